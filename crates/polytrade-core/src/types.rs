//! # Domain Types
//!
//! Core domain types for the polymer trading ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌────────────────┐        │
//! │  │   Product     │   │    Party      │   │  InventoryLot  │        │
//! │  │ ───────────── │   │ ───────────── │   │ ────────────── │        │
//! │  │ grade         │   │ contactPerson │   │ id (UUID)      │        │
//! │  │ company       │   │ phone/email   │   │ quantity (kg)  │        │
//! │  │ specificGrade │   │ address       │   │ rate (per kg)  │        │
//! │  └───────────────┘   └───────────────┘   └────────────────┘        │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌────────────────┐        │
//! │  │     Deal      │   │  SaleSource   │   │ PendingUpdate  │        │
//! │  │ ───────────── │   │ ───────────── │   │ ────────────── │        │
//! │  │ sale side     │   │  Inventory    │   │ kind + payload │        │
//! │  │ purchase side │   │  New          │   │ retries        │        │
//! │  │ profit        │   └───────────────┘   └────────────────┘        │
//! │  └───────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products and parties are keyed by their code/name in the reference cache
//! maps, so the structs themselves carry only attributes. Deals and lots are
//! persisted locally as JSON and keep the camelCase field names the stored
//! snapshots use.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Product
// =============================================================================

/// A polymer product entry from the reference table.
///
/// Keyed by product code in the cache map. Bulk loads fully replace the map;
/// individual adds stamp `last_updated` and a source annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Polymer grade (e.g. "Raffia").
    #[serde(default)]
    pub grade: String,

    /// Producing company (e.g. "Reliance").
    #[serde(default)]
    pub company: String,

    /// Specific grade designation (e.g. "H030SG").
    #[serde(default)]
    pub specific_grade: String,

    /// When this entry was last loaded or edited.
    pub last_updated: DateTime<Utc>,

    /// Where the entry came from ("Added via App - <date>" for local adds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Product {
    /// Field-level equality ignoring bookkeeping (timestamps, source tag).
    ///
    /// Used by change detection: two loads of the same sheet row must
    /// compare equal even though `last_updated` differs.
    pub fn same_fields(&self, other: &Product) -> bool {
        self.grade == other.grade
            && self.company == other.company
            && self.specific_grade == other.specific_grade
    }
}

// =============================================================================
// Party
// =============================================================================

/// Which reference table a party belongs to.
///
/// Purchase parties (suppliers) and sale parties (customers) are independent
/// namespaces; the same name may exist in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Purchase,
    Sale,
}

impl std::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyKind::Purchase => write!(f, "purchase party"),
            PartyKind::Sale => write!(f, "sale party"),
        }
    }
}

/// A trading counterparty (supplier or customer), keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub contact_person: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub address: String,

    pub last_updated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// =============================================================================
// Inventory Lot
// =============================================================================

/// Unsold purchased stock: one batch of one product.
///
/// ## Lifecycle
/// - Created when a deal buys more than it sells (the surplus becomes a lot)
///   or via a purchase-only entry.
/// - Consumed when a later inventory-sourced sale draws it down; a lot whose
///   quantity reaches exactly zero is removed from the collection.
///
/// Invariant: `quantity > 0` while the lot exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLot {
    /// Creation-time unique token (UUID v4).
    pub id: String,

    pub product: String,
    pub grade: String,
    pub company: String,
    pub specific_grade: String,

    /// Remaining quantity in kilograms.
    pub quantity: f64,

    /// Purchase rate, currency per kg.
    pub rate: f64,

    /// Supplier the stock was bought from.
    pub purchase_party: String,

    /// Date the lot entered inventory.
    pub date_added: NaiveDate,
}

// =============================================================================
// Sale Source
// =============================================================================

/// Where the sold goods come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleSource {
    /// Drawing down an existing inventory lot.
    Inventory,
    /// Backed by a fresh purchase recorded on the same form.
    New,
}

// =============================================================================
// Deal
// =============================================================================

/// One recorded trading transaction.
///
/// Immutable once appended to the deal history; an "edit" at the UI level is
/// a new submission. The derived fields (`sale_value`, `purchase_value`,
/// `profit`) are computed exactly once at creation time and profit is always
/// `sale_value - purchase_value`, never stored independently of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub date: NaiveDate,

    // Sale side
    pub sale_party: String,
    pub product: String,
    pub grade: String,
    pub company: String,
    pub specific_grade: String,
    pub quantity_sold: f64,
    pub sale_rate: f64,
    pub delivery_terms: String,
    pub sale_comments: String,
    pub sale_source: SaleSource,

    // Purchase side
    pub purchase_party: String,
    pub purchase_quantity: f64,
    pub purchase_rate: f64,
    pub purchase_comments: String,

    // Free-form extras carried through to messages
    pub final_comments: String,
    pub warehouse_input: String,

    // Derived at creation time
    pub sale_value: f64,
    pub purchase_value: f64,
    pub profit: f64,
}

impl Deal {
    /// Projects this deal onto the fixed 12-column remote sheet row.
    ///
    /// Column order:
    /// `[serial, date, saleParty, quantitySold, saleRate, product, grade,
    ///   company, specificGrade, purchaseParty, purchaseQuantity,
    ///   purchaseRate]`
    ///
    /// The serial is supplied by the caller (generated at append time);
    /// an empty string is a valid serial.
    pub fn sheet_row(&self, serial: &str) -> Vec<String> {
        vec![
            serial.to_string(),
            self.date.format("%Y-%m-%d").to_string(),
            self.sale_party.clone(),
            fmt_number(self.quantity_sold),
            fmt_number(self.sale_rate),
            self.product.clone(),
            self.grade.clone(),
            self.company.clone(),
            self.specific_grade.clone(),
            self.purchase_party.clone(),
            fmt_number(self.purchase_quantity),
            fmt_number(self.purchase_rate),
        ]
    }
}

/// Formats a numeric cell without a trailing `.0` for whole values.
pub(crate) fn fmt_number(value: f64) -> String {
    format!("{}", value)
}

// =============================================================================
// Deal Form
// =============================================================================

/// Raw deal submission as it arrives from the form layer.
///
/// All business fields are optional here; the ledger's classification step
/// decides what the submission is (purchase-only, complete deal) and which
/// missing field to complain about. Whitespace-only strings count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealForm {
    pub date: NaiveDate,

    #[serde(default)]
    pub sale_party: Option<String>,
    #[serde(default)]
    pub quantity_sold: Option<f64>,
    #[serde(default)]
    pub sale_rate: Option<f64>,
    #[serde(default)]
    pub delivery_terms: Option<String>,
    #[serde(default)]
    pub sale_comments: Option<String>,
    #[serde(default)]
    pub sale_source: Option<SaleSource>,

    /// Index into the inventory collection when selling from stock.
    #[serde(default)]
    pub inventory_index: Option<usize>,

    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub specific_grade: Option<String>,

    #[serde(default)]
    pub purchase_party: Option<String>,
    #[serde(default)]
    pub purchase_quantity: Option<f64>,
    #[serde(default)]
    pub purchase_rate: Option<f64>,
    #[serde(default)]
    pub purchase_comments: Option<String>,

    #[serde(default)]
    pub final_comments: Option<String>,
    #[serde(default)]
    pub warehouse_input: Option<String>,
}

impl DealForm {
    /// Returns the trimmed value of an optional text field, or None when
    /// the field is absent or whitespace-only.
    pub fn text(field: &Option<String>) -> Option<&str> {
        field.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Returns the trimmed text or an empty string.
    pub fn text_or_empty(field: &Option<String>) -> String {
        Self::text(field).unwrap_or_default().to_string()
    }
}

// =============================================================================
// Pending Update
// =============================================================================

/// Which remote write a queued update performs when retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateKind {
    AddProduct,
    AddPurchaseParty,
    AddSaleParty,
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateKind::AddProduct => write!(f, "add-product"),
            UpdateKind::AddPurchaseParty => write!(f, "add-purchase-party"),
            UpdateKind::AddSaleParty => write!(f, "add-sale-party"),
        }
    }
}

/// An envelope around a deferred remote write.
///
/// Created when a synchronous sync call fails; destroyed when a retry
/// succeeds or the retry counter reaches the drain ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpdate {
    pub kind: UpdateKind,

    /// The row the retry will append, already projected to sheet columns.
    pub row: Vec<String>,

    /// When the update was queued.
    pub queued_at: DateTime<Utc>,

    /// Number of failed delivery attempts so far.
    pub retries: u32,
}

impl PendingUpdate {
    pub fn new(kind: UpdateKind, row: Vec<String>) -> Self {
        PendingUpdate {
            kind,
            row,
            queued_at: Utc::now(),
            retries: 0,
        }
    }
}

// =============================================================================
// Date Formatting
// =============================================================================

/// Formats a date as dd-mm-yyyy, the display convention used in source
/// annotations and outbound messages.
pub fn format_date_ddmmyyyy(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
