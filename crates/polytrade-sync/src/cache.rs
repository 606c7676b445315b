//! # Reference Cache
//!
//! In-memory mirror of the three reference tables: products, purchase
//! parties, sale parties. The remote tabular store is the source of truth;
//! the cache is rebuilt by full replacement on every load or refresh, never
//! merged.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Reference Cache                               │
//! │                                                                     │
//! │  load_all() / refresh()                                             │
//! │     │   three concurrent range reads, fail-fast                     │
//! │     ▼                                                               │
//! │  parse rows ──► FULL REPLACE of each mapping                        │
//! │     │           (blank/whitespace keys skipped)                     │
//! │     ▼                                                               │
//! │  detect_changes ──► notification only, never gates the replace      │
//! │                                                                     │
//! │  add_product() / add_party()                                        │
//! │     1. insert locally (lastUpdated + "Added via App" source tag)    │
//! │     2. best-effort remote append                                    │
//! │     3. retryable failure: PendingUpdate queued, warning             │
//! │        non-retryable failure: error notification, nothing queued    │
//! │        local entry NEVER rolled back either way                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Availability over immediate consistency: a user can keep trading against
//! a locally added product while the pending queue repairs the remote side.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use polytrade_core::validation::require_text;
use polytrade_core::{
    format_date_ddmmyyyy, CoreError, Party, PartyKind, PendingUpdate, Product, UpdateKind,
};

use crate::config::Ranges;
use crate::error::SyncResult;
use crate::notify::{Notifier, Severity};
use crate::pending::PendingQueue;
use crate::sheets::TabularStore;

// =============================================================================
// Input DTOs
// =============================================================================

/// Structured input for adding a product.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub code: String,
    pub grade: String,
    pub company: String,
    pub specific_grade: String,
}

/// Structured input for adding a party.
#[derive(Debug, Clone, Default)]
pub struct NewParty {
    pub name: String,
    pub contact_person: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

/// Mapping sizes, for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub products: usize,
    pub purchase_parties: usize,
    pub sale_parties: usize,
}

// =============================================================================
// Reference Cache
// =============================================================================

/// In-memory mirror of the reference tables.
pub struct ReferenceCache {
    store: Arc<dyn TabularStore>,
    ranges: Ranges,
    notifier: Arc<dyn Notifier>,
    queue: Arc<Mutex<PendingQueue>>,

    products: RwLock<HashMap<String, Product>>,
    purchase_parties: RwLock<HashMap<String, Party>>,
    sale_parties: RwLock<HashMap<String, Party>>,
}

impl ReferenceCache {
    pub fn new(
        store: Arc<dyn TabularStore>,
        ranges: Ranges,
        notifier: Arc<dyn Notifier>,
        queue: Arc<Mutex<PendingQueue>>,
    ) -> Self {
        ReferenceCache {
            store,
            ranges,
            notifier,
            queue,
            products: RwLock::new(HashMap::new()),
            purchase_parties: RwLock::new(HashMap::new()),
            sale_parties: RwLock::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Bulk Load / Refresh
    // =========================================================================

    /// Initial load of all three tables. Any failure is fatal: without
    /// reference data the application cannot function, so there is no
    /// partial-success state.
    pub async fn load_all(&self) -> SyncResult<()> {
        self.refresh().await?;
        Ok(())
    }

    /// Fetches all three tables and fully replaces the mappings.
    ///
    /// Returns whether the product table changed relative to the previous
    /// snapshot; callers use that to decide whether to notify, never to
    /// skip the replacement itself.
    pub async fn refresh(&self) -> SyncResult<bool> {
        let (products_rows, purchase_rows, sale_rows) = tokio::join!(
            self.store.read_range(&self.ranges.products),
            self.store.read_range(&self.ranges.purchase_parties),
            self.store.read_range(&self.ranges.sale_parties),
        );

        let new_products = parse_products(&products_rows?);
        let new_purchase = parse_parties(&purchase_rows?);
        let new_sale = parse_parties(&sale_rows?);

        let changed = self.detect_changes(&new_products).await;

        *self.products.write().await = new_products;
        *self.purchase_parties.write().await = new_purchase;
        *self.sale_parties.write().await = new_sale;

        let stats = self.stats().await;
        info!(
            products = stats.products,
            purchase_parties = stats.purchase_parties,
            sale_parties = stats.sale_parties,
            changed,
            "Reference tables loaded"
        );

        Ok(changed)
    }

    /// Whether a just-fetched product table differs from the cached one.
    ///
    /// Compares key-set cardinality, then the sorted key sets, then
    /// grade/company/specificGrade for every shared key. Bookkeeping fields
    /// (lastUpdated, source) are ignored.
    pub async fn detect_changes(&self, new_products: &HashMap<String, Product>) -> bool {
        let current = self.products.read().await;

        if current.len() != new_products.len() {
            return true;
        }

        let mut current_keys: Vec<&String> = current.keys().collect();
        let mut new_keys: Vec<&String> = new_products.keys().collect();
        current_keys.sort();
        new_keys.sort();
        if current_keys != new_keys {
            return true;
        }

        current.iter().any(|(key, product)| {
            new_products
                .get(key)
                .map(|candidate| !product.same_fields(candidate))
                .unwrap_or(true)
        })
    }

    // =========================================================================
    // Optimistic Adds
    // =========================================================================

    /// Adds a product locally, then syncs the remote table best-effort.
    ///
    /// The local insert always sticks. When the remote append fails the
    /// write is queued for the drain loop and the caller sees an optimistic
    /// success with a warning notification.
    pub async fn add_product(&self, input: NewProduct) -> SyncResult<()> {
        let code = require_text("product", Some(input.code.as_str())).map_err(CoreError::from)?;

        let product = Product {
            grade: input.grade.trim().to_string(),
            company: input.company.trim().to_string(),
            specific_grade: input.specific_grade.trim().to_string(),
            last_updated: Utc::now(),
            source: Some(source_tag()),
        };
        self.products
            .write()
            .await
            .insert(code.clone(), product.clone());

        // Leading blank cell keeps the serial column empty.
        let row = vec![
            String::new(),
            code.clone(),
            product.grade,
            product.company,
            product.specific_grade,
        ];
        self.sync_or_queue(UpdateKind::AddProduct, row, &format!("Product {code}"))
            .await;
        Ok(())
    }

    /// Adds a purchase or sale party locally, then syncs best-effort.
    pub async fn add_party(&self, kind: PartyKind, input: NewParty) -> SyncResult<()> {
        let name = require_text("partyName", Some(input.name.as_str())).map_err(CoreError::from)?;

        let party = Party {
            contact_person: input.contact_person.trim().to_string(),
            phone: input.phone.trim().to_string(),
            email: input.email.trim().to_string(),
            address: input.address.trim().to_string(),
            last_updated: Utc::now(),
            source: Some(source_tag()),
        };

        let map = match kind {
            PartyKind::Purchase => &self.purchase_parties,
            PartyKind::Sale => &self.sale_parties,
        };
        map.write().await.insert(name.clone(), party.clone());

        let row = vec![
            name.clone(),
            party.contact_person,
            party.phone,
            party.email,
            party.address,
        ];
        let update_kind = match kind {
            PartyKind::Purchase => UpdateKind::AddPurchaseParty,
            PartyKind::Sale => UpdateKind::AddSaleParty,
        };
        self.sync_or_queue(update_kind, row, &format!("{kind} {name}"))
            .await;
        Ok(())
    }

    async fn sync_or_queue(&self, kind: UpdateKind, row: Vec<String>, what: &str) {
        let range = match kind {
            UpdateKind::AddProduct => &self.ranges.products,
            UpdateKind::AddPurchaseParty => &self.ranges.purchase_parties,
            UpdateKind::AddSaleParty => &self.ranges.sale_parties,
        };

        match self.store.append_row(range, &row).await {
            Ok(()) => {
                self.notifier
                    .notify(&format!("{what} added and synced"), Severity::Success);
            }
            Err(e) if e.is_retryable() => {
                warn!(kind = %kind, error = %e, "Remote append failed, queueing");
                self.queue.lock().await.push(PendingUpdate::new(kind, row));
                self.notifier.notify(
                    &format!("{what} added locally, will sync when possible"),
                    Severity::Warning,
                );
            }
            Err(e) => {
                // A rejected request would be rejected again; retrying it
                // just burns drain ticks. The local entry still sticks.
                warn!(kind = %kind, error = %e, "Remote append rejected, not queueing");
                self.notifier.notify(
                    &format!("{what} added locally, remote rejected the update: {e}"),
                    Severity::Error,
                );
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_product(&self, code: &str) -> Option<Product> {
        self.products.read().await.get(code).cloned()
    }

    pub async fn get_party(&self, kind: PartyKind, name: &str) -> Option<Party> {
        let map = match kind {
            PartyKind::Purchase => &self.purchase_parties,
            PartyKind::Sale => &self.sale_parties,
        };
        map.read().await.get(name).cloned()
    }

    /// Snapshot of all product codes, sorted. For dropdown-style listings.
    pub async fn product_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.products.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            products: self.products.read().await.len(),
            purchase_parties: self.purchase_parties.read().await.len(),
            sale_parties: self.sale_parties.read().await.len(),
        }
    }
}

// =============================================================================
// Row Parsing
// =============================================================================

/// "Added via App - dd-mm-yyyy" annotation for locally created entries.
fn source_tag() -> String {
    format!(
        "Added via App - {}",
        format_date_ddmmyyyy(Utc::now().date_naive())
    )
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Parses product rows: columns [product, grade, company, specificGrade].
/// The range excludes the header, so every row is data; rows with a blank
/// key are skipped.
fn parse_products(rows: &[Vec<String>]) -> HashMap<String, Product> {
    let now = Utc::now();
    let mut products = HashMap::new();
    for row in rows {
        let key = cell(row, 0);
        if key.is_empty() {
            continue;
        }
        products.insert(
            key,
            Product {
                grade: cell(row, 1),
                company: cell(row, 2),
                specific_grade: cell(row, 3),
                last_updated: now,
                source: None,
            },
        );
    }
    products
}

/// Parses party rows: columns [name, contactPerson, phone, email, address].
/// The first row is the header and is skipped; blank names are skipped.
fn parse_parties(rows: &[Vec<String>]) -> HashMap<String, Party> {
    let now = Utc::now();
    let mut parties = HashMap::new();
    for row in rows.iter().skip(1) {
        let key = cell(row, 0);
        if key.is_empty() {
            continue;
        }
        parties.insert(
            key,
            Party {
                contact_person: cell(row, 1),
                phone: cell(row, 2),
                email: cell(row, 3),
                address: cell(row, 4),
                last_updated: now,
                source: None,
            },
        );
    }
    parties
}

// =============================================================================
// Unit Tests
// =============================================================================
