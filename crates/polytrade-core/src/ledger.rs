//! # Deal/Inventory Ledger
//!
//! The decision procedure applied to every submitted deal form.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Ledger Submission                             │
//! │                                                                     │
//! │   DealForm                                                          │
//! │      │                                                              │
//! │      ▼                                                              │
//! │  classify() ──────────────► rejected (no mutation)                  │
//! │      │                                                              │
//! │      ├── PURCHASE_ONLY ───► new InventoryLot, no Deal               │
//! │      │                                                              │
//! │      └── COMPLETE_DEAL                                              │
//! │            │                                                        │
//! │            ├── saleSource = inventory                               │
//! │            │     pre-check lot.quantity >= quantitySold             │
//! │            │     decrement lot (remove at exactly 0)                │
//! │            │     purchaseParty/purchaseRate taken from the lot      │
//! │            │                                                        │
//! │            └── saleSource = new                                     │
//! │                  purchase fields from the form                      │
//! │                  surplus (purchaseQty − qtySold) becomes a lot      │
//! │            │                                                        │
//! │            ▼                                                        │
//! │       profit = saleValue − purchaseValue, Deal appended             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All validation and the inventory sufficiency check happen before any
//! mutation; a submission that returns an error leaves `LedgerState`
//! untouched. Persistence and remote sync are the caller's job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Deal, DealForm, InventoryLot, SaleSource};
use crate::validation::{require_positive, require_text, validate_comment};

// =============================================================================
// Ledger State
// =============================================================================

/// The two collections the ledger owns.
///
/// An explicit state struct passed to the decision procedure; callers hold
/// exactly one instance and mirror it into the local store after every
/// successful submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub deals: Vec<Deal>,
    pub inventory: Vec<InventoryLot>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total remaining stock across all lots, in kilograms.
    pub fn total_inventory_kg(&self) -> f64 {
        self.inventory.iter().map(|lot| lot.quantity).sum()
    }
}

// =============================================================================
// Classification
// =============================================================================

/// What kind of submission a form represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Purchase side only. Creates a lot, appends no deal.
    PurchaseOnly,
    /// Sale backed by a purchase (inventory draw-down or fresh purchase).
    CompleteDeal,
}

/// Classifies a form by which sides it carries.
///
/// A sale is "present" when saleParty, quantitySold and saleRate all are; a
/// purchase is present when the three purchase fields are, or when the sale
/// is sourced from a selected inventory lot (the lot is the purchase info).
///
/// Rejections happen here, before anything is validated in depth:
/// - sale without any purchase backing is a business-rule violation
/// - neither side present is insufficient data
pub fn classify(form: &DealForm) -> CoreResult<Classification> {
    let has_sale = DealForm::text(&form.sale_party).is_some()
        && form.quantity_sold.is_some()
        && form.sale_rate.is_some();

    let has_form_purchase = DealForm::text(&form.purchase_party).is_some()
        && form.purchase_quantity.is_some()
        && form.purchase_rate.is_some();

    let has_lot_backing =
        form.sale_source == Some(SaleSource::Inventory) && form.inventory_index.is_some();

    match (has_sale, has_form_purchase || has_lot_backing) {
        (false, true) if has_form_purchase => Ok(Classification::PurchaseOnly),
        (true, false) => Err(CoreError::SaleWithoutPurchase),
        (true, true) => Ok(Classification::CompleteDeal),
        _ => Err(CoreError::InsufficientData),
    }
}

// =============================================================================
// Submission Outcome
// =============================================================================

/// What a successful submission did to the ledger.
#[derive(Debug, Clone)]
pub enum Submission {
    /// A purchase-only entry: one new lot, no deal.
    PurchaseOnly { lot: InventoryLot },

    /// A complete deal was appended.
    CompleteDeal {
        deal: Deal,
        /// The surplus lot created when the purchase exceeded the sale.
        surplus_lot: Option<InventoryLot>,
        /// True when an inventory-sourced sale emptied its lot.
        lot_removed: bool,
    },
}

impl Submission {
    /// The deal appended by this submission, if any.
    pub fn deal(&self) -> Option<&Deal> {
        match self {
            Submission::CompleteDeal { deal, .. } => Some(deal),
            Submission::PurchaseOnly { .. } => None,
        }
    }
}

// =============================================================================
// Submit
// =============================================================================

/// Applies a submitted form to the ledger.
///
/// Validation order for complete deals follows the entry form: saleParty,
/// then deliveryTerms, then the numeric sale fields, then the purchase
/// resolution. An error return means no mutation occurred.
pub fn submit(state: &mut LedgerState, form: DealForm) -> CoreResult<Submission> {
    match classify(&form)? {
        Classification::PurchaseOnly => submit_purchase_only(state, form),
        Classification::CompleteDeal => submit_complete_deal(state, form),
    }
}

fn submit_purchase_only(state: &mut LedgerState, form: DealForm) -> CoreResult<Submission> {
    let product = require_text("product", DealForm::text(&form.product))?;
    let purchase_party = require_text("purchaseParty", DealForm::text(&form.purchase_party))?;
    let purchase_quantity = require_positive("purchaseQuantity", form.purchase_quantity)?;
    let purchase_rate = require_positive("purchaseRate", form.purchase_rate)?;
    validate_comment(
        "purchaseComments",
        DealForm::text(&form.purchase_comments).unwrap_or(""),
    )?;

    let lot = InventoryLot {
        id: Uuid::new_v4().to_string(),
        product,
        grade: DealForm::text_or_empty(&form.grade),
        company: DealForm::text_or_empty(&form.company),
        specific_grade: DealForm::text_or_empty(&form.specific_grade),
        quantity: purchase_quantity,
        rate: purchase_rate,
        purchase_party,
        date_added: form.date,
    };

    state.inventory.push(lot.clone());
    Ok(Submission::PurchaseOnly { lot })
}

/// Resolved purchase side of a complete deal, computed before any mutation.
struct PurchaseResolution {
    party: String,
    quantity: f64,
    rate: f64,
    /// Lot index to decrement, for inventory-sourced sales.
    draw_from: Option<usize>,
    surplus_lot: Option<InventoryLot>,
}

fn submit_complete_deal(state: &mut LedgerState, form: DealForm) -> CoreResult<Submission> {
    let sale_party = require_text("saleParty", DealForm::text(&form.sale_party))?;
    let delivery_terms = require_text("deliveryTerms", DealForm::text(&form.delivery_terms))?;
    let quantity_sold = require_positive("quantitySold", form.quantity_sold)?;
    let sale_rate = require_positive("saleRate", form.sale_rate)?;
    let product = require_text("product", DealForm::text(&form.product))?;
    validate_comment(
        "saleComments",
        DealForm::text(&form.sale_comments).unwrap_or(""),
    )?;
    validate_comment(
        "finalComments",
        DealForm::text(&form.final_comments).unwrap_or(""),
    )?;

    let sale_source = form.sale_source.unwrap_or(SaleSource::New);

    let resolution = match sale_source {
        SaleSource::Inventory => {
            let index = form
                .inventory_index
                .ok_or_else(|| ValidationError::required("inventoryIndex"))?;
            let lot = state
                .inventory
                .get(index)
                .ok_or(CoreError::LotNotFound(index))?;

            // Sufficiency pre-check. Nothing has been mutated yet, so an
            // insufficient lot leaves the ledger exactly as it was.
            if lot.quantity < quantity_sold {
                return Err(CoreError::InsufficientInventory {
                    product: lot.product.clone(),
                    available: lot.quantity,
                    requested: quantity_sold,
                });
            }

            // Purchase side comes from the lot, not the form. The rate is
            // captured before the decrement.
            PurchaseResolution {
                party: lot.purchase_party.clone(),
                quantity: quantity_sold,
                rate: lot.rate,
                draw_from: Some(index),
                surplus_lot: None,
            }
        }
        SaleSource::New => {
            let party = require_text("purchaseParty", DealForm::text(&form.purchase_party))?;
            let quantity = require_positive("purchaseQuantity", form.purchase_quantity)?;
            let rate = require_positive("purchaseRate", form.purchase_rate)?;

            // Buying more than is sold leaves a surplus lot in inventory.
            // Undersupply is accepted as-is.
            let surplus_lot = if quantity > quantity_sold {
                Some(InventoryLot {
                    id: Uuid::new_v4().to_string(),
                    product: product.clone(),
                    grade: DealForm::text_or_empty(&form.grade),
                    company: DealForm::text_or_empty(&form.company),
                    specific_grade: DealForm::text_or_empty(&form.specific_grade),
                    quantity: quantity - quantity_sold,
                    rate,
                    purchase_party: party.clone(),
                    date_added: form.date,
                })
            } else {
                None
            };

            PurchaseResolution {
                party,
                quantity,
                rate,
                draw_from: None,
                surplus_lot,
            }
        }
    };

    // Past this point nothing can fail; mutations are safe to apply.
    let mut lot_removed = false;
    if let Some(index) = resolution.draw_from {
        let lot = &mut state.inventory[index];
        lot.quantity -= quantity_sold;
        if lot.quantity <= 0.0 {
            state.inventory.remove(index);
            lot_removed = true;
        }
    }

    let sale_value = quantity_sold * sale_rate;
    let purchase_value = resolution.quantity * resolution.rate;

    let deal = Deal {
        id: Uuid::new_v4().to_string(),
        date: form.date,
        sale_party,
        product,
        grade: DealForm::text_or_empty(&form.grade),
        company: DealForm::text_or_empty(&form.company),
        specific_grade: DealForm::text_or_empty(&form.specific_grade),
        quantity_sold,
        sale_rate,
        delivery_terms,
        sale_comments: DealForm::text_or_empty(&form.sale_comments),
        sale_source,
        purchase_party: resolution.party,
        purchase_quantity: resolution.quantity,
        purchase_rate: resolution.rate,
        purchase_comments: DealForm::text_or_empty(&form.purchase_comments),
        final_comments: DealForm::text_or_empty(&form.final_comments),
        warehouse_input: DealForm::text_or_empty(&form.warehouse_input),
        sale_value,
        purchase_value,
        profit: sale_value - purchase_value,
    };

    state.deals.push(deal.clone());

    let surplus_lot = resolution.surplus_lot;
    if let Some(lot) = &surplus_lot {
        state.inventory.push(lot.clone());
    }

    Ok(Submission::CompleteDeal {
        deal,
        surplus_lot,
        lot_removed,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn purchase_only_form() -> DealForm {
        DealForm {
            date: date(),
            product: Some("PP".to_string()),
            grade: Some("Raffia".to_string()),
            company: Some("Reliance".to_string()),
            specific_grade: Some("H030SG".to_string()),
            purchase_party: Some("Supply Co".to_string()),
            purchase_quantity: Some(200.0),
            purchase_rate: Some(42.0),
            ..Default::default()
        }
    }

    fn complete_new_form() -> DealForm {
        DealForm {
            date: date(),
            sale_party: Some("Acme".to_string()),
            quantity_sold: Some(100.0),
            sale_rate: Some(50.0),
            delivery_terms: Some("Ex-Works".to_string()),
            sale_source: Some(SaleSource::New),
            product: Some("PP".to_string()),
            purchase_party: Some("Supply Co".to_string()),
            purchase_quantity: Some(150.0),
            purchase_rate: Some(40.0),
            ..Default::default()
        }
    }

    fn seeded_state() -> LedgerState {
        let mut state = LedgerState::new();
        state.inventory.push(InventoryLot {
            id: "lot-1".to_string(),
            product: "PP".to_string(),
            grade: "Raffia".to_string(),
            company: "Reliance".to_string(),
            specific_grade: "H030SG".to_string(),
            quantity: 120.0,
            rate: 38.0,
            purchase_party: "Original Supplier".to_string(),
            date_added: date(),
        });
        state
    }

    #[test]
    fn test_classify_purchase_only() {
        let form = purchase_only_form();
        assert_eq!(classify(&form).unwrap(), Classification::PurchaseOnly);
    }

    #[test]
    fn test_classify_complete_deal() {
        let form = complete_new_form();
        assert_eq!(classify(&form).unwrap(), Classification::CompleteDeal);
    }

    #[test]
    fn test_classify_inventory_selection_counts_as_purchase() {
        let mut form = complete_new_form();
        form.purchase_party = None;
        form.purchase_quantity = None;
        form.purchase_rate = None;
        form.sale_source = Some(SaleSource::Inventory);
        form.inventory_index = Some(0);
        assert_eq!(classify(&form).unwrap(), Classification::CompleteDeal);
    }

    #[test]
    fn test_classify_rejects_bare_sale() {
        let mut form = complete_new_form();
        form.purchase_party = None;
        form.purchase_quantity = None;
        form.purchase_rate = None;
        let err = classify(&form).unwrap_err();
        assert!(matches!(err, CoreError::SaleWithoutPurchase));
    }

    #[test]
    fn test_classify_rejects_empty_form() {
        let form = DealForm {
            date: date(),
            ..Default::default()
        };
        let err = classify(&form).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientData));
    }

    #[test]
    fn test_purchase_only_creates_lot_no_deal() {
        let mut state = LedgerState::new();
        let outcome = submit(&mut state, purchase_only_form()).unwrap();

        assert!(state.deals.is_empty());
        assert_eq!(state.inventory.len(), 1);
        match outcome {
            Submission::PurchaseOnly { lot } => {
                assert_eq!(lot.quantity, 200.0);
                assert_eq!(lot.rate, 42.0);
                assert_eq!(lot.purchase_party, "Supply Co");
            }
            other => panic!("expected purchase-only outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_purchase_only_requires_product() {
        let mut state = LedgerState::new();
        let mut form = purchase_only_form();
        form.product = None;
        let err = submit(&mut state, form).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: product is required");
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_complete_deal_new_surplus_lot_and_negative_profit() {
        let mut state = LedgerState::new();
        let outcome = submit(&mut state, complete_new_form()).unwrap();

        let Submission::CompleteDeal {
            deal, surplus_lot, ..
        } = outcome
        else {
            panic!("expected complete deal");
        };
        assert_eq!(deal.sale_value, 5000.0);
        assert_eq!(deal.purchase_value, 6000.0);
        assert_eq!(deal.profit, -1000.0);

        let lot = surplus_lot.expect("surplus lot");
        assert_eq!(lot.quantity, 50.0);
        assert_eq!(lot.rate, 40.0);
        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.deals.len(), 1);
    }

    #[test]
    fn test_complete_deal_exact_supply_creates_no_lot() {
        let mut state = LedgerState::new();
        let mut form = complete_new_form();
        form.purchase_quantity = Some(100.0);
        let outcome = submit(&mut state, form).unwrap();

        let Submission::CompleteDeal { surplus_lot, .. } = outcome else {
            panic!("expected complete deal");
        };
        assert!(surplus_lot.is_none());
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_complete_deal_undersupply_accepted() {
        let mut state = LedgerState::new();
        let mut form = complete_new_form();
        form.purchase_quantity = Some(60.0);
        let outcome = submit(&mut state, form).unwrap();
        let deal = outcome.deal().unwrap();
        assert_eq!(deal.purchase_value, 60.0 * 40.0);
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_inventory_sale_draws_down_and_uses_lot_rate() {
        let mut state = seeded_state();
        let mut form = complete_new_form();
        form.sale_source = Some(SaleSource::Inventory);
        form.inventory_index = Some(0);
        form.purchase_party = None;
        form.purchase_quantity = None;
        form.purchase_rate = None;

        let outcome = submit(&mut state, form).unwrap();
        let Submission::CompleteDeal {
            deal, lot_removed, ..
        } = outcome
        else {
            panic!("expected complete deal");
        };

        assert!(!lot_removed);
        assert_eq!(state.inventory[0].quantity, 20.0);
        assert_eq!(deal.purchase_party, "Original Supplier");
        assert_eq!(deal.purchase_rate, 38.0);
        assert_eq!(deal.purchase_quantity, 100.0);
        assert_eq!(deal.purchase_value, 100.0 * 38.0);
        assert_eq!(deal.profit, deal.sale_value - deal.purchase_value);
    }

    #[test]
    fn test_inventory_sale_removes_lot_at_exactly_zero() {
        let mut state = seeded_state();
        let mut form = complete_new_form();
        form.quantity_sold = Some(120.0);
        form.sale_source = Some(SaleSource::Inventory);
        form.inventory_index = Some(0);

        let outcome = submit(&mut state, form).unwrap();
        let Submission::CompleteDeal { lot_removed, .. } = outcome else {
            panic!("expected complete deal");
        };
        assert!(lot_removed);
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_insufficient_inventory_mutates_nothing() {
        let mut state = seeded_state();
        let mut form = complete_new_form();
        form.quantity_sold = Some(500.0);
        form.sale_source = Some(SaleSource::Inventory);
        form.inventory_index = Some(0);

        let err = submit(&mut state, form).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientInventory { .. }));
        assert_eq!(state.inventory[0].quantity, 120.0);
        assert!(state.deals.is_empty());
    }

    #[test]
    fn test_missing_lot_index_is_lot_not_found() {
        let mut state = seeded_state();
        let mut form = complete_new_form();
        form.sale_source = Some(SaleSource::Inventory);
        form.inventory_index = Some(7);

        let err = submit(&mut state, form).unwrap_err();
        assert!(matches!(err, CoreError::LotNotFound(7)));
    }

    #[test]
    fn test_blank_sale_party_falls_back_to_purchase_only() {
        // A whitespace sale party means no sale side, so a form that still
        // carries full purchase data classifies as purchase-only.
        let mut form = complete_new_form();
        form.sale_party = Some("   ".to_string());
        assert_eq!(classify(&form).unwrap(), Classification::PurchaseOnly);
    }

    #[test]
    fn test_delivery_terms_required_for_complete_deal() {
        let mut state = LedgerState::new();
        let mut form = complete_new_form();
        form.delivery_terms = None;
        let err = submit(&mut state, form).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: deliveryTerms is required"
        );
        assert!(state.deals.is_empty());
        assert!(state.inventory.is_empty());
    }

    #[test]
    fn test_total_inventory_kg() {
        let state = seeded_state();
        assert_eq!(state.total_inventory_kg(), 120.0);
    }
}
