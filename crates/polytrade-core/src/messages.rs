//! # Outbound Message Templates
//!
//! Pure text rendering for the accounts and logistics teams plus inventory
//! alerts. Delivery (and simulation mode) lives in the sync crate; this
//! module only turns ledger data into message bodies, so every template is
//! deterministic and directly testable.

use crate::types::{format_date_ddmmyyyy, fmt_number, Deal, InventoryLot};

/// Stock level at or below which a lot triggers an inventory alert.
pub const LOW_STOCK_THRESHOLD_KG: f64 = 100.0;

/// Renders the accounts-team message for a completed deal.
///
/// Carries both sides of the deal so accounts can raise invoices without
/// opening the app.
pub fn accounts_message(deal: &Deal) -> String {
    format!(
        "Date: {date}\n\n\
         Sold to **{sale_party}**\n\
         Quantity: {qty} kg\n\
         Rate: {rate} {terms}\n\
         Comments: {sale_comments}\n\n\
         {product}  {company} {specific_grade}\n\n\
         Purchase from **{purchase_party}**\n\
         Quantity: {purchase_qty} kg\n\
         Rate: {purchase_rate}\n\
         Comments: {final_comments}",
        date = format_date_ddmmyyyy(deal.date),
        sale_party = deal.sale_party,
        qty = fmt_number(deal.quantity_sold),
        rate = fmt_number(deal.sale_rate),
        terms = deal.delivery_terms,
        sale_comments = or_none(&deal.sale_comments),
        product = deal.product,
        company = deal.company,
        specific_grade = deal.specific_grade,
        purchase_party = or_tbd(&deal.purchase_party),
        purchase_qty = fmt_number(deal.purchase_quantity),
        purchase_rate = fmt_number(deal.purchase_rate),
        final_comments = or_none(&deal.final_comments),
    )
}

/// Renders the logistics-team message: only what dispatch needs.
pub fn logistics_message(deal: &Deal) -> String {
    format!(
        "Sold to **{sale_party}**\n\
         {product}  {company} {specific_grade}\n\
         {qty} kg\n\
         Purchase from **{purchase_party}**\n\
         Warehouse: {warehouse}",
        sale_party = deal.sale_party,
        product = deal.product,
        company = deal.company,
        specific_grade = deal.specific_grade,
        qty = fmt_number(deal.purchase_quantity),
        purchase_party = or_tbd(&deal.purchase_party),
        warehouse = or_tbd(&deal.warehouse_input),
    )
}

/// Renders a low-stock alert for one inventory lot.
pub fn inventory_alert(lot: &InventoryLot) -> String {
    format!(
        "INVENTORY UPDATE\n\n\
         Product: {product}\n\
         Current Stock: {qty} kgs\n\
         Rate: {rate}/kg\n\
         Total Value: {value}\n\n\
         Low stock alert!\n\n\
         #InventoryAlert",
        product = lot.product,
        qty = fmt_number(lot.quantity),
        rate = fmt_number(lot.rate),
        value = fmt_number(lot.quantity * lot.rate),
    )
}

/// Wraps a free-form system notification in the standard envelope.
pub fn system_notification(body: &str, sent_at: &str) -> String {
    format!(
        "SYSTEM NOTIFICATION\n\n{body}\n\nSent from Polymer Trading System\n{sent_at}"
    )
}

fn or_none(s: &str) -> &str {
    if s.trim().is_empty() {
        "None"
    } else {
        s
    }
}

fn or_tbd(s: &str) -> &str {
    if s.trim().is_empty() {
        "TBD"
    } else {
        s
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleSource;
    use chrono::NaiveDate;

    fn deal() -> Deal {
        Deal {
            id: "d-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            sale_party: "Acme".to_string(),
            product: "PP".to_string(),
            grade: "Raffia".to_string(),
            company: "Reliance".to_string(),
            specific_grade: "H030SG".to_string(),
            quantity_sold: 100.0,
            sale_rate: 50.0,
            delivery_terms: "Ex-Works".to_string(),
            sale_comments: String::new(),
            sale_source: SaleSource::New,
            purchase_party: "Supply Co".to_string(),
            purchase_quantity: 150.0,
            purchase_rate: 40.0,
            purchase_comments: String::new(),
            final_comments: "urgent".to_string(),
            warehouse_input: String::new(),
            sale_value: 5000.0,
            purchase_value: 6000.0,
            profit: -1000.0,
        }
    }

    #[test]
    fn test_accounts_message_contents() {
        let msg = accounts_message(&deal());
        assert!(msg.contains("Date: 15-03-2024"));
        assert!(msg.contains("Sold to **Acme**"));
        assert!(msg.contains("Quantity: 100 kg"));
        assert!(msg.contains("Rate: 50 Ex-Works"));
        assert!(msg.contains("Comments: None"));
        assert!(msg.contains("Purchase from **Supply Co**"));
        assert!(msg.contains("Comments: urgent"));
    }

    #[test]
    fn test_logistics_message_uses_purchase_quantity_and_tbd_warehouse() {
        let msg = logistics_message(&deal());
        assert!(msg.contains("150 kg"));
        assert!(msg.contains("Warehouse: TBD"));
    }

    #[test]
    fn test_inventory_alert_value_math() {
        let lot = InventoryLot {
            id: "lot-1".to_string(),
            product: "PP".to_string(),
            grade: String::new(),
            company: String::new(),
            specific_grade: String::new(),
            quantity: 80.0,
            rate: 40.0,
            purchase_party: "Supply Co".to_string(),
            date_added: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        };
        let msg = inventory_alert(&lot);
        assert!(msg.contains("Current Stock: 80 kgs"));
        assert!(msg.contains("Total Value: 3200"));
        assert!(msg.contains("Low stock alert!"));
    }

    #[test]
    fn test_system_notification_envelope() {
        let msg = system_notification("Reference data updated", "2024-03-15 10:00");
        assert!(msg.starts_with("SYSTEM NOTIFICATION"));
        assert!(msg.contains("Reference data updated"));
        assert!(msg.ends_with("2024-03-15 10:00"));
    }
}
