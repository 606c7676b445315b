//! # Ledger Snapshot Repository
//!
//! Persists the deal history and the inventory as JSON blobs under
//! well-known keys, plus the last self-test report. Deals and inventory are
//! mirrored here after every successful submission; on startup they are the
//! authoritative local state.
//!
//! ## Round-Trip Fidelity
//! Snapshots are serialized with serde_json and must reload to identical
//! ordered sequences with numeric fields still numeric. A snapshot that
//! fails to parse surfaces as [`DbError::Corrupt`]; callers log a warning
//! and start from an empty collection instead of refusing to start.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use polytrade_core::{Deal, InventoryLot};

use crate::error::{DbError, DbResult};
use crate::repository::kv::KvRepository;

/// Storage key for the ordered deal history.
pub const KEY_DEALS: &str = "deals";
/// Storage key for the inventory lot collection.
pub const KEY_INVENTORY: &str = "inventory";
/// Storage key for the last persisted self-test report.
pub const KEY_TEST_REPORT: &str = "last_test_report";

/// JSON snapshot access for the ledger collections.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    kv: KvRepository,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository {
            kv: KvRepository::new(pool),
        }
    }

    // =========================================================================
    // Deals
    // =========================================================================

    /// Loads the deal history. A missing key is an empty history.
    pub async fn load_deals(&self) -> DbResult<Vec<Deal>> {
        self.load_collection(KEY_DEALS).await
    }

    /// Replaces the stored deal history.
    pub async fn save_deals(&self, deals: &[Deal]) -> DbResult<()> {
        self.save_collection(KEY_DEALS, deals).await
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Loads the inventory lots. A missing key is an empty collection.
    pub async fn load_inventory(&self) -> DbResult<Vec<InventoryLot>> {
        self.load_collection(KEY_INVENTORY).await
    }

    /// Replaces the stored inventory.
    pub async fn save_inventory(&self, inventory: &[InventoryLot]) -> DbResult<()> {
        self.save_collection(KEY_INVENTORY, inventory).await
    }

    // =========================================================================
    // Test Report
    // =========================================================================

    /// Loads the last self-test report, if one was ever stored.
    pub async fn load_test_report(&self) -> DbResult<Option<serde_json::Value>> {
        match self.kv.get(KEY_TEST_REPORT).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DbError::corrupt(KEY_TEST_REPORT, e.to_string())),
        }
    }

    /// Stores a self-test report, replacing the previous one.
    pub async fn save_test_report(&self, report: &serde_json::Value) -> DbResult<()> {
        let json = serde_json::to_string(report)
            .map_err(|e| DbError::Internal(e.to_string()))?;
        self.kv.set(KEY_TEST_REPORT, &json).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load_collection<T: DeserializeOwned>(&self, key: &str) -> DbResult<Vec<T>> {
        match self.kv.get(key).await? {
            None => Ok(Vec::new()),
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|e| DbError::corrupt(key, e.to_string()))
            }
        }
    }

    async fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> DbResult<()> {
        let json =
            serde_json::to_string(items).map_err(|e| DbError::Internal(e.to_string()))?;
        self.kv.set(key, &json).await?;
        debug!(key, count = items.len(), "snapshot saved");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use polytrade_core::SaleSource;

    async fn repo() -> LedgerRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().ledger()
    }

    fn sample_deal(id: &str) -> Deal {
        Deal {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            sale_party: "Acme".to_string(),
            product: "PP".to_string(),
            grade: "Raffia".to_string(),
            company: "Reliance".to_string(),
            specific_grade: "H030SG".to_string(),
            quantity_sold: 100.0,
            sale_rate: 50.5,
            delivery_terms: "Ex-Works".to_string(),
            sale_comments: String::new(),
            sale_source: SaleSource::New,
            purchase_party: "Supply Co".to_string(),
            purchase_quantity: 150.0,
            purchase_rate: 40.0,
            purchase_comments: String::new(),
            final_comments: String::new(),
            warehouse_input: String::new(),
            sale_value: 5050.0,
            purchase_value: 6000.0,
            profit: -950.0,
        }
    }

    #[tokio::test]
    async fn test_missing_keys_load_empty() {
        let repo = repo().await;
        assert!(repo.load_deals().await.unwrap().is_empty());
        assert!(repo.load_inventory().await.unwrap().is_empty());
        assert!(repo.load_test_report().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deal_round_trip_preserves_order_and_values() {
        let repo = repo().await;
        let deals = vec![sample_deal("d-1"), sample_deal("d-2")];
        repo.save_deals(&deals).await.unwrap();

        let loaded = repo.load_deals().await.unwrap();
        assert_eq!(loaded, deals);
        assert_eq!(loaded[0].id, "d-1");
        assert_eq!(loaded[1].sale_rate, 50.5);
    }

    #[tokio::test]
    async fn test_inventory_round_trip() {
        let repo = repo().await;
        let lots = vec![InventoryLot {
            id: "lot-1".to_string(),
            product: "PP".to_string(),
            grade: "Raffia".to_string(),
            company: "Reliance".to_string(),
            specific_grade: "H030SG".to_string(),
            quantity: 50.0,
            rate: 40.0,
            purchase_party: "Supply Co".to_string(),
            date_added: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }];
        repo.save_inventory(&lots).await.unwrap();
        assert_eq!(repo.load_inventory().await.unwrap(), lots);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_reported() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.kv().set(KEY_DEALS, "{not json").await.unwrap();

        let err = db.ledger().load_deals().await.unwrap_err();
        assert!(matches!(err, DbError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_test_report_round_trip() {
        let repo = repo().await;
        let report = serde_json::json!({
            "passed": 12,
            "failed": 0,
            "ranAt": "2024-03-15T10:00:00Z",
        });
        repo.save_test_report(&report).await.unwrap();
        assert_eq!(repo.load_test_report().await.unwrap(), Some(report));
    }
}
