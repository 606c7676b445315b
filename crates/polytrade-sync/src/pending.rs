//! # Pending-Write Queue
//!
//! At-least-once delivery buffer for reference-table writes that failed to
//! reach the remote store.
//!
//! ## Drain Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  drain(): one pass over the queue, oldest first                     │
//! │                                                                     │
//! │  entry ──► append_row ──► ok ──────────► dropped (delivered)        │
//! │                       └─► err ─► retries += 1                       │
//! │                                    │                                │
//! │                                    ├─ not retryable ─► abandoned    │
//! │                                    ├─ retries < 5 ───► kept         │
//! │                                    └─ retries >= 5 ──► abandoned,   │
//! │                                                        logged       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No per-entry backoff: retries are rate-limited by the scheduler's fixed
//! drain tick. Draining never runs on the submission path, so a backed-up
//! queue cannot block a deal.

use tracing::{info, warn};

use polytrade_core::{PendingUpdate, UpdateKind};

use crate::config::Ranges;
use crate::sheets::TabularStore;

/// Delivery attempts before an update is abandoned.
pub const MAX_SYNC_ATTEMPTS: u32 = 5;

/// What one drain pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub kept: usize,
    pub abandoned: usize,
}

/// Ordered collection of deferred remote writes.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Vec<PendingUpdate>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an update for the next drain pass.
    pub fn push(&mut self, update: PendingUpdate) {
        info!(
            kind = %update.kind,
            queued = self.entries.len() + 1,
            "Remote write deferred"
        );
        self.entries.push(update);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attempts every queued entry once against the remote store.
    pub async fn drain(&mut self, store: &dyn TabularStore, ranges: &Ranges) -> DrainReport {
        if self.entries.is_empty() {
            return DrainReport::default();
        }

        let mut report = DrainReport::default();
        let mut kept = Vec::new();

        for mut update in self.entries.drain(..) {
            let range = range_for(&update.kind, ranges);
            match store.append_row(range, &update.row).await {
                Ok(()) => {
                    report.delivered += 1;
                }
                Err(e) => {
                    update.retries += 1;
                    if e.is_retryable() && update.retries < MAX_SYNC_ATTEMPTS {
                        warn!(
                            kind = %update.kind,
                            retries = update.retries,
                            error = %e,
                            "Deferred write failed, keeping for retry"
                        );
                        report.kept += 1;
                        kept.push(update);
                    } else {
                        // Either the remote rejected the row outright or the
                        // attempt ceiling was reached.
                        warn!(
                            kind = %update.kind,
                            retries = update.retries,
                            error = %e,
                            "Deferred write abandoned"
                        );
                        report.abandoned += 1;
                    }
                }
            }
        }

        self.entries = kept;
        report
    }
}

/// The target range for each update kind.
fn range_for<'a>(kind: &UpdateKind, ranges: &'a Ranges) -> &'a str {
    match kind {
        UpdateKind::AddProduct => &ranges.products,
        UpdateKind::AddPurchaseParty => &ranges.purchase_parties,
        UpdateKind::AddSaleParty => &ranges.sale_parties,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SyncError, SyncResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    struct MockStore {
        fail: AtomicBool,
        fail_status: u16,
        appends: Mutex<Vec<(String, Vec<String>)>>,
        attempts: AtomicU32,
    }

    impl MockStore {
        fn new(fail: bool) -> Self {
            Self::with_status(fail, 503)
        }

        fn with_status(fail: bool, fail_status: u16) -> Self {
            MockStore {
                fail: AtomicBool::new(fail),
                fail_status,
                appends: Mutex::new(Vec::new()),
                attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TabularStore for MockStore {
        async fn read_range(&self, _range: &str) -> SyncResult<Vec<Vec<String>>> {
            Ok(Vec::new())
        }

        async fn append_row(&self, range: &str, row: &[String]) -> SyncResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SyncError::Api {
                    status: self.fail_status,
                    body: "append failed".to_string(),
                });
            }
            self.appends
                .lock()
                .unwrap()
                .push((range.to_string(), row.to_vec()));
            Ok(())
        }
    }

    fn ranges() -> Ranges {
        Ranges {
            products: "Products!A2:D".to_string(),
            purchase_parties: "PurchaseParties!A:E".to_string(),
            sale_parties: "SaleParties!A:E".to_string(),
            deals: "Deals!A:L".to_string(),
        }
    }

    fn product_update() -> PendingUpdate {
        PendingUpdate::new(
            UpdateKind::AddProduct,
            vec!["PP".to_string(), "Raffia".to_string()],
        )
    }

    #[tokio::test]
    async fn test_successful_drain_delivers_and_empties() {
        let store = MockStore::new(false);
        let mut queue = PendingQueue::new();
        queue.push(product_update());
        queue.push(PendingUpdate::new(
            UpdateKind::AddSaleParty,
            vec!["Acme".to_string()],
        ));

        let report = queue.drain(&store, &ranges()).await;
        assert_eq!(report.delivered, 2);
        assert!(queue.is_empty());

        let appends = store.appends.lock().unwrap();
        assert_eq!(appends[0].0, "Products!A2:D");
        assert_eq!(appends[1].0, "SaleParties!A:E");
    }

    #[tokio::test]
    async fn test_failed_entry_kept_with_incremented_retries() {
        let store = MockStore::new(true);
        let mut queue = PendingQueue::new();
        queue.push(product_update());

        let report = queue.drain(&store, &ranges()).await;
        assert_eq!(report.kept, 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_entry_abandoned_after_five_attempts() {
        let store = MockStore::new(true);
        let mut queue = PendingQueue::new();
        queue.push(product_update());

        for pass in 1..=MAX_SYNC_ATTEMPTS {
            let report = queue.drain(&store, &ranges()).await;
            if pass < MAX_SYNC_ATTEMPTS {
                assert_eq!(report.kept, 1, "pass {pass}");
            } else {
                assert_eq!(report.abandoned, 1);
            }
        }

        assert!(queue.is_empty());
        assert_eq!(store.attempts.load(Ordering::SeqCst), MAX_SYNC_ATTEMPTS);

        // A further drain performs no attempts at all.
        let report = queue.drain(&store, &ranges()).await;
        assert_eq!(report, DrainReport::default());
        assert_eq!(store.attempts.load(Ordering::SeqCst), MAX_SYNC_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_rejected_entry_abandoned_on_first_pass() {
        let store = MockStore::with_status(true, 400);
        let mut queue = PendingQueue::new();
        queue.push(product_update());

        let report = queue.drain(&store, &ranges()).await;
        assert_eq!(report.abandoned, 1);
        assert_eq!(report.kept, 0);
        assert!(queue.is_empty());
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovery_mid_way_delivers_late() {
        let store = MockStore::new(true);
        let mut queue = PendingQueue::new();
        queue.push(product_update());

        queue.drain(&store, &ranges()).await;
        queue.drain(&store, &ranges()).await;
        assert_eq!(queue.len(), 1);

        store.fail.store(false, Ordering::SeqCst);
        let report = queue.drain(&store, &ranges()).await;
        assert_eq!(report.delivered, 1);
        assert!(queue.is_empty());
    }
}
