//! # Periodic Scheduler
//!
//! Drives the three background loops: reference-cache refresh,
//! pending-queue drain, and the low-stock inventory sweep.
//!
//! ## Timing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       SyncScheduler                                 │
//! │                                                                     │
//! │  refresh tick (configurable, default 5 min)                         │
//! │     └─► cache.refresh()                                             │
//! │           changed? ──► one "reference data updated" notification    │
//! │           error?   ──► logged, retried next tick                    │
//! │                                                                     │
//! │  drain tick (fixed 30 s)                                            │
//! │     └─► queue.drain() against the remote store                      │
//! │                                                                     │
//! │  alert tick (fixed 30 min)                                          │
//! │     └─► ledger.check_inventory_alerts()                             │
//! │                                                                     │
//! │  shutdown ──► handle.shutdown() breaks the loop                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Overlap-skip safety: a refresh that races a manual refresh is benign
//! because every refresh fully replaces the mappings, so the last writer
//! wins. Draining holds only the queue lock, never the ledger state, so a
//! slow drain cannot block a deal submission.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::cache::ReferenceCache;
use crate::config::{Ranges, ALERT_INTERVAL, DRAIN_INTERVAL};
use crate::error::{SyncError, SyncResult};
use crate::notify::{Notifier, Severity};
use crate::pending::PendingQueue;
use crate::service::LedgerService;
use crate::sheets::TabularStore;

/// Background loop driving refresh, drain and alert ticks.
pub struct SyncScheduler {
    cache: Arc<ReferenceCache>,
    queue: Arc<Mutex<PendingQueue>>,
    store: Arc<dyn TabularStore>,
    ledger: Arc<LedgerService>,
    ranges: Ranges,
    notifier: Arc<dyn Notifier>,
    refresh_interval: std::time::Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }
}

impl SyncScheduler {
    /// Creates a scheduler and its control handle.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cache: Arc<ReferenceCache>,
        queue: Arc<Mutex<PendingQueue>>,
        store: Arc<dyn TabularStore>,
        ledger: Arc<LedgerService>,
        ranges: Ranges,
        notifier: Arc<dyn Notifier>,
        refresh_interval: std::time::Duration,
    ) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let scheduler = SyncScheduler {
            cache,
            queue,
            store,
            ledger,
            ranges,
            notifier,
            refresh_interval,
            shutdown_rx,
        };

        (scheduler, SchedulerHandle { shutdown_tx })
    }

    /// Runs the scheduler loop. Spawn as a background task.
    pub async fn run(mut self) {
        info!(
            refresh_secs = self.refresh_interval.as_secs(),
            drain_secs = DRAIN_INTERVAL.as_secs(),
            alert_secs = ALERT_INTERVAL.as_secs(),
            "Sync scheduler starting"
        );

        let mut refresh_tick = tokio::time::interval(self.refresh_interval);
        refresh_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick of a tokio interval fires immediately; the cache was
        // already loaded at startup, so swallow it.
        refresh_tick.tick().await;

        let mut drain_tick = tokio::time::interval(DRAIN_INTERVAL);
        drain_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        drain_tick.tick().await;

        let mut alert_tick = tokio::time::interval(ALERT_INTERVAL);
        alert_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        alert_tick.tick().await;

        loop {
            tokio::select! {
                _ = refresh_tick.tick() => {
                    self.refresh_once().await;
                }

                _ = drain_tick.tick() => {
                    self.drain_once().await;
                }

                _ = alert_tick.tick() => {
                    self.alert_once().await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Sync scheduler shutting down");
                    break;
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    async fn refresh_once(&self) {
        match self.cache.refresh().await {
            Ok(true) => {
                self.notifier
                    .notify("Reference data updated from remote", Severity::Info);
            }
            Ok(false) => {
                debug!("Scheduled refresh: no reference changes");
            }
            Err(e) => {
                // Steady-state refresh failure is not fatal; the cached
                // snapshot keeps serving until the next tick succeeds.
                error!(error = %e, "Scheduled refresh failed");
            }
        }
    }

    async fn drain_once(&self) {
        let mut queue = self.queue.lock().await;
        if queue.is_empty() {
            return;
        }
        let report = queue.drain(self.store.as_ref(), &self.ranges).await;
        debug!(
            delivered = report.delivered,
            kept = report.kept,
            abandoned = report.abandoned,
            "Pending queue drained"
        );
    }

    async fn alert_once(&self) {
        let alerted = self.ledger.check_inventory_alerts().await;
        if alerted > 0 {
            info!(alerted, "Low-stock inventory alerts sent");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::test_support::RecordingChannel;
    use crate::notify::test_support::RecordingNotifier;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use polytrade_core::DealForm;
    use polytrade_db::{Database, DbConfig};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct StaticStore {
        rows: StdMutex<HashMap<String, Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl TabularStore for StaticStore {
        async fn read_range(&self, range: &str) -> SyncResult<Vec<Vec<String>>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(range)
                .cloned()
                .unwrap_or_default())
        }

        async fn append_row(&self, _range: &str, _row: &[String]) -> SyncResult<()> {
            Ok(())
        }
    }

    fn ranges() -> Ranges {
        Ranges {
            products: "P".to_string(),
            purchase_parties: "PP".to_string(),
            sale_parties: "SP".to_string(),
            deals: "D".to_string(),
        }
    }

    struct Parts {
        store: Arc<StaticStore>,
        notifier: Arc<RecordingNotifier>,
        channel: Arc<RecordingChannel>,
        queue: Arc<Mutex<PendingQueue>>,
        cache: Arc<ReferenceCache>,
        ledger: Arc<LedgerService>,
    }

    async fn parts() -> Parts {
        let store = Arc::new(StaticStore {
            rows: StdMutex::new(HashMap::new()),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let channel = Arc::new(RecordingChannel::default());
        let queue = Arc::new(Mutex::new(PendingQueue::new()));
        let cache = Arc::new(ReferenceCache::new(
            store.clone(),
            ranges(),
            notifier.clone(),
            queue.clone(),
        ));
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = Arc::new(LedgerService::new(
            db,
            store.clone(),
            notifier.clone(),
            channel.clone(),
            ranges().deals,
            "accounts-team",
            "logistics-team",
        ));
        Parts {
            store,
            notifier,
            channel,
            queue,
            cache,
            ledger,
        }
    }

    fn scheduler_of(p: &Parts, refresh: std::time::Duration) -> (SyncScheduler, SchedulerHandle) {
        SyncScheduler::new(
            p.cache.clone(),
            p.queue.clone(),
            p.store.clone(),
            p.ledger.clone(),
            ranges(),
            p.notifier.clone(),
            refresh,
        )
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let p = parts().await;
        let (scheduler, handle) = scheduler_of(&p, std::time::Duration::from_secs(3600));

        let task = tokio::spawn(scheduler.run());
        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_alert_tick_sweeps_low_stock() {
        let p = parts().await;

        // 60 kg lot, below the 100 kg threshold
        p.ledger
            .submit_deal(DealForm {
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                product: Some("PP".to_string()),
                purchase_party: Some("Supply Co".to_string()),
                purchase_quantity: Some(60.0),
                purchase_rate: Some(40.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(p.channel.sent.lock().unwrap().is_empty());

        // Pause only after DB setup: the SQLite pool connects via a worker
        // thread outside the runtime, and a paused clock auto-advances past
        // the pool's acquire timeout while waiting on it.
        tokio::time::pause();

        let (scheduler, handle) = scheduler_of(&p, std::time::Duration::from_secs(3600));
        let task = tokio::spawn(scheduler.run());

        // Paused clock: jump past the 30-minute alert tick.
        tokio::time::sleep(ALERT_INTERVAL + std::time::Duration::from_secs(1)).await;

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let sent = p.channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].1.contains("Current Stock: 60 kgs"));
        assert_eq!(sent[1].0, "logistics-team");
    }
}
