//! # Ledger Service
//!
//! Orchestrates deal submission end to end.
//!
//! ## Submission Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     submit_deal(form)                               │
//! │                                                                     │
//! │  1. ledger::submit ──► validate + mutate LedgerState                │
//! │         (error: nothing was mutated, nothing persisted)             │
//! │                                                                     │
//! │  2. persist deals + inventory to the local store (blocking)         │
//! │         LOCAL DURABILITY PRECEDES ANY REMOTE ATTEMPT                │
//! │                                                                     │
//! │  3. complete deals only: one best-effort remote append of the       │
//! │     12-column row. Failure = warning notification, local state      │
//! │     stays committed. Deals never use the pending queue.             │
//! │                                                                     │
//! │  4. complete deals only: fire-and-forget accounts + logistics       │
//! │     messages. Purchase-only entries short-circuit messaging.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use polytrade_core::messages::{
    accounts_message, inventory_alert, logistics_message, LOW_STOCK_THRESHOLD_KG,
};
use polytrade_core::{ledger, DealForm, InventoryLot, LedgerState, Submission};
use polytrade_db::{Database, DbError};

use crate::error::SyncResult;
use crate::messaging::MessageChannel;
use crate::notify::{Notifier, Severity};
use crate::sheets::TabularStore;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a successful submission, including sync status.
#[derive(Debug)]
pub struct DealOutcome {
    pub submission: Submission,
    /// Whether the remote deal-sheet append succeeded. Local durability is
    /// already guaranteed either way.
    pub remote_synced: bool,
}

/// Ledger collection sizes, for status displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerStats {
    pub deals: usize,
    pub inventory_lots: usize,
    pub total_inventory_kg: f64,
}

// =============================================================================
// Ledger Service
// =============================================================================

/// Owns the ledger state and its persistence/sync side effects.
pub struct LedgerService {
    state: Mutex<LedgerState>,
    db: Database,
    store: Arc<dyn TabularStore>,
    notifier: Arc<dyn Notifier>,
    channel: Arc<dyn MessageChannel>,

    deals_range: String,
    accounts_recipient: String,
    logistics_recipient: String,
}

impl LedgerService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Database,
        store: Arc<dyn TabularStore>,
        notifier: Arc<dyn Notifier>,
        channel: Arc<dyn MessageChannel>,
        deals_range: impl Into<String>,
        accounts_recipient: impl Into<String>,
        logistics_recipient: impl Into<String>,
    ) -> Self {
        LedgerService {
            state: Mutex::new(LedgerState::new()),
            db,
            store,
            notifier,
            channel,
            deals_range: deals_range.into(),
            accounts_recipient: accounts_recipient.into(),
            logistics_recipient: logistics_recipient.into(),
        }
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Restores deals and inventory from the local store.
    ///
    /// A corrupt snapshot is logged and replaced by an empty collection;
    /// refusing to start over a bad blob would lose the user more than the
    /// blob already did.
    pub async fn load_local(&self) -> SyncResult<()> {
        let repo = self.db.ledger();

        let deals = match repo.load_deals().await {
            Ok(deals) => deals,
            Err(DbError::Corrupt { key, reason }) => {
                warn!(key, reason, "Corrupt deal snapshot, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        let inventory = match repo.load_inventory().await {
            Ok(lots) => lots,
            Err(DbError::Corrupt { key, reason }) => {
                warn!(key, reason, "Corrupt inventory snapshot, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = self.state.lock().await;
        info!(
            deals = deals.len(),
            lots = inventory.len(),
            "Ledger restored from local store"
        );
        state.deals = deals;
        state.inventory = inventory;
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submits a deal form through the full pipeline.
    pub async fn submit_deal(&self, form: DealForm) -> SyncResult<DealOutcome> {
        let mut state = self.state.lock().await;

        let submission = match ledger::submit(&mut state, form) {
            Ok(submission) => submission,
            Err(e) => {
                self.notifier.notify(&e.to_string(), Severity::Error);
                return Err(e.into());
            }
        };

        // Local durability first. The state lock is held until both
        // snapshots are written, so no second submission can interleave.
        let repo = self.db.ledger();
        if let Err(e) = async {
            repo.save_deals(&state.deals).await?;
            repo.save_inventory(&state.inventory).await
        }
        .await
        {
            self.notifier
                .notify(&format!("Failed to save locally: {e}"), Severity::Error);
            return Err(e.into());
        }

        let serial = format!(
            "{}-{:04}",
            chrono::Utc::now().format("%Y%m%d"),
            state.deals.len()
        );
        drop(state);

        let remote_synced = match &submission {
            Submission::PurchaseOnly { lot } => {
                self.notifier.notify(
                    &format!("{} kg {} added to inventory", lot.quantity, lot.product),
                    Severity::Success,
                );
                // Nothing goes to the deal sheet and no messages are sent.
                true
            }
            Submission::CompleteDeal { deal, .. } => {
                let synced = match self
                    .store
                    .append_row(&self.deals_range, &deal.sheet_row(&serial))
                    .await
                {
                    Ok(()) => {
                        self.notifier
                            .notify("Deal recorded and synced", Severity::Success);
                        true
                    }
                    Err(e) => {
                        // Advisory only: the deal is already durable locally.
                        warn!(error = %e, "Deal remote append failed");
                        self.notifier.notify(
                            "Deal recorded locally, remote sync failed",
                            Severity::Warning,
                        );
                        false
                    }
                };

                self.send_deal_messages(deal).await;
                synced
            }
        };

        Ok(DealOutcome {
            submission,
            remote_synced,
        })
    }

    /// Fire-and-forget accounts and logistics messages for a complete deal.
    async fn send_deal_messages(&self, deal: &polytrade_core::Deal) {
        let sends = [
            (&self.accounts_recipient, accounts_message(deal)),
            (&self.logistics_recipient, logistics_message(deal)),
        ];
        for (recipient, body) in sends {
            if let Err(e) = self.channel.send_text(recipient, &body).await {
                warn!(recipient, error = %e, "Outbound message failed");
            }
        }
    }

    // =========================================================================
    // Inventory Alerts
    // =========================================================================

    /// Sends a low-stock alert for every lot at or below the threshold.
    ///
    /// Returns how many lots alerted.
    pub async fn check_inventory_alerts(&self) -> usize {
        let low_lots: Vec<InventoryLot> = {
            let state = self.state.lock().await;
            state
                .inventory
                .iter()
                .filter(|lot| lot.quantity <= LOW_STOCK_THRESHOLD_KG)
                .cloned()
                .collect()
        };

        for lot in &low_lots {
            let body = inventory_alert(lot);
            for recipient in [&self.accounts_recipient, &self.logistics_recipient] {
                if let Err(e) = self.channel.send_text(recipient, &body).await {
                    warn!(recipient, error = %e, "Inventory alert failed");
                }
            }
        }
        low_lots.len()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn stats(&self) -> LedgerStats {
        let state = self.state.lock().await;
        LedgerStats {
            deals: state.deals.len(),
            inventory_lots: state.inventory.len(),
            total_inventory_kg: state.total_inventory_kg(),
        }
    }

    /// Snapshot of the deal history, oldest first.
    pub async fn deals(&self) -> Vec<polytrade_core::Deal> {
        self.state.lock().await.deals.clone()
    }

    /// Snapshot of the current inventory lots.
    pub async fn inventory(&self) -> Vec<InventoryLot> {
        self.state.lock().await.inventory.clone()
    }
}
