//! # polytrade-sync
//!
//! Reference cache and sync engine for the Polytrade ledger.
//!
//! ## System Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         polytrade-sync                              │
//! │                                                                     │
//! │   UI / caller                                                       │
//! │      │ deal form                 ┌──────────────┐                   │
//! │      ▼                          │ SyncScheduler │                   │
//! │  ┌──────────────┐               │  refresh 5min │                   │
//! │  │ LedgerService│◄──alerts 30min┤  drain 30s    │                   │
//! │  └──────┬───────┘               └──────┬───────┘                    │
//! │         │ persist first               │                             │
//! │         ▼                             ▼                             │
//! │   polytrade-db            ┌────────────────┐  ┌──────────────┐      │
//! │   (SQLite)                │ ReferenceCache │  │ PendingQueue │      │
//! │         │                 └───────┬────────┘  └──────┬───────┘      │
//! │         │ best-effort append      │ read/append      │ retries      │
//! │         └────────────►┌───────────┴──────────────────┘              │
//! │                       ▼                                             │
//! │                 SheetsClient ──► TokenCache ──► AuthProvider        │
//! │                       │                                             │
//! │                       ▼                                             │
//! │              Remote Tabular Store                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//! - [`config`]    - TOML configuration with placeholder validation
//! - [`auth`]      - Bearer token cache with early refresh
//! - [`sheets`]    - TabularStore trait + HTTP client
//! - [`cache`]     - In-memory reference mirror, full-replace refresh
//! - [`pending`]   - At-least-once retry queue for deferred writes
//! - [`service`]   - Deal submission orchestration, local-first
//! - [`scheduler`] - Refresh, drain and inventory-alert loops
//! - [`messaging`] - Outbound message channel (simulation-capable)
//! - [`notify`]    - Fire-and-forget notification hook
//! - [`error`]     - SyncError / SyncResult

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod messaging;
pub mod notify;
pub mod pending;
pub mod scheduler;
pub mod service;
pub mod sheets;

pub use auth::{AuthProvider, BearerToken, TokenCache};
pub use cache::{CacheStats, NewParty, NewProduct, ReferenceCache};
pub use config::{AppConfig, MessagingMode, Ranges, ALERT_INTERVAL, DRAIN_INTERVAL};
pub use error::{SyncError, SyncResult};
pub use messaging::{MessageChannel, SimulationChannel};
pub use notify::{LogNotifier, Notifier, Severity};
pub use pending::{DrainReport, PendingQueue, MAX_SYNC_ATTEMPTS};
pub use scheduler::{SchedulerHandle, SyncScheduler};
pub use service::{DealOutcome, LedgerService, LedgerStats};
pub use sheets::{SheetsClient, TabularStore};
