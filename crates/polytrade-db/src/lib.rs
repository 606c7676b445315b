//! # polytrade-db
//!
//! Local persistent store for the Polytrade ledger.
//!
//! ## Responsibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Persistence Layer                             │
//! │                                                                     │
//! │  polytrade-sync                                                     │
//! │       │  save/load ledger snapshots                                 │
//! │       ▼                                                             │
//! │  ┌──────────────────────────────────────────────┐                   │
//! │  │  polytrade-db                                │                   │
//! │  │                                              │                   │
//! │  │  Database ──► KvRepository (raw get/set)     │                   │
//! │  │           └─► LedgerRepository (JSON blobs)  │                   │
//! │  │                     │                        │                   │
//! │  │                     ▼                        │                   │
//! │  │          SQLite (WAL), table local_store     │                   │
//! │  └──────────────────────────────────────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deals and inventory survive restarts here; the remote spreadsheet is
//! advisory for those collections. Reference tables are NOT stored locally,
//! they live in memory and are re-fetched from the remote store.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::kv::KvRepository;
pub use repository::ledger::{LedgerRepository, KEY_DEALS, KEY_INVENTORY, KEY_TEST_REPORT};
