//! # polytrade-core
//!
//! Pure business logic for the Polytrade polymer trading ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Dependency Graph                             │
//! │                                                                     │
//! │            ┌──────────────┐      ┌────────────────┐                 │
//! │            │ polytrade-db │      │ polytrade-sync │                 │
//! │            └──────┬───────┘      └───────┬────────┘                 │
//! │                   │                      │                          │
//! │                   └──────────┬───────────┘                          │
//! │                              ▼                                      │
//! │                     ┌────────────────┐                              │
//! │                     │ polytrade-core │  ◄── this crate              │
//! │                     │   (no I/O)     │                              │
//! │                     └────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Golden Rule: NO I/O
//! Everything in this crate is a deterministic function over its inputs:
//! deal classification and submission, inventory mutation, profit math,
//! validation, and message rendering. Persistence, HTTP, timers and
//! messaging channels live in the sibling crates.
//!
//! ## Module Overview
//! - [`types`]      - Domain types (Product, Party, InventoryLot, Deal, ...)
//! - [`ledger`]     - The per-submission decision procedure over LedgerState
//! - [`validation`] - Boundary validators feeding ValidationError
//! - [`messages`]   - Outbound message template rendering
//! - [`error`]      - CoreError / ValidationError / CoreResult

pub mod error;
pub mod ledger;
pub mod messages;
pub mod types;
pub mod validation;

// Re-export the types used at every call site.
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{classify, submit, Classification, LedgerState, Submission};
pub use types::{
    format_date_ddmmyyyy, Deal, DealForm, InventoryLot, Party, PartyKind, PendingUpdate, Product,
    SaleSource, UpdateKind,
};
