//! # Error Types
//!
//! Domain-specific error types for polytrade-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  polytrade-core errors (this file)                                  │
//! │  ├── CoreError        - Ledger / business rule failures             │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  polytrade-db errors (separate crate)                               │
//! │  └── DbError          - Local store failures                        │
//! │                                                                     │
//! │  polytrade-sync errors (separate crate)                             │
//! │  └── SyncError        - Auth / remote API / config failures         │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → caller notification            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, quantities, field names)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger business logic errors.
///
/// These errors represent business rule violations. They are surfaced to the
/// caller before any state mutation takes place; a failed submission leaves
/// both the deal history and the inventory untouched.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The selected inventory lot does not hold enough stock for the sale.
    ///
    /// ## When This Occurs
    /// - Selling from inventory with `quantity_sold` above the lot quantity
    ///
    /// The check happens before any decrement, so the lot is left exactly
    /// as it was.
    #[error("Insufficient inventory for {product}: available {available} kg, requested {requested} kg")]
    InsufficientInventory {
        product: String,
        available: f64,
        requested: f64,
    },

    /// The caller referenced an inventory lot index that does not exist.
    #[error("No inventory lot at index {0}")]
    LotNotFound(usize),

    /// A sale was submitted without any purchase backing.
    ///
    /// Business rule: every sale must be covered either by an inventory
    /// draw-down or by fresh purchase data. A bare sale is rejected.
    #[error("Sale has no purchase backing: select an inventory lot or provide purchase details")]
    SaleWithoutPurchase,

    /// The form carries neither a sale side nor a purchase side.
    #[error("Submission needs either sale or purchase details")]
    InsufficientData,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a submitted form doesn't meet requirements.
/// Used for early validation before the ledger mutates anything.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error for the given field name.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
