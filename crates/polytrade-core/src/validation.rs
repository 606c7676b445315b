//! # Input Validation
//!
//! Field validators shared by the ledger submission path and the reference
//! cache add paths.
//!
//! ## Validation Philosophy
//! Validate at the boundary, once. Everything behind these functions assumes
//! clean input: the ledger never re-checks that a sale party is non-empty,
//! and the cache never re-checks that a product code fits.
//!
//! All validators return `Result<T, ValidationError>` so callers compose them
//! with `?`.

use crate::error::ValidationError;

// =============================================================================
// Limits
// =============================================================================

/// Maximum length for free-text identifiers (product codes, party names).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length for comment fields.
pub const MAX_COMMENT_LEN: usize = 500;

// =============================================================================
// Text Validators
// =============================================================================

/// Requires a non-empty, trimmed text value.
///
/// Returns the trimmed string on success.
pub fn require_text(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    let trimmed = value.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates an optional comment field. Absent is fine; present must fit.
pub fn validate_comment(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_COMMENT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_COMMENT_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Requires a present, strictly positive number.
pub fn require_positive(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    match value {
        None => Err(ValidationError::required(field)),
        Some(v) if !v.is_finite() => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "not a finite number".to_string(),
        }),
        Some(v) if v <= 0.0 => Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("saleParty", Some("  Acme ")).unwrap(), "Acme");
    }

    #[test]
    fn test_require_text_rejects_blank() {
        assert!(require_text("saleParty", Some("   ")).is_err());
        assert!(require_text("saleParty", None).is_err());
    }

    #[test]
    fn test_require_text_rejects_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = require_text("product", Some(&long)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { .. }));
    }

    #[test]
    fn test_require_positive() {
        assert_eq!(require_positive("quantitySold", Some(10.5)).unwrap(), 10.5);
        assert!(require_positive("quantitySold", Some(0.0)).is_err());
        assert!(require_positive("quantitySold", Some(-3.0)).is_err());
        assert!(require_positive("quantitySold", None).is_err());
        assert!(require_positive("quantitySold", Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_comment_limit() {
        assert!(validate_comment("saleComments", "fine").is_ok());
        let long = "y".repeat(MAX_COMMENT_LEN + 1);
        assert!(validate_comment("saleComments", &long).is_err());
    }
}
