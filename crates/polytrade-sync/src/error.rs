//! # Sync Error Types
//!
//! Error types for the cache/sync engine.
//!
//! ## Severity Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  When the error happens          What the engine does               │
//! │  ─────────────────────────────── ─────────────────────────────────  │
//! │  Config validation               Fatal before initialization        │
//! │  Bulk reference load (init)      Fatal, no partial-success state    │
//! │  Reference add (steady state)    Queue a PendingUpdate, warn        │
//! │  Deal remote append              Warning only, deal already durable │
//! │  Scheduled refresh               Logged, retried next tick          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Sync engine errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration is missing or still carries placeholder values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Token acquisition or refresh failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The remote tabular store answered with a non-2xx status.
    #[error("Remote API error {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP transport failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote response did not parse as expected.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local store failure.
    #[error("Local store error: {0}")]
    Database(#[from] polytrade_db::DbError),

    /// Ledger business rule or validation failure.
    #[error(transparent)]
    Core(#[from] polytrade_core::CoreError),

    /// Internal channel closed (shutdown race).
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl SyncError {
    /// Whether a retry has any chance of succeeding.
    ///
    /// Transport failures and server-side errors are worth queueing;
    /// auth rejections, client errors and local failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Http(_) => true,
            SyncError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::Api {
            status: 503,
            body: "unavailable".to_string()
        }
        .is_retryable());
        assert!(SyncError::Api {
            status: 429,
            body: "slow down".to_string()
        }
        .is_retryable());
        assert!(!SyncError::Api {
            status: 403,
            body: "forbidden".to_string()
        }
        .is_retryable());
        assert!(!SyncError::Auth("bad key".to_string()).is_retryable());
        assert!(!SyncError::InvalidConfig("empty id".to_string()).is_retryable());
    }

    #[test]
    fn test_api_error_message() {
        let err = SyncError::Api {
            status: 404,
            body: "range not found".to_string(),
        };
        assert_eq!(err.to_string(), "Remote API error 404: range not found");
    }
}
