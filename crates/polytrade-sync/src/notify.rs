//! # Notification Hook
//!
//! Fire-and-forget notifications toward whatever UI is attached. The engine
//! calls [`Notifier::notify`] and moves on; a notifier must never block or
//! fail. Capability injection at construction time replaces any runtime
//! "is a hook installed?" checks.

use tracing::{error, info, warn};

/// How urgent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Outbound notification capability.
///
/// Implementations must be cheap and infallible; the engine emits exactly
/// one notification per user-visible event and never checks the outcome.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Default notifier: routes notifications into the log stream.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(?severity, "{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}
