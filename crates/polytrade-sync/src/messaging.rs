//! # Outbound Messaging
//!
//! Delivery side of the message templates rendered in polytrade-core. The
//! channel is an injected capability; in simulation mode (the default)
//! messages are logged instead of delivered, so the whole submission flow
//! works without any messaging credentials.
//!
//! Delivery is fire-and-forget: a send failure is logged and swallowed,
//! never propagated to the submission path.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::MessagingMode;
use crate::error::SyncResult;

/// Send-text capability toward one recipient.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send_text(&self, recipient: &str, body: &str) -> SyncResult<()>;
}

/// Channel that logs messages instead of delivering them.
#[derive(Debug, Default)]
pub struct SimulationChannel;

#[async_trait]
impl MessageChannel for SimulationChannel {
    async fn send_text(&self, recipient: &str, body: &str) -> SyncResult<()> {
        info!(recipient, chars = body.len(), "Simulated message send");
        info!("{body}");
        Ok(())
    }
}

/// Picks the channel implementation for the configured mode.
///
/// Live mode expects a real channel from the caller; without one the engine
/// falls back to simulation with a warning rather than failing startup.
pub fn select_channel(
    mode: MessagingMode,
    live: Option<Box<dyn MessageChannel>>,
) -> Box<dyn MessageChannel> {
    match (mode, live) {
        (MessagingMode::Live, Some(channel)) => channel,
        (MessagingMode::Live, None) => {
            warn!("Live messaging configured but no channel supplied, simulating");
            Box::new(SimulationChannel)
        }
        (MessagingMode::Simulate, _) => Box::new(SimulationChannel),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records sends; optionally fails every delivery.
    #[derive(Debug, Default)]
    pub struct RecordingChannel {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl MessageChannel for RecordingChannel {
        async fn send_text(&self, recipient: &str, body: &str) -> SyncResult<()> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(crate::error::SyncError::Api {
                    status: 500,
                    body: "channel down".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), body.to_string()));
            Ok(())
        }
    }
}
