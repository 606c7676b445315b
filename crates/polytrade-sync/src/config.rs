//! # Sync Configuration
//!
//! Configuration surface for the sync engine, loaded from a TOML file with
//! serde defaults. Validation runs before any initialization: identifiers
//! that are empty or still carry the `your-` template placeholder fail fast
//! so the engine never issues requests against a half-configured remote.
//!
//! ## Example
//! ```toml
//! spreadsheet_id = "1AbC..."
//! api_base_url   = "https://sheets.example.com/v4/spreadsheets"
//! refresh_interval_ms = 300000
//! messaging_mode = "simulate"
//!
//! [ranges]
//! products         = "Products!A2:D"
//! purchase_parties = "PurchaseParties!A:E"
//! sale_parties     = "SaleParties!A:E"
//! deals            = "Deals!A:L"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Constants
// =============================================================================

/// Default reference refresh interval: 5 minutes.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Pending-queue drain interval. Fixed, not configurable: retries are
/// rate-limited by this outer tick rather than per-entry backoff.
pub const DRAIN_INTERVAL: Duration = Duration::from_secs(30);

/// Low-stock inventory sweep interval: 30 minutes.
pub const ALERT_INTERVAL: Duration = Duration::from_secs(30 * 60);

// =============================================================================
// Messaging Mode
// =============================================================================

/// Whether outbound messages really leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingMode {
    /// Log the message instead of delivering it (default).
    Simulate,
    /// Hand the message to the configured channel.
    Live,
}

impl Default for MessagingMode {
    fn default() -> Self {
        MessagingMode::Simulate
    }
}

// =============================================================================
// Range Identifiers
// =============================================================================

/// Range identifiers for the four remote tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ranges {
    pub products: String,
    pub purchase_parties: String,
    pub sale_parties: String,
    pub deals: String,
}

// =============================================================================
// App Config
// =============================================================================

/// Top-level sync engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote store (spreadsheet) identifier.
    pub spreadsheet_id: String,

    /// Base URL of the tabular store API.
    pub api_base_url: String,

    /// Range identifiers for the reference tables and the deal sheet.
    pub ranges: Ranges,

    /// How often the reference cache refreshes, in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Whether messaging is simulated or live.
    #[serde(default)]
    pub messaging_mode: MessagingMode,

    /// Recipient identifier for the accounts team.
    #[serde(default)]
    pub accounts_recipient: String,

    /// Recipient identifier for the logistics team.
    #[serde(default)]
    pub logistics_recipient: String,

    /// Extra diagnostic logging.
    #[serde(default)]
    pub debug: bool,
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

impl AppConfig {
    /// Loads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SyncError::InvalidConfig(format!(
                "cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let config: AppConfig = toml::from_str(&raw)
            .map_err(|e| SyncError::InvalidConfig(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty or template-placeholder identifiers.
    ///
    /// Must pass before any initialization proceeds.
    pub fn validate(&self) -> SyncResult<()> {
        check_identifier("spreadsheet_id", &self.spreadsheet_id)?;
        check_identifier("api_base_url", &self.api_base_url)?;
        check_identifier("ranges.products", &self.ranges.products)?;
        check_identifier("ranges.purchase_parties", &self.ranges.purchase_parties)?;
        check_identifier("ranges.sale_parties", &self.ranges.sale_parties)?;
        check_identifier("ranges.deals", &self.ranges.deals)?;

        if self.refresh_interval_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The refresh interval as a Duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

fn check_identifier(name: &str, value: &str) -> SyncResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SyncError::InvalidConfig(format!("{name} is empty")));
    }
    if trimmed.contains("your-") {
        return Err(SyncError::InvalidConfig(format!(
            "{name} still carries the template placeholder '{trimmed}'"
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
