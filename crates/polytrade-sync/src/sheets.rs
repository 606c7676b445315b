//! # Remote Tabular Store Client
//!
//! The engine's only view of the remote spreadsheet service: range-based
//! read plus row append, behind the [`TabularStore`] trait so tests swap in
//! an in-memory fake.
//!
//! ## Request Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  read_range("Products!A2:D")                                        │
//! │    GET {base}/{spreadsheet}/values/{range}                          │
//! │    → { "values": [["PP", "Raffia", "Reliance", "H030SG"], ...] }    │
//! │                                                                     │
//! │  append_row("Deals!A:L", row)                                       │
//! │    POST {base}/{spreadsheet}/values/{range}:append                  │
//! │    body { "values": [row] }                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request carries a bearer token from the [`TokenCache`]; a non-2xx
//! response becomes [`SyncError::Api`] with the status and body text, and
//! transport failures stay as retryable [`SyncError::Http`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::auth::TokenCache;
use crate::error::{SyncError, SyncResult};

/// Bound on every remote call. The original enforced none; a hung remote
/// call would stall its caller indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Tabular Store Trait
// =============================================================================

/// Range-based read/append access to a spreadsheet-like service.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Reads all rows in a range. Cells are strings; short rows are allowed.
    async fn read_range(&self, range: &str) -> SyncResult<Vec<Vec<String>>>;

    /// Appends one row after the last row of a range.
    async fn append_row(&self, range: &str, row: &[String]) -> SyncResult<()>;
}

// =============================================================================
// HTTP Client
// =============================================================================

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    values: [&'a [String]; 1],
}

/// HTTP implementation of [`TabularStore`].
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    tokens: Arc<TokenCache>,
}

impl SheetsClient {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        tokens: Arc<TokenCache>,
    ) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(SheetsClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/{}/values/{range}", self.base_url, self.spreadsheet_id)
    }

    /// Turns a non-2xx response into an Api error carrying status and body.
    async fn check_status(response: reqwest::Response) -> SyncResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn read_range(&self, range: &str) -> SyncResult<Vec<Vec<String>>> {
        let token = self.tokens.bearer_token().await?;

        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let parsed: ValuesResponse = response.json().await?;
        debug!(range, rows = parsed.values.len(), "range read");
        Ok(parsed.values)
    }

    async fn append_row(&self, range: &str, row: &[String]) -> SyncResult<()> {
        let token = self.tokens.bearer_token().await?;

        let url = format!("{}:append", self.values_url(range));
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&AppendRequest { values: [row] })
            .send()
            .await?;
        Self::check_status(response).await?;

        debug!(range, cols = row.len(), "row appended");
        Ok(())
    }
}
