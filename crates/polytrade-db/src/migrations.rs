//! # Schema Migrations
//!
//! The local store is a single key/value table; the schema is applied as an
//! idempotent statement at connect time rather than through versioned
//! migration files. Adding a second table later means adding a statement
//! here and bumping nothing.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// The key/value table backing the local persistent store.
///
/// Values are JSON blobs; `updated_at` is bookkeeping for debugging, the
/// application never reads it.
const LOCAL_STORE_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS local_store (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Applies the schema. Idempotent, safe to run on every connect.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(LOCAL_STORE_SCHEMA).execute(pool).await?;
    debug!("local_store schema ensured");
    Ok(())
}
