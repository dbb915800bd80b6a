//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! folio migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FOLIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/sync/migrations/` and are embedded in the
//! binary at build time.

use folio_sync::config::SyncConfig;
use folio_sync::db;

use super::CliError;

/// Run every pending migration.
pub async fn run(config: &SyncConfig) -> Result<(), CliError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
