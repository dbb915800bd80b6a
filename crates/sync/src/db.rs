//! `PostgreSQL` connection and schema.
//!
//! # Tables
//!
//! - `hero_images`, `portfolio_items`, `news_posts`, `contact_submissions`,
//!   `site_settings` - site content
//! - `admin_users`, `admin_sessions` - dashboard accounts
//!
//! Writes to the four watched content tables fire `pg_notify` on the
//! `folio_changes` channel (see [`crate::store::PgChangeFeed`]).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/sync/migrations/` and run via:
//! ```bash
//! cargo run -p folio-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    tracing::info!("Running folio migrations...");
    MIGRATOR.run(pool).await?;
    tracing::info!("Migrations complete");
    Ok(())
}
