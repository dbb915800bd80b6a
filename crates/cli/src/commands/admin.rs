//! Admin account bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Create the first admin; prompts for the password
//! folio admin create -e owner@example.com
//! ```
//!
//! Further accounts are created from a signed-in session (the dashboard's
//! Users page); this command needs only database access.

use folio_sync::auth::PgAuthService;
use folio_sync::config::SyncConfig;
use folio_sync::db;
use secrecy::ExposeSecret;

use super::{CliError, prompt_secret};

/// Create an admin account directly in the database.
pub async fn create(config: &SyncConfig, email: &str) -> Result<(), CliError> {
    let password = prompt_secret("Password")?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;

    let user = PgAuthService::new(pool)
        .create_admin(email, password.expose_secret())
        .await?;

    tracing::info!("Admin account created successfully! ID: {}, Email: {}", user.id, user.email);
    Ok(())
}
