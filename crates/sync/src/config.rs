//! Sync configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOLIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `FOLIO_MEDIA_ROOT` - Directory holding the storage buckets (default: ./media)
//! - `FOLIO_PUBLIC_BASE_URL` - URL the media root is served from
//!   (default: <http://localhost:3000/storage>)
//! - `FOLIO_SESSION_FILE` - Where the CLI keeps the admin session token
//!   (default: .folio-session)
//! - `FOLIO_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_MEDIA_ROOT: &str = "./media";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000/storage";
const DEFAULT_SESSION_FILE: &str = ".folio-session";
const DEFAULT_MAX_CONNECTIONS: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection settings for the content store, buckets and auth service.
pub struct SyncConfig {
    /// `PostgreSQL` connection string
    pub database_url: SecretString,
    /// Maximum pool connections
    pub max_connections: u32,
    /// Directory holding one subdirectory per bucket
    pub media_root: PathBuf,
    /// Public URL of `media_root`
    pub public_base_url: Url,
    /// CLI session token file
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("media_root", &self.media_root)
            .field("public_base_url", &self.public_base_url.as_str())
            .field("session_file", &self.session_file)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let database_url = env.database_url("FOLIO_DATABASE_URL")?;
        let max_connections = env
            .or_default("FOLIO_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "FOLIO_DB_MAX_CONNECTIONS".to_string(),
                    "expected a positive integer".to_string(),
                )
            })?;
        let public_base_url = Url::parse(&env.or_default("FOLIO_PUBLIC_BASE_URL", DEFAULT_PUBLIC_BASE_URL))
            .map_err(|e| {
                ConfigError::InvalidEnvVar("FOLIO_PUBLIC_BASE_URL".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            max_connections,
            media_root: PathBuf::from(env.or_default("FOLIO_MEDIA_ROOT", DEFAULT_MEDIA_ROOT)),
            public_base_url,
            session_file: PathBuf::from(env.or_default("FOLIO_SESSION_FILE", DEFAULT_SESSION_FILE)),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SyncConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SyncConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("FOLIO_DATABASE_URL", "postgres://localhost/folio")]).unwrap();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.media_root, PathBuf::from("./media"));
        assert_eq!(config.public_base_url.as_str(), "http://localhost:3000/storage");
        assert_eq!(config.session_file, PathBuf::from(".folio-session"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");

        let config = load(&[
            ("FOLIO_DATABASE_URL", "postgres://primary/db"),
            ("DATABASE_URL", "postgres://fallback/db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "FOLIO_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[
            ("DATABASE_URL", "postgres://x/db"),
            ("FOLIO_DB_MAX_CONNECTIONS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));

        let err = load(&[
            ("DATABASE_URL", "postgres://x/db"),
            ("FOLIO_PUBLIC_BASE_URL", "not a url"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[
            ("DATABASE_URL", "postgres://user:hunter2@db/folio"),
            ("SENTRY_DSN", "https://key@sentry.test/1"),
        ])
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("key@sentry"));
    }
}
