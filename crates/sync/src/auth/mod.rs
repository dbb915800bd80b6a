//! Authentication service.
//!
//! Dashboard accounts sign in with email and password. A signed-in client
//! holds one [`Session`]; every change to it is announced on the service's
//! [`AuthEvent`] channel, which the session guard follows.
//!
//! # Adapters
//!
//! - [`PgAuthService`] - accounts and sessions in `PostgreSQL`
//! - [`MemoryAuthService`] - in-process accounts for tests and demos

mod error;
mod memory;
mod postgres;

pub use error::AuthError;
pub use memory::MemoryAuthService;
pub use postgres::PgAuthService;

use std::sync::RwLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use folio_core::{AdminUserId, Email};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::info;

/// Minimum password length for new admin accounts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// How long a session stays valid after sign-in.
pub const SESSION_TTL: Duration = Duration::days(7);

/// The account behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: AdminUserId,
    pub email: Email,
}

/// A signed-in admin session.
#[derive(Debug)]
pub struct Session {
    pub token: SecretString,
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            token: SecretString::from(self.token.expose_secret().to_owned()),
            user: self.user.clone(),
            expires_at: self.expires_at,
        }
    }
}

impl Session {
    /// Whether the session has passed its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Session change pushed by the auth service.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Remote authentication service.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in and make the new session current.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create another admin account. Requires a current session; the
    /// current session is unchanged.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The current session, if it is still valid.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Resume a session from a previously issued token.
    async fn restore(&self, token: &SecretString) -> Result<Option<Session>, AuthError>;

    /// Receiver for every future session change.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Client-side holder of the current session.
#[derive(Debug)]
pub(crate) struct SessionSlot {
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionSlot {
    pub(crate) fn new() -> Self {
        Self {
            current: RwLock::new(None),
            events: broadcast::channel(16).0,
        }
    }

    pub(crate) fn get(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    pub(crate) fn set(&self, session: Session) {
        if let Ok(mut current) = self.current.write() {
            *current = Some(session.clone());
        }
        info!(user = %session.user.email, "Admin signed in");
        let _ = self.events.send(AuthEvent::SignedIn(session));
    }

    pub(crate) fn clear(&self) {
        let previous = self.current.write().ok().and_then(|mut s| s.take());
        if let Some(session) = previous {
            info!(user = %session.user.email, "Admin signed out");
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with a user-facing message.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Parse and lower-case an account email.
pub(crate) fn normalize_email(email: &str) -> Result<Email, AuthError> {
    Ok(Email::parse(&email.to_lowercase())?)
}

/// Fresh random bearer token.
pub(crate) fn generate_token() -> SecretString {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    SecretString::from(URL_SAFE_NO_PAD.encode(bytes))
}

/// Digest stored in place of a bearer token.
pub(crate) fn token_digest(token: &SecretString) -> String {
    hex::encode(Sha256::digest(token.expose_secret().as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_minimum() {
        let err = validate_password("12345").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long");
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_tokens_are_unique_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a.expose_secret(), b.expose_secret());
        assert_eq!(a.expose_secret().len(), 43);
        assert_eq!(token_digest(&a).len(), 64);
        assert_ne!(token_digest(&a), a.expose_secret());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("Yna@Winxel.Art").unwrap().as_str(), "yna@winxel.art");
        assert!(normalize_email("nope").is_err());
    }

    #[test]
    fn test_slot_announces_changes_once() {
        let slot = SessionSlot::new();
        let mut events = slot.subscribe();
        slot.clear();
        assert!(events.try_recv().is_err());

        slot.set(Session {
            token: generate_token(),
            user: SessionUser {
                id: AdminUserId::random(),
                email: Email::parse("a@b.co").unwrap(),
            },
            expires_at: Utc::now() + SESSION_TTL,
        });
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedIn(_))));
        slot.clear();
        slot.clear();
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedOut)));
        assert!(events.try_recv().is_err());
    }
}
