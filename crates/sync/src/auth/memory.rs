//! In-process authentication service.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{AdminUserId, Email};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;

use super::{
    AuthError, AuthEvent, AuthService, SESSION_TTL, Session, SessionSlot, SessionUser,
    generate_token, hash_password, normalize_email, token_digest, validate_password,
    verify_password,
};

#[derive(Debug)]
struct Account {
    id: AdminUserId,
    password_hash: String,
}

#[derive(Debug)]
struct IssuedSession {
    user: SessionUser,
    expires_at: DateTime<Utc>,
}

/// Admin accounts and sessions held in memory.
#[derive(Debug)]
pub struct MemoryAuthService {
    accounts: RwLock<HashMap<Email, Account>>,
    sessions: RwLock<HashMap<String, IssuedSession>>,
    slot: SessionSlot,
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> AuthError {
    AuthError::Unavailable("auth state lock poisoned".to_owned())
}

impl MemoryAuthService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            slot: SessionSlot::new(),
        }
    }

    /// Create an account without a signed-in session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    pub fn create_admin(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = normalize_email(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.contains_key(&email) {
            return Err(AuthError::UserAlreadyExists);
        }
        let id = AdminUserId::random();
        accounts.insert(email.clone(), Account { id, password_hash });
        Ok(SessionUser { id, email })
    }

    /// End every issued session on the service side, as a remote expiry
    /// would, and announce it.
    pub fn revoke_all(&self) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.clear();
        }
        self.slot.clear();
    }

    fn issue(&self, user: SessionUser) -> Result<Session, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + SESSION_TTL;
        self.sessions.write().map_err(|_| poisoned())?.insert(
            token_digest(&token),
            IssuedSession {
                user: user.clone(),
                expires_at,
            },
        );
        Ok(Session {
            token,
            user,
            expires_at,
        })
    }

    fn lookup(&self, token: &SecretString) -> Result<Option<Session>, AuthError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions
            .get(&token_digest(token))
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| Session {
                token: SecretString::from(token.expose_secret().to_owned()),
                user: s.user.clone(),
                expires_at: s.expires_at,
            }))
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let (id, password_hash) = {
            let accounts = self.accounts.read().map_err(|_| poisoned())?;
            let account = accounts.get(&email).ok_or(AuthError::InvalidCredentials)?;
            (account.id, account.password_hash.clone())
        };
        verify_password(password, &password_hash)?;

        let session = self.issue(SessionUser { id, email })?;
        self.slot.set(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        if self.current_session().await?.is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        self.create_admin(email, password)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.slot.get() {
            self.sessions
                .write()
                .map_err(|_| poisoned())?
                .remove(&token_digest(&session.token));
        }
        self.slot.clear();
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(current) = self.slot.get() else {
            return Ok(None);
        };
        let valid = self.lookup(&current.token)?;
        if valid.is_none() {
            self.slot.clear();
        }
        Ok(valid)
    }

    async fn restore(&self, token: &SecretString) -> Result<Option<Session>, AuthError> {
        let session = self.lookup(token)?;
        if let Some(session) = &session {
            self.slot.set(session.clone());
        }
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.slot.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let auth = MemoryAuthService::new();
        auth.create_admin("yna@winxel.art", "secret1").unwrap();

        let session = auth.sign_in("YNA@winxel.art", "secret1").await.unwrap();
        assert_eq!(session.user.email.as_str(), "yna@winxel.art");
        assert!(auth.current_session().await.unwrap().is_some());

        auth.sign_out().await.unwrap();
        assert!(auth.current_session().await.unwrap().is_none());
        assert!(auth.restore(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let auth = MemoryAuthService::new();
        auth.create_admin("yna@winxel.art", "secret1").unwrap();
        let err = auth.sign_in("yna@winxel.art", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        let err = auth.sign_in("ghost@winxel.art", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_sign_up_requires_session() {
        let auth = MemoryAuthService::new();
        let err = auth.sign_up("new@winxel.art", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));

        auth.create_admin("yna@winxel.art", "secret1").unwrap();
        let session = auth.sign_in("yna@winxel.art", "secret1").await.unwrap();
        auth.sign_up("new@winxel.art", "secret2").await.unwrap();

        let current = auth.current_session().await.unwrap().unwrap();
        assert_eq!(current.user, session.user);
        assert!(matches!(
            auth.sign_up("new@winxel.art", "secret2").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_revoke_announces_sign_out() {
        let auth = MemoryAuthService::new();
        auth.create_admin("yna@winxel.art", "secret1").unwrap();
        let mut events = auth.subscribe();
        auth.sign_in("yna@winxel.art", "secret1").await.unwrap();
        auth.revoke_all();

        assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn(_)));
        assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedOut));
        assert!(auth.current_session().await.unwrap().is_none());
    }
}
