//! `PostgreSQL` authentication service.
//!
//! Accounts live in `admin_users`; issued sessions in `admin_sessions`,
//! keyed by a SHA-256 digest of the bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{AdminUserId, Email};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    AuthError, AuthEvent, AuthService, SESSION_TTL, Session, SessionSlot, SessionUser,
    generate_token, hash_password, normalize_email, token_digest, validate_password,
    verify_password,
};

/// Authentication backed by the site database.
#[derive(Debug)]
pub struct PgAuthService {
    pool: PgPool,
    slot: SessionSlot,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            slot: SessionSlot::new(),
        }
    }

    /// Create an account without a signed-in session. Used to bootstrap
    /// the first admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = normalize_email(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO admin_users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(email.as_str())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return AuthError::UserAlreadyExists;
            }
            AuthError::Database(e)
        })?;

        info!(user = %email, "Created admin account");
        Ok(SessionUser {
            id: AdminUserId::from_uuid(id),
            email,
        })
    }

    async fn lookup(&self, token: &SecretString) -> Result<Option<Session>, AuthError> {
        let row: Option<(Uuid, String, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT u.id, u.email, s.expires_at
            FROM admin_sessions s
            JOIN admin_users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            ",
        )
        .bind(token_digest(token))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, expires_at)| {
            let email = Email::parse(&email).map_err(|e| {
                AuthError::Unavailable(format!("invalid email in database: {e}"))
            })?;
            Ok(Session {
                token: SecretString::from(token.expose_secret().to_owned()),
                user: SessionUser {
                    id: AdminUserId::from_uuid(id),
                    email,
                },
                expires_at,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (id, password_hash): (Uuid, String) = sqlx::query_as(
            r"
            SELECT id, password_hash
            FROM admin_users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = generate_token();
        let expires_at = Utc::now() + SESSION_TTL;
        sqlx::query(
            r"
            INSERT INTO admin_sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token_digest(&token))
        .bind(id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let session = Session {
            token,
            user: SessionUser {
                id: AdminUserId::from_uuid(id),
                email,
            },
            expires_at,
        };
        self.slot.set(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        if self.current_session().await?.is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        self.create_admin(email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(session) = self.slot.get() {
            sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
                .bind(token_digest(&session.token))
                .execute(&self.pool)
                .await?;
        }
        self.slot.clear();
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(current) = self.slot.get() else {
            return Ok(None);
        };
        let valid = self.lookup(&current.token).await?;
        if valid.is_none() {
            self.slot.clear();
        }
        Ok(valid)
    }

    async fn restore(&self, token: &SecretString) -> Result<Option<Session>, AuthError> {
        let session = self.lookup(token).await?;
        if let Some(session) = &session {
            self.slot.set(session.clone());
        }
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.slot.subscribe()
    }
}
