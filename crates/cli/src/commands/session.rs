//! CLI session commands.
//!
//! The bearer token of the signed-in admin is kept in `FOLIO_SESSION_FILE`
//! and restored by every command that needs a session.

use std::io;

use folio_sync::config::SyncConfig;
use folio_sync::session::{SessionGuard, SessionState};
use secrecy::{ExposeSecret, SecretString};

use super::{CliError, connect, prompt_secret, restore};

/// Stored session token, if any.
pub async fn read_token(config: &SyncConfig) -> Result<Option<SecretString>, CliError> {
    match tokio::fs::read_to_string(&config.session_file).await {
        Ok(token) => {
            let token = token.trim();
            Ok((!token.is_empty()).then(|| SecretString::from(token.to_owned())))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_token(config: &SyncConfig, token: &SecretString) -> Result<(), CliError> {
    tokio::fs::write(&config.session_file, token.expose_secret()).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&config.session_file, std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    Ok(())
}

async fn forget_token(config: &SyncConfig) -> Result<(), CliError> {
    match tokio::fs::remove_file(&config.session_file).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Sign in and store the session token.
pub async fn login(config: &SyncConfig, email: &str) -> Result<(), CliError> {
    let password = prompt_secret("Password")?;
    let client = connect(config).await?;
    let mut guard = SessionGuard::new(&client);
    guard.mount().await;

    if guard.login(email, password.expose_secret()).await.is_none() {
        return Err(CliError::ActionFailed("Sign-in"));
    }
    let session = client
        .auth()
        .current_session()
        .await?
        .ok_or(CliError::NotSignedIn)?;
    write_token(config, &session.token).await?;

    tracing::info!(user = %session.user.email, expires_at = %session.expires_at, "Session stored");
    Ok(())
}

/// Sign out and forget the stored token.
pub async fn logout(config: &SyncConfig) -> Result<(), CliError> {
    let (_client, guard) = restore(config).await?;
    let outcome = match guard.state() {
        SessionState::Authenticated(_) => guard.logout().await.map(|_| ()),
        _ => Some(()),
    };
    forget_token(config).await?;
    outcome.ok_or(CliError::ActionFailed("Sign-out"))
}

/// Print the signed-in admin.
pub async fn whoami(config: &SyncConfig) -> Result<(), CliError> {
    let (_client, guard) = restore(config).await?;
    #[allow(clippy::print_stdout)]
    {
        match guard.resolved().await {
            SessionState::Authenticated(user) => println!("{} ({})", user.email, user.id),
            _ => println!("Not signed in"),
        }
    }
    Ok(())
}
