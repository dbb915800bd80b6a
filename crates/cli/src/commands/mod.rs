//! Command implementations.

pub mod admin;
pub mod content;
pub mod migrate;
pub mod session;
pub mod watch;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use folio_sync::auth::AuthError;
use folio_sync::bindings::Outcome;
use folio_sync::bindings::admin::{AdminView, Mounted, mount_admin};
use folio_sync::client::ConnectError;
use folio_sync::config::{ConfigError, SyncConfig};
use folio_sync::live::LiveView;
use folio_sync::notify::{Notice, NoticeLevel, Notifier};
use folio_sync::session::{AdminPage, SessionGuard};
use folio_sync::{SiteClient, StoreError};
use secrecy::SecretString;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No stored session, or it has expired.
    #[error("Not signed in. Run `folio login` first.")]
    NotSignedIn,

    /// The action ran and reported its own failure.
    #[error("{0} did not complete")]
    ActionFailed(&'static str),

    #[error("unexpected view mounted for {0:?}")]
    UnexpectedView(AdminPage),

    /// A live view's refresh task ended.
    #[error("{0} view stopped refreshing")]
    ViewStopped(&'static str),
}

/// Prints notifications to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        #[allow(clippy::print_stdout, clippy::print_stderr)]
        {
            match notice.level {
                NoticeLevel::Success => println!("✓ {}", notice.message),
                NoticeLevel::Error => eprintln!("✗ {}", notice.message),
            }
        }
    }
}

/// Connect with the terminal as the notification sink.
pub async fn connect(config: &SyncConfig) -> Result<SiteClient, CliError> {
    Ok(SiteClient::connect(config, Arc::new(ConsoleNotifier)).await?)
}

/// Connect, restore the stored session and resolve the session guard.
pub async fn restore(config: &SyncConfig) -> Result<(SiteClient, SessionGuard), CliError> {
    let client = connect(config).await?;
    if let Some(token) = session::read_token(config).await? {
        client.auth().restore(&token).await?;
    }
    let mut guard = SessionGuard::new(&client);
    guard.mount().await;
    Ok((client, guard))
}

/// Open an admin page as the stored session.
pub async fn open_page(config: &SyncConfig, page: AdminPage) -> Result<LiveView<AdminView>, CliError> {
    let (client, guard) = restore(config).await?;
    match mount_admin(&client, &guard, page).await? {
        Mounted::Page(view) => Ok(view),
        Mounted::Loading | Mounted::Redirect(_) => Err(CliError::NotSignedIn),
    }
}

/// Map an action outcome to the command result. Declining is not an error.
pub fn finish(outcome: Outcome, action: &'static str) -> Result<(), CliError> {
    match outcome {
        Outcome::Applied | Outcome::Declined => Ok(()),
        Outcome::Rejected | Outcome::Failed => Err(CliError::ActionFailed(action)),
    }
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` declines.
pub fn confirm(prompt: &str) -> bool {
    #[allow(clippy::print_stdout)]
    {
        print!("{prompt} [y/N] ");
    }
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Read a secret from the terminal without echoing it.
pub fn prompt_secret(prompt: &str) -> Result<SecretString, CliError> {
    let secret = rpassword::prompt_password(format!("{prompt}: "))?;
    Ok(SecretString::from(secret))
}
