//! Folio CLI - Migrations, admin accounts and content management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! folio migrate
//!
//! # Bootstrap the first admin account
//! folio admin create -e owner@example.com
//!
//! # Sign in; the session token is kept in FOLIO_SESSION_FILE
//! folio login -e owner@example.com
//!
//! # Work with content as the signed-in admin
//! folio overview
//! folio messages list --filter unread
//! folio settings set artist_name "Winxel ( Yna )*"
//! folio hero upload ./cover.png --title "Summer"
//!
//! # Follow the public site as content changes
//! folio watch
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create an admin account without signing in
//! - `login` / `logout` / `whoami` - Manage the CLI session
//! - `overview`, `messages`, `settings`, `hero`, `news` - Admin pages
//! - `watch` - Bind the public views and log every refresh

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_core::{HeroImageId, NewsPostId, SettingKey, SubmissionId};
use folio_sync::bindings::admin::ReadFilter;
use folio_sync::config::SyncConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Folio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Sign in and keep the session for later commands
    Login {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
    /// End the stored session
    Logout,
    /// Show the signed-in admin
    Whoami,
    /// Show dashboard counts
    Overview,
    /// Manage contact messages
    Messages {
        #[command(subcommand)]
        action: MessagesAction,
    },
    /// Show or change site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage hero carousel images
    Hero {
        #[command(subcommand)]
        action: HeroAction,
    },
    /// Manage news posts
    News {
        #[command(subcommand)]
        action: NewsAction,
    },
    /// Follow the public site and log every refresh
    Watch,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin account directly in the database
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum MessagesAction {
    /// List messages, newest first
    List {
        /// all, unread or read
        #[arg(short, long, default_value = "all")]
        filter: ReadFilter,
    },
    /// Mark a message read or unread
    Toggle { id: SubmissionId },
    /// Delete a message
    Delete {
        id: SubmissionId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print every setting
    Show,
    /// Change one setting and save all of them
    Set { key: SettingKey, value: String },
}

#[derive(Subcommand)]
enum HeroAction {
    /// List hero images
    List,
    /// Upload an image and add it to the carousel
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subtitle: Option<String>,
    },
    /// Show or hide an image
    Toggle { id: HeroImageId },
    /// Delete an image and its file
    Delete {
        id: HeroImageId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum NewsAction {
    /// List posts, newest first
    List,
    /// Publish or unpublish a post
    Toggle { id: NewsPostId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SyncConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "folio_sync=info,folio_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(&config).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email } => commands::admin::create(&config, &email).await?,
        },
        Commands::Login { email } => commands::session::login(&config, &email).await?,
        Commands::Logout => commands::session::logout(&config).await?,
        Commands::Whoami => commands::session::whoami(&config).await?,
        Commands::Overview => commands::content::overview(&config).await?,
        Commands::Messages { action } => match action {
            MessagesAction::List { filter } => commands::content::list_messages(&config, filter).await?,
            MessagesAction::Toggle { id } => commands::content::toggle_message(&config, id).await?,
            MessagesAction::Delete { id, yes } => {
                commands::content::delete_message(&config, id, yes).await?;
            }
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::content::show_settings(&config).await?,
            SettingsAction::Set { key, value } => {
                commands::content::set_setting(&config, key, value).await?;
            }
        },
        Commands::Hero { action } => match action {
            HeroAction::List => commands::content::list_hero(&config).await?,
            HeroAction::Upload { path, title, subtitle } => {
                commands::content::upload_hero(&config, &path, title, subtitle).await?;
            }
            HeroAction::Toggle { id } => commands::content::toggle_hero(&config, id).await?,
            HeroAction::Delete { id, yes } => commands::content::delete_hero(&config, id, yes).await?,
        },
        Commands::News { action } => match action {
            NewsAction::List => commands::content::list_news(&config).await?,
            NewsAction::Toggle { id } => commands::content::toggle_news(&config, id).await?,
        },
        Commands::Watch => commands::watch::run(&config).await?,
    }
    Ok(())
}
