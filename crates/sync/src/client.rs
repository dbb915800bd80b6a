//! Shared handle to the remote services.

use std::sync::Arc;

use folio_core::Entity;
use thiserror::Error;
use tracing::info;

use crate::auth::{AuthService, MemoryAuthService, PgAuthService};
use crate::blob::{BlobStore, FsBlobStore, MemoryBlobStore};
use crate::config::SyncConfig;
use crate::db;
use crate::error::StoreError;
use crate::notify::Notifier;
use crate::realtime::SubscriptionManager;
use crate::store::{ChangeFeed, ContentStore, MemoryStore, PgChangeFeed, PgStore, Table};

/// Error connecting to the remote services.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The service implementations a [`SiteClient`] talks to.
pub struct Backend {
    pub store: Arc<dyn ContentStore>,
    pub changes: Arc<dyn ChangeFeed>,
    pub blobs: Arc<dyn BlobStore>,
    pub auth: Arc<dyn AuthService>,
    pub notifier: Arc<dyn Notifier>,
}

/// In-process services, kept as concrete types for inspection.
#[derive(Clone, Default)]
pub struct InMemory {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub auth: Arc<MemoryAuthService>,
}

impl InMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend sharing these services.
    #[must_use]
    pub fn backend(&self, notifier: Arc<dyn Notifier>) -> Backend {
        Backend {
            store: self.store.clone(),
            changes: self.store.clone(),
            blobs: self.blobs.clone(),
            auth: self.auth.clone(),
            notifier,
        }
    }
}

/// Handle shared by every binding.
///
/// This struct is cheaply cloneable via `Arc`. All clones share one
/// [`SubscriptionManager`], so upstream change subscriptions are shared
/// across every view built from the same client.
#[derive(Clone)]
pub struct SiteClient {
    inner: Arc<SiteClientInner>,
}

struct SiteClientInner {
    store: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    auth: Arc<dyn AuthService>,
    notifier: Arc<dyn Notifier>,
    subscriptions: SubscriptionManager,
}

impl SiteClient {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            inner: Arc::new(SiteClientInner {
                store: backend.store,
                blobs: backend.blobs,
                auth: backend.auth,
                notifier: backend.notifier,
                subscriptions: SubscriptionManager::new(backend.changes),
            }),
        }
    }

    /// Connect to `PostgreSQL` and the filesystem buckets described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError` if the pool or the change listener cannot connect.
    pub async fn connect(config: &SyncConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ConnectError> {
        info!("Connecting to content store...");
        let pool = db::create_pool(&config.database_url, config.max_connections).await?;
        let changes = PgChangeFeed::listen(&pool).await?;
        let blobs = FsBlobStore::new(&config.media_root, config.public_base_url.clone());

        Ok(Self::new(Backend {
            store: Arc::new(PgStore::new(pool.clone())),
            changes: Arc::new(changes),
            blobs: Arc::new(blobs),
            auth: Arc::new(PgAuthService::new(pool)),
            notifier,
        }))
    }

    /// Structured-data service.
    #[must_use]
    pub fn store(&self) -> &dyn ContentStore {
        self.inner.store.as_ref()
    }

    /// Typed access to the collection backing `E`.
    #[must_use]
    pub fn table<E: Entity>(&self) -> Table<'_, E> {
        Table::new(self.inner.store.as_ref())
    }

    /// Bucket storage.
    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.inner.blobs.as_ref()
    }

    /// Authentication service.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.inner.auth
    }

    /// Notification sink.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    /// Change subscriptions shared by every view of this client.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.inner.subscriptions
    }
}
