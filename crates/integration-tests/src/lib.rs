//! Integration tests for Folio.
//!
//! Every scenario runs against the in-process services, so no database is
//! needed:
//!
//! ```bash
//! cargo test -p folio-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `public_site` - public views following content changes
//! - `admin_pages` - dashboard actions and their notifications
//! - `session_guard` - admin gating and session transitions
//! - `subscriptions` - shared change subscriptions and refresh coalescing

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use folio_core::Collection;
use folio_sync::auth::SessionUser;
use folio_sync::bindings::admin::{AdminView, Mounted, mount_admin};
use folio_sync::client::{Backend, InMemory};
use folio_sync::live::LiveView;
use folio_sync::notify::RecordingNotifier;
use folio_sync::session::{AdminPage, SessionGuard};
use folio_sync::store::{ContentStore, Filter, Query, Row};
use folio_sync::{SiteClient, StoreError};
use uuid::Uuid;

/// Credentials of the admin seeded by [`TestSite::with_admin`].
pub const ADMIN_EMAIL: &str = "studio@winxel.test";
pub const ADMIN_PASSWORD: &str = "correct-horse";

/// How long to wait for a background refresh before failing.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

/// A client wired to in-process services, with every notification recorded.
pub struct TestSite {
    pub client: SiteClient,
    pub services: InMemory,
    pub notices: Arc<RecordingNotifier>,
    pub store: Arc<FaultyStore>,
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSite {
    #[must_use]
    pub fn new() -> Self {
        let services = InMemory::new();
        let notices = Arc::new(RecordingNotifier::new());
        let store = Arc::new(FaultyStore::new(services.store.clone()));

        let mut backend = services.backend(notices.clone());
        backend.store = store.clone();
        Self {
            client: SiteClient::new(backend),
            services,
            notices,
            store,
        }
    }

    /// A site with one admin account, not yet signed in.
    ///
    /// # Panics
    ///
    /// Panics if the account cannot be created.
    #[must_use]
    pub fn with_admin() -> (Self, SessionUser) {
        let site = Self::new();
        let admin = site
            .services
            .auth
            .create_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .expect("seed admin account");
        (site, admin)
    }

    /// Another client sharing this site's services, as a second browser
    /// would.
    #[must_use]
    pub fn second_client(&self) -> SiteClient {
        let mut backend: Backend = self.services.backend(self.notices.clone());
        backend.store = self.store.clone();
        SiteClient::new(backend)
    }
}

/// Content store wrapper that counts calls and fails on request.
///
/// Reads and writes pass through to the wrapped store until a failure is
/// armed.
pub struct FaultyStore {
    inner: Arc<dyn ContentStore>,
    queries: Mutex<HashMap<Collection, usize>>,
    upserts: AtomicUsize,
    fail_upsert_at: Mutex<Option<usize>>,
    fail_deletes: Mutex<Option<Collection>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn ContentStore>) -> Self {
        Self {
            inner,
            queries: Mutex::new(HashMap::new()),
            upserts: AtomicUsize::new(0),
            fail_upsert_at: Mutex::new(None),
            fail_deletes: Mutex::new(None),
        }
    }

    /// Fail the `n`th upsert from now (1-based) and every one after it.
    pub fn fail_upserts_from(&self, n: usize) {
        let done = self.upserts.load(Ordering::SeqCst);
        if let Ok(mut at) = self.fail_upsert_at.lock() {
            *at = Some(done + n);
        }
    }

    /// Fail every delete in `collection`.
    pub fn fail_deletes_in(&self, collection: Collection) {
        if let Ok(mut fail) = self.fail_deletes.lock() {
            *fail = Some(collection);
        }
    }

    /// Clear armed failures.
    pub fn heal(&self) {
        if let Ok(mut at) = self.fail_upsert_at.lock() {
            *at = None;
        }
        if let Ok(mut fail) = self.fail_deletes.lock() {
            *fail = None;
        }
    }

    /// Queries made against `collection` so far.
    #[must_use]
    pub fn query_count(&self, collection: Collection) -> usize {
        self.queries
            .lock()
            .map_or(0, |q| q.get(&collection).copied().unwrap_or(0))
    }

    /// Queries made against any collection so far.
    #[must_use]
    pub fn total_queries(&self) -> usize {
        self.queries.lock().map_or(0, |q| q.values().sum())
    }

    fn record_query(&self, collection: Collection) {
        if let Ok(mut queries) = self.queries.lock() {
            *queries.entry(collection).or_default() += 1;
        }
    }
}

fn injected(op: &str, collection: Collection) -> StoreError {
    StoreError::Unavailable(format!("injected {op} failure on {collection}"))
}

#[async_trait]
impl ContentStore for FaultyStore {
    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.record_query(collection);
        self.inner.query(collection, query).await
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, StoreError> {
        self.record_query(collection);
        self.inner.count(collection, filters).await
    }

    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError> {
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: Collection, id: Uuid, patch: Row) -> Result<(), StoreError> {
        self.inner.update(collection, id, patch).await
    }

    async fn upsert(&self, collection: Collection, record: Row) -> Result<(), StoreError> {
        let n = self.upserts.fetch_add(1, Ordering::SeqCst) + 1;
        let armed = self.fail_upsert_at.lock().ok().and_then(|at| *at);
        if armed.is_some_and(|at| n >= at) {
            return Err(injected("upsert", collection));
        }
        self.inner.upsert(collection, record).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let failing = self.fail_deletes.lock().ok().and_then(|f| *f);
        if failing == Some(collection) {
            return Err(injected("delete", collection));
        }
        self.inner.delete(collection, id).await
    }
}

/// Mount a session guard on `client` and sign in as the seeded admin.
pub async fn sign_in(client: &SiteClient) -> SessionGuard {
    let mut guard = SessionGuard::new(client);
    guard.mount().await;
    let _ = guard.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    guard
}

/// Open an admin page that is expected to render.
///
/// # Panics
///
/// Panics if the guard does not let the page render.
pub async fn open_page(client: &SiteClient, guard: &SessionGuard, page: AdminPage) -> LiveView<AdminView> {
    match mount_admin(client, guard, page).await {
        Ok(Mounted::Page(view)) => view,
        other => panic!("{page:?} did not render: {other:?}"),
    }
}

/// Poll `check` until it holds or [`SETTLE_TIMEOUT`] passes.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Give spawned relay and refresh tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
