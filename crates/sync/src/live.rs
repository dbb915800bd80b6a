//! Bound views.
//!
//! A [`LiveView`] owns one binding, registers it with the subscription
//! manager for every collection it watches, and re-runs its `refresh()`
//! whenever one of them changes. Refreshes are single-flight: change
//! notifications that arrive while a refresh is running collapse into one
//! follow-up refresh.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, Notify, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::bindings::Binding;
use crate::client::SiteClient;
use crate::error::StoreError;
use crate::realtime::Subscription;

/// A binding kept in sync with the content store.
pub struct LiveView<B> {
    binding: Arc<Mutex<B>>,
    refreshes: watch::Receiver<u64>,
    _subscriptions: Vec<Subscription>,
    worker: JoinHandle<()>,
}

impl<B> std::fmt::Debug for LiveView<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveView")
            .field("refreshes", &*self.refreshes.borrow())
            .finish_non_exhaustive()
    }
}

impl<B: Binding + 'static> LiveView<B> {
    /// Register `binding` for its collections and load its first snapshot.
    ///
    /// Subscriptions are opened before the first fetch so a change landing
    /// in between still triggers a refresh.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a change subscription cannot be opened. A
    /// failed first fetch is logged and leaves the binding empty.
    pub async fn bind(client: &SiteClient, binding: B) -> Result<Self, StoreError> {
        let name = binding.name();
        let watches = binding.watches();
        let pending = Arc::new(Notify::new());

        let subscriptions = watches
            .iter()
            .map(|&collection| {
                let pending = Arc::clone(&pending);
                client
                    .subscriptions()
                    .register(collection, move |_| pending.notify_one())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let binding = Arc::new(Mutex::new(binding));
        let (counter, refreshes) = watch::channel(0_u64);
        refresh_once(&binding, &counter).await;

        let worker = tokio::spawn({
            let binding = Arc::clone(&binding);
            async move {
                loop {
                    pending.notified().await;
                    debug!(view = name, "Change received, refreshing");
                    refresh_once(&binding, &counter).await;
                }
            }
        });

        Ok(Self {
            binding,
            refreshes,
            _subscriptions: subscriptions,
            worker,
        })
    }
}

impl<B: Binding> LiveView<B> {
    /// Exclusive access to the binding, for reading its snapshot or running
    /// an action.
    pub async fn lock(&self) -> MutexGuard<'_, B> {
        self.binding.lock().await
    }

    /// Completed refreshes, including the initial load.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        *self.refreshes.borrow()
    }

    /// Wait until more than `seen` refreshes have completed.
    ///
    /// Returns false instead if the view has stopped refreshing, which
    /// happens only when a refresh panicked.
    #[must_use = "a stopped view never refreshes again"]
    pub async fn refreshed_since(&self, seen: u64) -> bool {
        let mut refreshes = self.refreshes.clone();
        refreshes.wait_for(|count| *count > seen).await.is_ok()
    }
}

impl<B> Drop for LiveView<B> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn refresh_once<B: Binding>(binding: &Mutex<B>, counter: &watch::Sender<u64>) {
    binding.lock().await.reload().await;
    counter.send_modify(|count| *count += 1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use folio_core::{Collection, NewsPost};
    use serde_json::json;

    use super::*;
    use crate::bindings::testing::fixture;

    /// Counts its refreshes and panics on the one numbered `panic_on`.
    struct Counting {
        refreshes: u32,
        panic_on: Option<u32>,
    }

    #[async_trait]
    impl Binding for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn watches(&self) -> &'static [Collection] {
            &[Collection::NewsPosts]
        }

        async fn refresh(&mut self) -> Result<(), StoreError> {
            self.refreshes += 1;
            assert_ne!(Some(self.refreshes), self.panic_on, "refresh failed hard");
            Ok(())
        }
    }

    async fn add_post(client: &SiteClient) {
        client
            .table::<NewsPost>()
            .insert(&json!({"title": "Update", "content": "..."}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_change_triggers_refresh() {
        let (client, _services, _notices) = fixture();
        let view = LiveView::bind(&client, Counting { refreshes: 0, panic_on: None })
            .await
            .unwrap();
        assert_eq!(view.refresh_count(), 1);

        add_post(&client).await;
        let refreshed = tokio::time::timeout(Duration::from_secs(2), view.refreshed_since(1))
            .await
            .unwrap();
        assert!(refreshed);
        assert!(view.lock().await.refreshes >= 2);
    }

    #[tokio::test]
    async fn test_stopped_view_reports_instead_of_waiting() {
        let (client, _services, _notices) = fixture();
        let view = LiveView::bind(&client, Counting { refreshes: 0, panic_on: Some(2) })
            .await
            .unwrap();

        add_post(&client).await;
        let refreshed = tokio::time::timeout(Duration::from_secs(2), view.refreshed_since(1))
            .await
            .unwrap();
        assert!(!refreshed);
        // Still false on later calls, without waiting.
        assert!(!view.refreshed_since(1).await);
        assert_eq!(view.refresh_count(), 1);
    }
}
