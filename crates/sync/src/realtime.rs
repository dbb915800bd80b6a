//! Subscription manager.
//!
//! Views register interest in a collection; the manager keeps exactly one
//! upstream change subscription per collection with at least one registrant
//! and runs every registrant's callback on each change. Dropping the last
//! [`Subscription`] for a collection closes its upstream subscription.
//!
//! Registrants see every change, including their own writes. Lagging behind
//! the upstream channel counts as a change, so no registrant can miss one.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use folio_core::Collection;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::{ChangeEvent, ChangeFeed, ChangeKind};

/// Callback run for every change to a registered collection.
pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

type Registrants = Arc<Mutex<BTreeMap<u64, ChangeCallback>>>;

struct Channel {
    registrants: Registrants,
    relay: JoinHandle<()>,
}

struct Inner {
    feed: Arc<dyn ChangeFeed>,
    channels: Mutex<HashMap<Collection, Channel>>,
    next_id: AtomicU64,
}

/// Shares one upstream change subscription per collection.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("channels", &self.open_channels())
            .finish_non_exhaustive()
    }
}

impl SubscriptionManager {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            inner: Arc::new(Inner {
                feed,
                channels: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register `callback` for changes to `collection`.
    ///
    /// Opens the upstream subscription if this is the collection's first
    /// registrant. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the feed's error if the upstream subscription cannot be opened.
    pub fn register<F>(&self, collection: Collection, callback: F) -> Result<Subscription, StoreError>
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: ChangeCallback = Arc::new(callback);

        let mut channels = self.inner.lock_channels()?;
        if let Some(channel) = channels.get(&collection) {
            lock_registrants(&channel.registrants)?.insert(id, callback);
        } else {
            let receiver = self.inner.feed.subscribe(collection)?;
            let registrants: Registrants = Arc::new(Mutex::new(BTreeMap::from([(id, callback)])));
            let relay = tokio::spawn(relay(collection, receiver, Arc::clone(&registrants)));
            channels.insert(collection, Channel { registrants, relay });
            info!(%collection, "Opened change subscription");
        }
        drop(channels);

        debug!(%collection, registrant = id, "Registered view");
        Ok(Subscription {
            manager: Arc::downgrade(&self.inner),
            collection,
            id,
        })
    }

    /// Collections with an open upstream subscription.
    #[must_use]
    pub fn open_channels(&self) -> Vec<Collection> {
        let mut open: Vec<Collection> = self
            .inner
            .channels
            .lock()
            .map(|c| c.keys().copied().collect())
            .unwrap_or_default();
        open.sort();
        open
    }

    /// Number of registrants for `collection`.
    #[must_use]
    pub fn registrant_count(&self, collection: Collection) -> usize {
        self.inner
            .channels
            .lock()
            .ok()
            .and_then(|c| {
                c.get(&collection)
                    .and_then(|ch| ch.registrants.lock().ok().map(|r| r.len()))
            })
            .unwrap_or(0)
    }
}

impl Inner {
    fn lock_channels(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Collection, Channel>>, StoreError> {
        self.channels
            .lock()
            .map_err(|_| StoreError::Unavailable("subscription registry poisoned".to_owned()))
    }

    fn release(&self, collection: Collection, id: u64) {
        let Ok(mut channels) = self.lock_channels() else {
            return;
        };
        let Some(channel) = channels.get(&collection) else {
            return;
        };
        let now_empty = lock_registrants(&channel.registrants).is_ok_and(|mut registrants| {
            registrants.remove(&id);
            registrants.is_empty()
        });
        debug!(%collection, registrant = id, "Released view");

        if now_empty && let Some(channel) = channels.remove(&collection) {
            channel.relay.abort();
            info!(%collection, "Closed change subscription");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(channels) = self.channels.get_mut() {
            for channel in channels.values() {
                channel.relay.abort();
            }
        }
    }
}

fn lock_registrants(
    registrants: &Registrants,
) -> Result<std::sync::MutexGuard<'_, BTreeMap<u64, ChangeCallback>>, StoreError> {
    registrants
        .lock()
        .map_err(|_| StoreError::Unavailable("subscription registrants poisoned".to_owned()))
}

async fn relay(
    collection: Collection,
    mut receiver: broadcast::Receiver<ChangeEvent>,
    registrants: Registrants,
) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(%collection, skipped, "Change subscription lagged");
                ChangeEvent::new(collection, ChangeKind::Resync)
            }
            Err(RecvError::Closed) => {
                debug!(%collection, "Change feed closed");
                return;
            }
        };

        // Callbacks run outside the lock so they may register or release.
        let callbacks: Vec<ChangeCallback> = match registrants.lock() {
            Ok(r) => r.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(&event);
        }
    }
}

/// A live registration. Dropping it unregisters the callback.
#[derive(Debug)]
#[must_use = "dropping a Subscription unregisters it"]
pub struct Subscription {
    manager: Weak<Inner>,
    collection: Collection,
    id: u64,
}

impl Subscription {
    #[must_use]
    pub const fn collection(&self) -> Collection {
        self.collection
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.manager.upgrade() {
            inner.release(self.collection, self.id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::store::{ChangeHub, ChangeKind};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &ChangeEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_one_upstream_subscription_per_collection() {
        let hub = ChangeHub::new();
        let manager = SubscriptionManager::new(Arc::new(hub.clone()));

        let (a_count, a) = counter();
        let (b_count, b) = counter();
        let sub_a = manager.register(Collection::NewsPosts, a).unwrap();
        let sub_b = manager.register(Collection::NewsPosts, b).unwrap();

        assert_eq!(hub.receiver_count(Collection::NewsPosts), 1);
        assert_eq!(manager.registrant_count(Collection::NewsPosts), 2);

        hub.publish(ChangeEvent::new(Collection::NewsPosts, ChangeKind::Insert));
        settle().await;
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);

        drop(sub_a);
        assert_eq!(manager.open_channels(), [Collection::NewsPosts]);
        hub.publish(ChangeEvent::new(Collection::NewsPosts, ChangeKind::Update));
        settle().await;
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 2);

        drop(sub_b);
        assert!(manager.open_channels().is_empty());
        settle().await;
        assert_eq!(hub.receiver_count(Collection::NewsPosts), 0);
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let hub = ChangeHub::new();
        let manager = SubscriptionManager::new(Arc::new(hub.clone()));
        let (hero_count, hero) = counter();
        let _sub = manager.register(Collection::HeroImages, hero).unwrap();

        hub.publish(ChangeEvent::new(Collection::PortfolioItems, ChangeKind::Insert));
        settle().await;
        assert_eq!(hero_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unwatched_collection_fails_to_register() {
        let manager = SubscriptionManager::new(Arc::new(ChangeHub::new()));
        let (_, cb) = counter();
        assert!(manager.register(Collection::SiteSettings, cb).is_err());
        assert!(manager.open_channels().is_empty());
    }
}
