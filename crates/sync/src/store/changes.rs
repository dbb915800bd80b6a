//! Change notifications published by a store.

use std::collections::HashMap;
use std::sync::Arc;

use folio_core::Collection;
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::error::StoreError;

/// Buffered events per collection before slow receivers lag.
const CHANNEL_CAPACITY: usize = 64;

/// What happened to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Events may have been missed; treat as an arbitrary change.
    #[serde(skip)]
    Resync,
}

/// A change to some row of a collection. Carries no row data: receivers
/// re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    #[must_use]
    pub const fn new(collection: Collection, kind: ChangeKind) -> Self {
        Self { collection, kind }
    }
}

/// Source of change events for watched collections.
pub trait ChangeFeed: Send + Sync {
    /// Open a receiver for every future change to `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the collection publishes no changes.
    fn subscribe(&self, collection: Collection) -> Result<broadcast::Receiver<ChangeEvent>, StoreError>;
}

/// Broadcast senders for every watched collection.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    senders: Arc<HashMap<Collection, broadcast::Sender<ChangeEvent>>>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    #[must_use]
    pub fn new() -> Self {
        let senders = Collection::WATCHED
            .into_iter()
            .map(|c| (c, broadcast::channel(CHANNEL_CAPACITY).0))
            .collect();
        Self {
            senders: Arc::new(senders),
        }
    }

    /// Deliver `event` to current receivers. Unwatched collections and
    /// collections with no receivers drop the event.
    pub fn publish(&self, event: ChangeEvent) {
        if let Some(sender) = self.senders.get(&event.collection) {
            let _ = sender.send(event);
        }
    }

    /// Tell every watched collection's receivers to re-fetch.
    pub fn publish_resync(&self) {
        for collection in Collection::WATCHED {
            self.publish(ChangeEvent::new(collection, ChangeKind::Resync));
        }
    }

    /// Number of open receivers for `collection`.
    #[must_use]
    pub fn receiver_count(&self, collection: Collection) -> usize {
        self.senders
            .get(&collection)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl ChangeFeed for ChangeHub {
    fn subscribe(&self, collection: Collection) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        self.senders
            .get(&collection)
            .map(broadcast::Sender::subscribe)
            .ok_or_else(|| StoreError::Unavailable(format!("{collection} does not publish changes")))
    }
}
