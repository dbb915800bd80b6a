//! Content store client.
//!
//! [`ContentStore`] is the capability interface to the structured-data
//! service. Adapters work on untyped JSON rows so one implementation serves
//! every collection; [`Table`] layers the typed entity API on top.
//!
//! # Adapters
//!
//! - [`PgStore`] - `PostgreSQL`, with [`PgChangeFeed`] over `LISTEN/NOTIFY`
//! - [`MemoryStore`] - in-process store and change feed for tests and demos

pub mod changes;
pub mod memory;
pub mod postgres;
pub mod query;

use std::marker::PhantomData;

use async_trait::async_trait;
use folio_core::{Collection, Entity};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

pub use changes::{ChangeEvent, ChangeFeed, ChangeHub, ChangeKind};
pub use memory::MemoryStore;
pub use postgres::{PgChangeFeed, PgStore};
pub use query::{Direction, Filter, Order, Query, Row};

/// Remote structured-data service.
///
/// Every method is a single remote call. Failures are returned, never
/// retried.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Rows matching `query`, ordered and limited as requested.
    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Number of rows matching every filter.
    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, StoreError>;

    /// Insert one row and return it with store-side defaults applied.
    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError>;

    /// Set the given columns on the row with `id`.
    async fn update(&self, collection: Collection, id: Uuid, patch: Row) -> Result<(), StoreError>;

    /// Insert, or update the row sharing the collection's conflict key.
    async fn upsert(&self, collection: Collection, record: Row) -> Result<(), StoreError>;

    /// Delete the row with `id`.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError>;
}

/// Typed access to the collection backing `E`.
pub struct Table<'a, E> {
    store: &'a dyn ContentStore,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> Table<'a, E> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Fetch and decode matching rows.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or [`StoreError::DataCorruption`] if a row
    /// does not decode.
    pub async fn fetch(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        self.store
            .query(E::COLLECTION, query)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }

    /// Count matching rows.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn count(&self, filters: &[Filter]) -> Result<u64, StoreError> {
        self.store.count(E::COLLECTION, filters).await
    }

    /// Insert `payload` and decode the stored row.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn insert<P>(&self, payload: &P) -> Result<E, StoreError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let row = self.store.insert(E::COLLECTION, encode_row(payload)?).await?;
        decode_row(row)
    }

    /// Apply `patch` to the row with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row has `id`.
    pub async fn update<P>(&self, id: impl Into<Uuid> + Send, patch: &P) -> Result<(), StoreError>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.store
            .update(E::COLLECTION, id.into(), encode_row(patch)?)
            .await
    }

    /// Upsert `payload` on the collection's conflict key.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn upsert<P>(&self, payload: &P) -> Result<(), StoreError>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.store.upsert(E::COLLECTION, encode_row(payload)?).await
    }

    /// Delete the row with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row has `id`.
    pub async fn delete(&self, id: impl Into<Uuid> + Send) -> Result<(), StoreError> {
        self.store.delete(E::COLLECTION, id.into()).await
    }
}

/// Serialize a payload into a row.
///
/// # Errors
///
/// Returns [`StoreError::DataCorruption`] unless the payload is a JSON object.
pub fn encode_row<P: Serialize + ?Sized>(payload: &P) -> Result<Row, StoreError> {
    match serde_json::to_value(payload)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::DataCorruption(format!(
            "expected an object payload, got {other}"
        ))),
    }
}

/// Deserialize a row into an entity.
///
/// # Errors
///
/// Returns [`StoreError::DataCorruption`] naming the collection.
pub fn decode_row<E: Entity>(row: Row) -> Result<E, StoreError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| StoreError::DataCorruption(format!("invalid {} row: {e}", E::COLLECTION)))
}

/// Read the `id` column of a row.
pub(crate) fn row_id(row: &Row) -> Option<Uuid> {
    row.get("id")?.as_str()?.parse().ok()
}
