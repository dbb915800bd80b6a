//! In-process content store.
//!
//! Applies the same column defaults, required columns and unique keys as the
//! `PostgreSQL` schema, and publishes a change event after every successful
//! write to a watched collection.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use folio_core::Collection;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::changes::{ChangeEvent, ChangeFeed, ChangeHub, ChangeKind};
use super::query::{Filter, Query, Row, check_required, validate_fields};
use super::{ContentStore, row_id};
use crate::error::StoreError;

/// Content store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Collection, Vec<Row>>>,
    changes: ChangeHub,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The hub this store publishes to.
    #[must_use]
    pub const fn changes(&self) -> &ChangeHub {
        &self.changes
    }

    /// Number of stored rows in `collection`.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .map_or(0, |t| t.get(&collection).map_or(0, Vec::len))
    }

    /// Whether `collection` holds no rows.
    #[must_use]
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<Collection, Vec<Row>>) -> T) -> Result<T, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_owned()))?;
        Ok(f(&tables))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut HashMap<Collection, Vec<Row>>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_owned()))?;
        f(&mut tables)
    }

    fn publish(&self, collection: Collection, kind: ChangeKind) {
        debug!(%collection, ?kind, "memory store change");
        self.changes.publish(ChangeEvent::new(collection, kind));
    }
}

/// Column defaults matching the schema migrations.
fn column_defaults(collection: Collection) -> Row {
    let now = json!(Utc::now());
    let id = json!(Uuid::new_v4());
    let defaults = match collection {
        Collection::HeroImages => json!({
            "id": id, "title": null, "subtitle": null,
            "is_active": true, "display_order": 0, "created_at": now,
        }),
        Collection::PortfolioItems => json!({
            "id": id, "description": null, "media_type": "image",
            "thumbnail_url": null, "category": null, "is_published": true,
            "display_order": 0, "created_at": now,
        }),
        Collection::NewsPosts => json!({
            "id": id, "excerpt": null, "image_url": null, "is_published": true,
            "published_at": now.clone(), "created_at": now,
        }),
        Collection::ContactSubmissions => json!({
            "id": id, "subject": null, "is_read": false, "created_at": now,
        }),
        Collection::SiteSettings => json!({
            "id": id, "value": null, "updated_at": now,
        }),
    };
    match defaults {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

fn check_unique(collection: Collection, rows: &[Row], candidate: &Row) -> Result<(), StoreError> {
    let keys = if collection.conflict_key() == "id" {
        &["id"][..]
    } else {
        &["id", collection.conflict_key()][..]
    };
    for key in keys {
        let value = candidate.get(*key).unwrap_or(&Value::Null);
        if !value.is_null() && rows.iter().any(|r| r.get(*key) == Some(value)) {
            return Err(StoreError::Conflict(format!(
                "duplicate {collection}.{key} {value}"
            )));
        }
    }
    Ok(())
}

fn build_row(collection: Collection, record: Row) -> Result<Row, StoreError> {
    validate_fields(collection, record.keys().map(String::as_str))?;
    let mut row = column_defaults(collection);
    row.extend(record);
    check_required(collection, &row)?;
    Ok(row)
}

fn find_by_id(rows: &[Row], id: Uuid) -> Option<usize> {
    rows.iter().position(|r| row_id(r) == Some(id))
}

fn not_found(collection: Collection, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{collection} record {id}"))
}

fn touch(collection: Collection, row: &mut Row) {
    if collection.has_column("updated_at") {
        row.insert("updated_at".to_owned(), json!(Utc::now()));
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        query.validate(collection)?;
        let mut rows = self.read(|tables| {
            tables
                .get(&collection)
                .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
                .unwrap_or_default()
        })?;
        query.arrange(&mut rows);
        Ok(rows)
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, StoreError> {
        validate_fields(collection, filters.iter().map(Filter::field))?;
        let count = self.read(|tables| {
            tables.get(&collection).map_or(0, |rows| {
                rows.iter()
                    .filter(|r| filters.iter().all(|f| f.matches(r)))
                    .count()
            })
        })?;
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    #[instrument(skip(self, record), fields(collection = %collection))]
    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError> {
        let row = build_row(collection, record)?;
        let stored = self.write(|tables| {
            let rows = tables.entry(collection).or_default();
            check_unique(collection, rows, &row)?;
            rows.push(row.clone());
            Ok(row)
        })?;
        self.publish(collection, ChangeKind::Insert);
        Ok(stored)
    }

    #[instrument(skip(self, patch), fields(collection = %collection, id = %id))]
    async fn update(&self, collection: Collection, id: Uuid, patch: Row) -> Result<(), StoreError> {
        validate_fields(collection, patch.keys().map(String::as_str))?;
        self.write(|tables| {
            let rows = tables.entry(collection).or_default();
            let index = find_by_id(rows, id).ok_or_else(|| not_found(collection, id))?;
            let mut updated = rows.get(index).cloned().unwrap_or_default();
            updated.extend(patch);
            check_required(collection, &updated)?;
            let others: Vec<Row> = rows
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, r)| r.clone())
                .collect();
            check_unique(collection, &others, &updated)?;
            touch(collection, &mut updated);
            if let Some(slot) = rows.get_mut(index) {
                *slot = updated;
            }
            Ok(())
        })?;
        self.publish(collection, ChangeKind::Update);
        Ok(())
    }

    #[instrument(skip(self, record), fields(collection = %collection))]
    async fn upsert(&self, collection: Collection, record: Row) -> Result<(), StoreError> {
        validate_fields(collection, record.keys().map(String::as_str))?;
        let key = collection.conflict_key();
        let key_value = record.get(key).cloned().unwrap_or(Value::Null);

        let kind = self.write(|tables| {
            let rows = tables.entry(collection).or_default();
            let existing = if key_value.is_null() {
                None
            } else {
                rows.iter_mut().find(|r| r.get(key) == Some(&key_value))
            };
            if let Some(row) = existing {
                row.extend(record);
                touch(collection, row);
                return Ok(ChangeKind::Update);
            }
            let row = build_row(collection, record)?;
            check_unique(collection, rows, &row)?;
            rows.push(row);
            Ok(ChangeKind::Insert)
        })?;
        self.publish(collection, kind);
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        self.write(|tables| {
            let rows = tables.entry(collection).or_default();
            let index = find_by_id(rows, id).ok_or_else(|| not_found(collection, id))?;
            rows.remove(index);
            Ok(())
        })?;
        self.publish(collection, ChangeKind::Delete);
        Ok(())
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&self, collection: Collection) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        self.changes.subscribe(collection)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::encode_row;
    use crate::store::query::Direction;

    fn row(value: Value) -> Row {
        encode_row(&value).unwrap()
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Collection::ContactSubmissions, row(json!({
                "name": "Ana", "email": "ana@example.com", "message": "Hi"
            })))
            .await
            .unwrap();

        assert_eq!(stored["is_read"], false);
        assert!(stored["subject"].is_null());
        assert!(row_id(&stored).is_some());
        assert!(stored["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_insert_requires_columns() {
        let store = MemoryStore::new();
        let err = store
            .insert(Collection::NewsPosts, row(json!({"title": "t"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingField { field, .. } if field == "content"));
        assert!(store.is_empty(Collection::NewsPosts));
    }

    #[tokio::test]
    async fn test_unknown_columns_are_rejected() {
        let store = MemoryStore::new();
        let err = store
            .insert(Collection::HeroImages, row(json!({"image_url": "u", "rank": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_rows() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.update(Collection::HeroImages, id, row(json!({"is_active": false}))).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(Collection::HeroImages, id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_on_settings_key() {
        let store = MemoryStore::new();
        store
            .upsert(Collection::SiteSettings, row(json!({"key": "artist_name", "value": "A"})))
            .await
            .unwrap();
        store
            .upsert(Collection::SiteSettings, row(json!({"key": "artist_name", "value": "B"})))
            .await
            .unwrap();

        let rows = store.query(Collection::SiteSettings, &Query::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["value"], "B");
    }

    #[tokio::test]
    async fn test_settings_keys_are_unique_on_insert() {
        let store = MemoryStore::new();
        let setting = json!({"key": "about_text", "value": "x"});
        store.insert(Collection::SiteSettings, row(setting.clone())).await.unwrap();
        let err = store
            .insert(Collection::SiteSettings, row(setting))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for (title, order, active) in [("c", 2, true), ("a", 0, true), ("x", 1, false), ("b", 1, true)] {
            store
                .insert(Collection::HeroImages, row(json!({
                    "image_url": title, "title": title, "display_order": order, "is_active": active
                })))
                .await
                .unwrap();
        }

        let query = Query::new()
            .filter(Filter::eq("is_active", true))
            .order_by("display_order", Direction::Ascending)
            .limit(2);
        let rows = store.query(Collection::HeroImages, &query).await.unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, ["a", "b"]);

        let active = store
            .count(Collection::HeroImages, &[Filter::eq("is_active", false)])
            .await
            .unwrap();
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe(Collection::NewsPosts).unwrap();

        let stored = store
            .insert(Collection::NewsPosts, row(json!({"title": "t", "content": "c"})))
            .await
            .unwrap();
        store
            .update(Collection::NewsPosts, row_id(&stored).unwrap(), row(json!({"is_published": false})))
            .await
            .unwrap();
        store
            .delete(Collection::NewsPosts, row_id(&stored).unwrap())
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Insert);
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Update);
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Delete);
    }

    #[tokio::test]
    async fn test_failed_writes_publish_nothing() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe(Collection::HeroImages).unwrap();
        let _ = store.insert(Collection::HeroImages, Row::new()).await;
        assert!(rx.try_recv().is_err());
    }
}
