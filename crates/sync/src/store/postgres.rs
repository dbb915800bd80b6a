//! `PostgreSQL` content store.
//!
//! Rows travel as `jsonb`: reads select `to_jsonb(t)` and writes expand the
//! payload with `jsonb_populate_record`, so one set of statements serves
//! every collection. Column names are checked against the collection's
//! allowlist before they are interpolated; values are always bound.

use std::time::Duration;

use async_trait::async_trait;
use folio_core::Collection;
use serde::Deserialize;
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::changes::{ChangeEvent, ChangeFeed, ChangeHub, ChangeKind};
use super::query::{Filter, Query, Row, check_required, validate_fields};
use super::ContentStore;
use crate::error::StoreError;

/// Notification channel written by the change trigger.
pub const CHANGE_CHANNEL: &str = "folio_changes";

/// Pause before retrying after a listener error.
const RELISTEN_DELAY: Duration = Duration::from_secs(1);

/// Content store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Eq { field, value } if value.is_null() => {
                qb.push(format!("t.{field} IS NULL"));
            }
            Filter::Eq { field, value } => {
                qb.push(format!("to_jsonb(t.{field}) = "));
                qb.push_bind(Json(value.clone()));
            }
            Filter::In { field, values } => {
                qb.push_bind(Json(Value::Array(values.clone())));
                qb.push(format!(" @> jsonb_build_array(to_jsonb(t.{field}))"));
            }
        }
    }
}

/// `a, b, c` and `r.a, r.b, r.c` for the payload's columns.
fn column_lists(record: &Row) -> (String, String) {
    let columns: Vec<&str> = record.keys().map(String::as_str).collect();
    let selected: Vec<String> = columns.iter().map(|c| format!("r.{c}")).collect();
    (columns.join(", "), selected.join(", "))
}

fn touch_clause(collection: Collection) -> &'static str {
    if collection.has_column("updated_at") {
        "updated_at = NOW()"
    } else {
        ""
    }
}

#[async_trait]
impl ContentStore for PgStore {
    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn query(&self, collection: Collection, query: &Query) -> Result<Vec<Row>, StoreError> {
        query.validate(collection)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT to_jsonb(t) FROM {} t",
            collection.table_name()
        ));
        push_filters(&mut qb, &query.filters);

        if let Some(order) = &query.order {
            qb.push(format!(" ORDER BY t.{} {}", order.field, order.direction.as_sql()));
            // Ties fall back to insertion order.
            if collection.has_column("created_at") && order.field != "created_at" {
                qb.push(", t.created_at ASC");
            }
            qb.push(", t.id ASC");
        }
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build_query_scalar::<Json<Row>>()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, StoreError> {
        validate_fields(collection, filters.iter().map(Filter::field))?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} t",
            collection.table_name()
        ));
        push_filters(&mut qb, filters);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self, record), fields(collection = %collection))]
    async fn insert(&self, collection: Collection, record: Row) -> Result<Row, StoreError> {
        validate_fields(collection, record.keys().map(String::as_str))?;
        check_required(collection, &record)?;

        let table = collection.table_name();
        let (columns, selected) = column_lists(&record);
        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {selected} FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             RETURNING to_jsonb(t)"
        );

        let Json(row) = sqlx::query_scalar::<_, Json<Row>>(&sql)
            .bind(Json(Value::Object(record)))
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(row)
    }

    #[instrument(skip(self, patch), fields(collection = %collection, id = %id))]
    async fn update(&self, collection: Collection, id: Uuid, patch: Row) -> Result<(), StoreError> {
        validate_fields(collection, patch.keys().map(String::as_str))?;

        let table = collection.table_name();
        let mut assignments: Vec<String> = patch.keys().map(|c| format!("{c} = r.{c}")).collect();
        let touch = touch_clause(collection);
        if !touch.is_empty() {
            assignments.push(touch.to_owned());
        }
        if assignments.is_empty() {
            let exists = self
                .count(collection, &[Filter::eq("id", id.to_string())])
                .await?;
            return if exists == 0 {
                Err(StoreError::NotFound(format!("{collection} record {id}")))
            } else {
                Ok(())
            };
        }

        let sql = format!(
            "UPDATE {table} AS t SET {} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE t.id = $2",
            assignments.join(", ")
        );
        let result = sqlx::query(&sql)
            .bind(Json(Value::Object(patch)))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{collection} record {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self, record), fields(collection = %collection))]
    async fn upsert(&self, collection: Collection, record: Row) -> Result<(), StoreError> {
        validate_fields(collection, record.keys().map(String::as_str))?;
        check_required(collection, &record)?;

        let table = collection.table_name();
        let key = collection.conflict_key();
        let (columns, selected) = column_lists(&record);
        let mut assignments: Vec<String> = record
            .keys()
            .filter(|c| c.as_str() != key)
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();
        let touch = touch_clause(collection);
        if !touch.is_empty() {
            assignments.push(touch.to_owned());
        }
        let on_conflict = if assignments.is_empty() {
            "DO NOTHING".to_owned()
        } else {
            format!("DO UPDATE SET {}", assignments.join(", "))
        };

        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {selected} FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             ON CONFLICT ({key}) {on_conflict}"
        );
        sqlx::query(&sql)
            .bind(Json(Value::Object(record)))
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.table_name());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{collection} record {id}")));
        }
        Ok(())
    }
}

/// Payload written by the change trigger.
#[derive(Debug, Deserialize)]
struct ChangeNotice {
    table: String,
    op: ChangeKind,
}

fn parse_notice(payload: &str) -> Option<ChangeEvent> {
    let notice: ChangeNotice = serde_json::from_str(payload).ok()?;
    let collection = Collection::from_table_name(&notice.table)?;
    Some(ChangeEvent::new(collection, notice.op))
}

/// Change feed fed by `LISTEN folio_changes`.
///
/// A single background task owns the listener connection and relays every
/// notice to the matching collection's broadcast channel. The task stops
/// when the feed is dropped.
#[derive(Debug)]
pub struct PgChangeFeed {
    hub: ChangeHub,
    relay: JoinHandle<()>,
}

impl PgChangeFeed {
    /// Open a listener connection and start relaying notices.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the listener cannot connect.
    pub async fn listen(pool: &PgPool) -> Result<Self, StoreError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        info!(channel = CHANGE_CHANNEL, "Listening for content changes");

        let hub = ChangeHub::new();
        let relay = tokio::spawn(relay(listener, hub.clone()));
        Ok(Self { hub, relay })
    }
}

async fn relay(mut listener: PgListener, hub: ChangeHub) {
    loop {
        match listener.try_recv().await {
            Ok(Some(notification)) => match parse_notice(notification.payload()) {
                Some(event) => hub.publish(event),
                None => warn!(
                    payload = notification.payload(),
                    "Ignoring malformed change notice"
                ),
            },
            Ok(None) => {
                // Notices sent while disconnected are lost.
                warn!("Change listener connection lost, reconnecting");
                hub.publish_resync();
            }
            Err(e) => {
                error!(error = %e, "Change listener failed");
                tokio::time::sleep(RELISTEN_DELAY).await;
            }
        }
    }
}

impl ChangeFeed for PgChangeFeed {
    fn subscribe(&self, collection: Collection) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        self.hub.subscribe(collection)
    }
}

impl Drop for PgChangeFeed {
    fn drop(&mut self) {
        self.relay.abort();
    }
}
