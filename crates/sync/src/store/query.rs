//! Query descriptions shared by every store adapter.
//!
//! A [`Query`] is plain data: equality and membership filters, an optional
//! single ordering and an optional limit. Adapters validate field names
//! against the collection's column list before use.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use folio_core::Collection;
use serde_json::{Map, Value};

use crate::error::StoreError;

/// One stored record as a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// A row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field` equals `value`. A null value matches null or missing fields.
    Eq { field: String, value: Value },
    /// `field` equals any of `values`.
    In { field: String, values: Vec<Value> },
}

impl Filter {
    /// Equality filter.
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.to_owned(),
            value: value.into(),
        }
    }

    /// Membership filter.
    pub fn is_in<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.to_owned(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Column this filter reads.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. } | Self::In { field, .. } => field,
        }
    }

    /// Evaluate against an in-memory row.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        let actual = row.get(self.field()).unwrap_or(&Value::Null);
        match self {
            Self::Eq { value, .. } => actual == value,
            Self::In { values, .. } => values.contains(actual),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Ordering on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

/// A filtered, ordered, limited read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Every row, in store order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter. Filters combine with AND.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order by `field`.
    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some(Order {
            field: field.to_owned(),
            direction,
        });
        self
    }

    /// Keep at most `limit` rows.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check every referenced field against the collection's columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidField`] for the first unknown field.
    pub fn validate(&self, collection: Collection) -> Result<(), StoreError> {
        let fields = self
            .filters
            .iter()
            .map(Filter::field)
            .chain(self.order.iter().map(|o| o.field.as_str()));
        validate_fields(collection, fields)
    }

    /// Apply ordering and limit to rows that already passed the filters.
    ///
    /// Sorting is stable, so ties keep their incoming order. Nulls sort
    /// after every other value, as in `PostgreSQL`.
    pub fn arrange(&self, rows: &mut Vec<Row>) {
        if let Some(order) = &self.order {
            rows.sort_by(|a, b| {
                let a = a.get(&order.field).unwrap_or(&Value::Null);
                let b = b.get(&order.field).unwrap_or(&Value::Null);
                match order.direction {
                    Direction::Ascending => compare_values(a, b),
                    Direction::Descending => compare_values(b, a),
                }
            });
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
    }

    /// Whether `row` passes every filter.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

/// Reject any field the collection does not have.
pub(crate) fn validate_fields<'a>(
    collection: Collection,
    fields: impl IntoIterator<Item = &'a str>,
) -> Result<(), StoreError> {
    for field in fields {
        if !collection.has_column(field) {
            return Err(StoreError::InvalidField {
                collection,
                field: field.to_owned(),
            });
        }
    }
    Ok(())
}

/// Reject a row that leaves a required column unset or null.
pub(crate) fn check_required(collection: Collection, row: &Row) -> Result<(), StoreError> {
    for field in collection.required_columns() {
        if row.get(*field).is_none_or(Value::is_null) {
            return Err(StoreError::MissingField {
                collection,
                field: (*field).to_owned(),
            });
        }
    }
    Ok(())
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Total order over JSON scalars with null last.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.cmp(b),
        },
        _ => a.to_string().cmp(&b.to_string()),
    }
}
