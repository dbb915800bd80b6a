//! Errors raised by the content store and blob storage adapters.
//!
//! The `Display` output is the human-readable message shown to the user when
//! an action fails, so variants read as sentences rather than codes.

use folio_core::Collection;
use thiserror::Error;

/// Errors that can occur during content store or bucket operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error from a bucket adapter.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// No row or object matched.
    #[error("{0} not found")]
    NotFound(String),

    /// Unique constraint violation (e.g. duplicate settings key).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A required column was missing from an insert.
    #[error("{collection}.{field} is required")]
    MissingField {
        collection: Collection,
        field: String,
    },

    /// Filter, ordering or payload referenced a column the collection does not have.
    #[error("unknown field '{field}' on {collection}")]
    InvalidField {
        collection: Collection,
        field: String,
    },

    /// A stored row could not be decoded into its entity type.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The service refused or could not serve the request.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Map a sqlx error, surfacing unique violations as [`StoreError::Conflict`].
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(db_err.message().to_owned());
        }
        Self::Database(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_readable() {
        let err = StoreError::MissingField {
            collection: Collection::NewsPosts,
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "news_posts.title is required");

        let err = StoreError::NotFound("news_posts record".to_string());
        assert_eq!(err.to_string(), "news_posts record not found");
    }

    #[test]
    fn test_non_database_sqlx_errors_stay_database() {
        let err = StoreError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
