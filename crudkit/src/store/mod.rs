//! Record storage
//!
//! [`Store`] is the seam between the CRUD service and persistence. Two
//! implementations ship with the crate:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`
//! - [`MemoryStore`]: in-process map, for tests and local development
//!
//! Stores are looked up per resource through a [`StoreRegistry`].

mod memory;
mod postgres;
mod registry;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use registry::StoreRegistry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::resource::{CreateOf, Resource, SortField, SortOrder, UpdateOf};

/// Storage failures, categorized so the service can map them to error kinds
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violation
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A write expected a row that does not exist
    #[error("row not found")]
    RowNotFound,

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err
                    .constraint()
                    .map_or_else(|| db_err.message().to_string(), ToString::to_string);
                if db_err.is_unique_violation() {
                    Self::UniqueViolation(constraint)
                } else if db_err.is_foreign_key_violation() {
                    Self::ForeignKeyViolation(constraint)
                } else {
                    Self::Other(err.to_string())
                }
            }
            _ => Self::Other(err.to_string()),
        }
    }
}

/// Row filter shared by `find_many` and `count`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Trimmed, non-empty search text
    pub search: Option<String>,
    /// Keep soft-deleted rows
    pub include_deleted: bool,
}

/// A page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Row filter
    pub filter: ListFilter,
    /// Rows to skip
    pub offset: u64,
    /// Row cap
    pub limit: u64,
    /// Sort column
    pub sort_by: SortField,
    /// Sort direction
    pub sort_order: SortOrder,
}

/// Persistence for one resource
///
/// Soft-deleted rows are only returned when asked for. Search matches the
/// resource's `SEARCH_FIELDS` case-insensitively.
#[async_trait]
pub trait Store<R: Resource>: Send + Sync {
    /// One page of matching records
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<R::Record>, StoreError>;

    /// Number of matching records across all pages
    async fn count(&self, filter: &ListFilter) -> Result<u64, StoreError>;

    /// Record by id
    async fn find_by_id(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<R::Record>, StoreError>;

    /// Insert a new record with server-assigned id and timestamps
    async fn insert(
        &self,
        id: Uuid,
        input: CreateOf<R>,
        now: DateTime<Utc>,
    ) -> Result<R::Record, StoreError>;

    /// Merge a partial update; `RowNotFound` if the id is unknown
    async fn update(
        &self,
        id: Uuid,
        patch: UpdateOf<R>,
        now: DateTime<Utc>,
    ) -> Result<R::Record, StoreError>;

    /// Set or clear the soft-delete marker; `RowNotFound` if the id is unknown
    async fn set_deleted_at(
        &self,
        id: Uuid,
        at: Option<DateTime<Utc>>,
    ) -> Result<R::Record, StoreError>;

    /// Remove a record; `false` if it did not exist
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

// Escape LIKE wildcards so search text matches literally.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_row_not_found_mapping() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::RowNotFound
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Other(_)
        ));
    }
}
