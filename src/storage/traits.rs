//! Store trait and errors

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::{PriceObservation, PriceRecord};

/// Errors from the storage layer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Database connection failed
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Query execution failed
    #[error("query execution failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an insert attempt keyed on `display_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was created with this id.
    Inserted(i64),
    /// A record with the same `display_time` already exists; nothing was
    /// written.
    DuplicateDisplayTime,
}

/// Append-only store for price records.
///
/// `display_time` is unique across records: inserting a duplicate reports
/// [`InsertOutcome::DuplicateDisplayTime`] instead of erroring, which is what
/// makes overlapping fetch cycles safe to run.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert unless a record with the same `display_time` already exists.
    async fn insert_if_absent(&self, observation: &PriceObservation)
        -> StoreResult<InsertOutcome>;

    /// The record with the greatest `timestamp`, if any.
    async fn latest(&self) -> StoreResult<Option<PriceRecord>>;

    /// All records, ascending by `timestamp`.
    async fn history(&self) -> StoreResult<Vec<PriceRecord>>;

    /// Short name of the backing engine, for health reporting.
    fn backend(&self) -> &'static str;
}
