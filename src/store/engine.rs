//! Storage Engine Contract
//!
//! Primitive operations a collection issues against its document store.

use std::fmt::Debug;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::store::{Document, Query, UpdateOp};

/// Result type for engine primitives.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Field projection applied to returned documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Every field, identifier included
    Full,
    /// Every field except the identifier
    ExcludeId,
}

/// An embedded document store.
///
/// Methods are synchronous; the owning collection serializes access
/// through its lock, so each call observes and leaves a consistent state.
pub trait StorageEngine: Send + Sync + Debug {
    /// Stores the documents, assigning identifiers where absent, and echoes
    /// them back. The batch is rejected as a whole on any failure.
    fn insert(&mut self, docs: Vec<Document>) -> StorageResult<Vec<Document>>;

    /// First match in storage order.
    fn find_one(&self, query: &Query, projection: Projection) -> StorageResult<Option<Document>>;

    /// Every match in storage order.
    fn find(&self, query: &Query, projection: Projection) -> StorageResult<Vec<Document>>;

    /// Applies `op` to the first match, or every match when `multi`.
    /// Returns the number of documents matched.
    fn update(&mut self, query: &Query, op: &UpdateOp, multi: bool) -> StorageResult<usize>;

    /// Removes the first match, or every match when `multi`.
    fn remove(&mut self, query: &Query, multi: bool) -> StorageResult<usize>;

    /// Declares a lookup index on `field`; with `expire_after`, documents
    /// whose timestamp at `field` is older than the duration expire.
    fn ensure_index(&mut self, field: &str, expire_after: Option<Duration>) -> StorageResult<()>;

    /// Purges documents expired as of `now`. Returns the number removed.
    fn remove_expired(&mut self, now: DateTime<Utc>) -> usize;

    /// Number of live documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of declared indexes.
    fn index_count(&self) -> usize;
}
