//! Doc Cache - A lightweight in-process document cache
//!
//! Named collections of schemaless documents with single-field equality and
//! membership queries, array mutation, secondary indexes and TTL expiry.

pub mod api;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use collection::{Collection, CollectionOptions, Found, Payload};
pub use config::Config;
pub use error::{CacheError, Result, StorageError};
pub use registry::Registry;
pub use store::{Document, Predicate, Query, UpdateOp};
pub use tasks::spawn_expiry_task;
