//! Store Module
//!
//! Document model, query and update primitives, and the storage engine
//! that executes them.

pub mod document;
mod engine;
pub mod expiry;
mod memory;
mod query;
mod update;

// Re-export public types
pub use document::{Document, ID_FIELD};
pub use engine::{Projection, StorageEngine, StorageResult};
pub use expiry::TtlRule;
pub use memory::MemoryEngine;
pub use query::{single_entry, Predicate, Query};
pub use update::UpdateOp;
