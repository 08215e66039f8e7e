//! Collection Module
//!
//! Named document caches with single-field queries, array mutation and
//! TTL expiry.

mod handle;
mod options;
mod payload;
mod stats;


// Re-export public types
pub use handle::Collection;
pub use options::CollectionOptions;
pub use payload::{Found, Payload};
pub use stats::CollectionStats;
