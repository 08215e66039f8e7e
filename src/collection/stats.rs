//! Collection Statistics Module
//!
//! Tracks lookup hits and misses and documents purged by expiry.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Collection Stats ==
/// Point-in-time view of a collection's metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionStats {
    /// Number of live documents
    pub documents: usize,
    /// Number of declared indexes
    pub indexes: usize,
    /// Lookups that returned at least one document
    pub hits: u64,
    /// Lookups that returned nothing
    pub misses: u64,
    /// Documents purged by TTL expiry
    pub expired: u64,
}

impl CollectionStats {
    // == Hit Rate ==
    /// Calculates the lookup hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by every handle to a collection.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
}

impl StatsRecorder {
    pub fn record_lookup(&self, found: bool) {
        let counter = if found { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self, count: usize) {
        self.expired.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, documents: usize, indexes: usize) -> CollectionStats {
        CollectionStats {
            documents,
            indexes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}
