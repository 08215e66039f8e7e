//! Response DTOs for the document cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::collection::CollectionStats;

/// Response body for collection creation (POST /collections)
#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    /// Success message
    pub message: String,
    /// The collection that was created
    pub name: String,
}

impl CreatedResponse {
    /// Creates a new CreatedResponse
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            message: format!("Collection '{}' created successfully", name),
            name,
        }
    }
}

/// Response body for collection listing (GET /collections)
#[derive(Debug, Clone, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
}

/// Response body for update, replace and array operations
#[derive(Debug, Clone, Serialize)]
pub struct MatchedResponse {
    /// Number of documents the query matched
    pub matched: usize,
}

/// Response body for remove (POST /collections/:name/remove)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of documents deleted
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /collections/:name/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub name: String,
    /// Number of live documents
    pub documents: usize,
    /// Number of declared indexes
    pub indexes: usize,
    /// Lookups that found something
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Documents purged by TTL expiry
    pub expired: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from collection statistics
    pub fn new(name: impl Into<String>, stats: &CollectionStats) -> Self {
        Self {
            name: name.into(),
            documents: stats.documents,
            indexes: stats.indexes,
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
