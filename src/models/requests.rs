//! Request DTOs for the document cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::collection::CollectionOptions;
use crate::error::Result;
use crate::store::{single_entry, Document, Query};

/// Maximum allowed collection name length in bytes
pub const MAX_NAME_LENGTH: usize = 128;

/// Request body for collection creation (POST /collections)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollectionRequest {
    /// The collection name
    pub name: String,
    /// Search indexes and TTL
    #[serde(default)]
    pub options: CollectionOptions,
}

impl CreateCollectionRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Collection name cannot be empty".to_string());
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Some(format!(
                "Collection name exceeds maximum length of {} characters",
                MAX_NAME_LENGTH
            ));
        }
        None
    }
}

/// Request body carrying only a query (find, remove)
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Single-field `{field: value | [values]}` mapping
    pub query: Map<String, Value>,
}

impl QueryRequest {
    pub fn query(&self) -> Result<Query> {
        Query::from_spec(&self.query)
    }
}

/// Request body for field-level updates (POST /collections/:name/update)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub query: Map<String, Value>,
    /// Fields to set
    pub set: Map<String, Value>,
}

/// Request body for full replacement (POST /collections/:name/replace)
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceRequest {
    pub query: Map<String, Value>,
    /// Replacement document
    pub document: Document,
}

/// Request body for push, add-to-set and pull
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayRequest {
    pub query: Map<String, Value>,
    /// Single `{field: value | [values]}` mapping
    pub values: Map<String, Value>,
}

impl ArrayRequest {
    /// Splits `values` into the target field and its value.
    pub fn target(&self) -> Result<(String, Value)> {
        single_entry(&self.values, "values")
    }
}
