//! Collection options: search indexes and TTL, fixed at creation.

use serde::{Deserialize, Serialize};

use crate::store::TtlRule;

/// Indexes and expiry declared when a collection is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Fields to index for faster lookup
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Optional expiry rule
    #[serde(default)]
    pub ttl: Option<TtlRule>,
}

impl CollectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_field(mut self, field: impl Into<String>) -> Self {
        self.search_fields.push(field.into());
        self
    }

    pub fn with_ttl(mut self, field: impl Into<String>, duration_secs: u64) -> Self {
        self.ttl = Some(TtlRule::new(field, duration_secs));
        self
    }
}
