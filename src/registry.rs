//! Collection Registry
//!
//! Maps collection names to collection handles for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::collection::{Collection, CollectionOptions};
use crate::error::{CacheError, Result};

/// Named collections, shared by clone.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers a collection.
    ///
    /// Fails with [`CacheError::AlreadyExists`] if `name` is taken.
    pub async fn create(&self, name: &str, options: CollectionOptions) -> Result<Collection> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            warn!("Collection '{}' already exists", name);
            return Err(CacheError::AlreadyExists(name.to_string()));
        }

        let collection = Collection::new(name, options)?;
        collections.insert(name.to_string(), collection.clone());
        info!("Registered collection '{}' ({} total)", name, collections.len());
        Ok(collection)
    }

    /// Looks up a collection by name.
    ///
    /// Fails with [`CacheError::NotFound`] if nothing is registered under `name`.
    pub async fn get(&self, name: &str) -> Result<Collection> {
        self.collections
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(name.to_string()))
    }

    /// Registered names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of every registered collection.
    pub async fn collections(&self) -> Vec<Collection> {
        self.collections.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.collections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Query;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = Registry::new();
        registry.create("Users", CollectionOptions::new()).await.unwrap();

        let users = registry.get("Users").await.unwrap();
        assert_eq!(users.name(), "Users");
    }

    #[tokio::test]
    async fn test_get_unregistered_fails() {
        let registry = Registry::new();
        registry.create("Users", CollectionOptions::new()).await.unwrap();

        let err = registry.get("Shares").await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
        assert_eq!(err.to_string(), "No collection registered under 'Shares'");
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let registry = Registry::new();
        registry.create("Users", CollectionOptions::new()).await.unwrap();

        let result = registry.create("Users", CollectionOptions::new()).await;
        assert!(matches!(result, Err(CacheError::AlreadyExists(_))));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_handles_share_documents() {
        let registry = Registry::new();
        let created = registry.create("Users", CollectionOptions::new()).await.unwrap();
        created
            .add(json!({"id": 1}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let fetched = registry.get("Users").await.unwrap();
        let found = fetched.get(&Query::equals("id", 1)).await.unwrap();
        assert!(!found.is_empty());
    }

    #[tokio::test]
    async fn test_names_sorted() {
        let registry = Registry::new();
        assert!(registry.is_empty().await);
        for name in ["Shares", "Users", "Comments"] {
            registry.create(name, CollectionOptions::new()).await.unwrap();
        }
        assert_eq!(registry.names().await, vec!["Comments", "Shares", "Users"]);
        assert_eq!(registry.collections().await.len(), 3);
    }
}
