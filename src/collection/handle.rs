//! Collection Handle Module
//!
//! A named document cache translating single-field queries and updates
//! into storage engine primitives.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::collection::stats::StatsRecorder;
use crate::collection::{CollectionOptions, CollectionStats, Found, Payload};
use crate::error::Result;
use crate::store::{Document, MemoryEngine, Predicate, Projection, Query, StorageEngine, UpdateOp};

// == Collection ==
/// Cheaply cloneable handle to a named collection.
///
/// Clones share the same engine; every operation takes the engine lock
/// once and issues a single engine request.
#[derive(Debug, Clone)]
pub struct Collection {
    name: Arc<str>,
    options: Arc<CollectionOptions>,
    engine: Arc<RwLock<Box<dyn StorageEngine>>>,
    stats: Arc<StatsRecorder>,
}

impl Collection {
    // == Constructor ==
    /// Creates a collection backed by a fresh [`MemoryEngine`].
    pub fn new(name: impl Into<String>, options: CollectionOptions) -> Result<Self> {
        Self::with_engine(name, options, MemoryEngine::new())
    }

    /// Creates a collection over the given engine, declaring the search
    /// indexes and TTL rule from `options`.
    pub fn with_engine<E>(
        name: impl Into<String>,
        options: CollectionOptions,
        mut engine: E,
    ) -> Result<Self>
    where
        E: StorageEngine + 'static,
    {
        let name = name.into();
        for field in &options.search_fields {
            engine.ensure_index(field, None)?;
        }
        if let Some(ttl) = &options.ttl {
            engine.ensure_index(&ttl.field, Some(ttl.as_duration()))?;
        }
        info!(
            "Collection '{}' created: search_fields={:?}, ttl={:?}",
            name, options.search_fields, options.ttl
        );

        let engine: Box<dyn StorageEngine> = Box::new(engine);
        Ok(Self {
            name: name.into(),
            options: Arc::new(options),
            engine: Arc::new(RwLock::new(engine)),
            stats: Arc::new(StatsRecorder::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    // == Add ==
    /// Inserts one or more documents and echoes them with identifiers.
    pub async fn add(&self, payload: impl Into<Payload>) -> Result<Payload> {
        let payload = payload.into();
        let one = payload.is_one();
        let inserted = {
            let mut engine = self.engine.write().await;
            engine.insert(payload.into_documents())?
        };
        debug!("{}: added {} documents", self.name, inserted.len());
        Ok(Payload::shaped(one, inserted))
    }

    // == Get ==
    /// Looks up documents, identifier stripped.
    ///
    /// An equality query yields at most one document, a membership query a
    /// sequence. No match is an empty result, never an error.
    pub async fn get(&self, query: &Query) -> Result<Found> {
        let found = {
            let engine = self.engine.read().await;
            match query.predicate() {
                Predicate::Equals(_) => Found::One(engine.find_one(query, Projection::ExcludeId)?),
                Predicate::In(_) => Found::Many(engine.find(query, Projection::ExcludeId)?),
            }
        };
        self.stats.record_lookup(!found.is_empty());
        Ok(found)
    }

    // == Update ==
    /// Sets each listed field on the targeted documents, leaving other
    /// fields untouched. Returns the number of documents matched.
    pub async fn update(&self, query: &Query, fields: Map<String, Value>) -> Result<usize> {
        self.apply(query, UpdateOp::Set(fields)).await
    }

    /// Overwrites the targeted documents, keeping their identifiers.
    pub async fn replace(&self, query: &Query, document: Document) -> Result<usize> {
        self.apply(query, UpdateOp::Replace(document)).await
    }

    /// Appends `value` (or each element of an array) to the array at `field`.
    pub async fn push_to_array(
        &self,
        query: &Query,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<usize> {
        self.apply(query, UpdateOp::push(field, value.into())).await
    }

    /// Like [`push_to_array`](Self::push_to_array) but skips values already present.
    pub async fn add_to_set(
        &self,
        query: &Query,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<usize> {
        self.apply(query, UpdateOp::add_to_set(field, value.into())).await
    }

    /// Removes every occurrence of `value` (or of each element of an array)
    /// from the array at `field`.
    pub async fn remove_from_array(
        &self,
        query: &Query,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<usize> {
        self.apply(query, UpdateOp::pull(field, value.into())).await
    }

    /// Runs an update operator against the query's target set.
    pub async fn apply(&self, query: &Query, op: UpdateOp) -> Result<usize> {
        let matched = {
            let mut engine = self.engine.write().await;
            engine.update(query, &op, query.is_multi())?
        };
        debug!("{}: update matched {} documents", self.name, matched);
        Ok(matched)
    }

    // == Remove ==
    /// Deletes the targeted documents. Returns the number removed.
    pub async fn remove(&self, query: &Query) -> Result<usize> {
        let removed = {
            let mut engine = self.engine.write().await;
            engine.remove(query, query.is_multi())?
        };
        debug!("{}: removed {} documents", self.name, removed);
        Ok(removed)
    }

    // == Expiry ==
    /// Purges documents whose TTL has elapsed. Returns the number removed.
    pub async fn purge_expired(&self) -> usize {
        let removed = {
            let mut engine = self.engine.write().await;
            engine.remove_expired(Utc::now())
        };
        self.stats.record_expired(removed);
        removed
    }

    // == Stats ==
    /// Number of live documents.
    pub async fn count(&self) -> usize {
        self.engine.read().await.len()
    }

    pub async fn stats(&self) -> CollectionStats {
        let engine = self.engine.read().await;
        self.stats.snapshot(engine.len(), engine.index_count())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn users() -> Collection {
        let users = Collection::new(
            "Users",
            CollectionOptions::new().with_search_field("username"),
        )
        .unwrap();
        users
            .add(vec![
                doc(json!({"id": 1, "username": "user1", "followers": [16, 278]})),
                doc(json!({"id": 2, "username": "user2", "followers": [16, 278]})),
            ])
            .await
            .unwrap();
        users
    }

    #[tokio::test]
    async fn test_new_declares_indexes() {
        let users = Collection::new(
            "Users",
            CollectionOptions::new()
                .with_search_field("username")
                .with_search_field("id")
                .with_ttl("created", 60),
        )
        .unwrap();

        assert_eq!(users.name(), "Users");
        assert_eq!(users.stats().await.indexes, 3);
    }

    #[tokio::test]
    async fn test_add_single_echoes_id() {
        let users = Collection::new("Users", CollectionOptions::new()).unwrap();
        let inserted = users.add(doc(json!({"id": 1}))).await.unwrap();

        match inserted {
            Payload::One(d) => assert!(d.contains_key("_id")),
            Payload::Many(_) => panic!("expected a single document"),
        }
    }

    #[tokio::test]
    async fn test_get_single_strips_id() {
        let users = users().await;
        let found = users.get(&Query::equals("id", 1)).await.unwrap();

        let user = found.into_one().unwrap();
        assert_eq!(
            Value::Object(user),
            json!({"id": 1, "username": "user1", "followers": [16, 278]})
        );
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let users = users().await;
        let found = users.get(&Query::equals("id", 9)).await.unwrap();
        assert_eq!(found, Found::One(None));
    }

    #[tokio::test]
    async fn test_get_many() {
        let users = users().await;
        let found = users.get(&Query::one_of("id", [1, 2, 3, 1])).await.unwrap();

        let docs = found.into_many();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| !d.contains_key("_id")));
    }

    #[tokio::test]
    async fn test_update_merges() {
        let users = users().await;
        let matched = users
            .update(&Query::equals("id", 1), doc(json!({"bio": "hello"})))
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let user = users.get(&Query::equals("id", 1)).await.unwrap().into_one().unwrap();
        assert_eq!(user["bio"], json!("hello"));
        assert_eq!(user["username"], json!("user1"));
    }

    #[tokio::test]
    async fn test_update_many_hits_all_matches() {
        let users = users().await;
        let matched = users
            .update(&Query::one_of("id", [1, 2]), doc(json!({"verified": true})))
            .await
            .unwrap();
        assert_eq!(matched, 2);

        let verified = users.get(&Query::one_of("verified", [true])).await.unwrap();
        assert_eq!(verified.into_many().len(), 2);
    }

    #[tokio::test]
    async fn test_replace() {
        let users = users().await;
        users
            .replace(&Query::equals("id", 2), doc(json!({"id": 2, "username": "new"})))
            .await
            .unwrap();

        let user = users.get(&Query::equals("id", 2)).await.unwrap().into_one().unwrap();
        assert_eq!(Value::Object(user), json!({"id": 2, "username": "new"}));
    }

    #[tokio::test]
    async fn test_array_operations() {
        let users = users().await;
        let by_id = Query::equals("id", 1);

        users.push_to_array(&by_id, "followers", 888).await.unwrap();
        users.add_to_set(&by_id, "followers", 888).await.unwrap();
        let user = users.get(&by_id).await.unwrap().into_one().unwrap();
        assert_eq!(user["followers"], json!([16, 278, 888]));

        users.remove_from_array(&by_id, "followers", json!([16, 888])).await.unwrap();
        let user = users.get(&by_id).await.unwrap().into_one().unwrap();
        assert_eq!(user["followers"], json!([278]));
    }

    #[tokio::test]
    async fn test_remove() {
        let users = users().await;
        assert_eq!(users.remove(&Query::equals("id", 1)).await.unwrap(), 1);
        assert_eq!(users.remove(&Query::equals("id", 1)).await.unwrap(), 0);
        assert_eq!(users.count().await, 1);
    }

    #[tokio::test]
    async fn test_stats_counts_lookups() {
        let users = users().await;
        users.get(&Query::equals("id", 1)).await.unwrap();
        users.get(&Query::equals("id", 5)).await.unwrap();
        users.get(&Query::one_of("id", [5, 6])).await.unwrap();

        let stats = users.stats().await;
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let options = CollectionOptions::new().with_ttl("created", 1);
        let sessions = Collection::new("Sessions", options).unwrap();
        let stale = Utc::now().timestamp_millis() - 5_000;
        sessions
            .add(vec![
                doc(json!({"sid": "a", "created": stale})),
                doc(json!({"sid": "b", "created": Utc::now().to_rfc3339()})),
            ])
            .await
            .unwrap();

        assert_eq!(sessions.purge_expired().await, 1);
        assert_eq!(sessions.count().await, 1);
        assert_eq!(sessions.stats().await.expired, 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let users = users().await;
        let other = users.clone();
        other.remove(&Query::one_of("id", [1, 2])).await.unwrap();
        assert_eq!(users.count().await, 0);
    }
}
