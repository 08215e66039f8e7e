//! Memory Engine Module
//!
//! In-memory storage engine: insertion-ordered documents, hash indexes on
//! declared fields and TTL-driven expiry.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::store::document::{get_path, index_key, without_id, Document, ID_FIELD};
use crate::store::engine::{Projection, StorageEngine, StorageResult};
use crate::store::expiry::{current_timestamp_ms, is_expired};
use crate::store::{Query, UpdateOp};

// == Field Index ==
/// Maps index keys of a field's value to document sequence numbers.
#[derive(Debug, Default)]
struct FieldIndex {
    entries: HashMap<String, BTreeSet<u64>>,
}

impl FieldIndex {
    /// Keys under which a document is reachable: the value itself and,
    /// for arrays, each element.
    fn keys_for(doc: &Document, field: &str) -> Vec<String> {
        match get_path(doc, field) {
            None => Vec::new(),
            Some(value @ Value::Array(items)) => {
                let mut keys: Vec<String> = items.iter().map(index_key).collect();
                keys.push(index_key(value));
                keys
            }
            Some(value) => vec![index_key(value)],
        }
    }

    fn insert(&mut self, field: &str, seq: u64, doc: &Document) {
        for key in Self::keys_for(doc, field) {
            self.entries.entry(key).or_default().insert(seq);
        }
    }

    fn remove(&mut self, field: &str, seq: u64, doc: &Document) {
        for key in Self::keys_for(doc, field) {
            if let Some(seqs) = self.entries.get_mut(&key) {
                seqs.remove(&seq);
                if seqs.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    fn lookup(&self, keys: &[String]) -> BTreeSet<u64> {
        keys.iter()
            .filter_map(|key| self.entries.get(key))
            .flatten()
            .copied()
            .collect()
    }
}

// == Memory Engine ==
/// Storage engine holding documents in memory.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    /// Documents keyed by insertion sequence
    documents: BTreeMap<u64, Document>,
    /// Identifier to sequence number
    ids: HashMap<String, u64>,
    /// Declared indexes by field path
    indexes: HashMap<String, FieldIndex>,
    /// TTL rules by field path
    ttl_rules: BTreeMap<String, Duration>,
    next_seq: u64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_expired_at(&self, doc: &Document, now_ms: i64) -> bool {
        self.ttl_rules
            .iter()
            .any(|(field, ttl)| is_expired(get_path(doc, field), *ttl, now_ms))
    }

    /// Sequence numbers worth testing, in storage order.
    fn candidates(&self, query: &Query) -> Vec<u64> {
        if let (Some(index), Some(keys)) = (self.indexes.get(query.field()), query.index_keys()) {
            return index.lookup(&keys).into_iter().collect();
        }
        self.documents.keys().copied().collect()
    }

    /// Live matches in storage order; stops at the first unless `multi`.
    fn matching(&self, query: &Query, multi: bool) -> Vec<u64> {
        let now_ms = current_timestamp_ms();
        let mut matched = Vec::new();
        for seq in self.candidates(query) {
            let Some(doc) = self.documents.get(&seq) else {
                continue;
            };
            if query.matches(doc) && !self.is_expired_at(doc, now_ms) {
                matched.push(seq);
                if !multi {
                    break;
                }
            }
        }
        matched
    }

    fn project(doc: &Document, projection: Projection) -> Document {
        match projection {
            Projection::Full => doc.clone(),
            Projection::ExcludeId => without_id(doc),
        }
    }

    fn store(&mut self, seq: u64, doc: Document) {
        for (field, index) in self.indexes.iter_mut() {
            index.insert(field, seq, &doc);
        }
        if let Some(Value::String(id)) = doc.get(ID_FIELD) {
            self.ids.insert(id.clone(), seq);
        }
        self.documents.insert(seq, doc);
    }

    fn discard(&mut self, seq: u64) -> Option<Document> {
        let doc = self.documents.remove(&seq)?;
        for (field, index) in self.indexes.iter_mut() {
            index.remove(field, seq, &doc);
        }
        if let Some(Value::String(id)) = doc.get(ID_FIELD) {
            self.ids.remove(id);
        }
        Some(doc)
    }

    /// Assigns or validates the identifier of each document in a batch.
    ///
    /// An identifier held only by an elapsed document is free to reuse.
    fn prepare(&self, docs: Vec<Document>) -> StorageResult<Vec<Document>> {
        let now_ms = current_timestamp_ms();
        let mut seen = HashSet::new();
        let mut prepared = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let id = match doc.get(ID_FIELD) {
                None => Uuid::new_v4().simple().to_string(),
                Some(Value::String(id)) => id.clone(),
                Some(other) => return Err(StorageError::InvalidId(other.to_string())),
            };
            let held = self
                .ids
                .get(&id)
                .and_then(|seq| self.documents.get(seq))
                .is_some_and(|holder| !self.is_expired_at(holder, now_ms));
            if held || !seen.insert(id.clone()) {
                return Err(StorageError::DuplicateId(id));
            }
            doc.insert(ID_FIELD.to_string(), Value::String(id));
            prepared.push(doc);
        }
        Ok(prepared)
    }
}

impl StorageEngine for MemoryEngine {
    fn insert(&mut self, docs: Vec<Document>) -> StorageResult<Vec<Document>> {
        let prepared = self.prepare(docs)?;
        for doc in &prepared {
            // Drop an elapsed holder of the same identifier before reuse.
            let stale = doc
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .and_then(|id| self.ids.get(id))
                .copied();
            if let Some(seq) = stale {
                self.discard(seq);
            }
            let seq = self.next_seq;
            self.next_seq += 1;
            self.store(seq, doc.clone());
        }
        debug!("Inserted {} documents", prepared.len());
        Ok(prepared)
    }

    fn find_one(&self, query: &Query, projection: Projection) -> StorageResult<Option<Document>> {
        Ok(self
            .matching(query, false)
            .first()
            .and_then(|seq| self.documents.get(seq))
            .map(|doc| Self::project(doc, projection)))
    }

    fn find(&self, query: &Query, projection: Projection) -> StorageResult<Vec<Document>> {
        Ok(self
            .matching(query, true)
            .iter()
            .filter_map(|seq| self.documents.get(seq))
            .map(|doc| Self::project(doc, projection))
            .collect())
    }

    fn update(&mut self, query: &Query, op: &UpdateOp, multi: bool) -> StorageResult<usize> {
        let targets = self.matching(query, multi);

        // Apply to copies first so a failure leaves every document untouched.
        let mut updated = Vec::with_capacity(targets.len());
        for seq in &targets {
            if let Some(doc) = self.documents.get(seq) {
                let mut copy = doc.clone();
                op.apply(&mut copy)?;
                updated.push((*seq, copy));
            }
        }

        for (seq, doc) in updated {
            self.discard(seq);
            self.store(seq, doc);
        }
        debug!("Updated {} documents", targets.len());
        Ok(targets.len())
    }

    fn remove(&mut self, query: &Query, multi: bool) -> StorageResult<usize> {
        let targets = self.matching(query, multi);
        let removed = targets
            .into_iter()
            .filter_map(|seq| self.discard(seq))
            .count();
        debug!("Removed {} documents", removed);
        Ok(removed)
    }

    fn ensure_index(&mut self, field: &str, expire_after: Option<Duration>) -> StorageResult<()> {
        if !self.indexes.contains_key(field) {
            let mut index = FieldIndex::default();
            for (seq, doc) in &self.documents {
                index.insert(field, *seq, doc);
            }
            self.indexes.insert(field.to_string(), index);
        }
        if let Some(ttl) = expire_after {
            self.ttl_rules.insert(field.to_string(), ttl);
        }
        Ok(())
    }

    fn remove_expired(&mut self, now: DateTime<Utc>) -> usize {
        if self.ttl_rules.is_empty() {
            return 0;
        }
        let now_ms = now.timestamp_millis();
        let expired: Vec<u64> = self
            .documents
            .iter()
            .filter(|(_, doc)| self.is_expired_at(doc, now_ms))
            .map(|(seq, _)| *seq)
            .collect();

        expired
            .into_iter()
            .filter_map(|seq| self.discard(seq))
            .count()
    }

    fn len(&self) -> usize {
        if self.ttl_rules.is_empty() {
            return self.documents.len();
        }
        let now_ms = current_timestamp_ms();
        self.documents
            .values()
            .filter(|doc| !self.is_expired_at(doc, now_ms))
            .count()
    }

    fn index_count(&self) -> usize {
        self.indexes.len()
    }
}
