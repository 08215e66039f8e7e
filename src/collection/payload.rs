//! Payload Module
//!
//! One-or-many shapes for documents going into and coming out of a
//! collection.

use serde_json::Value;

use crate::error::{CacheError, Result};
use crate::store::Document;

// == Payload ==
/// Documents handed to `add`, echoed back with identifiers.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    One(Document),
    Many(Vec<Document>),
}

impl Payload {
    /// Accepts a JSON object or an array of objects.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(doc) => Ok(Payload::One(doc)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(doc) => Ok(doc),
                    other => Err(CacheError::InvalidRequest(format!(
                        "Documents must be objects, got {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Payload::Many),
            other => Err(CacheError::InvalidRequest(format!(
                "Expected a document or an array of documents, got {}",
                other
            ))),
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Payload::One(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Payload::One(_) => 1,
            Payload::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Payload::One(doc) => vec![doc],
            Payload::Many(docs) => docs,
        }
    }

    /// Rebuilds the input's shape around engine output.
    pub(crate) fn shaped(one: bool, mut docs: Vec<Document>) -> Self {
        if one && docs.len() == 1 {
            if let Some(doc) = docs.pop() {
                return Payload::One(doc);
            }
        }
        Payload::Many(docs)
    }

    pub fn into_value(self) -> Value {
        match self {
            Payload::One(doc) => Value::Object(doc),
            Payload::Many(docs) => Value::Array(docs.into_iter().map(Value::Object).collect()),
        }
    }
}

impl From<Document> for Payload {
    fn from(doc: Document) -> Self {
        Payload::One(doc)
    }
}

impl From<Vec<Document>> for Payload {
    fn from(docs: Vec<Document>) -> Self {
        Payload::Many(docs)
    }
}

// == Found ==
/// Result of `get`: at most one document for an equality query, a
/// sequence for a membership query.
#[derive(Debug, Clone, PartialEq)]
pub enum Found {
    One(Option<Document>),
    Many(Vec<Document>),
}

impl Found {
    pub fn is_empty(&self) -> bool {
        match self {
            Found::One(doc) => doc.is_none(),
            Found::Many(docs) => docs.is_empty(),
        }
    }

    /// The single document, or the first of many.
    pub fn into_one(self) -> Option<Document> {
        match self {
            Found::One(doc) => doc,
            Found::Many(docs) => docs.into_iter().next(),
        }
    }

    pub fn into_many(self) -> Vec<Document> {
        match self {
            Found::One(doc) => doc.into_iter().collect(),
            Found::Many(docs) => docs,
        }
    }

    /// `null`, an object, or an array.
    pub fn into_value(self) -> Value {
        match self {
            Found::One(doc) => doc.map(Value::Object).unwrap_or(Value::Null),
            Found::Many(docs) => Value::Array(docs.into_iter().map(Value::Object).collect()),
        }
    }
}
