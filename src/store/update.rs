//! Update Module
//!
//! Update operators applied by the storage engine to matched documents.

use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::store::document::{parent_mut, set_path, values_equal, Document, ID_FIELD};

// == Update Operator ==
/// One mutation applied to every targeted document.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Sets each listed field, leaving the others untouched.
    Set(Map<String, Value>),
    /// Appends values to the array at `field`, duplicates allowed.
    Push { field: String, values: Vec<Value> },
    /// Appends values not already present in the array at `field`.
    AddToSet { field: String, values: Vec<Value> },
    /// Removes every occurrence of the values from the array at `field`.
    Pull { field: String, values: Vec<Value> },
    /// Overwrites the whole document, keeping its identifier.
    Replace(Document),
}

impl UpdateOp {
    pub fn push(field: impl Into<String>, value: Value) -> Self {
        UpdateOp::Push {
            field: field.into(),
            values: spread(value),
        }
    }

    pub fn add_to_set(field: impl Into<String>, value: Value) -> Self {
        UpdateOp::AddToSet {
            field: field.into(),
            values: spread(value),
        }
    }

    pub fn pull(field: impl Into<String>, value: Value) -> Self {
        UpdateOp::Pull {
            field: field.into(),
            values: spread(value),
        }
    }

    // == Apply ==
    /// Applies the operator to `doc` in place.
    ///
    /// On error the document may be partially modified; callers apply to a
    /// copy and commit only on success.
    pub fn apply(&self, doc: &mut Document) -> Result<(), StorageError> {
        match self {
            UpdateOp::Set(fields) => {
                for (path, value) in fields {
                    if path == ID_FIELD || path.starts_with("_id.") {
                        return Err(StorageError::ImmutableId(path.clone()));
                    }
                    set_path(doc, path, value.clone())?;
                }
            }
            UpdateOp::Push { field, values } => {
                if let Some(items) = array_at(doc, field, true)? {
                    items.extend(values.iter().cloned());
                }
            }
            UpdateOp::AddToSet { field, values } => {
                if let Some(items) = array_at(doc, field, true)? {
                    for value in values {
                        if !items.iter().any(|item| values_equal(item, value)) {
                            items.push(value.clone());
                        }
                    }
                }
            }
            UpdateOp::Pull { field, values } => {
                if let Some(items) = array_at(doc, field, false)? {
                    items.retain(|item| !values.iter().any(|value| values_equal(item, value)));
                }
            }
            UpdateOp::Replace(replacement) => {
                let original = doc.get(ID_FIELD).cloned();
                match (replacement.get(ID_FIELD), &original) {
                    (Some(new_id), Some(old_id)) if new_id != old_id => {
                        return Err(StorageError::ImmutableId(new_id.to_string()));
                    }
                    _ => {}
                }
                *doc = replacement.clone();
                if let Some(id) = original {
                    doc.insert(ID_FIELD.to_string(), id);
                }
            }
        }
        Ok(())
    }
}

fn spread(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        other => vec![other],
    }
}

/// Array stored at `path`. With `create`, a missing field becomes `[]`.
fn array_at<'a>(
    doc: &'a mut Document,
    path: &str,
    create: bool,
) -> Result<Option<&'a mut Vec<Value>>, StorageError> {
    let (parent, leaf) = match parent_mut(doc, path, create)? {
        Some(found) => found,
        None => return Ok(None),
    };
    if create && !parent.contains_key(leaf) {
        parent.insert(leaf.to_string(), Value::Array(Vec::new()));
    }
    match parent.get_mut(leaf) {
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(StorageError::NotAnArray(path.to_string())),
        None => Ok(None),
    }
}
