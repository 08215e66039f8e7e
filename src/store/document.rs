//! Document Module
//!
//! Schemaless documents, dotted field-path access and value comparison.

use serde_json::{Map, Number, Value};

use crate::error::StorageError;

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// A schemaless record mapping field names to JSON values.
pub type Document = Map<String, Value>;

// == Path Lookup ==
/// Resolves a dotted field path (`"avatar.url"`) against a document.
///
/// Returns `None` when any segment is missing or walks through a non-object.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Sets the value at a dotted field path, creating intermediate objects.
pub fn set_path(doc: &mut Document, path: &str, value: Value) -> Result<(), StorageError> {
    if let Some((parent, leaf)) = parent_mut(doc, path, true)? {
        parent.insert(leaf.to_string(), value);
    }
    Ok(())
}

/// Walks to the object holding the last segment of `path`.
///
/// With `create`, missing intermediate objects are inserted; otherwise a
/// missing segment yields `Ok(None)`. Walking through a scalar is an error.
pub(crate) fn parent_mut<'a, 'p>(
    doc: &'a mut Document,
    path: &'p str,
    create: bool,
) -> Result<Option<(&'a mut Document, &'p str)>, StorageError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    let leaf = match segments.pop() {
        Some(leaf) => leaf,
        None => return Err(StorageError::InvalidPath(path.to_string())),
    };

    let mut current = doc;
    for segment in segments {
        if create && !current.contains_key(segment) {
            current.insert(segment.to_string(), Value::Object(Map::new()));
        }
        current = match current.get_mut(segment) {
            Some(Value::Object(inner)) => inner,
            Some(_) => return Err(StorageError::InvalidPath(path.to_string())),
            None => return Ok(None),
        };
    }
    Ok(Some((current, leaf)))
}

// == Projection ==
/// Returns a copy of the document without its identifier.
pub fn without_id(doc: &Document) -> Document {
    let mut projected = doc.clone();
    projected.remove(ID_FIELD);
    projected
}

// == Comparison ==
/// Numeric value in a form shared by integers and integral floats.
#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberKey {
    Int(i128),
    Float(f64),
}

/// 2^64, the first float past every `u64`.
const INTEGRAL_FLOAT_LIMIT: f64 = 18_446_744_073_709_551_616.0;

impl NumberKey {
    fn of(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return NumberKey::Int(i128::from(i));
        }
        if let Some(u) = n.as_u64() {
            return NumberKey::Int(i128::from(u));
        }
        let f = n.as_f64().unwrap_or(f64::NAN);
        // Covers -0.0, which folds into 0.
        if f.fract() == 0.0 && f.abs() < INTEGRAL_FLOAT_LIMIT {
            NumberKey::Int(f as i128)
        } else {
            NumberKey::Float(f)
        }
    }

    fn write(self, out: &mut String) {
        match self {
            NumberKey::Int(i) => out.push_str(&i.to_string()),
            NumberKey::Float(f) => out.push_str(&f.to_string()),
        }
    }
}

/// Deep equality where numbers compare by numeric value (`1 == 1.0`).
///
/// Integers compare exactly, so ids past 2^53 stay distinct.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => NumberKey::of(x) == NumberKey::of(y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Canonical string for a value; two values share a key iff `values_equal`.
pub fn index_key(value: &Value) -> String {
    let mut key = String::new();
    write_key(value, &mut key);
    key
}

fn write_key(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            out.push('#');
            NumberKey::of(n).write(out);
        }
        Value::String(s) => {
            out.push_str(&Value::String(s.clone()).to_string());
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_key(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, k) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_key(&map[k], out);
            }
            out.push('}');
        }
    }
}
