//! Query Module
//!
//! Single-field predicates: equality or membership.

use serde_json::{Map, Value};

use crate::error::{CacheError, Result};
use crate::store::document::{get_path, index_key, values_equal, Document};

// == Predicate ==
/// How a field's value is compared.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value; targets at most one document.
    Equals(Value),
    /// Field equals any of the values; targets every match.
    In(Vec<Value>),
}

// == Query ==
/// A single `(field, predicate)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    field: String,
    predicate: Predicate,
}

impl Query {
    /// Builds a query, normalizing an array value into membership.
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        let predicate = match value {
            Value::Array(values) => Predicate::In(values),
            other => Predicate::Equals(other),
        };
        Self {
            field: field.into(),
            predicate,
        }
    }

    /// Equality query on `field`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            predicate: Predicate::Equals(value.into()),
        }
    }

    /// Membership query on `field`.
    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.into(),
            predicate: Predicate::In(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Parses a `{field: value}` mapping. Exactly one key is accepted.
    pub fn from_spec(spec: &Map<String, Value>) -> Result<Self> {
        let (field, value) = single_entry(spec, "query")?;
        Ok(Self::new(field, value))
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// True when the query may affect more than one document.
    pub fn is_multi(&self) -> bool {
        matches!(self.predicate, Predicate::In(_))
    }

    // == Matching ==
    /// Tests a stored document against the predicate.
    ///
    /// An array-valued field matches when the whole array or any of its
    /// elements equals a wanted value.
    pub fn matches(&self, doc: &Document) -> bool {
        let stored = get_path(doc, &self.field);
        match &self.predicate {
            Predicate::Equals(wanted) => value_matches(stored, wanted),
            Predicate::In(wanted) => wanted.iter().any(|w| value_matches(stored, w)),
        }
    }

    /// Index keys that cover every possible match, or `None` when the
    /// predicate also matches missing fields and needs a full scan.
    pub(crate) fn index_keys(&self) -> Option<Vec<String>> {
        let wanted: &[Value] = match &self.predicate {
            Predicate::Equals(value) => std::slice::from_ref(value),
            Predicate::In(values) => values,
        };
        if wanted.iter().any(Value::is_null) {
            return None;
        }
        Some(wanted.iter().map(index_key).collect())
    }
}

fn value_matches(stored: Option<&Value>, wanted: &Value) -> bool {
    match stored {
        None => wanted.is_null(),
        Some(stored @ Value::Array(items)) => {
            values_equal(stored, wanted) || items.iter().any(|item| values_equal(item, wanted))
        }
        Some(stored) => values_equal(stored, wanted),
    }
}

/// Splits a mapping that must hold exactly one `field: value` pair.
pub fn single_entry(spec: &Map<String, Value>, what: &str) -> Result<(String, Value)> {
    let mut entries = spec.iter();
    match (entries.next(), entries.next()) {
        (Some((field, value)), None) => Ok((field.clone(), value.clone())),
        (None, _) => Err(CacheError::InvalidRequest(format!("{} must name one field", what))),
        (Some(_), Some(_)) => Err(CacheError::InvalidRequest(format!(
            "{} must name exactly one field, got {}",
            what,
            spec.len()
        ))),
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

    #[test]
    fn test_scalar_normalizes_to_equals() {
        let q = Query::new("id", json!(1));
        assert_eq!(q.predicate(), &Predicate::Equals(json!(1)));
        assert!(!q.is_multi());
    }

    #[test]
    fn test_array_normalizes_to_in() {
        let q = Query::new("id", json!([1, 2, 3]));
        assert_eq!(q.predicate(), &Predicate::In(vec![json!(1), json!(2), json!(3)]));
        assert!(q.is_multi());
    }

    #[test]
    fn test_from_spec_rejects_multiple_keys() {
        let spec = doc(json!({"id": 1, "username": "user1"}));
        assert!(matches!(Query::from_spec(&spec), Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_spec_rejects_empty() {
        assert!(matches!(
            Query::from_spec(&Map::new()),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_from_spec_single_key() {
        let q = Query::from_spec(&doc(json!({"username": "user1"}))).unwrap();
        assert_eq!(q, Query::equals("username", "user1"));
    }

    #[test]
    fn test_matches_equality_and_membership() {
        let d = doc(json!({"id": 2, "username": "user2"}));
        assert!(Query::equals("id", 2).matches(&d));
        assert!(Query::equals("id", 2.0).matches(&d));
        assert!(!Query::equals("id", 3).matches(&d));
        assert!(Query::one_of("id", [1, 2, 3]).matches(&d));
        assert!(!Query::one_of("id", [4, 5]).matches(&d));
        assert!(!Query::one_of("id", Vec::<i32>::new()).matches(&d));
    }

    #[test]
    fn test_matches_array_field_elements() {
        let d = doc(json!({"followers": [16, 278]}));
        assert!(Query::equals("followers", 16).matches(&d));
        assert!(Query::one_of("followers", [1, 278]).matches(&d));
        assert!(!Query::equals("followers", 17).matches(&d));
    }

    #[test]
    fn test_matches_nested_path() {
        let d = doc(json!({"avatar": {"size": 64}}));
        assert!(Query::equals("avatar.size", 64).matches(&d));
    }

    #[test]
    fn test_null_matches_missing_field() {
        let d = doc(json!({"id": 1}));
        assert!(Query::equals("bio", Value::Null).matches(&d));
        assert!(!Query::equals("bio", "x").matches(&d));
        assert!(Query::equals("bio", Value::Null).index_keys().is_none());
    }
}
