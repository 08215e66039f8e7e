//! Expiry Module
//!
//! TTL rules and timestamp interpretation for document expiry.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == TTL Rule ==
/// Documents whose `field` timestamp is older than `duration` seconds expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlRule {
    /// Field holding the document's timestamp
    pub field: String,
    /// Lifetime in seconds
    pub duration: u64,
}

impl TtlRule {
    pub fn new(field: impl Into<String>, duration: u64) -> Self {
        Self {
            field: field.into(),
            duration,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }
}

// == Timestamp Parsing ==
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Reads a timestamp as Unix milliseconds.
///
/// Accepts an RFC 3339 string, an ISO 8601 string without offset (read as
/// UTC, e.g. `2018-04-19T08:51:57.981149`) or an integer count of
/// milliseconds; anything else is not a timestamp.
pub fn timestamp_ms(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.timestamp_millis())
            .or_else(|_| {
                NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
                    .map(|naive| naive.and_utc().timestamp_millis())
            })
            .ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

// == Is Expired ==
/// Checks a timestamp field against a TTL.
///
/// Boundary condition: expired once `now >= timestamp + ttl`. A missing or
/// non-timestamp value never expires.
pub fn is_expired(value: Option<&Value>, ttl: Duration, now_ms: i64) -> bool {
    let Some(stamp) = value.and_then(timestamp_ms) else {
        return false;
    };
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms >= stamp.saturating_add(ttl_ms)
}

/// Returns the current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_from_rfc3339() {
        let ms = timestamp_ms(&json!("2018-04-19T08:51:57Z")).unwrap();
        assert_eq!(ms, 1_524_127_917_000);
    }

    #[test]
    fn test_timestamp_without_offset_reads_as_utc() {
        let ms = timestamp_ms(&json!("2018-04-19T08:51:57.981149")).unwrap();
        assert_eq!(ms, 1_524_127_917_981);
        assert_eq!(timestamp_ms(&json!("2018-04-19T08:51:57")), Some(1_524_127_917_000));
    }

    #[test]
    fn test_naive_timestamp_expires() {
        let joined = json!("2018-04-19T08:51:57.981149");
        assert!(is_expired(Some(&joined), Duration::from_secs(60), current_timestamp_ms()));
        assert!(!is_expired(Some(&json!("not a date")), Duration::ZERO, current_timestamp_ms()));
    }

    #[test]
    fn test_timestamp_from_millis() {
        assert_eq!(timestamp_ms(&json!(1_524_127_917_000i64)), Some(1_524_127_917_000));
    }

    #[test]
    fn test_non_timestamps() {
        assert_eq!(timestamp_ms(&json!("yesterday")), None);
        assert_eq!(timestamp_ms(&json!(true)), None);
        assert_eq!(timestamp_ms(&json!(1.5)), None);
    }

    #[test]
    fn test_is_expired() {
        let now = current_timestamp_ms();
        let old = json!(now - 5_000);
        let fresh = json!(now);

        assert!(is_expired(Some(&old), Duration::from_secs(1), now));
        assert!(!is_expired(Some(&fresh), Duration::from_secs(1), now));
        assert!(!is_expired(None, Duration::from_secs(1), now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let stamp = json!(now - 1_000);
        assert!(is_expired(Some(&stamp), Duration::from_secs(1), now));
    }

    #[test]
    fn test_ttl_rule_deserialize() {
        let rule: TtlRule = serde_json::from_str(r#"{"field":"created","duration":60}"#).unwrap();
        assert_eq!(rule, TtlRule::new("created", 60));
        assert_eq!(rule.as_duration(), Duration::from_secs(60));
    }
}
