//! Payload structure
//!
//! The incoming record: required title and data tree, optional description
//! and source/type identifiers, plus system-assigned id and timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::security;

/// Longest sanitized-title prefix embedded in a generated filename
const TITLE_PREFIX_LENGTH: usize = 32;

/// Fallback filename prefix when a title cannot be sanitized
pub const FALLBACK_NAME_PREFIX: &str = "payload";

/// A submitted payload. Field order here is the field order in the
/// persisted file; empty optional fields are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Free-form business content. `None` (absent) and an empty map are
    /// distinct validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Server-assigned UUID; empty until `ensure_id` runs.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Server-assigned timestamp; `None` until `ensure_timestamp` runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Payload {
    /// Decode a payload from raw request bytes. This is the narrow contract
    /// for the external transport layer.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Payload, ValidationError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ValidationError::InvalidEncoding("payload"))?;
        serde_json::from_str(text).map_err(|e| ValidationError::MalformedPayload(e.to_string()))
    }

    /// Assign a fresh UUID if none is set. Idempotent.
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
    }

    /// Assign the current UTC time if no timestamp is set. Idempotent.
    pub fn ensure_timestamp(&mut self) {
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
    }

    /// Base filename for this payload:
    /// `YYYY-MM-DD_HH-MM-SS_<id>_<sanitized title prefix>.json`.
    pub fn file_name(&self) -> String {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let title_prefix = match security::sanitize_name(&self.title) {
            Ok(name) => security::truncate_at_boundary(&name, TITLE_PREFIX_LENGTH).to_string(),
            Err(_) => FALLBACK_NAME_PREFIX.to_string(),
        };
        format!(
            "{}_{}_{}.json",
            timestamp.format("%Y-%m-%d_%H-%M-%S"),
            self.id,
            title_prefix
        )
    }

    /// One-line JSON summary for logging: metadata and top-level data keys
    /// only. Data values are user-submitted and never logged.
    pub fn log_summary(&self) -> String {
        let data_keys: Vec<&str> = self
            .data
            .as_ref()
            .map(|d| d.keys().map(String::as_str).collect())
            .unwrap_or_default();
        serde_json::json!({
            "id": self.id,
            "title": self.title,
            "source": self.source,
            "type": self.kind,
            "timestamp": self.timestamp,
            "data_keys": data_keys,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> Payload {
        serde_json::from_value(json).expect("payload should deserialize")
    }

    #[test]
    fn test_decode_minimal_payload() {
        let p = Payload::from_json_bytes(br#"{"title":"Hello","data":{"a":1}}"#).unwrap();
        assert_eq!(p.title, "Hello");
        assert_eq!(p.data.as_ref().unwrap()["a"], 1);
        assert!(p.id.is_empty());
        assert!(p.timestamp.is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = Payload::from_json_bytes(&[b'{', 0xff, 0xfe, b'}']).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEncoding("payload")));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = Payload::from_json_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedPayload(_)));
    }

    #[test]
    fn test_metadata_assignment_is_idempotent() {
        let mut p = payload(serde_json::json!({"title": "t", "data": {"a": 1}}));
        p.ensure_id();
        p.ensure_timestamp();
        let id = p.id.clone();
        let ts = p.timestamp;
        p.ensure_id();
        p.ensure_timestamp();
        assert_eq!(p.id, id);
        assert_eq!(p.timestamp, ts);
    }

    #[test]
    fn test_file_name_format() {
        let mut p = payload(serde_json::json!({"title": "My Report", "data": {"a": 1}}));
        p.id = "abc-123".to_string();
        p.timestamp = Some("2024-03-01T10:20:30Z".parse().unwrap());
        assert_eq!(p.file_name(), "2024-03-01_10-20-30_abc-123_My_Report.json");
    }

    #[test]
    fn test_file_name_falls_back_on_unsanitizable_title() {
        let mut p = payload(serde_json::json!({"title": "...", "data": {"a": 1}}));
        p.id = "abc".to_string();
        p.timestamp = Some("2024-03-01T10:20:30Z".parse().unwrap());
        assert_eq!(p.file_name(), "2024-03-01_10-20-30_abc_payload.json");
    }

    #[test]
    fn test_file_name_truncates_long_titles() {
        let mut p = payload(serde_json::json!({"title": "x".repeat(200), "data": {"a": 1}}));
        p.id = "abc".to_string();
        p.timestamp = Some("2024-03-01T10:20:30Z".parse().unwrap());
        let name = p.file_name();
        assert!(name.ends_with(&format!("{}.json", "x".repeat(32))));
    }

    #[test]
    fn test_serialization_omits_empty_optionals() {
        let p = payload(serde_json::json!({"title": "t", "data": {"a": 1}}));
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("description"));
        assert!(!json.contains("source"));
        assert!(!json.contains("\"type\""));
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn test_log_summary_exposes_keys_not_values() {
        let p = payload(serde_json::json!({
            "title": "t",
            "data": {"secret_key": "secret_value"}
        }));
        let summary = p.log_summary();
        assert!(summary.contains("secret_key"));
        assert!(!summary.contains("secret_value"));
    }
}
