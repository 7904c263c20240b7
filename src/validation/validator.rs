//! Payload validation
//!
//! Walks a payload's fields and nested data tree, enforcing the size, depth,
//! charset, and business-rule limits supplied by the validation policy. The
//! first failing check short-circuits; nothing here touches the filesystem.

use serde_json::{Map, Value};

use crate::config::ValidationPolicy;
use crate::error::ValidationError;
use crate::model::Payload;

/// Maximum length of the source field in bytes
const MAX_SOURCE_LENGTH: usize = 128;
/// Maximum length of the type field in bytes
const MAX_TYPE_LENGTH: usize = 32;
/// Maximum length of an object key in the data tree
const MAX_KEY_LENGTH: usize = 100;

/// Characters never allowed in source/type identifiers
const DANGEROUS_CHARS: [char; 7] = ['<', '>', '"', '\'', '&', ';', '|'];

/// Validate a payload against the policy. Returns the first failure found.
pub fn validate(payload: &Payload, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    validate_structure(payload)?;
    validate_content(payload, policy)?;
    validate_business_rules(payload, policy)?;
    Ok(())
}

/// Validate required fields are present and non-empty.
pub fn validate_structure(payload: &Payload) -> Result<(), ValidationError> {
    if payload.title.trim().is_empty() {
        return Err(ValidationError::MissingField("title"));
    }

    match &payload.data {
        None => Err(ValidationError::MissingField("data")),
        Some(data) if data.is_empty() => Err(ValidationError::EmptyField("data")),
        Some(_) => Ok(()),
    }
}

/// Validate field contents: per-field length and charset limits, then the
/// size and structure of the data tree.
pub fn validate_content(payload: &Payload, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    validate_text_field("title", &payload.title, 1, policy.max_title_length, true)?;

    if !payload.description.is_empty() {
        validate_text_field("description", &payload.description, 0, policy.max_desc_length, false)?;
    }

    if !payload.source.is_empty() {
        validate_text_field("source", &payload.source, 0, MAX_SOURCE_LENGTH, false)?;
    }

    if !payload.kind.is_empty() {
        validate_text_field("type", &payload.kind, 0, MAX_TYPE_LENGTH, false)?;
    }

    if let Some(data) = &payload.data {
        validate_data_field(data, policy)?;
    }

    Ok(())
}

/// Per-field text validation: charset first, then length bounds.
fn validate_text_field(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    required: bool,
) -> Result<(), ValidationError> {
    if required && value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    if contains_unsafe_characters(value) {
        return Err(ValidationError::UnsafeCharacters(field));
    }

    if value.len() < min {
        return Err(ValidationError::FieldTooShort { field, len: value.len(), min });
    }

    if value.len() > max {
        return Err(ValidationError::FieldTooLong { field, len: value.len(), max });
    }

    Ok(())
}

/// NUL or control characters other than tab, newline, and carriage return.
fn contains_unsafe_characters(s: &str) -> bool {
    s.chars()
        .any(|c| (c as u32) < 32 && c != '\t' && c != '\n' && c != '\r')
}

/// Validate the data field: serialized size first, then the recursive walk.
fn validate_data_field(
    data: &Map<String, Value>,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    let serialized = serde_json::to_vec(data)
        .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;

    if serialized.len() as u64 > policy.max_data_size {
        return Err(ValidationError::DataTooLarge {
            size: serialized.len() as u64,
            limit: policy.max_data_size,
        });
    }

    validate_object(data, 0, "data", policy)
}

/// Recursive walk over a value. The depth counter is checked before
/// anything else so attacker-supplied nesting is bounded ahead of any
/// deeper recursion.
fn validate_tree(
    value: &Value,
    depth: usize,
    path: &str,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    if depth > policy.max_nesting_depth {
        return Err(ValidationError::NestingTooDeep {
            at: path.to_string(),
            depth,
            limit: policy.max_nesting_depth,
        });
    }

    match value {
        Value::String(s) => {
            if s.len() > policy.max_string_length {
                return Err(ValidationError::StringTooLong {
                    at: path.to_string(),
                    len: s.len(),
                    limit: policy.max_string_length,
                });
            }
            if contains_unsafe_characters(s) {
                return Err(ValidationError::UnsafeCharacters("data"));
            }
            Ok(())
        }
        Value::Object(map) => validate_object(map, depth, path, policy),
        Value::Array(items) => {
            if items.len() > policy.max_array_length {
                return Err(ValidationError::ArrayTooLong {
                    at: path.to_string(),
                    len: items.len(),
                    limit: policy.max_array_length,
                });
            }
            for (index, item) in items.iter().enumerate() {
                validate_tree(item, depth + 1, &format!("{}[{}]", path, index), policy)?;
            }
            Ok(())
        }
        // Scalars carry no structure to bound.
        Value::Number(_) | Value::Bool(_) | Value::Null => Ok(()),
    }
}

fn validate_object(
    map: &Map<String, Value>,
    depth: usize,
    path: &str,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    if map.len() > policy.max_object_keys {
        return Err(ValidationError::TooManyKeys {
            at: path.to_string(),
            count: map.len(),
            limit: policy.max_object_keys,
        });
    }

    for (key, sub_value) in map {
        if key.len() > MAX_KEY_LENGTH {
            return Err(ValidationError::InvalidKey {
                at: path.to_string(),
                key: key.clone(),
            });
        }
        validate_tree(sub_value, depth + 1, &format!("{}.{}", path, key), policy)?;
    }

    Ok(())
}

/// Business rules: reserved top-level data keys and source/type formats.
fn validate_business_rules(
    payload: &Payload,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    if let Some(data) = &payload.data {
        for key in data.keys() {
            if policy.is_reserved_field(key) {
                return Err(ValidationError::ReservedFieldName(key.clone()));
            }
        }
    }

    if !payload.source.is_empty() {
        validate_source_format(&payload.source)?;
    }

    if !payload.kind.is_empty() {
        validate_type_format(&payload.kind)?;
    }

    Ok(())
}

fn validate_source_format(source: &str) -> Result<(), ValidationError> {
    if source.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidSourceFormat(
            "must not contain whitespace".to_string(),
        ));
    }

    if source.contains("..") {
        return Err(ValidationError::InvalidSourceFormat(
            "must not contain consecutive dots".to_string(),
        ));
    }

    if let Some(c) = source.chars().find(|c| DANGEROUS_CHARS.contains(c)) {
        return Err(ValidationError::InvalidSourceFormat(format!(
            "unsafe character '{}'",
            c
        )));
    }

    Ok(())
}

fn validate_type_format(kind: &str) -> Result<(), ValidationError> {
    if kind.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidTypeFormat(
            "must not contain whitespace".to_string(),
        ));
    }

    if let Some(c) = kind.chars().find(|c| DANGEROUS_CHARS.contains(c)) {
        return Err(ValidationError::InvalidTypeFormat(format!(
            "unsafe character '{}'",
            c
        )));
    }

    if kind.starts_with('.') || kind.ends_with('.') {
        return Err(ValidationError::InvalidTypeFormat(
            "must not start or end with dot".to_string(),
        ));
    }

    if kind.contains("..") {
        return Err(ValidationError::InvalidTypeFormat(
            "must not contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}
