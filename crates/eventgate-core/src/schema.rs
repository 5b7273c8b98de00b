//! Structural validation of event payloads for outbound delivery (spec §4.5).
//!
//! Centralizes the shape check the Fan-out Engine runs immediately before
//! signing every outbound delivery, and that the Subscription API's sample
//! endpoint revalidates its synthetic event against.

use crate::event::{validate_event_type, MAX_PAYLOAD_KEYS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field-level violation, in the `{field, message, constraint}` shape
/// required by §4.5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub constraint: String,
}

/// Structural validation failure: a non-empty list of field violations.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("schema validation failed: {} field error(s)", .0.len())]
pub struct SchemaError(pub Vec<FieldError>);

/// Validates outbound event payloads against the fixed schema in §4.5:
/// `event_id`, `event_type`, `timestamp`, `payload`, `metadata`, `created_at`
/// required, no additional top-level properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

const REQUIRED_FIELDS: &[&str] = &[
    "event_id",
    "event_type",
    "timestamp",
    "payload",
    "metadata",
    "created_at",
];

impl SchemaValidator {
    /// Validate a serialized outbound event document.
    pub fn validate(&self, document: &Value) -> Result<(), SchemaError> {
        let mut errors = Vec::new();

        let Some(object) = document.as_object() else {
            errors.push(FieldError {
                field: "$".to_string(),
                message: "document must be a JSON object".to_string(),
                constraint: "type:object".to_string(),
            });
            return Err(SchemaError(errors));
        };

        for key in object.keys() {
            if !REQUIRED_FIELDS.contains(&key.as_str()) {
                errors.push(FieldError {
                    field: key.clone(),
                    message: "additional properties are not allowed".to_string(),
                    constraint: "additionalProperties:false".to_string(),
                });
            }
        }

        self.check_event_id(object, &mut errors);
        self.check_event_type(object, &mut errors);
        self.check_timestamp(object, "timestamp", &mut errors);
        self.check_timestamp(object, "created_at", &mut errors);
        self.check_object_field(object, "payload", Some(MAX_PAYLOAD_KEYS), &mut errors);
        self.check_object_field(object, "metadata", None, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaError(errors))
        }
    }

    fn check_event_id(&self, object: &serde_json::Map<String, Value>, errors: &mut Vec<FieldError>) {
        match object.get("event_id").and_then(Value::as_str) {
            Some(s) if !s.is_empty() && s.len() <= 255 && is_event_id_alphabet(s) => {}
            Some(_) => errors.push(FieldError {
                field: "event_id".to_string(),
                message: "must be 1-255 chars matching [A-Za-z0-9_-]+".to_string(),
                constraint: "pattern:[A-Za-z0-9_-]+".to_string(),
            }),
            None => errors.push(FieldError {
                field: "event_id".to_string(),
                message: "required string field is missing".to_string(),
                constraint: "required".to_string(),
            }),
        }
    }

    fn check_event_type(&self, object: &serde_json::Map<String, Value>, errors: &mut Vec<FieldError>) {
        match object.get("event_type").and_then(Value::as_str) {
            Some(s) if validate_event_type(s).is_ok() => {}
            Some(_) => errors.push(FieldError {
                field: "event_type".to_string(),
                message: "must be 1-255 chars matching [A-Za-z0-9_]+".to_string(),
                constraint: "pattern:[A-Za-z0-9_]+".to_string(),
            }),
            None => errors.push(FieldError {
                field: "event_type".to_string(),
                message: "required string field is missing".to_string(),
                constraint: "required".to_string(),
            }),
        }
    }

    fn check_timestamp(
        &self,
        object: &serde_json::Map<String, Value>,
        field: &str,
        errors: &mut Vec<FieldError>,
    ) {
        match object.get(field).and_then(Value::as_str) {
            Some(s) if crate::Timestamp::from_rfc3339(s).is_ok() => {}
            Some(_) => errors.push(FieldError {
                field: field.to_string(),
                message: "must be an ISO-8601 timestamp".to_string(),
                constraint: "format:iso8601".to_string(),
            }),
            None => errors.push(FieldError {
                field: field.to_string(),
                message: "required string field is missing".to_string(),
                constraint: "required".to_string(),
            }),
        }
    }

    fn check_object_field(
        &self,
        object: &serde_json::Map<String, Value>,
        field: &str,
        max_keys: Option<usize>,
        errors: &mut Vec<FieldError>,
    ) {
        match object.get(field) {
            Some(Value::Object(inner)) => {
                if let Some(max) = max_keys {
                    if inner.len() > max {
                        errors.push(FieldError {
                            field: field.to_string(),
                            message: format!("has {} keys, exceeding the maximum of {max}", inner.len()),
                            constraint: format!("maxProperties:{max}"),
                        });
                    }
                }
            }
            Some(_) => errors.push(FieldError {
                field: field.to_string(),
                message: "must be a JSON object".to_string(),
                constraint: "type:object".to_string(),
            }),
            None => errors.push(FieldError {
                field: field.to_string(),
                message: "required object field is missing".to_string(),
                constraint: "required".to_string(),
            }),
        }
    }
}

fn is_event_id_alphabet(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
