//! Payload validation on top of the `validator` crate.
//!
//! [`validate`] deserializes a JSON payload into a `Validate` type and turns
//! any failure into a `BadRequest` whose `errors` map dotted field paths to
//! messages: `{"title": ["title is required"], "tags[0].name": [...]}`.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::errors::QuillError;

/// Field path → messages.
#[derive(Default, Debug)]
pub struct FieldErrors {
    map: Map<String, Value>,
}

impl FieldErrors {
    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match self.map.get_mut(field) {
            Some(Value::Array(arr)) => arr.push(msg),
            _ => {
                self.map.insert(field.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// First message recorded, used as the headline of the error.
    fn first_message(&self) -> Option<&str> {
        self.map
            .values()
            .find_map(|v| v.as_array().and_then(|a| a.first()).and_then(|m| m.as_str()))
    }

    pub fn into_bad_request(self, fallback: &str) -> anyhow::Error {
        let message = self.first_message().unwrap_or(fallback).to_string();
        QuillError::bad_request(message)
            .with_errors(Value::Object(self.map))
            .into_anyhow()
    }
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "length" => Some("has invalid length"),
        "blank" => Some("must not be empty"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_validation_errors(out: &mut FieldErrors, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let key = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(|m| format!("{key} {m}")))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push_field(&key, msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => push_validation_errors(out, &key, nested),
            ValidationErrorsKind::List(list) => {
                for (idx, nested) in list {
                    push_validation_errors(out, &format!("{key}[{idx}]"), nested);
                }
            }
        }
    }
}

/// Custom `validator` rule: rejects strings that are empty after trimming.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Deserialize `data` into `T` and run its `validator` rules.
pub fn validate<T>(data: &Value, error_message: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| {
        QuillError::bad_request(error_message)
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into_anyhow()
    })?;

    parsed.validate().map_err(|e| {
        let mut out = FieldErrors::default();
        push_validation_errors(&mut out, "", &e);
        out.into_bad_request(error_message)
    })?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use validator::Validate;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Draft {
        #[validate(required(message = "title is required"), custom(function = "not_blank", message = "title must not be empty"))]
        title: Option<String>,

        #[validate(custom(function = "not_blank"))]
        body: Option<String>,
    }

    #[test]
    fn valid_payload_parses() {
        let d: Draft = validate(&json!({"title": "Hi", "body": "<p>x</p>"}), "invalid").unwrap();
        assert_eq!(d.title.as_deref(), Some("Hi"));
    }

    #[test]
    fn missing_field_is_bad_request_with_field_errors() {
        let err = validate::<Draft>(&json!({"body": "x"}), "invalid").unwrap_err();
        let q = QuillError::from_anyhow(&err).unwrap();
        assert_eq!(q.code(), 400);
        assert_eq!(q.message, "title is required");
        assert_eq!(q.errors.as_ref().unwrap()["title"][0], "title is required");
    }

    #[test]
    fn blank_strings_use_friendly_message() {
        let err = validate::<Draft>(&json!({"title": "ok", "body": "   "}), "invalid").unwrap_err();
        let q = QuillError::from_anyhow(&err).unwrap();
        assert_eq!(q.errors.as_ref().unwrap()["body"][0], "body must not be empty");
    }

    #[test]
    fn wrong_types_surface_as_schema_errors() {
        let err = validate::<Draft>(&json!({"title": 5}), "Post payload is invalid").unwrap_err();
        let q = QuillError::from_anyhow(&err).unwrap();
        assert_eq!(q.message, "Post payload is invalid");
        assert!(q.errors.as_ref().unwrap()["_schema"][0].is_string());
    }
}
