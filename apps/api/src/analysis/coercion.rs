//! Response Coercer — turns a raw model completion into a validated analysis object.
//!
//! Steps: locate the JSON objects in the text (models like to wrap them in prose
//! or markdown fences) → parse → walk the schema tree checking presence and type
//! of every declared field. Extra fields are left in place and ignored.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::schema::{FieldKind, FieldSpec};

#[derive(Debug, Error, PartialEq)]
pub enum CoercionError {
    #[error("no JSON object found in completion")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("completion is JSON but not an object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{path}` must be {expected}")]
    WrongType { path: String, expected: &'static str },
}

/// Parses `raw` and validates it against `schema`.
///
/// Every JSON object found in the completion is a candidate; the first one that
/// satisfies the schema is returned as-is, extra fields included. When none
/// does, the error for the first candidate is reported.
pub fn coerce_response(raw: &str, schema: &[FieldSpec]) -> Result<Value, CoercionError> {
    let mut first_error = None;
    for candidate in json_object_candidates(raw)? {
        let Some(object) = candidate.as_object() else {
            continue;
        };
        match validate_object(object, schema, "") {
            Ok(()) => return Ok(candidate),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(CoercionError::NoJsonObject))
}

/// Collects the JSON objects embedded in a completion.
///
/// Fenced code blocks anywhere in the text come first. Then, scanning left to
/// right, one value is parsed from each `{` that is not already inside a parsed
/// object, so stray braces in surrounding prose are skipped rather than fatal.
fn json_object_candidates(raw: &str) -> Result<Vec<Value>, CoercionError> {
    let mut candidates: Vec<Value> = Vec::new();
    let mut first_error = None;

    for block in fenced_blocks(raw) {
        match serde_json::from_str::<Value>(block) {
            Ok(value) if value.is_object() => candidates.push(value),
            Ok(_) => {
                first_error.get_or_insert(CoercionError::NotAnObject);
            }
            Err(e) => {
                first_error.get_or_insert(CoercionError::InvalidJson(e.to_string()));
            }
        }
    }

    let mut pos = 0;
    while let Some(offset) = raw[pos..].find('{') {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                pos = start + stream.byte_offset();
                if !candidates.contains(&value) {
                    candidates.push(value);
                }
                continue;
            }
            Some(Err(e)) => {
                first_error.get_or_insert(CoercionError::InvalidJson(e.to_string()));
            }
            None => {}
        }
        pos = start + 1;
    }

    if candidates.is_empty() {
        Err(first_error.unwrap_or(CoercionError::NoJsonObject))
    } else {
        Ok(candidates)
    }
}

/// Contents of every ``` fenced block, language tag removed. An unclosed
/// fence runs to the end of the text.
fn fenced_blocks(raw: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        match after.find("```") {
            Some(close) => {
                blocks.push(strip_language_tag(&after[..close]));
                rest = &after[close + 3..];
            }
            None => {
                blocks.push(strip_language_tag(after));
                break;
            }
        }
    }
    blocks
}

/// Drops a `json` (or any other) tag on the opening fence line.
fn strip_language_tag(block: &str) -> &str {
    match block.split_once('\n') {
        Some((tag, body)) if !tag.trim_start().starts_with('{') => body.trim(),
        _ => block.trim(),
    }
}

fn validate_object(
    object: &Map<String, Value>,
    fields: &[FieldSpec],
    prefix: &str,
) -> Result<(), CoercionError> {
    for spec in fields {
        let path = if prefix.is_empty() {
            spec.name.to_string()
        } else {
            format!("{prefix}.{}", spec.name)
        };
        let value = object
            .get(spec.name)
            .ok_or_else(|| CoercionError::MissingField(path.clone()))?;
        validate_value(value, spec.kind, &path)?;
    }
    Ok(())
}

fn validate_value(value: &Value, kind: FieldKind, path: &str) -> Result<(), CoercionError> {
    let wrong_type = |expected| CoercionError::WrongType {
        path: path.to_string(),
        expected,
    };

    match kind {
        FieldKind::Text => value.as_str().map(|_| ()).ok_or_else(|| wrong_type("a string")),
        FieldKind::Boolean => value
            .as_bool()
            .map(|_| ())
            .ok_or_else(|| wrong_type("a boolean")),
        FieldKind::TextList => {
            let items = value
                .as_array()
                .ok_or_else(|| wrong_type("an array of strings"))?;
            if items.iter().all(Value::is_string) {
                Ok(())
            } else {
                Err(wrong_type("an array of strings"))
            }
        }
        FieldKind::Object(fields) => {
            let object = value.as_object().ok_or_else(|| wrong_type("an object"))?;
            validate_object(object, fields, path)
        }
        FieldKind::ObjectList(fields) => {
            let items = value
                .as_array()
                .ok_or_else(|| wrong_type("an array of objects"))?;
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                let object = item.as_object().ok_or_else(|| CoercionError::WrongType {
                    path: item_path.clone(),
                    expected: "an object",
                })?;
                validate_object(object, fields, &item_path)?;
            }
            Ok(())
        }
    }
}
