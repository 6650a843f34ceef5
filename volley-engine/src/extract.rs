//! Response value extraction
//!
//! Paths take the form `$.field1.field2`. Every hop but the last must land on
//! a JSON object; the last may hold any value.

use crate::substitution::value_to_string;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure to resolve one path expression
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{0}' must start with '$.'")]
    InvalidPrefix(String),

    #[error("field '{field}' not found in path '{path}'")]
    MissingField { path: String, field: String },

    #[error("cannot read '{field}' in path '{path}': found {found}, expected object")]
    NotAnObject {
        path: String,
        field: String,
        found: &'static str,
    },
}

/// Failure of a whole extraction pass
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response body is {0}, expected a JSON object")]
    NotAnObject(&'static str),
}

/// Variables applied and paths that failed in one extraction pass
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub applied: Vec<(String, String)>,
    pub failures: Vec<(String, PathError)>,
}

impl ExtractionOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walk `document` along a `$.a.b.c` path
pub fn extract_json_path<'v>(document: &'v Value, path: &str) -> Result<&'v Value, PathError> {
    let fields = path
        .strip_prefix("$.")
        .ok_or_else(|| PathError::InvalidPrefix(path.to_string()))?;

    let mut current = document;
    for field in fields.split('.') {
        let object = current.as_object().ok_or_else(|| PathError::NotAnObject {
            path: path.to_string(),
            field: field.to_string(),
            found: kind(current),
        })?;
        current = object.get(field).ok_or_else(|| PathError::MissingField {
            path: path.to_string(),
            field: field.to_string(),
        })?;
    }

    Ok(current)
}

/// Resolve every rule against a raw response body
///
/// Each rule is independent: a failing path is reported in
/// [`ExtractionOutcome::failures`] and the rest still apply. Only a body that
/// is not a JSON object fails the whole pass.
pub fn extract(
    rules: &BTreeMap<String, String>,
    body: &[u8],
) -> Result<ExtractionOutcome, ExtractionError> {
    let document: Value = serde_json::from_slice(body)?;
    if !document.is_object() {
        return Err(ExtractionError::NotAnObject(kind(&document)));
    }

    let mut outcome = ExtractionOutcome::default();
    for (variable, path) in rules {
        match extract_json_path(&document, path) {
            Ok(value) => outcome
                .applied
                .push((variable.clone(), value_to_string(value))),
            Err(e) => outcome.failures.push((variable.clone(), e)),
        }
    }

    Ok(outcome)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
