// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow parameter schemas and kwargs normalization.
//!
//! Raw caller kwargs are validated against the workflow's declared schema
//! before any analysis record is created: unknown keys are a hard error,
//! declared defaults fill missing keys, and declared types coerce lenient
//! inputs (numeric strings become numbers). The normalized form is a
//! sorted-key map so two equivalent requests always fingerprint identically.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Normalized parameter set: keys sorted, defaults filled in, values coerced.
pub type Params = BTreeMap<String, Value>;

/// Errors from kwargs validation. Surfaced synchronously to the caller
/// before any analysis record exists.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    UnknownKey(String),
    #[error("parameter {key}: expected {expected}, got {got}")]
    TypeMismatch { key: String, expected: ParamKind, got: String },
    #[error("parameter {0} is required and has no default")]
    Missing(String),
    #[error("kwargs must be an object, got {0}")]
    NotAnObject(String),
}

/// Declared type of a workflow parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Integer,
    Float,
    Boolean,
    Text,
}

crate::simple_display! {
    ParamKind {
        Integer => "integer",
        Float => "float",
        Boolean => "boolean",
        Text => "text",
    }
}

/// One declared parameter: name, type, optional default.
///
/// A field without a default is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamField {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

/// Declared parameter schema of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    fields: Vec<ParamField>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter with a default value.
    pub fn field(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(ParamField { name: name.into(), kind, default: Some(default.into()) });
        self
    }

    /// Declare a required parameter (no default).
    pub fn required(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.fields.push(ParamField { name: name.into(), kind, default: None });
        self
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    fn lookup(&self, key: &str) -> Option<&ParamField> {
        self.fields.iter().find(|f| f.name == key)
    }

    /// Normalize raw kwargs against this schema.
    ///
    /// Unknown keys are rejected, missing keys take their declared default,
    /// and values are coerced to the declared type. The result is canonical:
    /// identical inputs modulo coercion produce byte-identical JSON.
    pub fn normalize(&self, raw: &Params) -> Result<Params, ParamError> {
        for key in raw.keys() {
            if self.lookup(key).is_none() {
                return Err(ParamError::UnknownKey(key.clone()));
            }
        }

        let mut out = Params::new();
        for field in &self.fields {
            let value = match raw.get(&field.name) {
                Some(v) => coerce(&field.name, field.kind, v)?,
                None => match &field.default {
                    Some(d) => coerce(&field.name, field.kind, d)?,
                    None => return Err(ParamError::Missing(field.name.clone())),
                },
            };
            out.insert(field.name.clone(), value);
        }
        Ok(out)
    }
}

/// Coerce a raw value to the declared kind.
fn coerce(key: &str, kind: ParamKind, value: &Value) -> Result<Value, ParamError> {
    let mismatch = || ParamError::TypeMismatch {
        key: key.to_string(),
        expected: kind,
        got: type_name(value).to_string(),
    };

    match kind {
        ParamKind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ParamKind::Float => match value {
            Value::Number(n) => {
                let f = n.as_f64().ok_or_else(mismatch)?;
                Ok(canonical_float(f))
            }
            Value::String(s) => {
                let f = s.trim().parse::<f64>().map_err(|_| mismatch())?;
                Ok(canonical_float(f))
            }
            _ => Err(mismatch()),
        },
        ParamKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        ParamKind::Text => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(mismatch()),
        },
    }
}

/// Whole floats canonicalize to integers so `2.0` and `2` fingerprint alike.
fn canonical_float(f: f64) -> Value {
    if f.fract() == 0.0 && f.is_finite() && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonical JSON encoding of a normalized parameter set.
///
/// `Params` is a BTreeMap and serde_json's default map preserves sorted
/// order, so the encoding is deterministic.
pub fn canonical_json(params: &Params) -> String {
    serde_json::to_string(params).unwrap_or_default()
}

/// Parse raw kwargs from a JSON value. `None` and `null` mean "no kwargs".
pub fn raw_params(value: Option<&Value>) -> Result<Params, ParamError> {
    match value {
        None | Some(Value::Null) => Ok(Params::new()),
        Some(Value::Object(map)) => {
            Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        }
        Some(other) => Err(ParamError::NotAnObject(type_name(other).to_string())),
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
