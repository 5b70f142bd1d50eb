//! # Canonical Values
//!
//! `CanonicalValue` is the closed set of shapes the object hash understands.
//! Lists and dicts are distinct variants: an empty list and an empty dict
//! hash differently, so any source that collapsed the two into one
//! container type could not be hashed correctly. `serde_json::Value` keeps
//! the distinction and is the primary source of canonical values.
//!
//! Numbers are held as `f64`. JSON does not distinguish integers from
//! floats, and the object hash treats both identically.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// A structured value in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    /// JSON `null`.
    Null,
    /// JSON `true` / `false`.
    Bool(bool),
    /// Any JSON number.
    Number(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered sequence.
    List(Vec<CanonicalValue>),
    /// A mapping with unique string keys.
    Dict(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    /// Parse JSON text, preserving the object/array distinction.
    pub fn from_json_str(json: &str) -> Result<Self, CanonicalizationError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from(value))
    }

    /// Parse JSON bytes.
    pub fn from_json_slice(json: &[u8]) -> Result<Self, CanonicalizationError> {
        let value: Value = serde_json::from_slice(json)?;
        Ok(Self::from(value))
    }

    /// Convert any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedValueType` if the value has no JSON
    /// representation (for example a map keyed by something other than
    /// strings, or a non-finite float).
    pub fn from_serialize(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)
            .map_err(|e| CanonicalizationError::UnsupportedValueType(e.to_string()))?;
        Ok(Self::from(value))
    }

    /// Convert back into a `serde_json::Value` for display or re-encoding.
    ///
    /// Non-finite numbers have no JSON form and become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => json_number(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Dict(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
        }
    }
}

/// Integral values inside the exact `i64`/`u64` range are rendered as JSON
/// integers so that re-serialized entries read the way they were written.
fn json_number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        if n < 0.0 {
            return Value::from(n as i64);
        }
        return Value::from(n as u64);
    }
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl From<Value> for CanonicalValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            // serde_json numbers are always representable as f64 unless the
            // arbitrary_precision feature is enabled, which this crate does not use.
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Dict(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for CanonicalValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CanonicalValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}
