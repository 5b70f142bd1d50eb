//! # Redactability Shedding
//!
//! Entries uploaded as redactable JSON are stored by the service with every
//! dict value wrapped in a nonce tuple `[nonce, value]`, so that the hash of
//! a field cannot be guessed before it is redacted. When a reader lacks
//! access to a field, the service replaces the tuple with a placeholder
//! string: the redaction prefix followed by the hex object hash of the tuple.
//!
//! Shedding turns such an entry back into plain data for display:
//! tuples are unwrapped to their value and placeholders are dropped. The
//! result can no longer be hashed to the entry's leaf hash, because the
//! nonces are gone. Hash the original value, display the shed one.

use std::collections::BTreeMap;

use crate::error::CanonicalizationError;
use crate::objecthash::REDACTED_PREFIX;
use crate::value::CanonicalValue;

/// Strip nonce tuples and redacted placeholders using `prefix`.
///
/// # Errors
///
/// `RedactionFormat` if a dict value is neither a 2-element nonce tuple nor
/// a string starting with `prefix`.
pub fn shed_redactability(
    value: &CanonicalValue,
    prefix: &str,
) -> Result<CanonicalValue, CanonicalizationError> {
    match value {
        CanonicalValue::Dict(map) => shed_dict(map, prefix),
        CanonicalValue::List(items) => {
            let shed: Result<Vec<_>, _> = items
                .iter()
                .map(|item| shed_redactability(item, prefix))
                .collect();
            Ok(CanonicalValue::List(shed?))
        }
        other => Ok(other.clone()),
    }
}

/// Strip nonce tuples and redacted placeholders using [`REDACTED_PREFIX`].
pub fn shed_std_redactability(
    value: &CanonicalValue,
) -> Result<CanonicalValue, CanonicalizationError> {
    shed_redactability(value, REDACTED_PREFIX)
}

fn shed_dict(
    map: &BTreeMap<String, CanonicalValue>,
    prefix: &str,
) -> Result<CanonicalValue, CanonicalizationError> {
    let mut out = BTreeMap::new();
    for (key, v) in map {
        match v {
            CanonicalValue::List(tuple) if tuple.len() == 2 => {
                out.insert(key.clone(), shed_redactability(&tuple[1], prefix)?);
            }
            CanonicalValue::String(s) if !prefix.is_empty() && s.starts_with(prefix) => {
                // Redacted field: nothing to show.
            }
            CanonicalValue::List(tuple) => {
                return Err(CanonicalizationError::RedactionFormat(format!(
                    "field {key:?} holds a list of {} elements, expected a nonce tuple",
                    tuple.len()
                )));
            }
            other => {
                return Err(CanonicalizationError::RedactionFormat(format!(
                    "field {key:?} holds a {}, expected a nonce tuple or redacted placeholder",
                    other.kind()
                )));
            }
        }
    }
    Ok(CanonicalValue::Dict(out))
}
