//! # Object Hash — Canonical Digest of Structured Values
//!
//! Reduces any `CanonicalValue` to a single `Hash256` that does not depend
//! on key order, whitespace, or how a number was written. The same digest
//! is computed by the remote service for JSON-formatted entries, so this
//! module must agree with it byte for byte.
//!
//! ## Encoding
//!
//! Each variant is hashed as a one-byte type tag followed by its payload:
//!
//! | Variant | Preimage                                              |
//! |---------|-------------------------------------------------------|
//! | Null    | `n`                                                   |
//! | Bool    | `b1` / `b0`                                           |
//! | Number  | `f` ‖ normalized float (see [`normalize_float`])     |
//! | String  | `u` ‖ NFC(string)                                     |
//! | List    | `l` ‖ hash(e0) ‖ hash(e1) ‖ …                         |
//! | Dict    | `d` ‖ sorted(hash(k) ‖ hash(v) for each pair)         |
//!
//! ## Redaction
//!
//! When a redaction prefix is supplied, any string that begins with it is
//! not user data: the remainder is the hex of a pre-computed hash standing
//! in for a redacted sub-object, and is returned as the hash directly.

use crate::digest::Hash256;
use crate::error::CanonicalizationError;
use crate::value::CanonicalValue;

/// Prefix marking a string as the hash of a redacted sub-object.
pub const REDACTED_PREFIX: &str = "***REDACTED*** Hash: ";

/// Strings longer than this cannot come from a terminating double.
const MAX_FLOAT_REPR: usize = 1000;

/// Upper bound on halvings or doublings during exponent normalization.
/// The full `f64` exponent range spans fewer than 1100 binary orders.
const MAX_EXPONENT_STEPS: u32 = 1100;

/// Object hash without redaction support.
pub fn object_hash(value: &CanonicalValue) -> Result<Hash256, CanonicalizationError> {
    object_hash_with_redaction(value, "")
}

/// Object hash using [`REDACTED_PREFIX`].
pub fn object_hash_with_std_redaction(
    value: &CanonicalValue,
) -> Result<Hash256, CanonicalizationError> {
    object_hash_with_redaction(value, REDACTED_PREFIX)
}

/// Object hash where strings starting with `prefix` are treated as the hex
/// of an already-computed hash. An empty prefix disables redaction.
pub fn object_hash_with_redaction(
    value: &CanonicalValue,
    prefix: &str,
) -> Result<Hash256, CanonicalizationError> {
    match value {
        CanonicalValue::Null => Ok(Hash256::sha256(&[b"n"])),
        CanonicalValue::Bool(true) => Ok(Hash256::sha256(&[b"b1"])),
        CanonicalValue::Bool(false) => Ok(Hash256::sha256(&[b"b0"])),
        CanonicalValue::Number(n) => {
            let repr = normalize_float(*n)?;
            Ok(Hash256::sha256(&[b"f", repr.as_bytes()]))
        }
        CanonicalValue::String(s) => hash_string(s, prefix),
        CanonicalValue::List(items) => {
            let mut buf = Vec::with_capacity(1 + items.len() * 32);
            buf.push(b'l');
            for item in items {
                buf.extend_from_slice(object_hash_with_redaction(item, prefix)?.as_bytes());
            }
            Ok(Hash256::sha256(&[&buf]))
        }
        CanonicalValue::Dict(map) => {
            let mut pairs: Vec<[u8; 64]> = Vec::with_capacity(map.len());
            for (k, v) in map {
                let mut pair = [0u8; 64];
                pair[..32].copy_from_slice(hash_string(k, prefix)?.as_bytes());
                pair[32..].copy_from_slice(object_hash_with_redaction(v, prefix)?.as_bytes());
                pairs.push(pair);
            }
            pairs.sort_unstable();
            let mut buf = Vec::with_capacity(1 + pairs.len() * 64);
            buf.push(b'd');
            for pair in &pairs {
                buf.extend_from_slice(pair);
            }
            Ok(Hash256::sha256(&[&buf]))
        }
    }
}

fn hash_string(s: &str, prefix: &str) -> Result<Hash256, CanonicalizationError> {
    if !prefix.is_empty() {
        if let Some(hex_digest) = s.strip_prefix(prefix) {
            return Hash256::from_hex(hex_digest).map_err(|e| {
                CanonicalizationError::RedactionFormat(format!("{s:?}: {e}"))
            });
        }
    }
    let normalized = normalize_unicode(s);
    Ok(Hash256::sha256(&[b"u", normalized.as_bytes()]))
}

/// Whether strings are NFC-normalized before hashing.
///
/// When this returns `false`, object hashes of non-ASCII strings may not
/// match those computed by a peer that does normalize.
pub fn unicode_normalization_available() -> bool {
    cfg!(feature = "unicode-nfc")
}

#[cfg(feature = "unicode-nfc")]
fn normalize_unicode(s: &str) -> std::borrow::Cow<'_, str> {
    use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

    match is_nfc_quick(s.chars()) {
        IsNormalized::Yes => std::borrow::Cow::Borrowed(s),
        _ => std::borrow::Cow::Owned(s.nfc().collect()),
    }
}

#[cfg(not(feature = "unicode-nfc"))]
fn normalize_unicode(s: &str) -> std::borrow::Cow<'_, str> {
    static WARNED: std::sync::Once = std::sync::Once::new();
    WARNED.call_once(|| {
        tracing::warn!(
            "unicode normalization is disabled; object hashes of non-ASCII strings may not verify"
        );
    });
    std::borrow::Cow::Borrowed(s)
}

/// Normalize a float to the textual form hashed after the `f` tag.
///
/// The form is a sign, the binary exponent `e` such that the mantissa `m`
/// satisfies `0.5 < m <= 1`, a colon, then the bits of `m` after the binary
/// point until the remainder is exactly zero. Zero (of either sign) is
/// `+0:`. Every step is an exact power-of-two scaling, so the result is
/// exact for any finite double.
///
/// # Errors
///
/// `MalformedNumber` for non-finite input, for exponent normalization that
/// exceeds its bound, for a representation of 1000 characters or more, or
/// for a mantissa bit that exceeds one.
pub fn normalize_float(value: f64) -> Result<String, CanonicalizationError> {
    if !value.is_finite() {
        return Err(CanonicalizationError::MalformedNumber(format!(
            "{value} is not finite"
        )));
    }
    if value == 0.0 {
        return Ok("+0:".to_string());
    }

    let mut out = String::with_capacity(64);
    let mut o = value;
    if o < 0.0 {
        out.push('-');
        o = -o;
    } else {
        out.push('+');
    }

    let mut e: i32 = 0;
    let mut steps: u32 = 0;
    while o > 1.0 {
        o /= 2.0;
        e += 1;
        steps += 1;
        if steps > MAX_EXPONENT_STEPS {
            return Err(malformed(value, "exponent normalization did not terminate"));
        }
    }
    while o <= 0.5 {
        o *= 2.0;
        e -= 1;
        steps += 1;
        if steps > MAX_EXPONENT_STEPS {
            return Err(malformed(value, "exponent normalization did not terminate"));
        }
    }
    if o > 1.0 || o <= 0.5 {
        return Err(malformed(value, "mantissa outside (0.5, 1]"));
    }

    out.push_str(&e.to_string());
    out.push(':');

    while o != 0.0 {
        if o >= 1.0 {
            out.push('1');
            o -= 1.0;
        } else {
            out.push('0');
        }
        if o >= 1.0 {
            return Err(malformed(value, "mantissa bit exceeds one"));
        }
        if out.len() >= MAX_FLOAT_REPR {
            return Err(malformed(value, "representation too long"));
        }
        o *= 2.0;
    }
    Ok(out)
}

fn malformed(value: f64, reason: &str) -> CanonicalizationError {
    CanonicalizationError::MalformedNumber(format!("{value}: {reason}"))
}

/// An object hasher bound to one redaction prefix.
///
/// Verification only cross-checks with a peer using the identical prefix,
/// so callers that load the prefix from configuration carry it in this
/// value rather than passing it to every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHasher {
    redaction_prefix: String,
}

impl ObjectHasher {
    /// A hasher using `prefix`; the empty string disables redaction.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            redaction_prefix: prefix.into(),
        }
    }

    /// A hasher using [`REDACTED_PREFIX`].
    pub fn standard() -> Self {
        Self::new(REDACTED_PREFIX)
    }

    /// A hasher with redaction disabled.
    pub fn unredacted() -> Self {
        Self::new("")
    }

    /// The redaction prefix in use.
    pub fn redaction_prefix(&self) -> &str {
        &self.redaction_prefix
    }

    /// Compute the object hash of `value`.
    pub fn hash(&self, value: &CanonicalValue) -> Result<Hash256, CanonicalizationError> {
        object_hash_with_redaction(value, &self.redaction_prefix)
    }

    /// Parse JSON text and compute its object hash.
    pub fn hash_json(&self, json: &str) -> Result<Hash256, CanonicalizationError> {
        self.hash(&CanonicalValue::from_json_str(json)?)
    }

    /// Strip nonce tuples and redacted placeholders from `value`.
    pub fn shed(&self, value: &CanonicalValue) -> Result<CanonicalValue, CanonicalizationError> {
        crate::redaction::shed_redactability(value, &self.redaction_prefix)
    }
}

impl Default for ObjectHasher {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(json: &str) -> String {
        object_hash_with_std_redaction(&CanonicalValue::from_json_str(json).unwrap())
            .unwrap()
            .to_hex()
    }

    // -----------------------------------------------------------------------
    // Golden vectors (common objecthash JSON corpus)
    // -----------------------------------------------------------------------

    #[test]
    fn test_empty_list() {
        assert_eq!(
            hex_of("[]"),
            "acac86c0e609ca906f632b0e2dacccb2b77d22b0621f20ebece1a4835b93f6f0"
        );
    }

    #[test]
    fn test_string_lists() {
        assert_eq!(
            hex_of(r#"["foo"]"#),
            "268bc27d4974d9d576222e4cdbb8f7c6bd6791894098645a19eeca9c102d0964"
        );
        assert_eq!(
            hex_of(r#"["foo", "bar"]"#),
            "32ae896c413cfdc79eec68be9139c86ded8b279238467c216cf2bec4d5f1e4a2"
        );
    }

    #[test]
    fn test_dicts() {
        assert_eq!(
            hex_of("{}"),
            "18ac3e7343f016890c510e93f935261169d9e3f565436429830faf0934f4f8e4"
        );
        assert_eq!(
            hex_of(r#"{"foo": "bar"}"#),
            "7ef5237c3027d6c58100afadf37796b3d351025cf28038280147d42fdc53b960"
        );
    }

    #[test]
    fn test_integer_lists() {
        assert_eq!(
            hex_of("[123]"),
            "2e72db006266ed9cdaa353aa22b9213e8a3c69c838349437c06896b1b34cee36"
        );
        assert_eq!(
            hex_of("[1, 2, 3]"),
            "925d474ac71f6e8cb35dd951d123944f7cabc5cda9a043cf38cd638cc0158db0"
        );
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            hex_of("null"),
            "1b16b1df538ba12dc3f97edbb85caa7050d46c148134290feba80f8236c83db9"
        );
        assert_eq!(
            hex_of("true"),
            "7dc96f776c8423e57a2785489a3f9c43fb6e756876d6ad9a9cac4aa4e72ec193"
        );
        assert_eq!(
            hex_of("false"),
            "c02c0b965e023abee808f2b548d8d5193a8b5229be6f3121a6f16e2d41a449b3"
        );
    }

    #[test]
    fn test_float_goldens() {
        let zero = "60101d8c9cb988411468e38909571f357daa67bff5a7b0a3f9ae295cd4aba33d";
        assert_eq!(hex_of("0.0"), zero);
        assert_eq!(hex_of("-0.0"), zero);
        assert_eq!(
            hex_of("1.0"),
            "f01adc732390ab024d64080e0b173f0ee3a1610efbdd4ce2a13bbf8d9b26c639"
        );
        assert_eq!(
            hex_of("0.5"),
            "62d74c83bbad0021602c96cc0456e83c55ee3a7f8f08d1965fe7ffb201b76014"
        );
        assert_eq!(
            hex_of("123.45"),
            "4183aaf52c55fb69dbb869469e3b1cc5a469523229c9b871ed59b367f722612f"
        );
        assert_eq!(
            hex_of("1.2345"),
            "844e08b1195a93563db4e5d4faa59759ba0e0397caf065f3b6bc0825499754e0"
        );
        assert_eq!(
            hex_of("-10.1234"),
            "59b49ae24998519925833e3ff56727e5d4868aba4ecf4c53653638ebff53c366"
        );
    }

    #[test]
    fn test_entry_document_golden() {
        assert_eq!(
            hex_of(r#"{"name":"adam","ssn":123.45}"#),
            "5a69642bb95dbb117568a39bcd43ccb7162268872a2db28acd9ffdebbc90c5d8"
        );
    }

    #[cfg(feature = "unicode-nfc")]
    #[test]
    fn test_unicode_nfc_composed_and_decomposed_agree() {
        let composed = "f72826713a01881404f34975447bd6edcb8de40b191dc57097ebf4f5417a554d";
        assert_eq!(hex_of("\"\u{03d3}\""), composed);
        assert_eq!(hex_of("\"\u{03d2}\u{0301}\""), composed);
        assert!(unicode_normalization_available());
    }

    // -----------------------------------------------------------------------
    // Float normalization
    // -----------------------------------------------------------------------

    #[test]
    fn test_normalize_float_forms() {
        assert_eq!(normalize_float(0.0).unwrap(), "+0:");
        assert_eq!(normalize_float(-0.0).unwrap(), "+0:");
        assert_eq!(normalize_float(1.0).unwrap(), "+0:1");
        assert_eq!(normalize_float(0.5).unwrap(), "+-1:1");
        assert_eq!(normalize_float(-3.0).unwrap(), "-2:011");
        assert_eq!(normalize_float(0.75).unwrap(), "+0:011");
        assert_eq!(normalize_float(2.0).unwrap(), "+1:1");
    }

    #[test]
    fn test_normalize_float_extremes_terminate() {
        assert!(normalize_float(f64::MAX).is_ok());
        assert!(normalize_float(f64::MIN_POSITIVE).is_ok());
        assert!(normalize_float(5e-324).is_ok());
    }

    #[test]
    fn test_non_finite_numbers_malformed() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = object_hash(&CanonicalValue::Number(n)).unwrap_err();
            assert!(matches!(err, CanonicalizationError::MalformedNumber(_)));
        }
    }

    #[test]
    fn test_integers_and_floats_hash_identically() {
        assert_eq!(hex_of("123"), hex_of("123.0"));
        assert_eq!(hex_of("123.45"), hex_of("123.4500"));
        assert_eq!(hex_of("1e2"), hex_of("100"));
    }

    // -----------------------------------------------------------------------
    // Invariance and sensitivity
    // -----------------------------------------------------------------------

    #[test]
    fn test_key_order_and_whitespace_invariance() {
        assert_eq!(hex_of(r#"{"a":1,"b":2}"#), hex_of(r#"{"b":2,"a":1}"#));
        assert_eq!(
            hex_of(r#"{"name":"adam","ssn":123.45}"#),
            hex_of(r#"{    "ssn":  123.4500 ,   "name" :  "adam"}"#)
        );
    }

    #[test]
    fn test_adjacent_mutations_change_hash() {
        let base = hex_of(r#"{"a":[1,2,3],"b":"x"}"#);
        for mutated in [
            r#"{"a":[1,2,4],"b":"x"}"#,
            r#"{"a":[1,3,2],"b":"x"}"#,
            r#"{"a":[1,2,3],"b":"y"}"#,
            r#"{"a":[1,2,3],"c":"x"}"#,
            r#"{"a":[1,2,3,null],"b":"x"}"#,
            r#"{"a":[1,2,3]}"#,
        ] {
            assert_ne!(base, hex_of(mutated), "collision with {mutated}");
        }
    }

    #[test]
    fn test_empty_list_and_dict_differ() {
        assert_ne!(hex_of("[]"), hex_of("{}"));
        assert_ne!(hex_of(r#"["a"]"#), hex_of(r#"{"a":null}"#));
    }

    // -----------------------------------------------------------------------
    // Redaction passthrough
    // -----------------------------------------------------------------------

    #[test]
    fn test_redacted_string_is_returned_verbatim() {
        let inner = object_hash(&CanonicalValue::from_json_str(r#"["nonce",123.45]"#).unwrap())
            .unwrap();
        let placeholder = format!("{REDACTED_PREFIX}{}", inner.to_hex());
        let h = object_hash_with_std_redaction(&CanonicalValue::String(placeholder)).unwrap();
        assert_eq!(h, inner);
    }

    #[test]
    fn test_redacted_field_preserves_container_hash() {
        let full = r#"{"name":"adam","ssn":["c2FsdA==",123.45]}"#;
        let tuple = CanonicalValue::from_json_str(r#"["c2FsdA==",123.45]"#).unwrap();
        let tuple_hash = object_hash(&tuple).unwrap();
        let redacted = format!(
            r#"{{"name":"adam","ssn":"{REDACTED_PREFIX}{}"}}"#,
            tuple_hash.to_hex()
        );
        assert_eq!(hex_of(full), hex_of(&redacted));
    }

    #[test]
    fn test_prefix_ignored_without_redaction() {
        let s = CanonicalValue::String(format!("{REDACTED_PREFIX}{}", "00".repeat(32)));
        let plain = object_hash(&s).unwrap();
        assert_ne!(plain, Hash256::new([0u8; 32]));
    }

    #[test]
    fn test_malformed_placeholder_rejected() {
        let padded = format!(" {} ", "00".repeat(32));
        for tail in ["not-hex", padded.as_str()] {
            let s = CanonicalValue::String(format!("{REDACTED_PREFIX}{tail}"));
            assert!(matches!(
                object_hash_with_std_redaction(&s),
                Err(CanonicalizationError::RedactionFormat(_))
            ));
        }
    }

    #[test]
    fn test_object_hasher_uses_its_prefix() {
        let custom = ObjectHasher::new("#");
        let s = CanonicalValue::String(format!("#{}", "11".repeat(32)));
        assert_eq!(custom.hash(&s).unwrap(), Hash256::new([0x11u8; 32]));
        assert_ne!(ObjectHasher::standard().hash(&s).unwrap(), Hash256::new([0x11u8; 32]));
        assert_eq!(ObjectHasher::default().redaction_prefix(), REDACTED_PREFIX);
        assert_eq!(ObjectHasher::unredacted().redaction_prefix(), "");
    }
}
