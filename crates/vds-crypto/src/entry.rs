//! # Verifiable Entries
//!
//! Anything that can sit at a leaf of a log implements [`MerkleTreeLeaf`].
//! The leaf hash is what inclusion proofs and audits bind to; how it is
//! derived depends on the format the entry was uploaded in:
//!
//! | Format         | Leaf hash                                      |
//! |----------------|------------------------------------------------|
//! | raw bytes      | `leaf_hash(bytes)`                             |
//! | JSON           | `leaf_hash(object_hash(json))`                 |
//! | redacted JSON  | same as JSON, with redacted placeholders       |
//!
//! JSON and redacted JSON entries share the service's `/xjson` path: the
//! service serves the redactable form and the client decides whether to
//! shed it for display.

use std::borrow::Cow;

use vds_core::{
    CanonicalValue, CanonicalizationError, Hash256, ObjectHasher, VerificationError,
};

use crate::merkle::leaf_hash;

/// A value that can be placed at a leaf of a log.
pub trait MerkleTreeLeaf {
    /// The Merkle tree leaf hash of this value.
    fn leaf_hash(&self) -> Result<Hash256, VerificationError>;
}

/// An already-computed leaf hash, as returned when an entry is added.
impl MerkleTreeLeaf for Hash256 {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        Ok(*self)
    }
}

impl<T: MerkleTreeLeaf + ?Sized> MerkleTreeLeaf for &T {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        (**self).leaf_hash()
    }
}

impl<T: MerkleTreeLeaf + ?Sized> MerkleTreeLeaf for Box<T> {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        (**self).leaf_hash()
    }
}

// ---------------------------------------------------------------------------
// Entry formats
// ---------------------------------------------------------------------------

/// Opaque bytes, hashed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataEntry(pub Vec<u8>);

impl RawDataEntry {
    pub fn data(&self) -> &[u8] {
        &self.0
    }
}

impl MerkleTreeLeaf for RawDataEntry {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        Ok(leaf_hash(&self.0))
    }
}

/// A JSON document, hashed by its object hash so that formatting and key
/// order do not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonEntry(pub String);

impl JsonEntry {
    pub fn data(&self) -> &str {
        &self.0
    }

    /// Leaf hash under an explicit redaction configuration.
    pub fn leaf_hash_with(&self, hasher: &ObjectHasher) -> Result<Hash256, VerificationError> {
        json_leaf_hash(&self.0, hasher)
    }
}

impl MerkleTreeLeaf for JsonEntry {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        self.leaf_hash_with(&ObjectHasher::standard())
    }
}

/// A JSON document in redactable form: every dict value is a
/// `[nonce, value]` tuple or a redacted placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedJsonEntry(pub String);

impl RedactedJsonEntry {
    /// The document with nonces and redacted fields removed, re-encoded as
    /// JSON.
    pub fn data(&self) -> Result<String, CanonicalizationError> {
        self.data_with(&ObjectHasher::standard())
    }

    pub fn data_with(&self, hasher: &ObjectHasher) -> Result<String, CanonicalizationError> {
        let value = CanonicalValue::from_json_str(&self.0)?;
        let shed = hasher.shed(&value)?;
        Ok(serde_json::to_string(&shed.to_json())?)
    }

    /// The document exactly as served, including nonces and placeholders.
    pub fn redactable_data(&self) -> &str {
        &self.0
    }

    pub fn leaf_hash_with(&self, hasher: &ObjectHasher) -> Result<Hash256, VerificationError> {
        json_leaf_hash(&self.0, hasher)
    }
}

impl MerkleTreeLeaf for RedactedJsonEntry {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        self.leaf_hash_with(&ObjectHasher::standard())
    }
}

fn json_leaf_hash(json: &str, hasher: &ObjectHasher) -> Result<Hash256, VerificationError> {
    let digest = hasher.hash_json(json)?;
    Ok(leaf_hash(digest.as_bytes()))
}

// ---------------------------------------------------------------------------
// Fetched entries
// ---------------------------------------------------------------------------

/// An entry fetched from the service, typed by the format it was read in.
///
/// Auditors receive this type when entries are built with
/// [`EntryFormat::entry_from_bytes`], so they can inspect content as well as
/// hash it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiableEntry {
    Raw(RawDataEntry),
    Json(JsonEntry),
    RedactedJson(RedactedJsonEntry),
}

impl VerifiableEntry {
    /// The format this entry was read in.
    pub fn format(&self) -> EntryFormat {
        match self {
            Self::Raw(_) => EntryFormat::Raw,
            Self::Json(_) => EntryFormat::Json,
            Self::RedactedJson(_) => EntryFormat::RedactedJson,
        }
    }

    /// The entry content as a reader sees it. Redacted JSON is returned
    /// with nonces and redacted fields removed.
    ///
    /// # Errors
    ///
    /// Shedding a redacted JSON entry fails on malformed JSON or a dict
    /// value that is neither a nonce tuple nor a placeholder.
    pub fn data(&self) -> Result<Cow<'_, [u8]>, CanonicalizationError> {
        self.data_with(&ObjectHasher::standard())
    }

    pub fn data_with(
        &self,
        hasher: &ObjectHasher,
    ) -> Result<Cow<'_, [u8]>, CanonicalizationError> {
        match self {
            Self::Raw(entry) => Ok(Cow::Borrowed(entry.data())),
            Self::Json(entry) => Ok(Cow::Borrowed(entry.data().as_bytes())),
            Self::RedactedJson(entry) => Ok(Cow::Owned(entry.data_with(hasher)?.into_bytes())),
        }
    }

    /// Leaf hash under an explicit redaction configuration. Raw entries
    /// ignore it.
    pub fn leaf_hash_with(&self, hasher: &ObjectHasher) -> Result<Hash256, VerificationError> {
        match self {
            Self::Raw(entry) => entry.leaf_hash(),
            Self::Json(entry) => entry.leaf_hash_with(hasher),
            Self::RedactedJson(entry) => entry.leaf_hash_with(hasher),
        }
    }
}

impl MerkleTreeLeaf for VerifiableEntry {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        self.leaf_hash_with(&ObjectHasher::standard())
    }
}

// ---------------------------------------------------------------------------
// Format selection
// ---------------------------------------------------------------------------

/// How entries of a log are encoded when fetched from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryFormat {
    Raw,
    Json,
    RedactedJson,
}

impl EntryFormat {
    /// Path suffix the service uses for this format.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            Self::Raw => "",
            Self::Json | Self::RedactedJson => "/xjson",
        }
    }

    /// Wrap fetched entry bytes in the entry type for this format.
    ///
    /// # Errors
    ///
    /// `UnsupportedValueType` if a JSON format is selected and the bytes
    /// are not UTF-8. The JSON itself is parsed lazily, when the leaf hash
    /// or data is requested.
    pub fn entry_from_bytes(
        &self,
        bytes: Vec<u8>,
    ) -> Result<VerifiableEntry, CanonicalizationError> {
        Ok(match self {
            Self::Raw => VerifiableEntry::Raw(RawDataEntry(bytes)),
            Self::Json => VerifiableEntry::Json(JsonEntry(utf8(bytes)?)),
            Self::RedactedJson => VerifiableEntry::RedactedJson(RedactedJsonEntry(utf8(bytes)?)),
        })
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, CanonicalizationError> {
    String::from_utf8(bytes).map_err(|e| {
        CanonicalizationError::UnsupportedValueType(format!("entry is not UTF-8: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vds_core::{object_hash, REDACTED_PREFIX};

    #[test]
    fn test_raw_entry_leaf_hash() {
        let entry = RawDataEntry(Vec::new());
        assert_eq!(
            entry.leaf_hash().unwrap().to_hex(),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
        assert_eq!(entry.data(), b"");
    }

    #[test]
    fn test_json_entry_ignores_formatting() {
        let a = JsonEntry(r#"{"name":"adam","ssn":123.45}"#.to_string());
        let b = JsonEntry(r#"{    "ssn":  123.4500 ,   "name" :  "adam"}"#.to_string());
        assert_eq!(a.leaf_hash().unwrap(), b.leaf_hash().unwrap());

        let digest = Hash256::from_hex(
            "5a69642bb95dbb117568a39bcd43ccb7162268872a2db28acd9ffdebbc90c5d8",
        )
        .unwrap();
        assert_eq!(a.leaf_hash().unwrap(), leaf_hash(digest.as_bytes()));
    }

    #[test]
    fn test_json_entry_rejects_invalid_json() {
        let err = JsonEntry("{not json".to_string()).leaf_hash().unwrap_err();
        assert!(matches!(
            err,
            VerificationError::Canonicalization(CanonicalizationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_redacted_entry_hashes_like_unredacted_and_sheds() {
        let stored = r#"{"name":["n1","adam"],"ssn":["n2",123.45]}"#;
        let tuple = CanonicalValue::from_json_str(r#"["n2",123.45]"#).unwrap();
        let served = format!(
            r#"{{"name":["n1","adam"],"ssn":"{REDACTED_PREFIX}{}"}}"#,
            object_hash(&tuple).unwrap().to_hex()
        );

        let full = RedactedJsonEntry(stored.to_string());
        let redacted = RedactedJsonEntry(served.clone());
        assert_eq!(full.leaf_hash().unwrap(), redacted.leaf_hash().unwrap());

        assert_eq!(full.data().unwrap(), r#"{"name":"adam","ssn":123.45}"#);
        assert_eq!(redacted.data().unwrap(), r#"{"name":"adam"}"#);
        assert_eq!(redacted.redactable_data(), served);
    }

    #[test]
    fn test_custom_prefix_changes_placeholder_handling() {
        let placeholder = format!("@@{}", "00".repeat(32));
        let entry = RedactedJsonEntry(format!(r#"{{"a":"{placeholder}"}}"#));
        let custom = ObjectHasher::new("@@");

        assert_eq!(entry.data_with(&custom).unwrap(), "{}");
        assert!(entry.data().is_err());
        assert_ne!(
            entry.leaf_hash_with(&custom).unwrap(),
            entry.leaf_hash().unwrap()
        );
    }

    #[test]
    fn test_entry_format_selects_entry_type() {
        assert_eq!(EntryFormat::Raw.path_suffix(), "");
        assert_eq!(EntryFormat::Json.path_suffix(), "/xjson");
        assert_eq!(EntryFormat::RedactedJson.path_suffix(), "/xjson");

        let json = br#"{"k":"v"}"#.to_vec();
        let raw = EntryFormat::Raw.entry_from_bytes(json.clone()).unwrap();
        let parsed = EntryFormat::Json.entry_from_bytes(json.clone()).unwrap();
        assert_eq!(raw.leaf_hash().unwrap(), leaf_hash(&json));
        assert_eq!(
            parsed.leaf_hash().unwrap(),
            JsonEntry(r#"{"k":"v"}"#.to_string()).leaf_hash().unwrap()
        );

        let err = EntryFormat::Json.entry_from_bytes(vec![0xff, 0xfe]).err();
        assert!(matches!(
            err,
            Some(CanonicalizationError::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn test_fetched_entry_exposes_content() {
        let raw = EntryFormat::Raw.entry_from_bytes(vec![0, 1, 2]).unwrap();
        assert_eq!(raw.format(), EntryFormat::Raw);
        assert_eq!(raw.data().unwrap().as_ref(), &[0u8, 1, 2][..]);

        let json = EntryFormat::Json
            .entry_from_bytes(br#"{"k": "v"}"#.to_vec())
            .unwrap();
        assert_eq!(json.data().unwrap().as_ref(), br#"{"k": "v"}"#);

        let stored = r#"{"name":["n1","adam"],"ssn":["n2",123.45]}"#;
        let redacted = EntryFormat::RedactedJson
            .entry_from_bytes(stored.as_bytes().to_vec())
            .unwrap();
        assert_eq!(redacted.format(), EntryFormat::RedactedJson);
        assert_eq!(
            redacted.data().unwrap().as_ref(),
            br#"{"name":"adam","ssn":123.45}"#
        );
        assert_eq!(
            redacted.leaf_hash().unwrap(),
            RedactedJsonEntry(stored.to_string()).leaf_hash().unwrap()
        );
    }
}
