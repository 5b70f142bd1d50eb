//! Verifier configuration.
//!
//! Object hashes only cross-verify with a service that uses the identical
//! redaction prefix. Deployments that talk to a service with a non-standard
//! prefix override it through the environment or by explicit construction.

use crate::error::ConfigError;
use crate::objecthash::{ObjectHasher, REDACTED_PREFIX};

/// Environment variable overriding the redaction prefix.
pub const REDACTION_PREFIX_VAR: &str = "VDS_REDACTION_PREFIX";

/// Configuration shared by all verification paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Prefix marking a string as a redacted sub-object hash. Empty disables
    /// redaction passthrough.
    pub redaction_prefix: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            redaction_prefix: REDACTED_PREFIX.to_string(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `VDS_REDACTION_PREFIX` (default: `***REDACTED*** Hash: `)
    pub fn from_env() -> Result<Self, ConfigError> {
        let redaction_prefix = match std::env::var(REDACTION_PREFIX_VAR) {
            Ok(raw) => validate_prefix(REDACTION_PREFIX_VAR, raw)?,
            Err(std::env::VarError::NotPresent) => REDACTED_PREFIX.to_string(),
            Err(std::env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::InvalidValue {
                    var: REDACTION_PREFIX_VAR.to_string(),
                    reason: "not valid unicode".to_string(),
                })
            }
        };
        tracing::debug!(prefix = %redaction_prefix, "loaded verifier configuration");
        Ok(Self { redaction_prefix })
    }

    /// Build an object hasher bound to this configuration.
    pub fn object_hasher(&self) -> ObjectHasher {
        ObjectHasher::new(self.redaction_prefix.clone())
    }
}

fn validate_prefix(var: &str, raw: String) -> Result<String, ConfigError> {
    if raw.chars().any(char::is_control) {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: "contains control characters".to_string(),
        });
    }
    Ok(raw)
}
