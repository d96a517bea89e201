//! Issuance metadata
//!
//! Project display fields carried on-ledger with the issuance. Serialized
//! to compact JSON and embedded as a size-bounded binary blob; the ledger
//! caps the field at 1024 bytes.

use serde::{Deserialize, Serialize};

/// Ledger limit for the metadata blob, in bytes
pub const MAX_METADATA_BYTES: usize = 1024;

/// Metadata encoding errors
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metadata too large: {0} bytes (limit {MAX_METADATA_BYTES})")]
    TooLarge(usize),
}

/// Display and reference fields for a tokenized funding project
///
/// Immutable once the issuance validates; only the outstanding amount of
/// the token changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Reference to the funding project in the account system
    pub project_ref: String,

    /// Token ticker symbol (e.g. "SOLAR")
    pub ticker: String,

    /// Token display name
    pub name: String,

    /// Asset classification (e.g. "real-estate", "infrastructure")
    pub asset_class: String,

    /// Free-form project description
    pub description: String,
}

impl ProjectMetadata {
    /// Serialize to the compact binary form embedded in the transaction
    ///
    /// Compact JSON, no whitespace. Enforces the ledger's size limit.
    pub fn encode(&self) -> Result<Vec<u8>, MetadataError> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_METADATA_BYTES {
            return Err(MetadataError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    /// Decode a metadata blob read back from the ledger
    pub fn decode(bytes: &[u8]) -> Result<Self, MetadataError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProjectMetadata {
        ProjectMetadata {
            project_ref: "proj-001".to_string(),
            ticker: "SOLAR".to_string(),
            name: "Solar Farm Alpha".to_string(),
            asset_class: "infrastructure".to_string(),
            description: "Fractional ownership of a 5MW solar installation".to_string(),
        }
    }

    #[test]
    fn encode_round_trips() {
        let metadata = sample();
        let bytes = metadata.encode().unwrap();
        assert_eq!(ProjectMetadata::decode(&bytes).unwrap(), metadata);
    }

    #[test]
    fn encoding_is_compact() {
        let bytes = sample().encode().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains('\n'));
        assert!(!text.contains(": "));
    }

    #[test]
    fn oversized_metadata_is_rejected() {
        let mut metadata = sample();
        metadata.description = "x".repeat(MAX_METADATA_BYTES);
        assert!(matches!(
            metadata.encode(),
            Err(MetadataError::TooLarge(_))
        ));
    }
}
