//! Discovery errors
//!
//! Discovery itself never fails: unresolvable types and misplaced
//! configuration are silent omissions. Errors only exist at the edges, when
//! loading an index manifest, parsing a signature or reading properties.

use thiserror::Error;

/// Errors raised while building the inputs of a discovery run
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid type signature '{signature}' at offset {offset}: {reason}")]
    InvalidSignature {
        signature: String,
        offset: usize,
        reason: String,
    },

    #[error("Duplicate class in index: {0}")]
    DuplicateClass(String),

    #[error("Invalid index manifest: {0}")]
    Manifest(String),

    #[error("Invalid properties at line {line}: {reason}")]
    Properties { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoveryError {
    pub(crate) fn signature(
        signature: &str,
        offset: usize,
        reason: impl Into<String>,
    ) -> Self {
        DiscoveryError::InvalidSignature {
            signature: signature.to_string(),
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for discovery input handling
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

impl From<serde_json::Error> for DiscoveryError {
    fn from(e: serde_json::Error) -> Self {
        DiscoveryError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for DiscoveryError {
    fn from(e: serde_yaml::Error) -> Self {
        DiscoveryError::Serialization(e.to_string())
    }
}
