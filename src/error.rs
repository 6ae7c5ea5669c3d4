//! ALFA Faces Vault - Error Types

use thiserror::Error;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    /// Key or nonce material could not be read or written. A missing key
    /// file and a truncated one surface identically: callers only learn
    /// that the key material at this path is unavailable.
    #[error("permission denied (key file unavailable): {0}")]
    KeyFile(String),

    #[error("embedding shape mismatch for \"{name}\": expected dimension {expected}, got {actual}")]
    Shape {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// True when stored ciphertext and key material no longer line up
    /// (stale generation, reordered records, truncated key file).
    pub fn is_corruption(&self) -> bool {
        matches!(self, VaultError::KeyFile(_) | VaultError::Decode(_))
    }
}
