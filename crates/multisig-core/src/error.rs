//! Error types for multisig operations

use thiserror::Error;

/// Result type alias for multisig operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up a group or signing with it
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or insufficient input
    #[error("{0}")]
    Validation(String),

    /// Unknown participant or account name
    #[error("{0}")]
    NotFound(String),

    /// Ciphertext could not be opened with the presented key material
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Commitment, signer set or transaction mismatch
    #[error("{0}")]
    Consistency(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed encoded data
    #[error("Invalid data: {0}")]
    Deserialization(String),

    /// Cryptographic operation failed
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used when surfacing errors to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Decryption,
    Consistency,
    InvalidData,
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Decryption(_) => ErrorKind::Decryption,
            Error::Consistency(_) => ErrorKind::Consistency,
            Error::Deserialization(_) => ErrorKind::InvalidData,
            Error::Serialization(_)
            | Error::Crypto(_)
            | Error::Storage(_)
            | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller is at fault (400-equivalent)
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<frost_ed25519::Error> for Error {
    fn from(e: frost_ed25519::Error) -> Self {
        Error::Crypto(e.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Deserialization(format!("invalid hex: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::Deserialization("x".into()).kind(), ErrorKind::InvalidData);
        assert!(Error::Decryption("x".into()).is_client_error());
        assert!(!Error::Internal("x".into()).is_client_error());
    }

    #[test]
    fn test_decryption_message() {
        let err = Error::Decryption("ciphertext could not be decrypted".into());
        assert_eq!(
            err.to_string(),
            "decryption error: ciphertext could not be decrypted"
        );
    }
}
