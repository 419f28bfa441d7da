//! RPC error type

use multisig_core::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub const ERR_VALIDATION: &str = "ERR_VALIDATION";
pub const ERR_NOT_FOUND: &str = "ERR_NOT_FOUND";
pub const ERR_DECRYPTION: &str = "ERR_DECRYPTION";
pub const ERR_CONSISTENCY: &str = "ERR_CONSISTENCY";
pub const ERR_INVALID_DATA: &str = "ERR_INVALID_DATA";
pub const ERR_INTERNAL: &str = "ERR_INTERNAL";

/// Error returned to RPC callers
#[derive(Debug, Clone, PartialEq, Eq, ThisError, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: String,
    pub status: u16,
    pub message: String,
}

impl RpcError {
    pub fn new(code: &str, status: u16, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Request parameters did not match the method's request type
    pub fn invalid_params(e: serde_json::Error) -> Self {
        Self::new(ERR_VALIDATION, 400, format!("invalid params: {}", e))
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new(ERR_VALIDATION, 400, format!("unknown method {}", method))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ERR_INTERNAL, 500, message)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

impl From<Error> for RpcError {
    fn from(e: Error) -> Self {
        let code = match e.kind() {
            ErrorKind::Validation => ERR_VALIDATION,
            ErrorKind::NotFound => ERR_NOT_FOUND,
            ErrorKind::Decryption => ERR_DECRYPTION,
            ErrorKind::Consistency => ERR_CONSISTENCY,
            ErrorKind::InvalidData => ERR_INVALID_DATA,
            ErrorKind::Internal => return Self::internal(e.to_string()),
        };
        Self::new(code, 400, e.to_string())
    }
}

impl From<hex::FromHexError> for RpcError {
    fn from(e: hex::FromHexError) -> Self {
        Error::from(e).into()
    }
}

pub type RpcResult<T> = std::result::Result<T, RpcError>;
