//! JWT-related error types

use thiserror::Error;

/// Errors that can occur during JWT operations
#[derive(Error, Debug)]
pub enum JwtError {
    /// Token is malformed or its claims are not acceptable
    #[error("Invalid token")]
    InvalidToken,

    /// Signature does not match the signing input
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is past its expiry
    #[error("Token expired")]
    Expired,

    /// Header or payload could not be serialized
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] serde_json::Error),
}
