//! Error types for bucket operations

use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::{delete_object::DeleteObjectError, put_object::PutObjectError},
};
use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur during bucket operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    /// The request never completed (connection, DNS, TLS or timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials were rejected or lack permission on the bucket
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The configured bucket does not exist
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Any other S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BucketError {
    /// Short label for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::AccessDenied(_) => "access_denied",
            Self::BucketNotFound(_) => "bucket_not_found",
            Self::UpstreamError(_) => "upstream",
            Self::S3Error(_) => "s3",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    fn classify<E>(error: &SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let detail = DisplayErrorContext(error).to_string();

        match error {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => Self::Network(detail),
            SdkError::ResponseError(_) => Self::UpstreamError(detail),
            SdkError::ServiceError(service_err) => {
                let status = service_err.raw().status().as_u16();
                // Error codes take precedence over the status
                match (service_err.err().code(), status) {
                    (Some("NoSuchBucket"), _) => Self::BucketNotFound(detail),
                    (
                        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"),
                        _,
                    )
                    | (_, 403) => Self::AccessDenied(detail),
                    (None, 404) => Self::BucketNotFound(detail),
                    (_, 500..=599) => Self::UpstreamError(detail),
                    _ => Self::S3Error(detail),
                }
            }
            _ => Self::S3Error(detail),
        }
    }
}

impl From<SdkError<PutObjectError>> for BucketError {
    fn from(error: SdkError<PutObjectError>) -> Self {
        Self::classify(&error)
    }
}

impl From<SdkError<DeleteObjectError>> for BucketError {
    fn from(error: SdkError<DeleteObjectError>) -> Self {
        Self::classify(&error)
    }
}
