//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flashcards_storage::image::ImageStorageError;
use schemars::JsonSchema;
use serde::Serialize;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

#[derive(Debug)]
enum ErrorPayload {
    Envelope(ApiErrorResponse),
    /// Serialized as a bare JSON string
    Message(&'static str),
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    payload: ErrorPayload,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            payload: ErrorPayload::Envelope(ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            }),
        }
    }

    /// Create an error whose body is only a message string
    #[must_use]
    pub const fn message(status: StatusCode, msg: &'static str) -> Self {
        Self {
            status,
            payload: ErrorPayload::Message(msg),
        }
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code, if the body is an envelope
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match &self.payload {
            ErrorPayload::Envelope(inner) => Some(inner.error.code),
            ErrorPayload::Message(_) => None,
        }
    }

    const fn log_fields(&self) -> (&'static str, &'static str) {
        match &self.payload {
            ErrorPayload::Envelope(inner) => (inner.error.code, inner.error.message),
            ErrorPayload::Message(msg) => ("message", *msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = self.log_fields();
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {code} - {message}"),
            500..=599 => tracing::error!("Server error: {code} - {message}"),
            _ => {}
        }

        match self.payload {
            ErrorPayload::Envelope(inner) => (self.status, Json(inner)).into_response(),
            ErrorPayload::Message(msg) => (self.status, Json(msg)).into_response(),
        }
    }
}

/// Convert record storage errors to application errors
impl From<ImageStorageError> for AppError {
    fn from(err: ImageStorageError) -> Self {
        tracing::error!("Image storage error: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
            true,
        )
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_envelope_body() {
        let err = AppError::new(StatusCode::BAD_REQUEST, "bad", "Bad things", false);
        assert_eq!(err.code(), Some("bad"));

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({
                "allowRetry": false,
                "error": { "code": "bad", "message": "Bad things" }
            })
        );
    }

    #[tokio::test]
    async fn test_message_body_is_plain_string() {
        let err = AppError::message(StatusCode::INTERNAL_SERVER_ERROR, "Nope");
        assert_eq!(err.code(), None);

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!("Nope"));
    }

    #[test]
    fn test_storage_error_maps_to_internal_error() {
        let err = AppError::from(ImageStorageError::ImageNotFound("abc".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), Some("internal_error"));
    }
}
