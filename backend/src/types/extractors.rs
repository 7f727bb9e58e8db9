//! Custom extractors for request validation

use aide::operation::OperationInput;
use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::StatusCode,
};

use crate::{
    images::{payload_too_large, ImageUpload, MAX_IMAGE_BYTES},
    types::error::AppError,
};

/// Multipart field expected to carry the image
pub const IMAGE_FIELD_NAME: &str = "image_file";

/// Extracts the uploaded file from a `multipart/form-data` body
///
/// The `image_file` field wins; otherwise the first field carrying a filename
/// is used. Reading stops as soon as the file grows past [`MAX_IMAGE_BYTES`].
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|_| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "invalid_content_type",
                "Expected a multipart/form-data body",
                false,
            )
        })?;

        let mut fallback = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(file_name) = field.file_name().map(ToString::to_string) else {
                continue;
            };
            let is_image_field = field.name() == Some(IMAGE_FIELD_NAME);

            if !is_image_field && fallback.is_some() {
                continue;
            }

            let upload = Self {
                file_name,
                bytes: read_limited(field).await?,
            };

            if is_image_field {
                return Ok(upload);
            }
            fallback = Some(upload);
        }

        fallback.ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "missing_file",
                "Request must contain an image_file upload",
                false,
            )
        })
    }
}

async fn read_limited(mut field: Field<'_>) -> Result<Bytes, AppError> {
    let mut buffer = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buffer.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(payload_too_large());
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffer))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return payload_too_large();
    }

    tracing::warn!("Multipart parsing error: {}", err.body_text());
    AppError::new(
        StatusCode::BAD_REQUEST,
        "invalid_multipart",
        "Malformed multipart body",
        false,
    )
}

impl OperationInput for ImageUpload {
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        // Same wire shape as a plain multipart body
        Multipart::operation_input(ctx, operation);
    }
}
