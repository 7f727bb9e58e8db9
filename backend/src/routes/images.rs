use std::sync::Arc;

use aide::transform::TransformOperation;
use axum::{Extension, Json};
use flashcards_storage::image::{ImageRecord, ImageStore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    images::{self, ImageUpload, UPLOAD_FAILED_MESSAGE},
    media_storage::ObjectStore,
    middleware::AuthenticatedUser,
    types::AppError,
};

/// Message returned with every successful upload
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Image uploaded successfully";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImageResponse {
    /// Record id (UUID)
    pub image_id: String,
    /// Id of the owning user
    pub owner: i64,
    /// Public URL of the file, empty while an upload is in flight
    pub link: String,
}

impl From<ImageRecord> for ImageResponse {
    fn from(record: ImageRecord) -> Self {
        Self {
            image_id: record.image_id.to_string(),
            owner: record.owner_id,
            link: record.link.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    /// Always "Image uploaded successfully"
    pub message: String,
    /// Public URL of the stored file
    pub image_url: String,
}

/// Lists every image owned by the caller
///
/// # Errors
///
/// Returns a 500 `AppError` if the record store query fails
#[instrument(skip(image_store))]
pub async fn list_images(
    Extension(image_store): Extension<Arc<dyn ImageStore>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let records = image_store.list_by_owner(user.user_id).await?;

    Ok(Json(records.into_iter().map(ImageResponse::from).collect()))
}

/// Stores an uploaded image and returns its public URL
///
/// Expects a `multipart/form-data` body with the file in the `image_file`
/// field. Accepted formats are png, jpg/jpeg, gif and webp up to 15 MiB.
///
/// # Errors
///
/// - 400/413/415 `AppError` envelopes when the file breaks the upload policy
/// - 500 with the body `"Something went wrong with the file upload"` when the
///   object store rejects the file
#[instrument(skip(image_store, media_storage, upload))]
pub async fn upload_image(
    Extension(image_store): Extension<Arc<dyn ImageStore>>,
    Extension(media_storage): Extension<Arc<dyn ObjectStore>>,
    user: AuthenticatedUser,
    upload: ImageUpload,
) -> Result<Json<UploadResponse>, AppError> {
    let uploaded = images::upload_image(image_store, media_storage, &user, upload).await?;

    Ok(Json(UploadResponse {
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        image_url: uploaded.url,
    }))
}

/// Documents the bare-string 500 returned when the transfer fails
pub fn upload_image_docs(op: TransformOperation) -> TransformOperation {
    op.response_with::<500, Json<String>, _>(|res| {
        res.description(
            "Transfer to the object store failed; other server errors use the error envelope",
        )
        .example(UPLOAD_FAILED_MESSAGE.to_string())
    })
}
