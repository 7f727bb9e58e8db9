//! Image upload flow: policy checks, placeholder record, transfer, link

mod key;
pub mod policy;

use std::sync::Arc;

use axum::{body::Bytes, http::StatusCode};
use flashcards_storage::image::{ImageStorageError, ImageStore};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

pub use key::storage_key;
pub use policy::{check_upload, split_extension, ImageFormat, UploadRejection, MAX_IMAGE_BYTES};

use crate::{
    media_storage::{BucketError, ObjectStore},
    middleware::AuthenticatedUser,
    types::AppError,
};

/// Body returned to the client when the transfer to the object store fails
pub const UPLOAD_FAILED_MESSAGE: &str = "Something went wrong with the file upload";

/// A file received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename supplied with the multipart field
    pub file_name: String,
    /// File content
    pub bytes: Bytes,
}

/// A stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Id of the record holding the link
    pub image_id: Uuid,
    /// Object store key
    pub key: String,
    /// Public URL, also saved on the record
    pub url: String,
}

/// Errors of the upload flow
#[derive(Error, Debug)]
pub enum UploadError {
    /// Refused before anything was stored
    #[error(transparent)]
    Rejected(#[from] UploadRejection),

    /// The object store did not accept the file; the placeholder was removed
    #[error("Transfer to object store failed: {0}")]
    Transfer(BucketError),

    /// The record store failed
    #[error(transparent)]
    Records(#[from] ImageStorageError),
}

/// Stores `upload` for `user`
///
/// A placeholder record is created first so its id can be embedded in the
/// object key. The record leaves this function either with its link set or
/// deleted, also when the returned future is dropped midway.
///
/// # Errors
///
/// - `UploadError::Rejected` if the file fails the upload policy (nothing is stored)
/// - `UploadError::Transfer` if the object store rejects the file
/// - `UploadError::Records` if the record store fails
pub async fn upload_image(
    records: Arc<dyn ImageStore>,
    objects: Arc<dyn ObjectStore>,
    user: &AuthenticatedUser,
    upload: ImageUpload,
) -> Result<UploadedImage, UploadError> {
    let accepted = check_upload(&upload.file_name, upload.bytes.len())?;

    let record = records.create(user.user_id).await?;
    let key = storage_key(&user.username, &record.image_id, &accepted.extension);
    let placeholder = PlaceholderGuard {
        records: records.clone(),
        objects: objects.clone(),
        image_id: record.image_id,
        key: key.clone(),
        armed: true,
    };

    if let Err(err) = objects
        .put_object(&key, upload.bytes, accepted.format.content_type())
        .await
    {
        error!(
            kind = err.kind(),
            image_id = %record.image_id,
            "Upload to object store failed: {err}"
        );
        discard_placeholder(records.as_ref(), &record.image_id).await;
        placeholder.disarm();
        return Err(UploadError::Transfer(err));
    }

    let url = objects.public_url(&key);

    if let Err(err) = records.set_link(&record.image_id, &url).await {
        if let Err(cleanup_err) = objects.delete_object(&key).await {
            error!(key = %key, "Failed to remove orphaned object: {cleanup_err}");
        }
        discard_placeholder(records.as_ref(), &record.image_id).await;
        placeholder.disarm();
        return Err(err.into());
    }
    placeholder.disarm();

    info!(image_id = %record.image_id, "Uploaded: {url}");

    Ok(UploadedImage {
        image_id: record.image_id,
        key,
        url,
    })
}

async fn discard_placeholder(records: &dyn ImageStore, image_id: &Uuid) {
    if let Err(err) = records.delete(image_id).await {
        error!(%image_id, "Failed to delete image placeholder: {err}");
    }
}

/// Removes the placeholder and its object if the upload future is dropped
/// before the record is finalized
struct PlaceholderGuard {
    records: Arc<dyn ImageStore>,
    objects: Arc<dyn ObjectStore>,
    image_id: Uuid,
    key: String,
    armed: bool,
}

impl PlaceholderGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PlaceholderGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!(image_id = %self.image_id, "No runtime to clean up abandoned upload");
            return;
        };

        warn!(image_id = %self.image_id, "Upload abandoned, removing placeholder");
        let records = self.records.clone();
        let objects = self.objects.clone();
        let image_id = self.image_id;
        let key = std::mem::take(&mut self.key);

        handle.spawn(async move {
            discard_placeholder(records.as_ref(), &image_id).await;
            if let Err(err) = objects.delete_object(&key).await {
                error!(key = %key, "Failed to remove abandoned object: {err}");
            }
        });
    }
}

impl From<UploadRejection> for AppError {
    fn from(rejection: UploadRejection) -> Self {
        match rejection {
            UploadRejection::MissingExtension(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "missing_extension",
                "Filename must have an extension",
                false,
            ),
            UploadRejection::UnsupportedFileType(_) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_file_type",
                "Only png, jpg, jpeg, gif and webp images are accepted",
                false,
            ),
            UploadRejection::EmptyFile => Self::new(
                StatusCode::BAD_REQUEST,
                "empty_file",
                "Uploaded file is empty",
                false,
            ),
            UploadRejection::PayloadTooLarge(_) => payload_too_large(),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected(rejection) => rejection.into(),
            UploadError::Transfer(_) => {
                Self::message(StatusCode::INTERNAL_SERVER_ERROR, UPLOAD_FAILED_MESSAGE)
            }
            UploadError::Records(err) => err.into(),
        }
    }
}

pub(crate) const fn payload_too_large() -> AppError {
    AppError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "payload_too_large",
        "Uploaded file exceeds 15 MiB",
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::test_utils::{FakeObjectStore, InMemoryImageStore};

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: 1,
            username: "alice".to_string(),
        }
    }

    fn png(bytes: &'static [u8]) -> ImageUpload {
        ImageUpload {
            file_name: "photo.png".to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[tokio::test]
    async fn test_upload_sets_link_on_record() {
        let records = Arc::new(InMemoryImageStore::default());
        let objects = Arc::new(FakeObjectStore::default());

        let uploaded = upload_image(records.clone(), objects.clone(), &alice(), png(b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(
            uploaded.key,
            format!("uploads/alice/{}.png", uploaded.image_id)
        );
        assert!(uploaded.url.ends_with(&uploaded.key));

        let stored = records.records().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].image_id, uploaded.image_id);
        assert_eq!(stored[0].owner_id, 1);
        assert_eq!(stored[0].link.as_deref(), Some(uploaded.url.as_str()));

        let object = objects.object(&uploaded.key).await.unwrap();
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.body, Bytes::from_static(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_transfer_failure_removes_placeholder() {
        let records = Arc::new(InMemoryImageStore::default());
        let objects = Arc::new(FakeObjectStore::default());
        objects
            .fail_puts_with(BucketError::AccessDenied("denied".to_string()))
            .await;

        let err = upload_image(records.clone(), objects.clone(), &alice(), png(b"data"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Transfer(BucketError::AccessDenied(_))));
        assert!(records.records().await.is_empty());

        let app_err = AppError::from(err);
        assert_eq!(app_err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app_err.code(), None);
    }

    #[tokio::test]
    async fn test_dropped_upload_removes_placeholder() {
        let records = Arc::new(InMemoryImageStore::default());
        let objects = Arc::new(FakeObjectStore::default());
        objects.hang_puts().await;

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            upload_image(records.clone(), objects.clone(), &alice(), png(b"data")),
        )
        .await;
        assert!(result.is_err());

        // Cleanup runs on a spawned task
        for _ in 0..20 {
            if records.records().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(records.records().await.is_empty());
        assert_eq!(objects.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_link_failure_removes_object_and_placeholder() {
        let records = Arc::new(InMemoryImageStore::default());
        records.fail_set_link().await;
        let objects = Arc::new(FakeObjectStore::default());

        let err = upload_image(records.clone(), objects.clone(), &alice(), png(b"data"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Records(_)));
        assert!(records.records().await.is_empty());
        assert_eq!(objects.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_upload_creates_no_record() {
        let records = Arc::new(InMemoryImageStore::default());
        let objects = Arc::new(FakeObjectStore::default());
        let upload = ImageUpload {
            file_name: "photo".to_string(),
            bytes: Bytes::from_static(b"data"),
        };

        let err = upload_image(records.clone(), objects.clone(), &alice(), upload)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Rejected(UploadRejection::MissingExtension(_))
        ));
        assert!(records.records().await.is_empty());
        assert_eq!(objects.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_same_file_twice_creates_two_records() {
        let records = Arc::new(InMemoryImageStore::default());
        let objects = Arc::new(FakeObjectStore::default());

        let first = upload_image(records.clone(), objects.clone(), &alice(), png(b"same"))
            .await
            .unwrap();
        let second = upload_image(records.clone(), objects.clone(), &alice(), png(b"same"))
            .await
            .unwrap();

        assert_ne!(first.image_id, second.image_id);
        assert_ne!(first.key, second.key);
        assert_eq!(records.records().await.len(), 2);
        assert_eq!(objects.object_count().await, 2);
    }

    #[test]
    fn test_rejections_map_to_client_errors() {
        let cases = [
            (
                UploadRejection::MissingExtension("a".to_string()),
                StatusCode::BAD_REQUEST,
                "missing_extension",
            ),
            (
                UploadRejection::UnsupportedFileType("exe".to_string()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_file_type",
            ),
            (UploadRejection::EmptyFile, StatusCode::BAD_REQUEST, "empty_file"),
            (
                UploadRejection::PayloadTooLarge(MAX_IMAGE_BYTES + 1),
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
            ),
        ];

        for (rejection, status, code) in cases {
            let err = AppError::from(rejection);
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), Some(code));
        }
    }
}
