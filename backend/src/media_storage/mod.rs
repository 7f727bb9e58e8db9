//! S3-based image storage operations
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use axum::body::Bytes;
use url::Url;

pub use error::{BucketError, BucketResult};

/// Remote object store receiving uploaded files
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> BucketResult<()>;

    /// Removes the object at `key`
    async fn delete_object(&self, key: &str) -> BucketResult<()>;

    /// Public URL of the object at `key`
    fn public_url(&self, key: &str) -> String;
}

/// Image storage client for S3 operations
pub struct MediaStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    public_base_url: Url,
}

impl MediaStorage {
    /// Creates a new media storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for image storage
    /// * `public_base_url` - URL prefix under which objects of the bucket are served
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String, public_base_url: Url) -> Self {
        Self {
            s3_client,
            bucket_name,
            public_base_url,
        }
    }
}

#[async_trait]
impl ObjectStore for MediaStorage {
    /// Uploads the file in a single `PutObject` call
    ///
    /// # Errors
    ///
    /// Returns the classified `BucketError` if S3 rejects or never answers the request
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> BucketResult<()> {
        let content_length = i64::try_from(body.len())
            .map_err(|_| BucketError::InvalidInput(format!("Object too large: {}", body.len())))?;

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_length(content_length)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await?;

        Ok(())
    }

    /// # Errors
    ///
    /// Returns the classified `BucketError` if the `DeleteObject` call fails
    async fn delete_object(&self, key: &str) -> BucketResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;

        Ok(())
    }

    /// Appends each key segment to the base URL, percent-encoded
    fn public_url(&self, key: &str) -> String {
        let mut url = self.public_base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(key.split('/'));
        }
        url.into()
    }
}
