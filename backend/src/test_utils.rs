//! In-memory stand-ins for the record and object stores

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use flashcards_storage::image::{ImageRecord, ImageStorageError, ImageStorageResult, ImageStore};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::media_storage::{BucketError, BucketResult, ObjectStore};

/// Public URL prefix used by [`FakeObjectStore`]
pub const FAKE_PUBLIC_BASE_URL: &str = "https://test-bucket.s3.us-west-2.amazonaws.com";

/// Record store kept in a map
#[derive(Default)]
pub struct InMemoryImageStore {
    records: Mutex<HashMap<Uuid, ImageRecord>>,
    fail_set_link: Mutex<bool>,
}

impl InMemoryImageStore {
    /// Snapshot of every record, oldest first
    pub async fn records(&self) -> Vec<ImageRecord> {
        let mut records: Vec<_> = self.records.lock().await.values().cloned().collect();
        records.sort_by_key(|record| (record.created_at, record.image_id));
        records
    }

    /// Inserts a record as if it had been uploaded earlier
    pub async fn insert(&self, record: ImageRecord) {
        self.records.lock().await.insert(record.image_id, record);
    }

    /// Makes every later `set_link` call fail
    pub async fn fail_set_link(&self) {
        *self.fail_set_link.lock().await = true;
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn create(&self, owner_id: i64) -> ImageStorageResult<ImageRecord> {
        let record = ImageRecord::new(owner_id);
        self.records
            .lock()
            .await
            .insert(record.image_id, record.clone());
        Ok(record)
    }

    async fn set_link(&self, image_id: &Uuid, link: &str) -> ImageStorageResult<()> {
        if *self.fail_set_link.lock().await {
            return Err(ImageStorageError::SerializationError(
                "injected failure".to_string(),
            ));
        }

        let mut records = self.records.lock().await;
        let record = records
            .get_mut(image_id)
            .ok_or_else(|| ImageStorageError::ImageNotFound(image_id.to_string()))?;
        record.link = Some(link.to_string());
        Ok(())
    }

    async fn delete(&self, image_id: &Uuid) -> ImageStorageResult<()> {
        self.records.lock().await.remove(image_id);
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: i64) -> ImageStorageResult<Vec<ImageRecord>> {
        Ok(self
            .records()
            .await
            .into_iter()
            .filter(|record| record.owner_id == owner_id)
            .collect())
    }
}

/// An object held by [`FakeObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object content
    pub body: Bytes,
    /// Content type sent with the object
    pub content_type: String,
}

/// Object store kept in a map, with injectable put failures
#[derive(Default)]
pub struct FakeObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    put_failure: Mutex<Option<BucketError>>,
    hang_puts: Mutex<bool>,
}

impl FakeObjectStore {
    /// Makes every later `put_object` call fail with `error`
    pub async fn fail_puts_with(&self, error: BucketError) {
        *self.put_failure.lock().await = Some(error);
    }

    /// Makes every later `put_object` call wait forever
    pub async fn hang_puts(&self) {
        *self.hang_puts.lock().await = true;
    }

    /// Object stored under `key`, if any
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(key).cloned()
    }

    /// Number of stored objects
    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> BucketResult<()> {
        let hang = *self.hang_puts.lock().await;
        if hang {
            std::future::pending::<()>().await;
        }

        if let Some(error) = self.put_failure.lock().await.clone() {
            return Err(error);
        }

        self.objects.lock().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> BucketResult<()> {
        self.objects.lock().await.remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{FAKE_PUBLIC_BASE_URL}/{key}")
    }
}
