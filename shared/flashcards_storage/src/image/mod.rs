//! Image record storage integration using Dynamo DB
//!
//! An image record is created as a placeholder before the file is sent to the
//! object store, then either receives its public link or is deleted.

mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::SdkError,
    types::{AttributeValue, Select},
    Client as DynamoDbClient,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

pub use error::{ImageStorageError, ImageStorageResult};

/// Name of the global secondary index keyed by owner
pub const OWNER_INDEX_NAME: &str = "owner_id-index";

/// Attribute names for the images table
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ImageAttribute {
    /// Image ID (Primary Key)
    ImageId,
    /// Owning user ID (partition key of [`OWNER_INDEX_NAME`])
    OwnerId,
    /// Public URL of the uploaded file
    Link,
    /// Creation timestamp (sort key of [`OWNER_INDEX_NAME`])
    CreatedAt,
}

/// Image record data structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Image ID (Primary Key)
    pub image_id: Uuid,
    /// ID of the user that uploaded the image
    pub owner_id: i64,
    /// Public URL, absent until the upload completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Unix timestamp in seconds
    pub created_at: i64,
}

impl ImageRecord {
    /// Creates a placeholder record with a fresh id and no link
    #[must_use]
    pub fn new(owner_id: i64) -> Self {
        Self {
            image_id: Uuid::new_v4(),
            owner_id,
            link: None,
            created_at: Utc::now().timestamp(),
        }
    }
}

/// Persistence operations on image records
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Creates and persists a placeholder record owned by `owner_id`
    async fn create(&self, owner_id: i64) -> ImageStorageResult<ImageRecord>;

    /// Sets the public link of an existing record
    async fn set_link(&self, image_id: &Uuid, link: &str) -> ImageStorageResult<()>;

    /// Deletes a record; deleting a missing record is not an error
    async fn delete(&self, image_id: &Uuid) -> ImageStorageResult<()>;

    /// Returns every record owned by `owner_id`, oldest first
    async fn list_by_owner(&self, owner_id: i64) -> ImageStorageResult<Vec<ImageRecord>>;
}

/// Image storage client for Dynamo DB operations
pub struct ImageStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
    query_page_size: Option<i32>,
}

impl ImageStorage {
    /// Creates a new image storage client
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured Dynamo DB client
    /// * `table_name` - Dynamo DB table name for image records
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
            query_page_size: None,
        }
    }

    /// Caps the number of items read per owner-index query page
    #[must_use]
    pub fn with_query_page_size(mut self, page_size: i32) -> Self {
        self.query_page_size = Some(page_size);
        self
    }

    fn image_key(image_id: &Uuid) -> (String, AttributeValue) {
        (
            ImageAttribute::ImageId.to_string(),
            AttributeValue::S(image_id.to_string()),
        )
    }
}

#[async_trait]
impl ImageStore for ImageStorage {
    /// Inserts a placeholder record
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError::ImageExists` if the generated id collides,
    /// or `ImageStorageError` if the Dynamo DB operation fails
    async fn create(&self, owner_id: i64) -> ImageStorageResult<ImageRecord> {
        let record = ImageRecord::new(owner_id);

        let item = serde_dynamo::to_item(&record)
            .map_err(|e| ImageStorageError::SerializationError(e.to_string()))?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", ImageAttribute::ImageId.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    ImageStorageError::ImageExists(record.image_id.to_string())
                } else {
                    err.into()
                }
            })?;

        tracing::debug!(image_id = %record.image_id, owner_id, "Created image placeholder");

        Ok(record)
    }

    /// Sets the link attribute, leaving the owner untouched
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError::ImageNotFound` if no record has this id
    async fn set_link(&self, image_id: &Uuid, link: &str) -> ImageStorageResult<()> {
        let (key_name, key_value) = Self::image_key(image_id);

        self.dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .update_expression("SET #link = :link")
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", ImageAttribute::ImageId.to_string())
            .expression_attribute_names("#link", ImageAttribute::Link.to_string())
            .expression_attribute_values(":link", AttributeValue::S(link.to_string()))
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    ImageStorageError::ImageNotFound(image_id.to_string())
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }

    /// Deletes a record by id
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError` if the Dynamo DB operation fails
    async fn delete(&self, image_id: &Uuid) -> ImageStorageResult<()> {
        let (key_name, key_value) = Self::image_key(image_id);

        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .send()
            .await?;

        Ok(())
    }

    /// Queries the owner index, following pagination until exhausted
    ///
    /// Index reads are eventually consistent: a record written moments ago
    /// may be missing or still show its placeholder state.
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError` if the Dynamo DB operation fails or an item
    /// cannot be parsed
    async fn list_by_owner(&self, owner_id: i64) -> ImageStorageResult<Vec<ImageRecord>> {
        let mut records = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let response = self
                .dynamodb_client
                .query()
                .table_name(&self.table_name)
                .index_name(OWNER_INDEX_NAME)
                .key_condition_expression("#owner_id = :owner_id")
                .expression_attribute_names("#owner_id", ImageAttribute::OwnerId.to_string())
                .expression_attribute_values(":owner_id", AttributeValue::N(owner_id.to_string()))
                .select(Select::AllProjectedAttributes)
                .scan_index_forward(true)
                .set_limit(self.query_page_size)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await?;

            for item in response.items() {
                let record = serde_dynamo::from_item(item.clone())
                    .map_err(|e| ImageStorageError::SerializationError(e.to_string()))?;
                records.push(record);
            }

            match response.last_evaluated_key() {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(records)
    }
}
