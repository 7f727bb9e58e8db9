//! Error types for image record storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, put_item::PutItemError, query::QueryError,
    update_item::UpdateItemError,
};
use thiserror::Error;

/// Result type for image storage operations
pub type ImageStorageResult<T> = Result<T, ImageStorageError>;

/// Errors that can occur during image storage operations
#[derive(Error, Debug)]
pub enum ImageStorageError {
    /// Failed to insert image record into Dynamo DB
    #[error("Failed to insert image record into DynamoDB: {0}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to update image record in Dynamo DB
    #[error("Failed to update image record in DynamoDB: {0}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to delete image record from Dynamo DB
    #[error("Failed to delete image record from DynamoDB: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// Failed to query image records from Dynamo DB
    #[error("Failed to query image records from DynamoDB: {0}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// An image record with the generated id already exists
    #[error("Image record already exists: {0}")]
    ImageExists(String),

    /// No image record with the given id
    #[error("Image record not found: {0}")]
    ImageNotFound(String),

    /// Serialization error for `serde_dynamo`
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
