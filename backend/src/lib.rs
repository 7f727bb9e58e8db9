//! Flashcards Backend service
//!
//! Stores user images in S3 and keeps one record per image in Dynamo DB.

#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery)]

/// Image upload workflow and upload policy
pub mod images;

/// Access token verification
pub mod jwt;

/// S3 object storage
pub mod media_storage;

/// Request middleware
pub mod middleware;

/// HTTP routes
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

/// Configuration, errors and extractors
pub mod types;

/// In-memory fakes for the storage seams
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
