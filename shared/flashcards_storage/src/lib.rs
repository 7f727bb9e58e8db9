//! Record storage for the flashcards backend
//!
//! This crate holds the persistence layer for uploaded image records. The
//! backend talks to it through the [`image::ImageStore`] trait so request
//! handlers can be exercised against an in-memory store.

pub mod image;
