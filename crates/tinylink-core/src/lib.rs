//! Core types and traits for the Tinylink URL shortener.
//!
//! This crate provides the shared domain types, the storage contract the
//! allocator relies on, and the [`Shortener`] trait exposed to callers.

pub mod content_hash;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use content_hash::ContentHash;
pub use error::{ShortenerError, StorageError};
pub use repository::{ReadRepository, Repository, UrlRecord};
pub use shortcode::{ShortCode, GENERATED_CODE_LENGTH};
pub use shortener::Shortener;
