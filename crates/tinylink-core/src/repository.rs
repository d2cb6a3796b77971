use crate::content_hash::ContentHash;
use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored URL record in the repository.
///
/// Records are written once and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The short code assigned to this URL.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    /// Fingerprint of `original_url`.
    pub content_hash: ContentHash,
    /// When the record was inserted.
    pub created_at: Timestamp,
}

/// A read-only view of a repository.
///
/// `Ok(None)` means the record does not exist. Every other failure is an
/// `Err`, so callers can tell "nothing there" from "something went wrong".
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record stored under the given short code.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Retrieves the record whose original URL has the given fingerprint.
    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<UrlRecord>>;
}

/// A writable repository.
///
/// Implementations must enforce uniqueness on both the short code and the
/// content hash, and must report a violation of either as
/// [`StorageError::Conflict`]. The content hash constraint is what keeps
/// concurrent shorten calls for the same URL from creating two records.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record and returns it with its creation time filled in.
    async fn insert(
        &self,
        code: &ShortCode,
        original_url: &str,
        content_hash: &ContentHash,
    ) -> Result<UrlRecord>;
}
