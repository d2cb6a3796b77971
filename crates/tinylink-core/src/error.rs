use thiserror::Error;

/// Errors reported by a [`Repository`](crate::Repository) backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write (duplicate code or duplicate content hash).
    #[error("duplicate key: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Returns `true` if the store rejected a write because of a uniqueness constraint.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

/// Errors surfaced by a [`Shortener`](crate::Shortener).
///
/// The variants stay distinct so that callers can tell an unknown code,
/// a temporary allocation failure and a broken store apart.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("failed to read from storage: {0}")]
    Retrieval(#[source] StorageError),
    #[error("unable to allocate a unique short code after {attempts} attempts")]
    AllocationExhausted { attempts: usize },
    #[error("failed to persist url record: {0}")]
    Persistence(#[source] StorageError),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

impl ShortenerError {
    /// Returns `true` if retrying the same request later may succeed.
    ///
    /// Only allocation exhaustion qualifies; it signals code-space pressure
    /// rather than a broken store or a bad request.
    pub fn is_temporary(&self) -> bool {
        matches!(self, ShortenerError::AllocationExhausted { .. })
    }
}
