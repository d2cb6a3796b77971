use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use tinylink_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use tinylink_core::{ContentHash, ShortCode, StorageError};

/// In-memory implementation of the Repository trait using DashMap.
///
/// Records are keyed by short code, with a secondary index from content hash
/// to short code. Inserts lock the hash entry first and the code entry
/// second, so both uniqueness checks and both writes happen under the same
/// pair of shard locks.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: DashMap<String, UrlRecord>,
    hashes: DashMap<String, String>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            hashes: DashMap::with_capacity(capacity),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self
            .records
            .get(code.as_str())
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<UrlRecord>> {
        let Some(code) = self
            .hashes
            .get(hash.as_str())
            .map(|entry| entry.value().clone())
        else {
            return Ok(None);
        };

        match self.records.get(&code) {
            Some(entry) => Ok(Some(entry.value().clone())),
            None => Err(StorageError::InvalidData(format!(
                "content hash {hash} points at missing code {code}"
            ))),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(
        &self,
        code: &ShortCode,
        original_url: &str,
        content_hash: &ContentHash,
    ) -> Result<UrlRecord> {
        let Entry::Vacant(hash_slot) = self.hashes.entry(content_hash.as_str().to_owned()) else {
            return Err(StorageError::Conflict(format!(
                "content hash already stored: {content_hash}"
            )));
        };
        let Entry::Vacant(code_slot) = self.records.entry(code.as_str().to_owned()) else {
            return Err(StorageError::Conflict(format!(
                "short code already stored: {code}"
            )));
        };

        let record = UrlRecord {
            code: code.clone(),
            original_url: original_url.to_owned(),
            content_hash: content_hash.clone(),
            created_at: Timestamp::now(),
        };

        code_slot.insert(record.clone());
        hash_slot.insert(code.as_str().to_owned());
        Ok(record)
    }
}
