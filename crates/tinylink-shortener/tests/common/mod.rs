#![allow(dead_code)]

use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tinylink_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use tinylink_core::{ContentHash, ShortCode, StorageError};
use tinylink_storage::InMemoryRepository;
use tokio::sync::Barrier;

/// Wraps an [`InMemoryRepository`] with call counters and fault injection.
#[derive(Default)]
pub struct InstrumentedRepository {
    inner: InMemoryRepository,
    hash_lookups: AtomicUsize,
    code_lookups: AtomicUsize,
    insert_attempts: AtomicUsize,
    inserts_stored: AtomicUsize,
    faults: Mutex<Faults>,
    gate: Option<Gate>,
}

#[derive(Default)]
struct Faults {
    hash_lookup: Option<StorageError>,
    /// Hash lookups allowed to succeed before `hash_lookup` kicks in.
    hash_lookup_grace: usize,
    code_lookup: Option<StorageError>,
    insert: Option<StorageError>,
    every_code_taken: bool,
}

/// Holds the first `callers` hash lookups until all of them have read.
struct Gate {
    barrier: Barrier,
    callers: usize,
}

impl InstrumentedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `callers` hash lookups wait for each other after reading,
    /// so every one of them observes the store before anyone inserts.
    pub fn gated(callers: usize) -> Self {
        Self {
            gate: Some(Gate {
                barrier: Barrier::new(callers),
                callers,
            }),
            ..Self::default()
        }
    }

    pub fn fail_hash_lookups(self, err: StorageError) -> Self {
        self.faults.lock().unwrap().hash_lookup = Some(err);
        self
    }

    /// Lets the first `grace` hash lookups through, then fails the rest.
    pub fn fail_hash_lookups_after(self, grace: usize, err: StorageError) -> Self {
        {
            let mut faults = self.faults.lock().unwrap();
            faults.hash_lookup = Some(err);
            faults.hash_lookup_grace = grace;
        }
        self
    }

    pub fn fail_code_lookups(self, err: StorageError) -> Self {
        self.faults.lock().unwrap().code_lookup = Some(err);
        self
    }

    pub fn fail_inserts(self, err: StorageError) -> Self {
        self.faults.lock().unwrap().insert = Some(err);
        self
    }

    /// Reports every code lookup as an existing record.
    pub fn every_code_taken(self) -> Self {
        self.faults.lock().unwrap().every_code_taken = true;
        self
    }

    pub fn hash_lookups(&self) -> usize {
        self.hash_lookups.load(Ordering::SeqCst)
    }

    pub fn code_lookups(&self) -> usize {
        self.code_lookups.load(Ordering::SeqCst)
    }

    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    pub fn inserts_stored(&self) -> usize {
        self.inserts_stored.load(Ordering::SeqCst)
    }

    pub fn stored_records(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl ReadRepository for InstrumentedRepository {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        self.code_lookups.fetch_add(1, Ordering::SeqCst);

        let (fault, every_code_taken) = {
            let faults = self.faults.lock().unwrap();
            (faults.code_lookup.clone(), faults.every_code_taken)
        };
        if let Some(err) = fault {
            return Err(err);
        }
        if every_code_taken {
            return Ok(Some(UrlRecord {
                code: code.clone(),
                original_url: "https://taken.example".to_string(),
                content_hash: ContentHash::of("https://taken.example"),
                created_at: Timestamp::now(),
            }));
        }

        self.inner.find_by_code(code).await
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> Result<Option<UrlRecord>> {
        let call = self.hash_lookups.fetch_add(1, Ordering::SeqCst);

        let fault = {
            let faults = self.faults.lock().unwrap();
            faults
                .hash_lookup
                .clone()
                .filter(|_| call >= faults.hash_lookup_grace)
        };
        if let Some(err) = fault {
            return Err(err);
        }

        let result = self.inner.find_by_content_hash(hash).await;
        if let Some(gate) = &self.gate {
            if call < gate.callers {
                gate.barrier.wait().await;
            }
        }
        result
    }
}

#[async_trait]
impl Repository for InstrumentedRepository {
    async fn insert(
        &self,
        code: &ShortCode,
        original_url: &str,
        content_hash: &ContentHash,
    ) -> Result<UrlRecord> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);

        let fault = self.faults.lock().unwrap().insert.clone();
        if let Some(err) = fault {
            return Err(err);
        }

        let record = self.inner.insert(code, original_url, content_hash).await?;
        self.inserts_stored.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }
}
