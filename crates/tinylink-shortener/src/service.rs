use crate::config::ShortenerConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tinylink_core::{
    ContentHash, Repository, ShortCode, Shortener, ShortenerError, StorageError, UrlRecord,
};
use tinylink_generator::Generator;
use tracing::{debug, trace, warn};

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - Deduplication of byte-identical URLs through their content hash
/// - Candidate code generation with a bounded number of collision retries
/// - Recovery from a lost insert race on the same content hash
///
/// The service holds no locks and no mutable state. The repository's unique
/// constraint on the content hash is what guarantees one record per URL;
/// the lookups done here only avoid needless inserts.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` with the default configuration.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_config(repository, generator, ShortenerConfig::default())
    }

    pub fn with_config(repository: R, generator: G, config: ShortenerConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// Finds a candidate code that is not yet present in the repository.
    ///
    /// A collision or a generator failure each use up one attempt. A failed
    /// lookup aborts immediately; it is never mistaken for a collision.
    async fn allocate_code(&self) -> Result<ShortCode, ShortenerError> {
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let candidate = match self.generator.generate() {
                Ok(candidate) => candidate,
                Err(err) => {
                    warn!(attempt, error = %err, "failed to generate candidate short code");
                    continue;
                }
            };

            let existing = self
                .repository
                .find_by_code(&candidate)
                .await
                .map_err(ShortenerError::Retrieval)?;

            match existing {
                None => {
                    trace!(attempt, code = %candidate, "accepted candidate short code");
                    return Ok(candidate);
                }
                Some(_) => {
                    warn!(attempt, code = %candidate, "short code collision");
                }
            }
        }

        Err(ShortenerError::AllocationExhausted {
            attempts: max_attempts,
        })
    }

    /// Handles an insert that failed with a duplicate key.
    ///
    /// The expected cause is a concurrent caller that inserted the same
    /// content hash first; its code is returned. If the hash still cannot be
    /// found, the original insert error is returned.
    async fn recover_lost_race(
        &self,
        content_hash: &ContentHash,
        insert_error: StorageError,
    ) -> Result<ShortCode, ShortenerError> {
        match self.repository.find_by_content_hash(content_hash).await {
            Ok(Some(winner)) => {
                debug!(
                    code = %winner.code,
                    content_hash = %content_hash,
                    "another caller stored this url first, reusing its code"
                );
                Ok(winner.code)
            }
            Ok(None) => Err(ShortenerError::Persistence(insert_error)),
            Err(err) => {
                warn!(error = %err, "re-reading after duplicate key failed");
                Err(ShortenerError::Persistence(insert_error))
            }
        }
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, original_url: &str) -> Result<ShortCode, ShortenerError> {
        let content_hash = ContentHash::of(original_url);

        if let Some(existing) = self
            .repository
            .find_by_content_hash(&content_hash)
            .await
            .map_err(ShortenerError::Retrieval)?
        {
            debug!(code = %existing.code, "url already shortened");
            return Ok(existing.code);
        }

        let code = self.allocate_code().await?;

        match self
            .repository
            .insert(&code, original_url, &content_hash)
            .await
        {
            Ok(record) => {
                debug!(code = %record.code, "stored new short url");
                Ok(record.code)
            }
            Err(err) if err.is_duplicate_key() => {
                warn!(code = %code, error = %err, "duplicate key on insert");
                self.recover_lost_race(&content_hash, err).await
            }
            Err(err) => Err(ShortenerError::Persistence(err)),
        }
    }

    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord, ShortenerError> {
        trace!(code = %code, "resolving short code");

        match self
            .repository
            .find_by_code(code)
            .await
            .map_err(ShortenerError::Retrieval)?
        {
            Some(record) => Ok(record),
            None => {
                trace!(code = %code, "short code not found");
                Err(ShortenerError::NotFound(code.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinylink_core::GENERATED_CODE_LENGTH;
    use tinylink_generator::{RandomCodeGenerator, ScriptedEntropy};
    use tinylink_storage::InMemoryRepository;

    fn test_service(
        chunks: &[[u8; 4]],
    ) -> ShortenerService<InMemoryRepository, RandomCodeGenerator<ScriptedEntropy>> {
        let entropy = ScriptedEntropy::from_chunks(chunks.iter().copied());
        ShortenerService::new(InMemoryRepository::new(), RandomCodeGenerator::new(entropy))
    }

    #[tokio::test]
    async fn shorten_returns_generated_code() {
        let service = test_service(&[*b"abcd"]);

        let code = service.shorten("https://example.com/a").await.unwrap();
        assert_eq!(code.as_str(), "YWJjZA");
        assert_eq!(code.as_str().len(), GENERATED_CODE_LENGTH);
    }

    #[tokio::test]
    async fn shorten_same_url_reuses_code() {
        let service = test_service(&[*b"abcd", *b"wxyz"]);

        let first = service.shorten("https://example.com/a").await.unwrap();
        let second = service.shorten("https://example.com/a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.repository().len(), 1);
        // The second call never asked for a candidate.
        assert_eq!(service.generator().entropy().calls(), 1);
    }

    #[tokio::test]
    async fn different_urls_get_different_codes() {
        let service = test_service(&[*b"abcd", *b"wxyz"]);

        let a = service.shorten("https://example.com/a").await.unwrap();
        let b = service.shorten("https://example.com/b").await.unwrap();

        assert_eq!(a.as_str(), "YWJjZA");
        assert_eq!(b.as_str(), "d3h5eg");
    }

    #[tokio::test]
    async fn collision_retries_with_next_candidate() {
        // The second url first draws the code already taken by the first.
        let service = test_service(&[*b"abcd", *b"abcd", *b"wxyz"]);

        let a = service.shorten("https://example.com/a").await.unwrap();
        let b = service.shorten("https://example.com/b").await.unwrap();

        assert_eq!(a.as_str(), "YWJjZA");
        assert_eq!(b.as_str(), "d3h5eg");
        assert_eq!(service.generator().entropy().calls(), 3);
    }

    #[tokio::test]
    async fn resolve_existing_code() {
        let service = test_service(&[*b"abcd"]);

        let code = service.shorten("https://example.com/a").await.unwrap();
        let record = service.resolve(&code).await.unwrap();

        assert_eq!(record.original_url, "https://example.com/a");
        assert_eq!(record.code, code);
        assert_eq!(record.content_hash, ContentHash::of("https://example.com/a"));
    }

    #[tokio::test]
    async fn resolve_unknown_code_is_not_found() {
        let service = test_service(&[*b"abcd"]);

        let err = service
            .resolve(&ShortCode::new("zzzzzz").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(ref code) if code == "zzzzzz"));
    }

    #[tokio::test]
    async fn exhausted_when_every_candidate_collides() {
        let service = ShortenerService::with_config(
            InMemoryRepository::new(),
            RandomCodeGenerator::new(ScriptedEntropy::repeating(*b"abcd")),
            ShortenerConfig::builder().max_attempts(3).build(),
        );

        service.shorten("https://example.com/a").await.unwrap();
        let err = service.shorten("https://example.com/b").await.unwrap_err();

        assert!(matches!(
            err,
            ShortenerError::AllocationExhausted { attempts: 3 }
        ));
        assert!(err.is_temporary());
        // One draw for the first url, three for the second.
        assert_eq!(service.generator().entropy().calls(), 4);
        assert_eq!(service.repository().len(), 1);
    }

    #[test]
    fn default_config_tries_five_times() {
        assert_eq!(ShortenerConfig::default().max_attempts, 5);
    }

    #[test]
    fn service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShortenerService<InMemoryRepository, RandomCodeGenerator>>();
    }
}
