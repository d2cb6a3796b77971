use typed_builder::TypedBuilder;

/// Default number of candidate codes tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Tunables for [`ShortenerService`](crate::service::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// Candidate codes tried per shorten call. A collision or an entropy
    /// failure each use up one attempt. No backoff is applied between them.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
