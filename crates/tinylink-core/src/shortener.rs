use crate::repository::UrlRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns a short code for the URL, reusing the existing one if the same
    /// URL was shortened before.
    ///
    /// The URL is expected to have been validated by the caller.
    async fn shorten(&self, original_url: &str) -> Result<ShortCode>;

    /// Resolves a short code to its stored record.
    ///
    /// Fails with [`ShortenerError::NotFound`](crate::ShortenerError::NotFound)
    /// if the code is unknown.
    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord>;
}
