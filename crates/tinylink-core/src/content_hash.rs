use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Length of a hex-encoded SHA-256 digest.
pub const CONTENT_HASH_LENGTH: usize = 64;

/// Fingerprint of an original URL, used as the deduplication key.
///
/// The store enforces uniqueness on this value, which makes it the arbiter
/// when two callers race to shorten the same URL.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Computes the lowercase hex SHA-256 digest of the URL bytes.
    pub fn of(original_url: &str) -> Self {
        let digest = Sha256::digest(original_url.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wraps an already computed digest, e.g. one read back from storage.
    pub fn from_hex_unchecked(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
