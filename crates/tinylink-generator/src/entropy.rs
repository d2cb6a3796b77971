use crate::error::EntropyError;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::sync::Arc;

/// A source of random bytes.
pub trait EntropySource: Send + Sync + 'static {
    /// Fills `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// Entropy read from the operating system's secure random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError(e.to_string()))
    }
}

impl<E: EntropySource> EntropySource for Arc<E> {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.as_ref().fill(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_entropy_fills_buffer() {
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        OsEntropy.fill(&mut first).unwrap();
        OsEntropy.fill(&mut second).unwrap();
        assert_ne!(first, second);
    }
}
