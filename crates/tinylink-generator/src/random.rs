use crate::entropy::{EntropySource, OsEntropy};
use crate::error::GeneratorError;
use crate::Generator;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use tinylink_core::{ShortCode, GENERATED_CODE_LENGTH};

/// Number of random bytes drawn per candidate code.
pub const ENTROPY_BYTES: usize = 4;

/// Generates random codes from the URL-safe base64 alphabet.
///
/// Each candidate is [`ENTROPY_BYTES`] random bytes, base64url encoded, cut
/// down to the first [`GENERATED_CODE_LENGTH`] characters. The cut drops the
/// low bits of the last kept character and the padding. Codes already issued
/// depend on this exact format, so it must not change.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator<E = OsEntropy> {
    entropy: E,
}

impl RandomCodeGenerator<OsEntropy> {
    /// Creates a generator backed by the operating system's secure RNG.
    pub fn os() -> Self {
        Self::new(OsEntropy)
    }
}

impl Default for RandomCodeGenerator<OsEntropy> {
    fn default() -> Self {
        Self::os()
    }
}

impl<E: EntropySource> RandomCodeGenerator<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    pub fn entropy(&self) -> &E {
        &self.entropy
    }
}

impl<E: EntropySource> Generator for RandomCodeGenerator<E> {
    fn generate(&self) -> Result<ShortCode, GeneratorError> {
        let mut bytes = [0u8; ENTROPY_BYTES];
        self.entropy.fill(&mut bytes)?;
        Ok(encode_code(&bytes))
    }
}

/// Encodes raw bytes into a code: base64url, truncated to the code length.
pub fn encode_code(bytes: &[u8]) -> ShortCode {
    let mut encoded = URL_SAFE.encode(bytes);
    encoded.truncate(GENERATED_CODE_LENGTH);
    ShortCode::new_unchecked(encoded)
}
