//! Short code generators.
//!
//! Generators are pure: they never touch storage, so uniqueness is checked
//! by the caller. The random generator draws its bytes from an injected
//! [`EntropySource`], which lets tests replay a known byte sequence.

pub mod entropy;
pub mod error;
pub mod random;
pub mod scripted;

pub use entropy::{EntropySource, OsEntropy};
pub use error::{EntropyError, GeneratorError};
pub use random::RandomCodeGenerator;
pub use scripted::{ScriptedEntropy, Step};

use tinylink_core::ShortCode;

/// Trait for generating candidate short codes.
pub trait Generator: Send + Sync + 'static {
    /// Produces a new candidate code.
    ///
    /// A candidate is not guaranteed to be unused; the caller checks it
    /// against storage before accepting it.
    fn generate(&self) -> Result<ShortCode, GeneratorError>;
}
