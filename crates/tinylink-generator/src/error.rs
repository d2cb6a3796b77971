use thiserror::Error;

/// Failure of an entropy source to produce bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("entropy source failed: {0}")]
pub struct EntropyError(pub String);

/// Errors returned when generating a short code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}
