use crate::entropy::EntropySource;
use crate::error::EntropyError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One step of a [`ScriptedEntropy`] script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Fill the buffer with these bytes, repeated if the buffer is longer.
    Bytes(Vec<u8>),
    /// Fail with the given message.
    Fail(String),
}

/// A deterministic entropy source that replays a fixed script.
///
/// Each call to [`fill`](EntropySource::fill) consumes one step. Once the
/// script is exhausted the last step is repeated forever, so a single-step
/// script yields the same bytes on every call.
#[derive(Debug)]
pub struct ScriptedEntropy {
    steps: Vec<Step>,
    calls: AtomicUsize,
}

impl ScriptedEntropy {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
        }
    }

    /// Replays the given byte chunks in order.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self::new(chunks.into_iter().map(|c| Step::Bytes(c.into())).collect())
    }

    /// Yields the same bytes on every call.
    pub fn repeating(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(vec![Step::Bytes(bytes.into())])
    }

    /// Fails on every call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![Step::Fail(message.into())])
    }

    /// Number of times the source has been asked for bytes.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EntropySource for ScriptedEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(last) = self.steps.len().checked_sub(1) else {
            return Err(EntropyError("entropy script is empty".to_string()));
        };

        match &self.steps[call.min(last)] {
            Step::Bytes(bytes) if bytes.is_empty() => {
                Err(EntropyError("entropy script step has no bytes".to_string()))
            }
            Step::Bytes(bytes) => {
                for (slot, byte) in dest.iter_mut().zip(bytes.iter().cycle()) {
                    *slot = *byte;
                }
                Ok(())
            }
            Step::Fail(message) => Err(EntropyError(message.clone())),
        }
    }
}
