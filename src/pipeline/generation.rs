//! Stale-result discard
//!
//! Each stylize submission takes a generation from a monotonically
//! increasing counter. A finished result is applied only if no newer
//! submission has started since; otherwise it is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::marshal::PixelBuffer;

/// Generation number captured when a submission starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Outcome of handing a finished result to [`LatestOutput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Applied,
    /// A newer generation started first; the result was discarded
    Stale,
}

/// Holds the displayed output and the current generation
#[derive(Debug, Default)]
pub struct LatestOutput {
    current: AtomicU64,
    shown: Mutex<Option<(Generation, PixelBuffer)>>,
}

impl LatestOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission; every earlier generation becomes stale
    pub fn begin(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Apply `output` if `generation` is still the newest submission
    pub fn submit(&self, generation: Generation, output: PixelBuffer) -> Submission {
        let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the lock so two finishing submissions cannot interleave
        if !self.is_current(generation) {
            debug!(
                generation = generation.value(),
                current = self.current().value(),
                "Discarding stale result"
            );
            return Submission::Stale;
        }
        *shown = Some((generation, output));
        Submission::Applied
    }

    /// The most recently applied output
    pub fn latest(&self) -> Option<PixelBuffer> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, output)| output.clone())
    }

    /// Generation of the most recently applied output
    pub fn latest_generation(&self) -> Option<Generation> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(generation, _)| *generation)
    }
}
