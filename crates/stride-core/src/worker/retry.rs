//! Retry policy seam for the generation worker.

use crate::error::GenerationError;

/// Decides whether a failed job should be returned to the queue for another
/// attempt.
///
/// The design does not currently distinguish transient persistence failures
/// from terminal ones; this trait is the place where such a distinction
/// would live without changing the worker.
pub trait RetryClassifier: Send + Sync {
    fn is_retriable(&self, error: &GenerationError) -> bool;
}

/// Default policy: plan generation is single-attempt. Engine failures are
/// structural (no retry helps) and persistence failures are not classified,
/// so nothing is retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl RetryClassifier for NeverRetry {
    fn is_retriable(&self, _error: &GenerationError) -> bool {
        false
    }
}
