//! Error taxonomy for the generation pipeline.

use thiserror::Error;

use crate::engine::EngineError;

/// A failure anywhere along the plan-generation path.
///
/// `Validation` is rejected synchronously at submission, before any plan
/// record exists. The other three occur after a pending record was created
/// and surface to the submitting client only through status polling.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Malformed or out-of-range request, rejected before anything is
    /// persisted or enqueued.
    #[error("validation error: {0}")]
    Validation(String),

    /// The periodization engine rejected the request or violated one of its
    /// own structural invariants.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Enqueueing failed after the pending plan record was already created.
    /// The pending record is left in place (see DESIGN.md).
    #[error("queue error: {0}")]
    Queue(#[source] anyhow::Error),

    /// The transactional write of weeks/sessions failed; nothing partial is
    /// visible to readers.
    #[error("persistence error: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl GenerationError {
    /// Wrap a storage-layer failure.
    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::Persistence(err.into())
    }

    /// Wrap a queue-layer failure.
    pub fn queue(err: impl Into<anyhow::Error>) -> Self {
        Self::Queue(err.into())
    }

    /// Short diagnostic suitable for embedding in a plan's description field.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Engine(e) => e.to_string(),
            Self::Queue(e) => format!("enqueue failed: {e}"),
            Self::Persistence(e) => format!("persistence failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_converts() {
        let err: GenerationError = EngineError::DurationTooShort(3).into();
        assert!(matches!(err, GenerationError::Engine(_)));
        assert!(err.diagnostic().contains("4 weeks"));
    }

    #[test]
    fn diagnostic_is_short() {
        let err = GenerationError::Validation("durationWeeks must be between 4 and 52".into());
        assert_eq!(err.diagnostic(), "durationWeeks must be between 4 and 52");
    }
}
