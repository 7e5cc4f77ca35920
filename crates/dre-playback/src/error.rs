//! Error types for playback

use dre_core::{CatalogError, DisputeId};

/// Step tracker errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// Position past the end of the step list
    #[error("step index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Playback errors
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Dispute has no entry in the resolution catalog
    #[error("resolution lookup failed: {0}")]
    ResolutionNotFound(#[from] CatalogError),

    /// Catalog entry would resolve the dispute without a corrected invoice
    #[error("resolution for dispute {0} has no corrected invoice")]
    MissingCorrectedInvoice(DisputeId),

    /// Update stream ended before delivering the resolved dispute
    #[error("playback ended before delivering a resolution")]
    Interrupted,

    /// Spawned playback task panicked or was aborted
    #[error("playback task failed: {0}")]
    TaskFailed(String),
}

impl PlaybackError {
    /// Whether the error was detected before any update was produced
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ResolutionNotFound(_) | Self::MissingCorrectedInvoice(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_error_from_catalog() {
        let err: PlaybackError = CatalogError::NotFound(DisputeId::new("DISP-404")).into();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("DISP-404"));
    }

    #[test]
    fn interrupted_is_not_precondition() {
        assert!(!PlaybackError::Interrupted.is_precondition());
    }

    #[test]
    fn tracker_error_display() {
        let err = TrackerError::OutOfRange { index: 7, len: 6 };
        assert_eq!(err.to_string(), "step index 7 out of range (len 6)");
    }
}
