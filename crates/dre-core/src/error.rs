//! Error types for DRE Core
//!
//! Covers:
//! - Resolution catalog misses
//! - Store lookups that find no dispute or invoice
//! - Illegal dispute lifecycle transitions
//! - Resolved disputes that lack their corrected invoice
//! - Snapshot decoding

use crate::model::{DisputeId, DisputeStatus, InvoiceId};

/// Resolution catalog errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// No canned resolution for the dispute
    #[error("no resolution recorded for dispute {0}")]
    NotFound(DisputeId),
}

/// Dispute store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unknown dispute id
    #[error("dispute not found: {0}")]
    DisputeNotFound(DisputeId),

    /// Dispute references an invoice the store does not hold
    #[error("invoice {invoice} referenced by dispute {dispute} not found")]
    InvoiceNotFound {
        dispute: DisputeId,
        invoice: InvoiceId,
    },

    /// Lifecycle step not permitted from the stored status
    #[error("dispute {dispute}: illegal transition {from} -> {to}")]
    InvalidTransition {
        dispute: DisputeId,
        from: DisputeStatus,
        to: DisputeStatus,
    },

    /// Resolved dispute whose resolution carries no corrected invoice
    #[error("dispute {0} is resolved but has no corrected invoice")]
    MissingCorrectedInvoice(DisputeId),

    /// Corrected invoice does not replace the invoice the dispute references
    #[error("dispute {dispute}: corrected invoice {corrected} does not match invoice {expected}")]
    CorrectedInvoiceMismatch {
        dispute: DisputeId,
        expected: InvoiceId,
        corrected: InvoiceId,
    },

    /// Comparison requested for a dispute that is not resolved
    #[error("dispute {dispute} is {status}, not resolved")]
    NotResolved {
        dispute: DisputeId,
        status: DisputeStatus,
    },

    /// Two records share an id
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Snapshot could not be decoded
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the error is a failed lookup rather than a rejected operation
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DisputeNotFound(_) | Self::InvoiceNotFound { .. }
        )
    }

    /// Whether the error reports a broken invariant in stored data
    #[inline]
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingCorrectedInvoice(_)
                | Self::CorrectedInvoiceMismatch { .. }
                | Self::DuplicateId { .. }
        )
    }
}
