//! Disputes and their resolutions
//!
//! ## Lifecycle
//!
//! OPEN → ANALYZING → RESOLVING → RESOLVED
//!
//! A playback that is torn down returns the dispute to OPEN. RESOLVED is
//! terminal.

use super::{Invoice, InvoiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispute identifier (e.g. `DISP-001`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisputeId(pub String);

impl DisputeId {
    /// Create from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisputeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DisputeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Closed set of dispute classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeType {
    MissingPo,
    PricingError,
    QuantityMismatch,
    MissingDocument,
}

impl DisputeType {
    /// All classifications, in display order
    pub const ALL: [DisputeType; 4] = [
        DisputeType::MissingPo,
        DisputeType::PricingError,
        DisputeType::QuantityMismatch,
        DisputeType::MissingDocument,
    ];

    /// Wire tag (`missing_po`, ...)
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            DisputeType::MissingPo => "missing_po",
            DisputeType::PricingError => "pricing_error",
            DisputeType::QuantityMismatch => "quantity_mismatch",
            DisputeType::MissingDocument => "missing_document",
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DisputeType::MissingPo => "Missing PO Number",
            DisputeType::PricingError => "Pricing Error",
            DisputeType::QuantityMismatch => "Quantity Mismatch",
            DisputeType::MissingDocument => "Missing Document",
        }
    }

    /// Upper-case classification used in narration (`MISSING PO`)
    #[must_use]
    pub fn classification(&self) -> String {
        self.tag().replace('_', " ").to_uppercase()
    }
}

impl fmt::Display for DisputeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dispute lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Raised by the customer, not yet worked
    Open,
    /// Playback started
    Analyzing,
    /// Playback producing the resolution
    Resolving,
    /// Resolution attached (terminal)
    Resolved,
}

impl DisputeStatus {
    /// Statuses reachable from `self` in one step
    #[must_use]
    pub fn allowed_transitions(&self) -> &'static [DisputeStatus] {
        match self {
            Self::Open => &[Self::Analyzing, Self::Resolved],
            Self::Analyzing => &[Self::Resolving, Self::Resolved, Self::Open],
            Self::Resolving => &[Self::Resolved, Self::Open],
            Self::Resolved => &[],
        }
    }

    /// Whether `self → to` is a legal lifecycle step
    #[inline]
    #[must_use]
    pub fn can_transition_to(&self, to: DisputeStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisputeStatus::Resolved)
    }

    /// Whether a playback currently owns the dispute
    #[inline]
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(self, DisputeStatus::Analyzing | DisputeStatus::Resolving)
    }

    /// Lower-case name as shown in listings
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "open",
            DisputeStatus::Analyzing => "analyzing",
            DisputeStatus::Resolving => "resolving",
            DisputeStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DisputeStatus::Open),
            "analyzing" => Ok(DisputeStatus::Analyzing),
            "resolving" => Ok(DisputeStatus::Resolving),
            "resolved" => Ok(DisputeStatus::Resolved),
            other => Err(format!("unknown dispute status: {other}")),
        }
    }
}

/// Outcome attached to a resolved dispute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// One-line summary of what was done
    pub action: String,
    /// Itemized, human-readable changes
    pub changes: Vec<String>,
    /// Full replacement invoice, not a diff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_invoice: Option<Invoice>,
}

/// A customer complaint against one invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: DisputeId,
    pub invoice_id: InvoiceId,
    pub customer_email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub dispute_type: DisputeType,
    pub status: DisputeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl Dispute {
    /// Still waiting for a resolution to be started
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == DisputeStatus::Open
    }

    /// Resolution attached
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == DisputeStatus::Resolved
    }

    /// The corrected invoice, when the resolution carries one
    #[inline]
    #[must_use]
    pub fn corrected_invoice(&self) -> Option<&Invoice> {
        self.resolution
            .as_ref()
            .and_then(|r| r.corrected_invoice.as_ref())
    }
}
