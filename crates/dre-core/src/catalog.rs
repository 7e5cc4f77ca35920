//! Resolution catalog
//!
//! The read-only lookup table of canned resolutions, keyed by dispute id.
//! Playback never computes a resolution; it only reads one from here.

use crate::error::CatalogError;
use crate::model::{DisputeId, Invoice, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A canned resolution plus the analysis narrated during playback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionEntry {
    pub action: String,
    pub changes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_invoice: Option<Invoice>,
    pub ai_analysis: String,
}

impl ResolutionEntry {
    /// The resolution record to attach to a dispute
    #[must_use]
    pub fn to_resolution(&self) -> Resolution {
        Resolution {
            action: self.action.clone(),
            changes: self.changes.clone(),
            corrected_invoice: self.corrected_invoice.clone(),
        }
    }
}

/// Read-only mapping from dispute id to canned resolution
#[derive(Debug, Clone, Default)]
pub struct ResolutionCatalog {
    entries: BTreeMap<DisputeId, ResolutionEntry>,
}

impl ResolutionCatalog {
    /// Build from a fully formed table
    #[inline]
    #[must_use]
    pub fn new(entries: BTreeMap<DisputeId, ResolutionEntry>) -> Self {
        Self { entries }
    }

    /// Entry for `id`, if any
    #[inline]
    #[must_use]
    pub fn get(&self, id: &DisputeId) -> Option<&ResolutionEntry> {
        self.entries.get(id)
    }

    /// Entry for `id`
    ///
    /// # Errors
    /// - `CatalogError::NotFound` if the table has no entry for `id`
    pub fn lookup(&self, id: &DisputeId) -> Result<&ResolutionEntry, CatalogError> {
        self.entries
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// Whether an entry exists for `id`
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &DisputeId) -> bool {
        self.entries.contains_key(id)
    }

    /// Dispute ids with an entry, in id order
    pub fn ids(&self) -> impl Iterator<Item = &DisputeId> {
        self.entries.keys()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(DisputeId, ResolutionEntry)> for ResolutionCatalog {
    fn from_iter<I: IntoIterator<Item = (DisputeId, ResolutionEntry)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
