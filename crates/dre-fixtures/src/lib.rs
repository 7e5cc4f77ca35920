//! Seed data for DRE
//!
//! The embedded snapshot holds three invoices, three open disputes, and the
//! canned resolution for each. Amounts are in cents.
//!
//! [`embedded_snapshot`] and [`load_snapshot`] propagate errors. The other
//! helpers panic on bad data and are meant for tests.

#![allow(missing_docs)]

use dre_core::{
    Dispute, DisputeId, DisputeStore, Invoice, InvoiceId, ResolutionCatalog, Snapshot, StoreError,
};
use std::path::{Path, PathBuf};

/// Embedded seed snapshot (JSON)
pub const SEED_JSON: &str = include_str!("../data/seed.json");

/// Fixture loading errors
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] StoreError),
}

/// Decode the embedded seed snapshot
///
/// # Errors
/// - `FixtureError::Snapshot` if the embedded JSON does not decode
pub fn embedded_snapshot() -> Result<Snapshot, FixtureError> {
    Ok(Snapshot::from_json(SEED_JSON)?)
}

/// Read a caller-supplied JSON snapshot
///
/// # Errors
/// - `FixtureError::Io` if the file cannot be read
/// - `FixtureError::Snapshot` if it is not a valid snapshot
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot, FixtureError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = Snapshot::from_json(&text)?;
    tracing::debug!(
        path = %path.display(),
        disputes = snapshot.disputes.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

/// The seed snapshot
///
/// # Panics
/// If the embedded JSON does not decode.
#[must_use]
pub fn seed_snapshot() -> Snapshot {
    embedded_snapshot().unwrap()
}

/// A fresh store and catalog over the seed
///
/// # Panics
/// If the seed has duplicate ids.
#[must_use]
pub fn seed_store() -> (DisputeStore, ResolutionCatalog) {
    DisputeStore::from_snapshot(seed_snapshot()).unwrap()
}

/// Seed dispute by id
///
/// # Panics
/// If the seed has no such dispute.
#[must_use]
pub fn dispute(id: &str) -> Dispute {
    let id = DisputeId::new(id);
    seed_snapshot()
        .disputes
        .into_iter()
        .find(|d| d.id == id)
        .unwrap_or_else(|| panic!("no seed dispute {id}"))
}

/// Seed invoice by id
///
/// # Panics
/// If the seed has no such invoice.
#[must_use]
pub fn invoice(id: &str) -> Invoice {
    let id = InvoiceId::new(id);
    seed_snapshot()
        .invoices
        .into_iter()
        .find(|i| i.id == id)
        .unwrap_or_else(|| panic!("no seed invoice {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dre_core::{DisputeStatus, DisputeType, Money, TotalsCheck};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn seed_decodes() {
        let snapshot = embedded_snapshot().unwrap();
        assert_eq!(snapshot.invoices.len(), 3);
        assert_eq!(snapshot.disputes.len(), 3);
        assert_eq!(snapshot.resolutions.len(), 3);
    }

    #[test]
    fn seed_disputes_start_open() {
        let (store, catalog) = seed_store();
        assert!(store.disputes().iter().all(Dispute::is_open));
        for dispute in store.disputes() {
            assert!(catalog.contains(&dispute.id));
            assert!(store.invoice(&dispute.invoice_id).is_some());
        }
    }

    #[test]
    fn seed_dispute_types() {
        assert_eq!(dispute("DISP-001").dispute_type, DisputeType::MissingPo);
        assert_eq!(dispute("DISP-002").dispute_type, DisputeType::PricingError);
        assert_eq!(dispute("DISP-003").status, DisputeStatus::Open);
    }

    #[test]
    fn inv_003_amount_mismatch_is_reported() {
        assert_eq!(
            invoice("INV-003").totals_consistency(),
            TotalsCheck::Mismatch {
                stated: Money::from_dollars(24_500),
                computed: Money::from_dollars(25_000),
            }
        );
        assert!(invoice("INV-001").totals_consistency().is_consistent());
        assert!(invoice("INV-002").totals_consistency().is_consistent());
    }

    #[test]
    fn corrected_invoices_are_consistent() {
        let snapshot = seed_snapshot();
        for entry in snapshot.resolutions.values() {
            let corrected = entry.corrected_invoice.as_ref().unwrap();
            assert!(corrected.totals_consistency().is_consistent());
        }
    }

    #[test]
    fn load_snapshot_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED_JSON.as_bytes()).unwrap();

        let snapshot = load_snapshot(file.path()).unwrap();
        assert_eq!(snapshot, seed_snapshot());
    }

    #[test]
    fn load_snapshot_missing_file() {
        let err = load_snapshot("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, FixtureError::Io { .. }));
    }

    #[test]
    fn load_snapshot_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"invoices\": 3}").unwrap();

        let err = load_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, FixtureError::Snapshot(_)));
    }
}
