//! Caller-owned dispute store
//!
//! Holds the invoices and disputes a dashboard session works against. The
//! store is built from an injected [`Snapshot`]; there is no ambient global
//! state, so every caller (and every test) owns an isolated copy.
//!
//! Mutations follow the dispute lifecycle:
//! - `begin_resolution`: OPEN → ANALYZING (the view trigger)
//! - `transition`: any step `DisputeStatus::can_transition_to` allows
//! - `abandon_resolution`: ANALYZING | RESOLVING → OPEN
//! - `apply_resolution`: → RESOLVED, replacing the referenced invoice
//!   wholesale with the corrected one

use crate::catalog::{ResolutionCatalog, ResolutionEntry};
use crate::error::StoreError;
use crate::model::{
    Dispute, DisputeId, DisputeStatus, Invoice, InvoiceId, Money, TotalsCheck,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Initial state injected into a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub invoices: Vec<Invoice>,
    pub disputes: Vec<Dispute>,
    #[serde(default)]
    pub resolutions: BTreeMap<DisputeId, ResolutionEntry>,
}

impl Snapshot {
    /// Decode a snapshot from JSON
    ///
    /// # Errors
    /// - `StoreError::Snapshot` if the text is not a valid snapshot
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisputeStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

/// A dispute paired with the invoice it references
#[derive(Debug, Clone, Copy)]
pub struct DisputeView<'a> {
    pub dispute: &'a Dispute,
    pub invoice: &'a Invoice,
}

impl DisputeView<'_> {
    /// Stated amount vs line items of the current invoice
    #[inline]
    #[must_use]
    pub fn totals(&self) -> TotalsCheck {
        self.invoice.totals_consistency()
    }
}

/// Original and corrected invoice for a resolved dispute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceComparison {
    pub original: Invoice,
    pub corrected: Invoice,
    pub changes: Vec<String>,
}

impl InvoiceComparison {
    /// Corrected minus original amount
    #[inline]
    #[must_use]
    pub fn delta(&self) -> Money {
        self.corrected.amount - self.original.amount
    }

    /// Whether the resolution changed the invoice total
    #[inline]
    #[must_use]
    pub fn amount_changed(&self) -> bool {
        self.corrected.amount != self.original.amount
    }

    /// Amount to credit back when the corrected total is lower
    #[must_use]
    pub fn credit_memo(&self) -> Option<Money> {
        let delta = self.delta();
        delta.is_negative().then(|| delta.abs())
    }
}

/// In-memory store of invoices and disputes
#[derive(Debug, Clone, Default)]
pub struct DisputeStore {
    invoices: Vec<Invoice>,
    disputes: Vec<Dispute>,
    /// Pre-correction invoices, kept once a corrected one replaces them
    originals: BTreeMap<InvoiceId, Invoice>,
}

impl DisputeStore {
    /// Create a store over the given records
    ///
    /// # Errors
    /// - `StoreError::DuplicateId` if two invoices or two disputes share an id
    pub fn new(invoices: Vec<Invoice>, disputes: Vec<Dispute>) -> Result<Self, StoreError> {
        check_unique("invoice", invoices.iter().map(|i| i.id.as_str()))?;
        check_unique("dispute", disputes.iter().map(|d| d.id.as_str()))?;

        for invoice in &invoices {
            if let TotalsCheck::Mismatch { stated, computed } = invoice.totals_consistency() {
                tracing::warn!(
                    invoice = %invoice.id,
                    %stated,
                    %computed,
                    "invoice amount does not match line items"
                );
            }
        }

        tracing::debug!(
            invoices = invoices.len(),
            disputes = disputes.len(),
            "dispute store loaded"
        );

        Ok(Self {
            invoices,
            disputes,
            originals: BTreeMap::new(),
        })
    }

    /// Split a snapshot into a store and its resolution catalog
    ///
    /// # Errors
    /// - `StoreError::DuplicateId` if two records share an id
    pub fn from_snapshot(snapshot: Snapshot) -> Result<(Self, ResolutionCatalog), StoreError> {
        let Snapshot {
            invoices,
            disputes,
            resolutions,
        } = snapshot;
        let store = Self::new(invoices, disputes)?;
        Ok((store, ResolutionCatalog::new(resolutions)))
    }

    /// All disputes, in seed order
    #[inline]
    #[must_use]
    pub fn disputes(&self) -> &[Dispute] {
        &self.disputes
    }

    /// All invoices, in seed order
    #[inline]
    #[must_use]
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Dispute by id
    #[must_use]
    pub fn dispute(&self, id: &DisputeId) -> Option<&Dispute> {
        self.disputes.iter().find(|d| &d.id == id)
    }

    /// Current invoice by id
    #[must_use]
    pub fn invoice(&self, id: &InvoiceId) -> Option<&Invoice> {
        self.invoices.iter().find(|i| &i.id == id)
    }

    /// Disputes with the given status, in seed order
    pub fn by_status(&self, status: DisputeStatus) -> impl Iterator<Item = &Dispute> {
        self.disputes.iter().filter(move |d| d.status == status)
    }

    /// Dashboard counters
    #[must_use]
    pub fn stats(&self) -> DisputeStats {
        self.disputes
            .iter()
            .fold(DisputeStats::default(), |mut stats, d| {
                stats.total += 1;
                match d.status {
                    DisputeStatus::Open => stats.open += 1,
                    DisputeStatus::Analyzing | DisputeStatus::Resolving => stats.in_progress += 1,
                    DisputeStatus::Resolved => stats.resolved += 1,
                }
                stats
            })
    }

    /// Pair a dispute with its invoice
    ///
    /// # Errors
    /// - `StoreError::DisputeNotFound` for an unknown dispute
    /// - `StoreError::InvoiceNotFound` when the referenced invoice is absent
    pub fn select(&self, id: &DisputeId) -> Result<DisputeView<'_>, StoreError> {
        let dispute = self
            .dispute(id)
            .ok_or_else(|| StoreError::DisputeNotFound(id.clone()))?;
        let invoice = self
            .invoice(&dispute.invoice_id)
            .ok_or_else(|| StoreError::InvoiceNotFound {
                dispute: dispute.id.clone(),
                invoice: dispute.invoice_id.clone(),
            })?;
        Ok(DisputeView { dispute, invoice })
    }

    /// Move a dispute one lifecycle step
    ///
    /// # Errors
    /// - `StoreError::DisputeNotFound` for an unknown dispute
    /// - `StoreError::InvalidTransition` if the step is not allowed
    pub fn transition(&mut self, id: &DisputeId, to: DisputeStatus) -> Result<(), StoreError> {
        let dispute = self.dispute_mut(id)?;
        let from = dispute.status;
        if !from.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                dispute: id.clone(),
                from,
                to,
            });
        }
        dispute.status = to;
        tracing::debug!(dispute = %id, %from, %to, "dispute transitioned");
        Ok(())
    }

    /// Start resolving an open dispute
    ///
    /// Returns the dispute value a playback should run against. Triggering a
    /// dispute that is not open is rejected.
    ///
    /// # Errors
    /// - `StoreError::DisputeNotFound` for an unknown dispute
    /// - `StoreError::InvoiceNotFound` when the referenced invoice is absent
    /// - `StoreError::InvalidTransition` unless the dispute is open
    pub fn begin_resolution(&mut self, id: &DisputeId) -> Result<Dispute, StoreError> {
        self.select(id)?;
        let status = self
            .dispute(id)
            .map(|d| d.status)
            .ok_or_else(|| StoreError::DisputeNotFound(id.clone()))?;
        if status != DisputeStatus::Open {
            return Err(StoreError::InvalidTransition {
                dispute: id.clone(),
                from: status,
                to: DisputeStatus::Analyzing,
            });
        }
        self.transition(id, DisputeStatus::Analyzing)?;
        tracing::info!(dispute = %id, "resolution started");
        self.dispute(id)
            .cloned()
            .ok_or_else(|| StoreError::DisputeNotFound(id.clone()))
    }

    /// Return an in-progress dispute to open after its playback was torn down
    ///
    /// # Errors
    /// - `StoreError::DisputeNotFound` for an unknown dispute
    /// - `StoreError::InvalidTransition` unless a playback owns the dispute
    pub fn abandon_resolution(&mut self, id: &DisputeId) -> Result<(), StoreError> {
        self.transition(id, DisputeStatus::Open)?;
        tracing::warn!(dispute = %id, "resolution abandoned");
        Ok(())
    }

    /// Store a resolved dispute and swap in its corrected invoice
    ///
    /// The dispute is replaced wholesale. When the resolution carries a
    /// corrected invoice, the invoice with id `updated.invoice_id` is
    /// replaced wholesale and the pre-correction value is kept for
    /// [`DisputeStore::comparison`].
    ///
    /// # Errors
    /// - `StoreError::DisputeNotFound` for an unknown dispute
    /// - `StoreError::InvalidTransition` if the stored dispute cannot move to
    ///   the updated status
    /// - `StoreError::MissingCorrectedInvoice` if `updated` is resolved
    ///   without a corrected invoice
    /// - `StoreError::CorrectedInvoiceMismatch` if the corrected invoice's id
    ///   is not `updated.invoice_id`
    /// - `StoreError::InvoiceNotFound` if the referenced invoice is absent
    pub fn apply_resolution(&mut self, updated: Dispute) -> Result<(), StoreError> {
        let id = updated.id.clone();
        let from = self
            .dispute(&id)
            .map(|d| d.status)
            .ok_or_else(|| StoreError::DisputeNotFound(id.clone()))?;
        if !from.can_transition_to(updated.status) {
            return Err(StoreError::InvalidTransition {
                dispute: id,
                from,
                to: updated.status,
            });
        }
        if updated.is_resolved() && updated.corrected_invoice().is_none() {
            return Err(StoreError::MissingCorrectedInvoice(id));
        }

        if let Some(corrected) = updated.corrected_invoice() {
            let invoice_id = updated.invoice_id.clone();
            if corrected.id != invoice_id {
                return Err(StoreError::CorrectedInvoiceMismatch {
                    dispute: id,
                    expected: invoice_id,
                    corrected: corrected.id.clone(),
                });
            }
            let slot = self
                .invoices
                .iter_mut()
                .find(|i| i.id == invoice_id)
                .ok_or_else(|| StoreError::InvoiceNotFound {
                    dispute: id.clone(),
                    invoice: invoice_id.clone(),
                })?;
            let previous = std::mem::replace(slot, corrected.clone());
            self.originals.entry(invoice_id.clone()).or_insert(previous);
            tracing::info!(dispute = %id, invoice = %invoice_id, "invoice replaced by corrected invoice");
        }

        let to = updated.status;
        *self.dispute_mut(&id)? = updated;
        tracing::info!(dispute = %id, %from, %to, "resolution applied");
        Ok(())
    }

    /// Original vs corrected invoice for a resolved dispute
    ///
    /// # Errors
    /// - `StoreError::DisputeNotFound` for an unknown dispute
    /// - `StoreError::NotResolved` unless the dispute is resolved
    /// - `StoreError::MissingCorrectedInvoice` if the resolution lacks one
    /// - `StoreError::InvoiceNotFound` if no original invoice is known
    pub fn comparison(&self, id: &DisputeId) -> Result<InvoiceComparison, StoreError> {
        let dispute = self
            .dispute(id)
            .ok_or_else(|| StoreError::DisputeNotFound(id.clone()))?;
        if !dispute.is_resolved() {
            return Err(StoreError::NotResolved {
                dispute: id.clone(),
                status: dispute.status,
            });
        }
        let resolution = dispute
            .resolution
            .as_ref()
            .ok_or_else(|| StoreError::MissingCorrectedInvoice(id.clone()))?;
        let corrected = resolution
            .corrected_invoice
            .clone()
            .ok_or_else(|| StoreError::MissingCorrectedInvoice(id.clone()))?;

        // Seeds that arrive already resolved have no recorded original
        let original = self
            .originals
            .get(&dispute.invoice_id)
            .or_else(|| self.invoice(&dispute.invoice_id))
            .cloned()
            .ok_or_else(|| StoreError::InvoiceNotFound {
                dispute: id.clone(),
                invoice: dispute.invoice_id.clone(),
            })?;

        Ok(InvoiceComparison {
            original,
            corrected,
            changes: resolution.changes.clone(),
        })
    }

    fn dispute_mut(&mut self, id: &DisputeId) -> Result<&mut Dispute, StoreError> {
        self.disputes
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| StoreError::DisputeNotFound(id.clone()))
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DisputeType, InvoiceStatus, LineItem, Resolution};
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn invoice(id: &str, dollars: i64) -> Invoice {
        Invoice {
            id: InvoiceId::new(id),
            invoice_number: format!("{id}-NUM"),
            customer_name: "Acme Corp".to_string(),
            amount: Money::from_dollars(dollars),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            po_number: None,
            line_items: vec![LineItem::new("Widget", 1, Money::from_dollars(dollars))],
            status: InvoiceStatus::Disputed,
        }
    }

    fn dispute(id: &str, invoice_id: &str) -> Dispute {
        Dispute {
            id: DisputeId::new(id),
            invoice_id: InvoiceId::new(invoice_id),
            customer_email: "ap@acmecorp.com".to_string(),
            subject: "Missing PO".to_string(),
            message: "Please add the PO".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 29, 10, 30, 0).unwrap(),
            dispute_type: DisputeType::MissingPo,
            status: DisputeStatus::Open,
            ai_analysis: None,
            resolution: None,
        }
    }

    fn store() -> DisputeStore {
        DisputeStore::new(
            vec![invoice("INV-1", 100), invoice("INV-2", 200)],
            vec![dispute("D-1", "INV-1"), dispute("D-2", "INV-2")],
        )
        .unwrap()
    }

    fn resolved(mut d: Dispute, corrected: Option<Invoice>) -> Dispute {
        d.status = DisputeStatus::Resolved;
        d.ai_analysis = Some("analysis".to_string());
        d.resolution = Some(Resolution {
            action: "fixed".to_string(),
            changes: vec!["change".to_string()],
            corrected_invoice: corrected,
        });
        d
    }

    #[test]
    fn duplicate_ids_rejected() {
        let result = DisputeStore::new(vec![invoice("INV-1", 1), invoice("INV-1", 2)], vec![]);
        assert!(matches!(
            result,
            Err(StoreError::DuplicateId { kind: "invoice", .. })
        ));
    }

    #[test]
    fn select_pairs_dispute_and_invoice() {
        let store = store();
        let view = store.select(&DisputeId::new("D-2")).unwrap();
        assert_eq!(view.invoice.id, InvoiceId::new("INV-2"));
        assert!(view.totals().is_consistent());
    }

    #[test]
    fn select_signals_missing_invoice() {
        let store = DisputeStore::new(vec![], vec![dispute("D-1", "INV-GONE")]).unwrap();
        let err = store.select(&DisputeId::new("D-1")).unwrap_err();
        assert!(matches!(err, StoreError::InvoiceNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn begin_resolution_only_once() {
        let mut store = store();
        let id = DisputeId::new("D-1");

        let started = store.begin_resolution(&id).unwrap();
        assert_eq!(started.status, DisputeStatus::Analyzing);
        assert_eq!(store.stats().in_progress, 1);

        let again = store.begin_resolution(&id);
        assert!(matches!(again, Err(StoreError::InvalidTransition { .. })));
    }

    #[test]
    fn abandon_returns_to_open() {
        let mut store = store();
        let id = DisputeId::new("D-1");
        store.begin_resolution(&id).unwrap();
        store.abandon_resolution(&id).unwrap();
        assert!(store.dispute(&id).unwrap().is_open());

        // Nothing to abandon on an open dispute
        assert!(store.abandon_resolution(&id).is_err());
    }

    #[test]
    fn apply_resolution_replaces_invoice_and_keeps_original() {
        let mut store = store();
        let id = DisputeId::new("D-1");
        let started = store.begin_resolution(&id).unwrap();

        let mut corrected = invoice("INV-1", 80);
        corrected.status = InvoiceStatus::Resolved;
        store
            .apply_resolution(resolved(started, Some(corrected.clone())))
            .unwrap();

        assert_eq!(store.invoice(&InvoiceId::new("INV-1")), Some(&corrected));
        assert!(store.dispute(&id).unwrap().is_resolved());

        let cmp = store.comparison(&id).unwrap();
        assert_eq!(cmp.original.amount, Money::from_dollars(100));
        assert_eq!(cmp.corrected.amount, Money::from_dollars(80));
        assert_eq!(cmp.credit_memo(), Some(Money::from_dollars(20)));
        assert!(cmp.amount_changed());
    }

    #[test]
    fn apply_resolution_requires_corrected_invoice() {
        let mut store = store();
        let id = DisputeId::new("D-1");
        let started = store.begin_resolution(&id).unwrap();

        let err = store.apply_resolution(resolved(started, None)).unwrap_err();
        assert!(matches!(err, StoreError::MissingCorrectedInvoice(_)));
        assert_eq!(
            store.dispute(&id).unwrap().status,
            DisputeStatus::Analyzing
        );
    }

    #[test]
    fn apply_resolution_rejects_foreign_corrected_invoice() {
        let mut store = store();
        let id = DisputeId::new("D-1");
        let started = store.begin_resolution(&id).unwrap();

        let err = store
            .apply_resolution(resolved(started, Some(invoice("INV-9", 90))))
            .unwrap_err();
        assert!(matches!(err, StoreError::CorrectedInvoiceMismatch { .. }));
        assert!(err.is_invariant_violation());
        assert_eq!(
            store.dispute(&id).unwrap().status,
            DisputeStatus::Analyzing
        );
        assert!(store.select(&id).is_ok());
    }

    #[test]
    fn apply_resolution_rejects_resolved_dispute() {
        let mut store = store();
        let id = DisputeId::new("D-1");
        let started = store.begin_resolution(&id).unwrap();
        let done = resolved(started, Some(invoice("INV-1", 90)));
        store.apply_resolution(done.clone()).unwrap();

        let err = store.apply_resolution(done).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn comparison_requires_resolved() {
        let store = store();
        let err = store.comparison(&DisputeId::new("D-1")).unwrap_err();
        assert!(matches!(err, StoreError::NotResolved { .. }));
    }

    #[test]
    fn stats_count_statuses() {
        let mut store = store();
        store.begin_resolution(&DisputeId::new("D-2")).unwrap();
        assert_eq!(
            store.stats(),
            DisputeStats {
                total: 2,
                open: 1,
                in_progress: 1,
                resolved: 0,
            }
        );
        assert_eq!(store.by_status(DisputeStatus::Open).count(), 1);
    }

    #[test]
    fn snapshot_from_json_errors_on_garbage() {
        assert!(matches!(
            Snapshot::from_json("{ not json"),
            Err(StoreError::Snapshot(_))
        ));
    }
}
