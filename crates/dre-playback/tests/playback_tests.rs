//! Playback Tests
//!
//! End-to-end runs of the standard script against the seed disputes, on
//! tokio's paused clock.

use dre_core::{DisputeId, DisputeStatus, Money, ResolutionCatalog};
use dre_playback::prelude::*;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator() -> Orchestrator {
    let (_, catalog) = dre_fixtures::seed_store();
    Orchestrator::new(Arc::new(catalog))
}

async fn collect(id: &str) -> Vec<PlaybackUpdate> {
    orchestrator()
        .prepare(dre_fixtures::dispute(id))
        .unwrap()
        .updates()
        .collect()
        .await
}

fn frames(updates: &[PlaybackUpdate]) -> Vec<&PlaybackFrame> {
    updates
        .iter()
        .filter_map(|u| match u {
            PlaybackUpdate::Frame(f) => Some(f),
            PlaybackUpdate::Resolved(_) => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_missing_po_resolution_updates_store() {
    let (mut store, catalog) = dre_fixtures::seed_store();
    let orchestrator = Orchestrator::new(Arc::new(catalog));
    let id = DisputeId::new("DISP-001");

    let dispute = store.begin_resolution(&id).unwrap();
    assert_eq!(dispute.status, DisputeStatus::Analyzing);

    let resolved = orchestrator.prepare(dispute).unwrap().run(|_| {}).await.unwrap();
    let resolution = resolved.resolution.clone().unwrap();
    assert!(resolution
        .changes
        .contains(&"Added PO Number: PO-2024-123".to_string()));

    store.apply_resolution(resolved).unwrap();

    let view = store.select(&id).unwrap();
    assert_eq!(view.dispute.status, DisputeStatus::Resolved);
    assert_eq!(view.invoice.po_number.as_deref(), Some("PO-2024-123"));

    let comparison = store.comparison(&id).unwrap();
    assert_eq!(comparison.original.po_number, None);
    assert!(!comparison.amount_changed());
}

#[tokio::test(start_paused = true)]
async fn test_pricing_error_resolution() {
    let (mut store, catalog) = dre_fixtures::seed_store();
    let orchestrator = Orchestrator::new(Arc::new(catalog));
    let id = DisputeId::new("DISP-002");

    let dispute = store.begin_resolution(&id).unwrap();
    let resolved = orchestrator.prepare(dispute).unwrap().run(|_| {}).await.unwrap();

    let corrected = resolved.corrected_invoice().unwrap();
    assert_eq!(corrected.amount, Money::from_dollars(7_500));
    assert!(resolved
        .resolution
        .as_ref()
        .unwrap()
        .changes
        .iter()
        .any(|c| c.contains("$200 → $175")));

    store.apply_resolution(resolved).unwrap();
    let comparison = store.comparison(&id).unwrap();
    assert_eq!(comparison.original.amount, Money::from_dollars(8_500));
    assert_eq!(comparison.credit_memo(), Some(Money::from_dollars(1_000)));
}

#[tokio::test(start_paused = true)]
async fn test_resolved_delivered_once_and_last() {
    let updates = collect("DISP-003").await;

    let resolved: Vec<usize> = updates
        .iter()
        .enumerate()
        .filter(|(_, u)| matches!(u, PlaybackUpdate::Resolved(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(resolved, vec![updates.len() - 1]);

    let frames = frames(&updates);
    let last = frames.last().unwrap();
    assert!(last.complete);
    assert_eq!(last.state, PlaybackState::Completed);
    assert!(last.steps.iter().all(|s| s.status == StepStatus::Complete));
}

#[tokio::test(start_paused = true)]
async fn test_one_step_in_progress_while_running() {
    let updates = collect("DISP-001").await;
    let frames = frames(&updates);

    assert_eq!(frames[0].state, PlaybackState::Idle);
    assert!(frames[0].steps.iter().all(|s| s.status == StepStatus::Pending));

    for frame in &frames {
        if let PlaybackState::Running { phase } = frame.state {
            assert_eq!(frame.in_progress_count(), 1);
            assert_eq!(frame.steps[phase].status, StepStatus::InProgress);
            assert!(frame.steps[..phase]
                .iter()
                .all(|s| s.status == StepStatus::Complete));
        } else {
            assert_eq!(frame.in_progress_count(), 0);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_step_status_never_regresses() {
    let updates = collect("DISP-002").await;
    let frames = frames(&updates);

    for pair in frames.windows(2) {
        for (before, after) in pair[0].steps.iter().zip(&pair[1].steps) {
            assert!(after.status >= before.status, "{before:?} -> {after:?}");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_completed_steps_carry_details() {
    let updates = collect("DISP-001").await;
    let last = *frames(&updates).last().unwrap();

    let details: Vec<&str> = last
        .steps
        .iter()
        .map(|s| s.detail.as_deref().unwrap())
        .collect();
    assert_eq!(
        details,
        vec![
            "Customer complaint analyzed",
            "Dispute type identified",
            "Systems accessed",
            "Data verified",
            "Resolution generated",
            "Corrected invoice created",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_narration_follows_script() {
    let updates = collect("DISP-001").await;
    let frames = frames(&updates);

    let last_of = |phase: usize| {
        frames
            .iter()
            .filter(|f| f.state == PlaybackState::Running { phase })
            .last()
            .unwrap()
            .narration
            .clone()
    };
    let first_of = |phase: usize| {
        frames
            .iter()
            .find(|f| f.state == PlaybackState::Running { phase })
            .unwrap()
            .narration
            .clone()
    };

    assert_eq!(last_of(1), "Dispute classification: MISSING PO");
    // each typed prefix replaces the buffer; only the trailing break survives
    assert_eq!(last_of(2), "Loading customer history...\n");
    assert!(frames
        .iter()
        .any(|f| f.narration == "Connecting to ERP system...\n"));
    assert!(last_of(3).starts_with("Customer requires PO number"));
    assert_eq!(
        last_of(4),
        "Resolution: Retrieved PO number from internal order management system"
    );
    for phase in 0..6 {
        assert_eq!(first_of(phase), "", "phase {phase} starts with a clear buffer");
    }
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_matches_script_duration() {
    let orchestrator = orchestrator();
    let dispute = dre_fixtures::dispute("DISP-002");
    let entry = orchestrator.catalog().lookup(&dispute.id).unwrap().clone();
    let expected = orchestrator.script().duration_for(&dispute, &entry);

    let start = tokio::time::Instant::now();
    orchestrator.prepare(dispute).unwrap().run(|_| {}).await.unwrap();

    assert_eq!(start.elapsed(), expected);
    assert!(expected > Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_instant_playback_takes_no_time() {
    let orchestrator = orchestrator().with_script(PlaybackConfig::instant().script());

    let start = tokio::time::Instant::now();
    let resolved = orchestrator
        .prepare(dre_fixtures::dispute("DISP-003"))
        .unwrap()
        .run(|_| {})
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(resolved.is_resolved());
}

#[tokio::test(start_paused = true)]
async fn test_repeat_runs_are_identical() {
    let orchestrator = orchestrator().with_script(PlaybackConfig::instant().script());
    let dispute = dre_fixtures::dispute("DISP-002");

    let first = orchestrator.prepare(dispute.clone()).unwrap().run(|_| {}).await.unwrap();
    let second = orchestrator.prepare(dispute).unwrap().run(|_| {}).await.unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_lookup_miss_rejected_before_playback() {
    let catalog: ResolutionCatalog = dre_fixtures::seed_snapshot()
        .resolutions
        .into_iter()
        .filter(|(id, _)| id.as_str() != "DISP-003")
        .collect();
    let orchestrator = Orchestrator::new(Arc::new(catalog));

    let err = orchestrator
        .prepare(dre_fixtures::dispute("DISP-003"))
        .unwrap_err();
    assert!(matches!(err, PlaybackError::ResolutionNotFound(_)));
    assert!(err.is_precondition());
}

#[test]
fn test_entry_without_corrected_invoice_rejected() {
    let catalog: ResolutionCatalog = dre_fixtures::seed_snapshot()
        .resolutions
        .into_iter()
        .map(|(id, mut entry)| {
            entry.corrected_invoice = None;
            (id, entry)
        })
        .collect();
    let orchestrator = Orchestrator::new(Arc::new(catalog));

    let err = orchestrator
        .prepare(dre_fixtures::dispute("DISP-001"))
        .unwrap_err();
    assert!(matches!(err, PlaybackError::MissingCorrectedInvoice(_)));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_stream_is_torn_down() {
    let orchestrator = orchestrator();
    let dispute = dre_fixtures::dispute("DISP-001");
    let entry = orchestrator.catalog().lookup(&dispute.id).unwrap().clone();
    let full = orchestrator.script().duration_for(&dispute, &entry);
    let start = tokio::time::Instant::now();

    let produced = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&produced);
    let mut updates = Box::pin(orchestrator.prepare(dispute).unwrap().updates().inspect(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));
    for _ in 0..10 {
        let update = updates.next().await;
        assert!(matches!(update, Some(PlaybackUpdate::Frame(f)) if !f.complete));
    }
    let at_drop = start.elapsed();
    drop(updates);

    assert_eq!(Arc::strong_count(&produced), 1);
    tokio::time::sleep(full).await;
    assert_eq!(produced.load(Ordering::SeqCst), 10);
    assert!(at_drop < full);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_playback_resolves_store_dispute() {
    let (mut store, catalog) = dre_fixtures::seed_store();
    let orchestrator = Orchestrator::new(Arc::new(catalog));
    let id = DisputeId::new("DISP-003");

    let dispute = store.begin_resolution(&id).unwrap();
    let handle = spawn(orchestrator.prepare(dispute).unwrap(), |_| {}, |_| {});

    match handle.join().await.unwrap() {
        PlaybackOutcome::Resolved(dispute) => store.apply_resolution(*dispute).unwrap(),
        PlaybackOutcome::Cancelled => panic!("playback was not cancelled"),
    }

    let comparison = store.comparison(&id).unwrap();
    assert_eq!(comparison.corrected.amount, Money::from_dollars(20_000));
    assert_eq!(comparison.credit_memo(), Some(Money::from_dollars(4_500)));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_playback_abandons_resolution() {
    let (mut store, catalog) = dre_fixtures::seed_store();
    let orchestrator = Orchestrator::new(Arc::new(catalog));
    let id = DisputeId::new("DISP-001");

    let dispute = store.begin_resolution(&id).unwrap();
    let handle = spawn(orchestrator.prepare(dispute).unwrap(), |_| {}, |_| {});
    tokio::time::sleep(Duration::from_secs(2)).await;
    handle.cancel();

    assert!(handle.join().await.unwrap().is_cancelled());
    store.abandon_resolution(&id).unwrap();
    assert_eq!(store.dispute(&id).unwrap().status, DisputeStatus::Open);
    assert!(store.begin_resolution(&id).is_ok());
}
