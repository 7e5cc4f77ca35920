//! Playback orchestrator
//!
//! Drives a [`PlaybackScript`] against one dispute:
//! 1. Marks each phase in progress
//! 2. Types its narration through the text revealer, one message at a time
//! 3. Marks it complete with its detail line and hands off to the next phase
//! 4. After the last phase: pauses, flags completion, builds the resolved
//!    dispute from the catalog entry, pauses again, and delivers it once
//!
//! # State machine
//!
//! IDLE → RUNNING(0..n) → FINISHING → COMPLETED
//!
//! The hand-off between phases is a single frame: the step that finishes and
//! the step that starts change together, so every RUNNING frame has exactly
//! one step in progress and no step ever moves backwards.

use crate::error::{PlaybackError, TrackerError};
use crate::revealer::{pause, TextRevealer};
use crate::script::PlaybackScript;
use crate::tracker::{ResolutionStep, StepStatus, StepTracker};
use dre_core::{Dispute, DisputeStatus, ResolutionCatalog, ResolutionEntry};
use futures::{Stream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;
use ulid::Ulid;

/// Unique playback identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaybackId(pub Ulid);

impl PlaybackId {
    /// Generate new playback ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for PlaybackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a playback is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing started yet
    Idle,
    /// Phase `phase` is in progress
    Running { phase: usize },
    /// Every phase complete, completion flag not yet raised
    Finishing,
    /// Completion flag raised
    Completed,
}

impl PlaybackState {
    /// Whether a phase is currently running
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Running { .. })
    }
}

/// Full snapshot of a playback at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackFrame {
    pub playback: PlaybackId,
    pub state: PlaybackState,
    pub steps: Vec<ResolutionStep>,
    /// Narration buffer as currently revealed
    pub narration: String,
    /// Completion flag
    pub complete: bool,
}

impl PlaybackFrame {
    /// Number of steps in progress
    #[must_use]
    pub fn in_progress_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::InProgress)
            .count()
    }

    /// The in-progress step, if any
    #[must_use]
    pub fn active_step(&self) -> Option<&ResolutionStep> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::InProgress)
    }
}

/// Item produced by a playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackUpdate {
    /// State snapshot
    Frame(PlaybackFrame),
    /// The resolved dispute; produced exactly once, last
    Resolved(Box<Dispute>),
}

/// Build the resolved dispute from the original and its catalog entry
///
/// Pure: the same inputs always produce the same value.
#[must_use]
pub fn resolve_dispute(dispute: &Dispute, entry: &ResolutionEntry) -> Dispute {
    Dispute {
        status: DisputeStatus::Resolved,
        ai_analysis: Some(entry.ai_analysis.clone()),
        resolution: Some(entry.to_resolution()),
        ..dispute.clone()
    }
}

/// Runs scripted playbacks against a resolution catalog
#[derive(Debug, Clone)]
pub struct Orchestrator {
    catalog: Arc<ResolutionCatalog>,
    script: Arc<PlaybackScript>,
}

impl Orchestrator {
    /// Orchestrator running the standard script
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<ResolutionCatalog>) -> Self {
        Self {
            catalog,
            script: Arc::new(PlaybackScript::standard()),
        }
    }

    /// Replace the script
    #[inline]
    #[must_use]
    pub fn with_script(mut self, script: PlaybackScript) -> Self {
        self.script = Arc::new(script);
        self
    }

    /// Script in use
    #[inline]
    #[must_use]
    pub fn script(&self) -> &PlaybackScript {
        &self.script
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &ResolutionCatalog {
        &self.catalog
    }

    /// Look up the dispute's resolution and prepare one playback
    ///
    /// All lookups happen here, so a playback that was prepared cannot fail
    /// partway through.
    ///
    /// # Errors
    /// - `PlaybackError::ResolutionNotFound` if the catalog has no entry
    /// - `PlaybackError::MissingCorrectedInvoice` if the entry would resolve
    ///   the dispute without a corrected invoice
    pub fn prepare(&self, dispute: Dispute) -> Result<Playback, PlaybackError> {
        let entry = self.catalog.lookup(&dispute.id)?.clone();
        if entry.corrected_invoice.is_none() {
            return Err(PlaybackError::MissingCorrectedInvoice(dispute.id));
        }

        let playback = Playback {
            id: PlaybackId::new(),
            dispute,
            entry,
            script: Arc::clone(&self.script),
        };
        tracing::debug!(
            playback = %playback.id,
            dispute = %playback.dispute.id,
            phases = playback.script.phases.len(),
            "playback prepared"
        );
        Ok(playback)
    }
}

/// One prepared run of the script against one dispute
#[derive(Debug, Clone)]
pub struct Playback {
    id: PlaybackId,
    dispute: Dispute,
    entry: ResolutionEntry,
    script: Arc<PlaybackScript>,
}

impl Playback {
    /// Playback ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> PlaybackId {
        self.id
    }

    /// Dispute being played
    #[inline]
    #[must_use]
    pub fn dispute(&self) -> &Dispute {
        &self.dispute
    }

    /// Catalog entry the result is drawn from
    #[inline]
    #[must_use]
    pub fn entry(&self) -> &ResolutionEntry {
        &self.entry
    }

    /// Script being run
    #[inline]
    #[must_use]
    pub fn script(&self) -> &PlaybackScript {
        &self.script
    }

    /// Lazy, finite stream of updates
    ///
    /// Frames in script order, then exactly one `Resolved`. Dropping the
    /// stream tears the playback down; nothing further is produced.
    pub fn updates(self) -> impl Stream<Item = PlaybackUpdate> + Send + 'static {
        let Playback {
            id,
            dispute,
            entry,
            script,
        } = self;

        async_stream::stream! {
            let mut tracker = StepTracker::new(script.labels());
            let mut narration = String::new();

            tracing::info!(playback = %id, dispute = %dispute.id, "playback started");
            yield PlaybackUpdate::Frame(frame(id, PlaybackState::Idle, &tracker, &narration, false));

            let mut state = match start_first(&mut tracker) {
                Ok(state) => state,
                Err(err) => {
                    tracing::error!(playback = %id, %err, "step tracker rejected scripted phase");
                    return;
                }
            };
            if state.is_running() {
                yield PlaybackUpdate::Frame(frame(id, state, &tracker, &narration, false));
            }

            for (index, phase) in script.phases.iter().enumerate() {
                tracing::debug!(playback = %id, phase = index, label = %phase.label, "phase running");

                for line in &phase.narration {
                    let revealer = TextRevealer::new(line.fragment.render(&dispute, &entry), line.char_delay);
                    let typed = revealer.reveal();
                    futures::pin_mut!(typed);
                    while let Some(prefix) = typed.next().await {
                        narration = prefix;
                        yield PlaybackUpdate::Frame(frame(id, state, &tracker, &narration, false));
                    }
                    pause(line.pause_after).await;
                    if line.line_break {
                        narration.push('\n');
                        yield PlaybackUpdate::Frame(frame(id, state, &tracker, &narration, false));
                    }
                }
                pause(phase.settle).await;

                state = match hand_off(&mut tracker, index, &phase.detail) {
                    Ok(next) => next,
                    Err(err) => {
                        tracing::error!(playback = %id, phase = index, %err, "step tracker rejected scripted phase");
                        return;
                    }
                };
                if state.is_running() {
                    narration.clear();
                }
                tracing::info!(playback = %id, phase = index, detail = %phase.detail, "phase complete");
                yield PlaybackUpdate::Frame(frame(id, state, &tracker, &narration, false));
            }

            pause(script.completion_pause).await;
            yield PlaybackUpdate::Frame(frame(id, PlaybackState::Completed, &tracker, &narration, true));

            let resolved = resolve_dispute(&dispute, &entry);
            pause(script.delivery_pause).await;
            tracing::info!(playback = %id, dispute = %resolved.id, "playback delivered resolution");
            yield PlaybackUpdate::Resolved(Box::new(resolved));
        }
    }

    /// Drive the playback to completion, calling `on_frame` for each frame
    ///
    /// # Errors
    /// - `PlaybackError::Interrupted` if the stream ended without a result
    pub async fn run<F>(self, mut on_frame: F) -> Result<Dispute, PlaybackError>
    where
        F: FnMut(&PlaybackFrame),
    {
        let span = tracing::info_span!("playback", playback = %self.id, dispute = %self.dispute.id);
        let updates = self.updates();

        async move {
            futures::pin_mut!(updates);
            while let Some(update) = updates.next().await {
                match update {
                    PlaybackUpdate::Frame(frame) => on_frame(&frame),
                    PlaybackUpdate::Resolved(dispute) => return Ok(*dispute),
                }
            }
            Err(PlaybackError::Interrupted)
        }
        .instrument(span)
        .await
    }
}

fn frame(
    playback: PlaybackId,
    state: PlaybackState,
    tracker: &StepTracker,
    narration: &str,
    complete: bool,
) -> PlaybackFrame {
    PlaybackFrame {
        playback,
        state,
        steps: tracker.steps().to_vec(),
        narration: narration.to_string(),
        complete,
    }
}

fn start_first(tracker: &mut StepTracker) -> Result<PlaybackState, TrackerError> {
    if tracker.is_empty() {
        return Ok(PlaybackState::Finishing);
    }
    tracker.set_status(0, StepStatus::InProgress)?;
    Ok(PlaybackState::Running { phase: 0 })
}

/// Complete phase `index` and start the next one in the same step
fn hand_off(
    tracker: &mut StepTracker,
    index: usize,
    detail: &str,
) -> Result<PlaybackState, TrackerError> {
    tracker.complete(index, detail)?;
    let next = index + 1;
    if next < tracker.len() {
        tracker.set_status(next, StepStatus::InProgress)?;
        Ok(PlaybackState::Running { phase: next })
    } else {
        Ok(PlaybackState::Finishing)
    }
}
