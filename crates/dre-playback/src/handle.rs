//! Spawned playbacks
//!
//! [`spawn`] runs a prepared playback on the tokio runtime and hands back a
//! [`PlaybackHandle`]. Cancelling the handle, or dropping it, tears the
//! playback down: after teardown neither `on_frame` nor `on_complete` is
//! invoked again.

use crate::error::PlaybackError;
use crate::orchestrator::{Playback, PlaybackFrame, PlaybackId, PlaybackUpdate};
use dre_core::Dispute;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// How a spawned playback ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Ran to the end; `on_complete` was called with this dispute
    Resolved(Box<Dispute>),
    /// Torn down before delivery
    Cancelled,
}

impl PlaybackOutcome {
    /// The resolved dispute, if the playback completed
    #[must_use]
    pub fn into_resolved(self) -> Option<Dispute> {
        match self {
            PlaybackOutcome::Resolved(dispute) => Some(*dispute),
            PlaybackOutcome::Cancelled => None,
        }
    }

    /// Whether the playback was torn down
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlaybackOutcome::Cancelled)
    }
}

/// Owner of a running playback
///
/// Dropping the handle cancels the playback.
#[derive(Debug)]
pub struct PlaybackHandle {
    id: PlaybackId,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<PlaybackOutcome, PlaybackError>>>,
}

impl PlaybackHandle {
    /// ID of the running playback
    #[inline]
    #[must_use]
    pub fn id(&self) -> PlaybackId {
        self.id
    }

    /// Tear the playback down
    ///
    /// Idempotent. On a multi-threaded runtime a callback already underway
    /// may still finish; once [`PlaybackHandle::join`] resolves, no callback
    /// runs again.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(playback = %self.id, "playback cancelled");
        }
        self.cancel.cancel();
    }

    /// Whether `cancel` was called
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the task has stopped running
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the playback to end
    ///
    /// # Errors
    /// - `PlaybackError::Interrupted` if the update stream ended early
    /// - `PlaybackError::TaskFailed` if the task panicked or was aborted
    pub async fn join(mut self) -> Result<PlaybackOutcome, PlaybackError> {
        let Some(task) = self.task.take() else {
            return Err(PlaybackError::TaskFailed("playback already joined".to_string()));
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => Err(PlaybackError::TaskFailed(err.to_string())),
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Run `playback` in the background
///
/// `on_frame` is called for every frame in order. `on_complete` is called
/// exactly once with the resolved dispute, and only if the playback was not
/// torn down first.
///
/// Must be called from within a tokio runtime.
pub fn spawn<F, C>(playback: Playback, mut on_frame: F, on_complete: C) -> PlaybackHandle
where
    F: FnMut(&PlaybackFrame) + Send + 'static,
    C: FnOnce(&Dispute) + Send + 'static,
{
    let id = playback.id();
    let span = tracing::info_span!("playback", playback = %id, dispute = %playback.dispute().id);
    let cancel = CancellationToken::new();
    let token = cancel.child_token();

    let task = tokio::spawn(
        async move {
            let updates = playback.updates();
            futures::pin_mut!(updates);

            loop {
                let update = tokio::select! {
                    biased;
                    () = token.cancelled() => return Ok(PlaybackOutcome::Cancelled),
                    update = updates.next() => update,
                };
                if token.is_cancelled() {
                    return Ok(PlaybackOutcome::Cancelled);
                }

                match update {
                    Some(PlaybackUpdate::Frame(frame)) => on_frame(&frame),
                    Some(PlaybackUpdate::Resolved(dispute)) => {
                        on_complete(&dispute);
                        return Ok(PlaybackOutcome::Resolved(dispute));
                    }
                    None => {
                        tracing::warn!("playback stream ended without a resolution");
                        return Err(PlaybackError::Interrupted);
                    }
                }
            }
        }
        .instrument(span),
    );

    PlaybackHandle {
        id,
        cancel,
        task: Some(task),
    }
}
