//! A dashboard session: one store, one orchestrator
//!
//! Resolving a dispute:
//! 1. `begin_resolution` moves it to ANALYZING
//! 2. The playback runs in the background; frames are rendered as they come
//! 3. Once the resolution phase starts, the dispute moves to RESOLVING
//! 4. On completion the resolved dispute and its corrected invoice are
//!    applied; on Ctrl-C the playback is torn down and the dispute reopened

use crate::render::{self, FrameRenderer};
use anyhow::Context;
use chrono::Utc;
use dre_core::{DisputeId, DisputeStatus, DisputeStore, ResolutionCatalog, Snapshot};
use dre_playback::{Orchestrator, Playback, PlaybackOutcome, PlaybackScript, PlaybackState};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Phase whose start moves the dispute to RESOLVING
const RESOLVING_PHASE: usize = 4;

pub(crate) struct Session {
    store: DisputeStore,
    orchestrator: Orchestrator,
}

impl Session {
    pub(crate) fn new(store: DisputeStore, catalog: ResolutionCatalog) -> Self {
        Self {
            store,
            orchestrator: Orchestrator::new(Arc::new(catalog)),
        }
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> anyhow::Result<Self> {
        let (store, catalog) =
            DisputeStore::from_snapshot(snapshot).context("building dispute store")?;
        Ok(Self::new(store, catalog))
    }

    #[must_use]
    pub(crate) fn with_script(mut self, script: PlaybackScript) -> Self {
        self.orchestrator = self.orchestrator.with_script(script);
        self
    }

    pub(crate) fn store(&self) -> &DisputeStore {
        &self.store
    }

    pub(crate) fn list(&self, status: Option<DisputeStatus>, out: &mut impl Write) -> anyhow::Result<()> {
        let text = match status {
            Some(status) => render::dispute_list(self.store.by_status(status)),
            None => render::dispute_list(self.store.disputes()),
        };
        out.write_all(text.as_bytes())?;
        Ok(())
    }

    pub(crate) fn show(&self, id: &DisputeId, out: &mut impl Write) -> anyhow::Result<()> {
        let view = self.store.select(id)?;
        out.write_all(render::dispute_detail(&view, Utc::now()).as_bytes())?;
        if view.dispute.is_resolved() {
            let comparison = self.store.comparison(id)?;
            writeln!(out)?;
            out.write_all(render::comparison(&comparison).as_bytes())?;
        }
        Ok(())
    }

    pub(crate) fn stats(&self, out: &mut impl Write) -> anyhow::Result<()> {
        out.write_all(render::stats(self.store.stats()).as_bytes())?;
        Ok(())
    }

    /// Play the resolution for one dispute until it completes or `interrupt`
    /// resolves
    pub(crate) async fn resolve<W, I>(
        &mut self,
        id: &DisputeId,
        out: &mut W,
        interrupt: I,
    ) -> anyhow::Result<PlaybackOutcome>
    where
        W: Write,
        I: Future<Output = ()>,
    {
        let dispute = self.store.begin_resolution(id)?;
        let playback = match self.orchestrator.prepare(dispute) {
            Ok(playback) => playback,
            Err(err) => {
                self.store.abandon_resolution(id)?;
                return Err(err).with_context(|| format!("preparing playback for {id}"));
            }
        };

        match self.play(id, playback, out, interrupt).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                // the playback is gone; a dispute it still owns goes back to open
                if self.store.dispute(id).is_some_and(|d| d.status.is_in_progress()) {
                    self.store.abandon_resolution(id)?;
                }
                Err(err)
            }
        }
    }

    async fn play<W, I>(
        &mut self,
        id: &DisputeId,
        playback: Playback,
        out: &mut W,
        interrupt: I,
    ) -> anyhow::Result<PlaybackOutcome>
    where
        W: Write,
        I: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = dre_playback::spawn(
            playback,
            move |frame| {
                let _ = tx.send(frame.clone());
            },
            |dispute| tracing::debug!(dispute = %dispute.id, "resolution delivered"),
        );

        let mut renderer = FrameRenderer::default();
        let mut resolving = false;
        tokio::pin!(interrupt);

        let header = self.store.select(id)?;
        writeln!(out, "Resolving {id}: {}\n", header.dispute.subject)?;

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    if !resolving {
                        if let PlaybackState::Running { phase } = frame.state {
                            if phase >= RESOLVING_PHASE {
                                self.store.transition(id, DisputeStatus::Resolving)?;
                                resolving = true;
                            }
                        }
                    }
                    out.write_all(renderer.render(&frame).as_bytes())?;
                    out.flush()?;
                }
                () = &mut interrupt => {
                    handle.cancel();
                    break;
                }
            }
        }

        let outcome = handle.join().await?;
        match &outcome {
            PlaybackOutcome::Resolved(dispute) => {
                self.store.apply_resolution(dispute.as_ref().clone())?;
                writeln!(out)?;
                out.write_all(render::comparison(&self.store.comparison(id)?).as_bytes())?;
            }
            PlaybackOutcome::Cancelled => {
                self.store.abandon_resolution(id)?;
                writeln!(out, "\nCancelled; {id} is open again.")?;
            }
        }
        Ok(outcome)
    }

    /// Resolve every open dispute in seed order, stopping at the first
    /// cancellation
    pub(crate) async fn resolve_all<W, F, I>(
        &mut self,
        out: &mut W,
        mut interrupt: F,
    ) -> anyhow::Result<usize>
    where
        W: Write,
        F: FnMut() -> I,
        I: Future<Output = ()>,
    {
        let open: Vec<DisputeId> = self
            .store
            .by_status(DisputeStatus::Open)
            .map(|d| d.id.clone())
            .collect();

        let mut resolved = 0;
        for id in open {
            if self.resolve(&id, out, interrupt()).await?.is_cancelled() {
                break;
            }
            resolved += 1;
            writeln!(out)?;
        }
        Ok(resolved)
    }
}
