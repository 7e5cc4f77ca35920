//! Step tracker
//!
//! A fixed-length, ordered list of labeled steps with a tri-state status and
//! an optional detail line. The tracker is a plain value holder: it does not
//! enforce pending → in-progress → complete. Ordering is the orchestrator's
//! job.

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tri-state step status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Complete,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in-progress",
            StepStatus::Complete => "complete",
        })
    }
}

/// One labeled step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStep {
    pub label: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResolutionStep {
    /// Pending step with no detail
    #[inline]
    #[must_use]
    pub fn pending(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: StepStatus::Pending,
            detail: None,
        }
    }
}

/// Ordered, fixed-length list of steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepTracker {
    steps: Vec<ResolutionStep>,
}

impl StepTracker {
    /// All-pending tracker over `labels`
    #[must_use]
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: labels.into_iter().map(ResolutionStep::pending).collect(),
        }
    }

    /// Set the status of step `index`
    ///
    /// # Errors
    /// - `TrackerError::OutOfRange` if `index >= len`
    pub fn set_status(&mut self, index: usize, status: StepStatus) -> Result<(), TrackerError> {
        self.step_mut(index)?.status = status;
        Ok(())
    }

    /// Set the detail line of step `index`
    ///
    /// # Errors
    /// - `TrackerError::OutOfRange` if `index >= len`
    pub fn set_detail(
        &mut self,
        index: usize,
        detail: impl Into<String>,
    ) -> Result<(), TrackerError> {
        self.step_mut(index)?.detail = Some(detail.into());
        Ok(())
    }

    /// Mark step `index` complete with a detail line
    ///
    /// # Errors
    /// - `TrackerError::OutOfRange` if `index >= len`
    pub fn complete(&mut self, index: usize, detail: impl Into<String>) -> Result<(), TrackerError> {
        let step = self.step_mut(index)?;
        step.status = StepStatus::Complete;
        step.detail = Some(detail.into());
        Ok(())
    }

    /// Steps in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[ResolutionStep] {
        &self.steps
    }

    /// Step at `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ResolutionStep> {
        self.steps.get(index)
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the tracker holds no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps currently in progress
    #[must_use]
    pub fn in_progress_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::InProgress)
            .count()
    }

    /// Position of the first in-progress step
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.status == StepStatus::InProgress)
    }

    /// Whether every step is complete
    #[must_use]
    pub fn all_complete(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Complete)
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut ResolutionStep, TrackerError> {
        let len = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(TrackerError::OutOfRange { index, len })
    }
}
