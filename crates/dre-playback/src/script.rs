//! Playback script
//!
//! The script is data: an ordered list of phases, each with a label, the
//! narration typed out while it runs, a settle pause, and the detail line
//! shown once it completes. The orchestrator is a generic runner over it.

use crate::revealer::TextRevealer;
use dre_core::{Dispute, ResolutionEntry};
use std::time::Duration;

/// Narration text, literal or bound to the dispute being played
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Fixed text
    Literal(String),
    /// `Dispute classification: MISSING PO`
    Classification,
    /// The catalog entry's analysis text
    Analysis,
    /// `Resolution: <action>`
    Action,
}

impl Fragment {
    /// Fixed-text fragment
    #[inline]
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Fragment::Literal(text.into())
    }

    /// Text to type for `dispute`
    #[must_use]
    pub fn render(&self, dispute: &Dispute, entry: &ResolutionEntry) -> String {
        match self {
            Fragment::Literal(text) => text.clone(),
            Fragment::Classification => format!(
                "Dispute classification: {}",
                dispute.dispute_type.classification()
            ),
            Fragment::Analysis => entry.ai_analysis.clone(),
            Fragment::Action => format!("Resolution: {}", entry.action),
        }
    }
}

/// One typed message within a phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    pub fragment: Fragment,
    /// Suspension after each revealed character
    pub char_delay: Duration,
    /// Suspension once the message is fully typed
    pub pause_after: Duration,
    /// Append `\n` to the narration buffer after the pause
    pub line_break: bool,
}

impl Narration {
    /// Narration typed at `char_delay_ms` per character, no trailing pause
    #[inline]
    #[must_use]
    pub fn new(fragment: Fragment, char_delay_ms: u64) -> Self {
        Self {
            fragment,
            char_delay: Duration::from_millis(char_delay_ms),
            pause_after: Duration::ZERO,
            line_break: false,
        }
    }

    /// Pause once typed
    #[inline]
    #[must_use]
    pub fn then_pause(mut self, millis: u64) -> Self {
        self.pause_after = Duration::from_millis(millis);
        self
    }

    /// Break the line after the pause
    #[inline]
    #[must_use]
    pub fn with_line_break(mut self) -> Self {
        self.line_break = true;
        self
    }
}

/// One labeled phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseScript {
    pub label: String,
    pub narration: Vec<Narration>,
    /// Suspension after the last narration, before the phase completes
    pub settle: Duration,
    /// Detail line recorded on completion
    pub detail: String,
}

impl PhaseScript {
    /// Phase with no narration yet
    #[must_use]
    pub fn new(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            narration: Vec::new(),
            settle: Duration::ZERO,
            detail: detail.into(),
        }
    }

    /// Append a narration
    #[inline]
    #[must_use]
    pub fn narrate(mut self, narration: Narration) -> Self {
        self.narration.push(narration);
        self
    }

    /// Settle pause before completion
    #[inline]
    #[must_use]
    pub fn settle_for(mut self, millis: u64) -> Self {
        self.settle = Duration::from_millis(millis);
        self
    }
}

/// Full playback script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackScript {
    pub phases: Vec<PhaseScript>,
    /// Suspension between the last phase completing and the completion flag
    pub completion_pause: Duration,
    /// Suspension between the completion flag and delivery of the result
    pub delivery_pause: Duration,
}

const SYSTEM_MESSAGES: [&str; 4] = [
    "Connecting to ERP system...",
    "Retrieving purchase order database...",
    "Accessing contract repository...",
    "Loading customer history...",
];

const INVOICE_MESSAGES: [&str; 4] = [
    "Updating invoice details...",
    "Recalculating totals...",
    "Generating PDF...",
    "Preparing email to customer...",
];

impl PlaybackScript {
    /// The six-phase dispute resolution script
    #[must_use]
    pub fn standard() -> Self {
        let systems = SYSTEM_MESSAGES.iter().fold(
            PhaseScript::new("Accessing internal systems", "Systems accessed"),
            |phase, msg| {
                phase.narrate(
                    Narration::new(Fragment::literal(*msg), 15)
                        .then_pause(800)
                        .with_line_break(),
                )
            },
        );
        let invoice = INVOICE_MESSAGES.iter().fold(
            PhaseScript::new("Creating corrected invoice", "Corrected invoice created"),
            |phase, msg| {
                phase.narrate(
                    Narration::new(Fragment::literal(*msg), 15)
                        .then_pause(700)
                        .with_line_break(),
                )
            },
        );

        Self {
            phases: vec![
                PhaseScript::new("Analyzing customer message", "Customer complaint analyzed")
                    .narrate(
                        Narration::new(
                            Fragment::literal(
                                "Reading customer email... Extracting key information... \
                                 Identifying complaint details...",
                            ),
                            20,
                        )
                        .then_pause(1500),
                    ),
                PhaseScript::new("Identifying dispute type", "Dispute type identified")
                    .narrate(Narration::new(Fragment::Classification, 20).then_pause(1000)),
                systems.settle_for(500),
                PhaseScript::new("Verifying data", "Data verified")
                    .narrate(Narration::new(Fragment::Analysis, 15).then_pause(1500)),
                PhaseScript::new("Generating resolution", "Resolution generated")
                    .narrate(Narration::new(Fragment::Action, 20).then_pause(1200)),
                invoice.settle_for(500),
            ],
            completion_pause: Duration::from_millis(500),
            delivery_pause: Duration::from_millis(1000),
        }
    }

    /// Copy with every delay multiplied by `factor`
    ///
    /// A factor of `0.0` makes playback instant. Negative or NaN factors are
    /// treated as `0.0`; delays too long to represent saturate at
    /// [`Duration::MAX`].
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = if factor > 0.0 { factor } else { 0.0 };
        let scale = |d: Duration| {
            if d.is_zero() {
                return Duration::ZERO;
            }
            Duration::try_from_secs_f64(d.as_secs_f64() * factor).unwrap_or(Duration::MAX)
        };

        Self {
            phases: self
                .phases
                .iter()
                .map(|phase| PhaseScript {
                    label: phase.label.clone(),
                    narration: phase
                        .narration
                        .iter()
                        .map(|n| Narration {
                            fragment: n.fragment.clone(),
                            char_delay: scale(n.char_delay),
                            pause_after: scale(n.pause_after),
                            line_break: n.line_break,
                        })
                        .collect(),
                    settle: scale(phase.settle),
                    detail: phase.detail.clone(),
                })
                .collect(),
            completion_pause: scale(self.completion_pause),
            delivery_pause: scale(self.delivery_pause),
        }
    }

    /// Phase labels, in order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.phases.iter().map(|p| p.label.as_str())
    }

    /// Wall time of a full playback of `dispute`, saturating at
    /// [`Duration::MAX`]
    #[must_use]
    pub fn duration_for(&self, dispute: &Dispute, entry: &ResolutionEntry) -> Duration {
        self.phases
            .iter()
            .flat_map(|phase| {
                phase
                    .narration
                    .iter()
                    .map(|n| {
                        TextRevealer::new(n.fragment.render(dispute, entry), n.char_delay)
                            .duration()
                            .saturating_add(n.pause_after)
                    })
                    .chain(std::iter::once(phase.settle))
            })
            .chain([self.completion_pause, self.delivery_pause])
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for PlaybackScript {
    fn default() -> Self {
        Self::standard()
    }
}
