//! DRE Playback - the scripted "AI resolution" run
//!
//! Provides:
//! - A text revealer for the typing effect
//! - A step tracker for the labeled resolution phases
//! - The playback script as data, with the standard six-phase script
//! - An orchestrator that runs the script against one dispute and delivers
//!   the resolved dispute exactly once
//!
//! # Example
//!
//! ```rust,ignore
//! use dre_playback::prelude::*;
//! use std::sync::Arc;
//!
//! let orchestrator = Orchestrator::new(Arc::new(catalog));
//! let playback = orchestrator.prepare(dispute)?;
//! let resolved = playback.run(|frame| println!("{}", frame.narration)).await?;
//! store.apply_resolution(resolved)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod handle;
pub mod orchestrator;
pub mod revealer;
pub mod script;
pub mod tracker;

pub use config::PlaybackConfig;
pub use error::{PlaybackError, TrackerError};
pub use handle::{spawn, PlaybackHandle, PlaybackOutcome};
pub use orchestrator::{
    resolve_dispute, Orchestrator, Playback, PlaybackFrame, PlaybackId, PlaybackState,
    PlaybackUpdate,
};
pub use revealer::{prefixes, TextRevealer};
pub use script::{Fragment, Narration, PhaseScript, PlaybackScript};
pub use tracker::{ResolutionStep, StepStatus, StepTracker};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running playbacks
    pub use crate::{
        spawn, Orchestrator, Playback, PlaybackConfig, PlaybackError, PlaybackFrame,
        PlaybackHandle, PlaybackOutcome, PlaybackScript, PlaybackState, PlaybackUpdate,
        StepStatus,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
