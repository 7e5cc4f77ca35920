//! Playback configuration

use crate::script::PlaybackScript;
use serde::{Deserialize, Serialize};

/// Playback pacing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Multiplier applied to every scripted delay (`0.0` = instant)
    pub time_scale: f64,
}

impl PlaybackConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With time scale
    #[inline]
    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// No delays at all
    #[inline]
    #[must_use]
    pub fn instant() -> Self {
        Self { time_scale: 0.0 }
    }

    /// The standard script paced by this configuration
    #[must_use]
    pub fn script(&self) -> PlaybackScript {
        let standard = PlaybackScript::standard();
        if (self.time_scale - 1.0).abs() < f64::EPSILON {
            standard
        } else {
            standard.scaled(self.time_scale)
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { time_scale: 1.0 }
    }
}
