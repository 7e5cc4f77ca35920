//! Configuration for the `dre` binary
//!
//! Loaded from TOML when `--config` is given; every field has a default.
//!
//! ```toml
//! [playback]
//! time_scale = 0.5
//!
//! [logging]
//! filter = "dre_playback=debug"
//! json = false
//! ```

use anyhow::Context;
use dre_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DreConfig {
    pub(crate) playback: PlaybackConfig,
    pub(crate) logging: LoggingConfig,
}

impl DreConfig {
    /// Parse from TOML text
    pub(crate) fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Read and parse a TOML file
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// With playback time scale
    #[must_use]
    pub(crate) fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.playback = self.playback.with_time_scale(time_scale);
        self
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub(crate) filter: String,
    /// Emit JSON lines instead of human-readable text
    pub(crate) json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            json: false,
        }
    }
}
