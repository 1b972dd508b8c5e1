//! Configuration for segreplay
//!
//! Stored as TOML at `<config_dir>/segreplay/config.toml`. The location can be
//! overridden with the `SEGREPLAY_CONFIG` environment variable. A missing file
//! yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::player::{LoadFailurePolicy, PlayerOptions};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SEGREPLAY_CONFIG";

const APP_DIR: &str = "segreplay";
const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub display: DisplayConfig,
}

/// `[playback]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial playback speed multiplier
    pub speed: f64,
    /// Let the speed also shorten/lengthen waits across gaps
    pub scale_gaps_with_speed: bool,
    pub on_load_failure: LoadFailurePolicy,
    /// How often the CLI host drives the player
    pub tick_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            scale_gaps_with_speed: false,
            on_load_failure: LoadFailurePolicy::Skip,
            tick_interval_ms: 16,
        }
    }
}

/// `[display]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width of the progress line; 0 uses the terminal width
    pub progress_width: usize,
}

impl Config {
    /// Path of the config file, honouring `SEGREPLAY_CONFIG`.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Write the config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ReplayError> {
        let speed = self.playback.speed;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ReplayError::InvalidSpeed(speed));
        }
        if self.playback.tick_interval_ms == 0 {
            return Err(ReplayError::Config(
                "playback.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Player options derived from the `[playback]` section.
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            origin_timestamp: None,
            speed: self.playback.speed,
            scale_gaps_with_speed: self.playback.scale_gaps_with_speed,
            on_load_failure: self.playback.on_load_failure,
        }
    }
}
