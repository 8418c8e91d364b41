//! Persistent application configuration
//!
//! Detector tuning lives in a JSON file at
//! `<config_dir>/tapper/config.json`. Missing fields fall back to the stock
//! Tapper values, so an empty `{}` file is a valid configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tapper_core::DetectorConfig;

fn default_alpha() -> f64 {
    0.15
}

fn default_threshold() -> f64 {
    0.05
}

fn default_max_event_duration_ms() -> u64 {
    500
}

fn default_pause1() -> [u64; 2] {
    [1000, 2000]
}

fn default_pause2() -> [u64; 2] {
    [2000, 3000]
}

fn default_notify_capacity() -> usize {
    16
}

fn default_queue_capacity() -> usize {
    1024
}

/// Persistent application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-axis delta scale
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Smoothed activity threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Excursions at least this long are not taps
    #[serde(default = "default_max_event_duration_ms")]
    pub max_event_duration_ms: u64,
    /// Pause after the first tap, exclusive `[min, max]` in ms
    #[serde(default = "default_pause1")]
    pub pause1_ms: [u64; 2],
    /// Pause after the second tap, exclusive `[min, max]` in ms
    #[serde(default = "default_pause2")]
    pub pause2_ms: [u64; 2],
    /// Pending match notifications before new ones are dropped
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
    /// Pending samples in the listener queue before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            threshold: default_threshold(),
            max_event_duration_ms: default_max_event_duration_ms(),
            pause1_ms: default_pause1(),
            pause2_ms: default_pause2(),
            notify_capacity: default_notify_capacity(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl AppConfig {
    /// Config file path: `<config_dir>/tapper/config.json`
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tapper")
            .join("config.json")
    }

    /// Load config from the default path, falling back to defaults on any error
    pub fn load() -> Self {
        let path = Self::path();
        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config from disk");
                config
            }
            Err(e) if path.exists() => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                Self::default()
            }
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }

    /// Detector parameters described by this config
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            alpha: self.alpha,
            threshold: self.threshold,
            max_event_duration_ms: self.max_event_duration_ms,
            pause1_min_ms: self.pause1_ms[0],
            pause1_max_ms: self.pause1_ms[1],
            pause2_min_ms: self.pause2_ms[0],
            pause2_max_ms: self.pause2_ms[1],
        }
    }
}
