//! Detector parameters
//!
//! Every field is required. Callers decide the values; the core carries no
//! built-in defaults.

use crate::detector::pattern::PauseWindow;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Scale applied to each per-axis delta before the magnitude is taken
    pub alpha: f64,
    /// Smoothed activity above this value opens an excursion
    pub threshold: f64,
    /// Excursions lasting this long or longer are not taps
    pub max_event_duration_ms: u64,
    /// Exclusive bounds of the pause between tap 1 and tap 2
    pub pause1_min_ms: u64,
    pub pause1_max_ms: u64,
    /// Exclusive bounds of the pause between tap 2 and tap 3
    pub pause2_min_ms: u64,
    pub pause2_max_ms: u64,
}

impl DetectorConfig {
    /// Check the parameters
    ///
    /// Overlapping pause windows (`pause1_max > pause2_min`) are allowed
    /// but logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.max_event_duration_ms == 0 {
            return Err(ConfigError::ZeroEventDuration);
        }
        for (which, min_ms, max_ms) in [
            (1, self.pause1_min_ms, self.pause1_max_ms),
            (2, self.pause2_min_ms, self.pause2_max_ms),
        ] {
            if min_ms >= max_ms {
                return Err(ConfigError::EmptyPauseWindow {
                    which,
                    min_ms,
                    max_ms,
                });
            }
        }
        if self.pause1_max_ms > self.pause2_min_ms {
            tracing::warn!(
                pause1_max_ms = self.pause1_max_ms,
                pause2_min_ms = self.pause2_min_ms,
                "Pause windows overlap"
            );
        }
        Ok(())
    }

    pub fn max_event_duration(&self) -> Duration {
        Duration::from_millis(self.max_event_duration_ms)
    }

    pub fn pause1(&self) -> PauseWindow {
        PauseWindow::from_millis(self.pause1_min_ms, self.pause1_max_ms)
    }

    pub fn pause2(&self) -> PauseWindow {
        PauseWindow::from_millis(self.pause2_min_ms, self.pause2_max_ms)
    }
}
