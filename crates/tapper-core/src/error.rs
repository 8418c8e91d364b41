//! Error types for detector setup and sample intake

use crate::detector::Axis;
use std::time::Duration;
use thiserror::Error;

/// Invalid detector parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("alpha must be finite and greater than zero, got {0}")]
    InvalidAlpha(f64),

    #[error("threshold must be finite and greater than zero, got {0}")]
    InvalidThreshold(f64),

    #[error("max event duration must be at least 1ms")]
    ZeroEventDuration,

    #[error("pause {which} window is empty: min {min_ms}ms must be below max {max_ms}ms")]
    EmptyPauseWindow { which: u8, min_ms: u64, max_ms: u64 },
}

/// A sample the detector refused
///
/// Rejections are not fatal: the sample is skipped, detector state is left
/// untouched and the rejection is counted in the stats.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("sample has a non-finite {axis} component")]
    NonFinite { axis: Axis },

    #[error("sample timestamp is {}us earlier than the previous sample", .behind.as_micros())]
    OutOfOrder { behind: Duration },
}
