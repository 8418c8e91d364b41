//! Tap-pattern detection pipeline
//!
//! Per-sample processing runs in strict order:
//! - Moving-average activity signal ([`smoother`])
//! - Threshold segmentation into tap events ([`segmenter`])
//! - Inter-tap pause matching over the last three taps ([`pattern`])
//!
//! [`pipeline::TapDetector`] wires the three stages together behind a single
//! lock. Supporting pieces: the fixed-capacity ring both buffers are built on
//! ([`ring`]), detector parameters ([`config`]) and a deterministic gesture
//! generator for demos and tests ([`synth`]).

pub mod config;
pub mod pattern;
pub mod pipeline;
pub mod ring;
pub mod segmenter;
pub mod smoother;
pub mod synth;

use std::fmt;
use std::time::{Duration, Instant};

/// A single accelerometer reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Acceleration along x (m/s²)
    pub x: f64,
    /// Acceleration along y (m/s²)
    pub y: f64,
    /// Acceleration along z (m/s²)
    pub z: f64,
    /// Monotonic capture time
    pub timestamp: Instant,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64, timestamp: Instant) -> Self {
        Self { x, y, z, timestamp }
    }

    /// Reading stamped with the current monotonic time
    pub fn now(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, Instant::now())
    }

    /// Components as `[x, y, z]`
    pub fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// First axis holding a NaN or infinite value, if any
    pub fn non_finite_axis(&self) -> Option<Axis> {
        Axis::ALL
            .into_iter()
            .zip(self.axes())
            .find(|(_, v)| !v.is_finite())
            .map(|(axis, _)| axis)
    }
}

/// Accelerometer axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(name)
    }
}

/// A short excursion above threshold, accepted as a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapEvent {
    /// Time the smoothed signal fell back to or below threshold
    pub completed_at: Instant,
}

/// Emitted when the last three taps satisfy both pause windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatched {
    /// Pause between the first and second tap
    pub gap1: Duration,
    /// Pause between the second and third tap
    pub gap2: Duration,
    /// Completion time of the third tap
    pub completed_at: Instant,
}

impl PatternMatched {
    pub fn gap1_ms(&self) -> u128 {
        self.gap1.as_millis()
    }

    pub fn gap2_ms(&self) -> u128 {
        self.gap2.as_millis()
    }
}
