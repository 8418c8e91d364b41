//! Tapper Core - accelerometer tap-pattern detection
//!
//! Consumes a stream of 3-axis accelerometer samples and recognizes a
//! "tap - pause - tap - pause - tap" gesture. Each sample runs through a
//! short moving-average smoother, a threshold segmenter that turns the
//! smoothed signal into tap events, and a matcher that checks the two
//! pauses between the last three taps against configured windows.
//!
//! The core only decides *whether and when* the gesture happened. What to do
//! about it is up to whoever receives the [`PatternMatched`] notification.

pub mod detector;
pub mod error;
pub mod stats;

pub use detector::config::DetectorConfig;
pub use detector::pipeline::{ChannelSink, PatternSink, TapDetector};
pub use detector::synth::GestureSynth;
pub use detector::{PatternMatched, Sample, TapEvent};
pub use error::{ConfigError, SampleError};
pub use stats::DetectorStats;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (YYYY-MM-DD), stamped by build.rs
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Number of delta magnitudes averaged by the smoother
pub const SMOOTHING_WINDOW: usize = 5;

/// Number of taps that make up the gesture
pub const PATTERN_TAPS: usize = 3;
