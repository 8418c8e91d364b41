//! Tapper - tap gesture detection for accelerometer streams
//!
//! Re-exports the detector from `tapper-core` and adds what a host needs
//! around it: a persistent configuration file ([`config`]), a line-oriented
//! sample trace format ([`trace`]) and a threaded detector handle
//! ([`listener`]).

pub mod config;
pub mod listener;
pub mod trace;

pub use tapper_core::detector;
pub use tapper_core::stats;

pub use tapper_core::{
    ChannelSink, ConfigError, DetectorConfig, DetectorStats, GestureSynth, PatternMatched,
    PatternSink, Sample, SampleError, TapDetector, TapEvent,
};
pub use tapper_core::{BUILD_DATE, PATTERN_TAPS, SMOOTHING_WINDOW, VERSION};
