//! Detector counters
//!
//! Counters never reset for the lifetime of a detector. Rejections are
//! reported here rather than through a failure path.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of detector counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorStats {
    /// Wall-clock time the detector was created (reporting only)
    pub started_at: DateTime<Utc>,
    /// Samples that passed validation and ran through the pipeline
    pub samples_accepted: u64,
    /// Samples skipped for a NaN or infinite component
    pub rejected_non_finite: u64,
    /// Samples skipped for a timestamp earlier than the previous one
    pub rejected_out_of_order: u64,
    /// Excursions above threshold that closed
    pub excursions: u64,
    /// Excursions accepted as taps
    pub taps: u64,
    /// Excursions too long to be taps
    pub long_excursions: u64,
    /// Tap triples evaluated against the pause windows
    pub evaluations: u64,
    /// Pattern matches
    pub matches: u64,
    /// Match notifications the sink could not accept
    pub notifications_dropped: u64,
}

impl DetectorStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            samples_accepted: 0,
            rejected_non_finite: 0,
            rejected_out_of_order: 0,
            excursions: 0,
            taps: 0,
            long_excursions: 0,
            evaluations: 0,
            matches: 0,
            notifications_dropped: 0,
        }
    }

    /// Total samples rejected for any reason
    pub fn rejected(&self) -> u64 {
        self.rejected_non_finite + self.rejected_out_of_order
    }

    /// Seconds since `started_at`
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
