//! Threshold segmentation of the activity signal
//!
//! Two-state machine, Idle and InEvent. A rising threshold crossing opens an
//! excursion, the falling crossing closes it. Closed excursions shorter than
//! the maximum duration become [`TapEvent`]s; longer ones are ordinary motion
//! and are discarded.

use crate::detector::TapEvent;
use std::time::{Duration, Instant};

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// Signal at or below threshold
    Idle,
    /// Signal above threshold since `started_at`
    InEvent { started_at: Instant },
}

/// Result of closing an excursion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excursion {
    /// Short enough to be a tap
    Tap(TapEvent),
    /// Too long to be a tap
    Discarded { duration: Duration },
}

/// Edge-triggered tap segmenter
///
/// # Example
/// ```
/// use std::time::{Duration, Instant};
/// use tapper_core::detector::segmenter::Segmenter;
///
/// let mut seg = Segmenter::new(0.05, Duration::from_millis(500));
/// let t0 = Instant::now();
///
/// assert!(seg.process(0.2, t0).is_none()); // rising edge
/// let tap = seg.process(0.01, t0 + Duration::from_millis(80));
/// assert!(tap.is_some()); // falling edge after 80ms
/// ```
#[derive(Debug, Clone)]
pub struct Segmenter {
    threshold: f64,
    max_event_duration: Duration,
    state: SegmentState,
    excursions: u64,
    discarded: u64,
}

impl Segmenter {
    pub fn new(threshold: f64, max_event_duration: Duration) -> Self {
        Self {
            threshold,
            max_event_duration,
            state: SegmentState::Idle,
            excursions: 0,
            discarded: 0,
        }
    }

    /// Feed one smoothed value; returns a tap on a qualifying falling edge
    pub fn process(&mut self, activity: f64, now: Instant) -> Option<TapEvent> {
        match self.step(activity, now)? {
            Excursion::Tap(tap) => Some(tap),
            Excursion::Discarded { .. } => None,
        }
    }

    /// Like [`Self::process`] but also reports discarded excursions
    pub fn step(&mut self, activity: f64, now: Instant) -> Option<Excursion> {
        let above = activity > self.threshold;

        match (self.state, above) {
            (SegmentState::Idle, true) => {
                self.state = SegmentState::InEvent { started_at: now };
                None
            }
            (SegmentState::InEvent { started_at }, false) => {
                self.state = SegmentState::Idle;
                self.excursions += 1;

                let duration = now.saturating_duration_since(started_at);
                if duration < self.max_event_duration {
                    tracing::debug!(duration_ms = duration.as_millis() as u64, "Tap detected");
                    Some(Excursion::Tap(TapEvent { completed_at: now }))
                } else {
                    self.discarded += 1;
                    tracing::debug!(
                        duration_ms = duration.as_millis() as u64,
                        max_ms = self.max_event_duration.as_millis() as u64,
                        "Excursion too long for a tap, discarded"
                    );
                    Some(Excursion::Discarded { duration })
                }
            }
            // Still above threshold inside an event, or quiet while idle
            _ => None,
        }
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    pub fn in_event(&self) -> bool {
        matches!(self.state, SegmentState::InEvent { .. })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Excursions closed so far (taps plus discarded)
    pub fn excursions(&self) -> u64 {
        self.excursions
    }

    /// Excursions rejected as too long
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.05;

    fn segmenter() -> Segmenter {
        Segmenter::new(THRESHOLD, Duration::from_millis(500))
    }

    fn ms(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_starts_idle() {
        let seg = segmenter();
        assert_eq!(seg.state(), SegmentState::Idle);
        assert!(!seg.in_event());
    }

    #[test]
    fn test_quiet_signal_no_events() {
        let base = Instant::now();
        let mut seg = segmenter();
        for i in 0..100 {
            assert!(seg.process(0.01, ms(base, i * 10)).is_none());
        }
        assert!(!seg.in_event());
        assert_eq!(seg.excursions(), 0);
    }

    #[test]
    fn test_sustained_excursion_yields_one_tap() {
        let base = Instant::now();
        let mut seg = segmenter();

        let mut taps = 0;
        for i in 0..20 {
            if seg.process(0.3, ms(base, i * 10)).is_some() {
                taps += 1;
            }
        }
        assert_eq!(taps, 0, "No tap while still above threshold");
        assert!(seg.in_event());

        let tap = seg.process(0.0, ms(base, 200));
        assert_eq!(
            tap,
            Some(TapEvent {
                completed_at: ms(base, 200)
            })
        );
        assert_eq!(seg.excursions(), 1);
    }

    #[test]
    fn test_exactly_threshold_is_not_above() {
        let base = Instant::now();
        let mut seg = segmenter();
        assert!(seg.process(THRESHOLD, base).is_none());
        assert!(!seg.in_event());

        seg.process(THRESHOLD + 0.01, ms(base, 10));
        assert!(seg.in_event());
        // Falling back to exactly the threshold closes the event
        assert!(seg.process(THRESHOLD, ms(base, 20)).is_some());
    }

    #[test]
    fn test_duration_just_under_limit_is_tap() {
        let base = Instant::now();
        let mut seg = segmenter();
        seg.process(1.0, base);
        assert!(seg.process(0.0, ms(base, 499)).is_some());
    }

    #[test]
    fn test_duration_at_limit_is_discarded() {
        let base = Instant::now();
        let mut seg = segmenter();
        seg.process(1.0, base);
        assert_eq!(
            seg.step(0.0, ms(base, 500)),
            Some(Excursion::Discarded {
                duration: Duration::from_millis(500)
            })
        );
        assert_eq!(seg.discarded(), 1);

        seg.process(1.0, ms(base, 1000));
        assert!(seg.process(0.0, ms(base, 2000)).is_none());
        assert_eq!(seg.discarded(), 2);
        assert!(!seg.in_event());
    }

    #[test]
    fn test_start_time_is_first_crossing() {
        let base = Instant::now();
        let mut seg = segmenter();
        seg.process(1.0, base);
        // Later above-threshold values must not move the start
        seg.process(2.0, ms(base, 300));
        seg.process(1.5, ms(base, 450));
        assert_eq!(seg.state(), SegmentState::InEvent { started_at: base });
        assert!(seg.process(0.0, ms(base, 600)).is_none());
    }
}
