//! Inter-tap pause matching
//!
//! Keeps the completion times of the three most recent taps and, after every
//! tap once three have been seen, checks the two pauses between them against
//! the configured windows. There is no reset after a failed or successful
//! attempt: the window simply slides to the newest triple.

use crate::detector::ring::FixedRing;
use crate::detector::PatternMatched;
use crate::PATTERN_TAPS;
use std::time::{Duration, Instant};

/// Open interval of acceptable pause lengths
///
/// Both bounds are exclusive: a pause exactly equal to `min` or `max` does
/// not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseWindow {
    pub min: Duration,
    pub max: Duration,
}

impl PauseWindow {
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    pub fn contains(&self, gap: Duration) -> bool {
        self.min < gap && gap < self.max
    }
}

/// Outcome of evaluating the current triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub gap1: Duration,
    pub gap2: Duration,
    pub gap1_ok: bool,
    pub gap2_ok: bool,
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        self.gap1_ok && self.gap2_ok
    }
}

/// Sliding matcher over the last three tap completions
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pause1: PauseWindow,
    pause2: PauseWindow,
    completions: FixedRing<Instant, PATTERN_TAPS>,
    taps_seen: u64,
    evaluations: u64,
}

impl PatternMatcher {
    pub fn new(pause1: PauseWindow, pause2: PauseWindow) -> Self {
        Self {
            pause1,
            pause2,
            completions: FixedRing::new(),
            taps_seen: 0,
            evaluations: 0,
        }
    }

    /// Record a tap and evaluate the last three
    pub fn on_tap(&mut self, completed_at: Instant) -> Option<PatternMatched> {
        let evaluation = self.record(completed_at)?;
        if !evaluation.is_match() {
            return None;
        }
        Some(PatternMatched {
            gap1: evaluation.gap1,
            gap2: evaluation.gap2,
            completed_at,
        })
    }

    /// Record a tap and return the evaluation of the current triple, if any
    pub fn record(&mut self, completed_at: Instant) -> Option<Evaluation> {
        self.completions.push(completed_at);
        self.taps_seen += 1;

        if self.taps_seen < PATTERN_TAPS as u64 {
            return None;
        }

        // Physical slot order is overwrite order, not time order.
        // Sorting assumes taps arrive in completion order.
        let mut sorted = self.completions.snapshot()?;
        sorted.sort_unstable();

        let gap1 = sorted[1].saturating_duration_since(sorted[0]);
        let gap2 = sorted[2].saturating_duration_since(sorted[1]);
        self.evaluations += 1;

        let evaluation = Evaluation {
            gap1,
            gap2,
            gap1_ok: self.pause1.contains(gap1),
            gap2_ok: self.pause2.contains(gap2),
        };

        tracing::debug!(
            gap1_ms = gap1.as_millis() as u64,
            gap2_ms = gap2.as_millis() as u64,
            gap1_ok = evaluation.gap1_ok,
            gap2_ok = evaluation.gap2_ok,
            "Evaluated tap triple"
        );

        Some(evaluation)
    }

    pub fn taps_seen(&self) -> u64 {
        self.taps_seen
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn pause1(&self) -> PauseWindow {
        self.pause1
    }

    pub fn pause2(&self) -> PauseWindow {
        self.pause2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(
            PauseWindow::from_millis(1000, 2000),
            PauseWindow::from_millis(2000, 3000),
        )
    }

    /// Feed taps at the given offsets, returning every match produced
    fn feed(matcher: &mut PatternMatcher, offsets: &[u64]) -> Vec<PatternMatched> {
        let base = Instant::now();
        offsets
            .iter()
            .filter_map(|&ms| matcher.on_tap(base + Duration::from_millis(ms)))
            .collect()
    }

    #[test]
    fn test_window_is_exclusive() {
        let window = PauseWindow::from_millis(1000, 2000);
        assert!(!window.contains(Duration::from_millis(1000)));
        assert!(window.contains(Duration::from_millis(1001)));
        assert!(window.contains(Duration::from_millis(1999)));
        assert!(!window.contains(Duration::from_millis(2000)));
    }

    #[test]
    fn test_fewer_than_three_taps_never_match() {
        let mut m = matcher();
        let base = Instant::now();
        assert!(m.record(base).is_none());
        assert!(m.record(base + Duration::from_millis(1500)).is_none());
        assert_eq!(m.evaluations(), 0);
    }

    #[test]
    fn test_gap1_on_lower_bound_does_not_match() {
        let mut m = matcher();
        assert!(feed(&mut m, &[0, 1000, 3500]).is_empty());
        assert_eq!(m.evaluations(), 1);
    }

    #[test]
    fn test_gap1_just_inside_matches() {
        let mut m = matcher();
        let matches = feed(&mut m, &[0, 1001, 3501]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].gap1, Duration::from_millis(1001));
        assert_eq!(matches[0].gap2, Duration::from_millis(2500));
    }

    #[test]
    fn test_gap2_on_upper_bound_does_not_match() {
        let mut m = matcher();
        assert!(feed(&mut m, &[0, 1500, 4500]).is_empty());
    }

    #[test]
    fn test_matching_triple() {
        let mut m = matcher();
        let matches = feed(&mut m, &[0, 1500, 4000]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].gap1_ms(), 1500);
        assert_eq!(matches[0].gap2_ms(), 2500);
    }

    #[test]
    fn test_oldest_tap_is_dropped() {
        let mut m = matcher();
        // Window 1: {0, 1500, 3600} -> gaps (1500, 2100) match
        // Window 2: {1500, 3600, 5400} -> gap1 2100 fails
        let base = Instant::now();
        let at = |ms| base + Duration::from_millis(ms);

        assert!(m.on_tap(at(0)).is_none());
        assert!(m.on_tap(at(1500)).is_none());
        assert!(m.on_tap(at(3600)).is_some());

        let eval = m.record(at(5400)).unwrap();
        assert_eq!(eval.gap1, Duration::from_millis(2100));
        assert_eq!(eval.gap2, Duration::from_millis(1800));
        assert!(!eval.is_match());
        assert_eq!(m.taps_seen(), 4);
        assert_eq!(m.evaluations(), 2);
    }

    #[test]
    fn test_failed_attempt_needs_no_reset() {
        let mut m = matcher();
        // Two stray taps, then a clean gesture starting from the second stray
        let matches = feed(&mut m, &[0, 200, 1700, 4200]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].gap1_ms(), 1500);
        assert_eq!(matches[0].gap2_ms(), 2500);
    }

    #[test]
    fn test_sort_recovers_time_order_after_wrap() {
        let mut m = matcher();
        // After five taps the physical order is [t3, t4, t2]
        let matches = feed(&mut m, &[0, 100, 200, 1700, 4200]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].gap1_ms(), 1500);
        assert_eq!(matches[0].gap2_ms(), 2500);
    }
}
