//! Moving-average activity signal
//!
//! Turns raw 3-axis readings into a single scalar. Each axis change since the
//! previous reading is scaled by `alpha`, the three deltas are folded into a
//! magnitude, and the last [`SMOOTHING_WINDOW`] magnitudes are averaged so a
//! single-sample spike cannot cross the threshold on its own.

use crate::detector::ring::FixedRing;
use crate::detector::Sample;
use crate::SMOOTHING_WINDOW;

/// Five-point moving average over alpha-scaled delta magnitudes
///
/// # Example
/// ```
/// use std::time::Instant;
/// use tapper_core::detector::smoother::Smoother;
/// use tapper_core::Sample;
///
/// let mut smoother = Smoother::new(0.15);
/// let t = Instant::now();
///
/// // The first reading only primes the previous-sample slot
/// assert!(smoother.process(&Sample::new(0.0, 0.0, 9.81, t)).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Smoother {
    /// Per-axis delta scale
    alpha: f64,
    /// Previous raw reading
    previous: Option<[f64; 3]>,
    /// Last five scaled delta magnitudes
    magnitudes: FixedRing<f64, SMOOTHING_WINDOW>,
    /// Readings seen, including the first one
    samples_seen: u64,
}

impl Smoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            previous: None,
            magnitudes: FixedRing::new(),
            samples_seen: 0,
        }
    }

    /// Feed one reading
    ///
    /// Returns the mean of the five stored magnitudes once more than
    /// [`SMOOTHING_WINDOW`] readings have been seen, `None` before that.
    pub fn process(&mut self, sample: &Sample) -> Option<f64> {
        let current = sample.axes();
        self.samples_seen += 1;

        let previous = self.previous.replace(current)?;

        let sum_sq: f64 = current
            .iter()
            .zip(previous.iter())
            .map(|(cur, prev)| {
                let d = (cur - prev) * self.alpha;
                d * d
            })
            .sum();
        self.magnitudes.push(sum_sq.sqrt());

        if self.samples_seen > SMOOTHING_WINDOW as u64 {
            self.average()
        } else {
            None
        }
    }

    /// Mean of the five slots, `None` until each has been written
    pub fn average(&self) -> Option<f64> {
        let slots = self.magnitudes.snapshot()?;
        Some(slots.iter().sum::<f64>() / SMOOTHING_WINDOW as f64)
    }

    /// Stored magnitudes in physical slot order
    pub fn window(&self) -> &[Option<f64>; SMOOTHING_WINDOW] {
        self.magnitudes.slots()
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }
}
