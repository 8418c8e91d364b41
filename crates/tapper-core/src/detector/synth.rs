//! Synthetic accelerometer traces
//!
//! Generates a phone lying still (gravity on z plus a little white noise)
//! that is tapped at chosen offsets. Each tap is a short alternating spike on
//! z. Output is deterministic: the noise generator is reseeded on every call.

use crate::detector::Sample;
use std::time::{Duration, Instant};

/// Standard gravity (m/s²)
const GRAVITY: f64 = 9.81;

/// Peak per-axis noise (m/s²)
const NOISE_AMPLITUDE: f64 = 0.01;

/// Tap spike height on z (m/s²)
const SPIKE_AMPLITUDE: f64 = 2.0;

/// Samples each tap spike lasts
const TAP_SAMPLES: u64 = 4;

/// Quiet tail after the last tap when no duration is set
const DEFAULT_TAIL_MS: u64 = 1000;

const NOISE_SEED: u32 = 0xDEADBEEF;

/// Deterministic tap gesture generator
///
/// With `alpha = 0.15` and `threshold = 0.05`, every spike produces one
/// excursion that closes a fixed number of samples after the spike starts.
/// Gaps between tap completions therefore equal gaps between the tap offsets
/// when the offsets lie on the sample grid.
///
/// # Example
/// ```
/// use tapper_core::GestureSynth;
///
/// let synth = GestureSynth::new(100).with_taps(&[1000, 2500, 5000]);
/// let readings = synth.readings();
/// assert_eq!(readings.len(), 601); // 0..=6000ms at 10ms spacing
/// ```
#[derive(Debug, Clone)]
pub struct GestureSynth {
    /// Sample rate in Hz
    sample_rate: u32,
    /// Tap start offsets
    taps_ms: Vec<u64>,
    /// Trace length; derived from the last tap when unset
    duration_ms: Option<u64>,
    noise_amplitude: f64,
    spike_amplitude: f64,
}

impl GestureSynth {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            taps_ms: Vec::new(),
            duration_ms: None,
            noise_amplitude: NOISE_AMPLITUDE,
            spike_amplitude: SPIKE_AMPLITUDE,
        }
    }

    /// Tap start offsets in milliseconds from the start of the trace
    pub fn with_taps(mut self, taps_ms: &[u64]) -> Self {
        self.taps_ms = taps_ms.to_vec();
        self.taps_ms.sort_unstable();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise_amplitude = amplitude.abs();
        self
    }

    pub fn with_spike(mut self, amplitude: f64) -> Self {
        self.spike_amplitude = amplitude;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total trace length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms.unwrap_or_else(|| {
            self.taps_ms.last().copied().unwrap_or(0) + DEFAULT_TAIL_MS
        })
    }

    /// Offset of sample `index` from the start of the trace
    pub fn offset_of(&self, index: u64) -> Duration {
        Duration::from_nanos(index * 1_000_000_000 / self.sample_rate as u64)
    }

    /// `(offset, [x, y, z])` for every sample in the trace
    pub fn readings(&self) -> Vec<(Duration, [f64; 3])> {
        let count = self.duration_ms() * self.sample_rate as u64 / 1000 + 1;
        let tap_starts: Vec<u64> = self
            .taps_ms
            .iter()
            .map(|&ms| (ms * self.sample_rate as u64).div_ceil(1000))
            .collect();

        let mut seed = NOISE_SEED;
        let mut readings = Vec::with_capacity(count as usize);
        for index in 0..count {
            let mut accel = [
                noise(&mut seed) * self.noise_amplitude,
                noise(&mut seed) * self.noise_amplitude,
                GRAVITY + noise(&mut seed) * self.noise_amplitude,
            ];

            let spike_step = tap_starts
                .iter()
                .find(|&&start| index >= start && index < start + TAP_SAMPLES)
                .map(|&start| index - start);
            if let Some(step) = spike_step {
                let sign = if step % 2 == 0 { 1.0 } else { -1.0 };
                accel[2] += sign * self.spike_amplitude;
            }

            readings.push((self.offset_of(index), accel));
        }
        readings
    }

    /// The trace as samples stamped relative to `base`
    pub fn samples(&self, base: Instant) -> Vec<Sample> {
        self.readings()
            .into_iter()
            .map(|(offset, [x, y, z])| Sample::new(x, y, z, base + offset))
            .collect()
    }
}

/// Noise in -1.0..1.0 from an LCG (glibc parameters)
fn noise(seed: &mut u32) -> f64 {
    *seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
    let bits = (*seed >> 16) & 0x7FFF;
    (bits as f64 / 16384.0) - 1.0
}
