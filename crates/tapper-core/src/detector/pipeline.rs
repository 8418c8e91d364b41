//! Serialized per-sample pipeline
//!
//! [`TapDetector`] runs validation, smoothing, segmentation and pattern
//! matching for one sample as a single unit under one mutex. Sample N+1 never
//! starts before sample N has finished, which is what keeps the ring indices
//! and excursion timing consistent when the sensor source delivers from its
//! own thread.
//!
//! Nothing inside the lock blocks or performs I/O. Match notifications go to a
//! [`PatternSink`] whose `deliver` must return immediately; [`ChannelSink`]
//! uses `try_send` on a bounded channel and counts what it cannot hand over.

use crate::detector::config::DetectorConfig;
use crate::detector::pattern::PatternMatcher;
use crate::detector::segmenter::Segmenter;
use crate::detector::smoother::Smoother;
use crate::detector::{PatternMatched, Sample};
use crate::error::{ConfigError, SampleError};
use crate::stats::DetectorStats;
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Receiver of pattern-match notifications
///
/// Called with the pipeline lock held, so implementations must not block.
pub trait PatternSink: Send {
    /// Hand over one notification; `false` if it could not be accepted
    fn deliver(&mut self, event: &PatternMatched) -> bool;
}

impl<F> PatternSink for F
where
    F: FnMut(&PatternMatched) + Send,
{
    fn deliver(&mut self, event: &PatternMatched) -> bool {
        self(event);
        true
    }
}

/// Sink forwarding matches into a bounded crossbeam channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<PatternMatched>,
}

impl ChannelSink {
    pub fn new(tx: Sender<PatternMatched>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiving end of its channel
    pub fn bounded(capacity: usize) -> (Self, Receiver<PatternMatched>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl PatternSink for ChannelSink {
    fn deliver(&mut self, event: &PatternMatched) -> bool {
        match self.tx.try_send(*event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Match channel full, notification dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Match receiver gone, notification dropped");
                false
            }
        }
    }
}

/// Everything mutated per sample, guarded as one unit
struct Pipeline {
    smoother: Smoother,
    segmenter: Segmenter,
    matcher: PatternMatcher,
    last_timestamp: Option<Instant>,
    stats: DetectorStats,
    sink: Box<dyn PatternSink>,
}

impl Pipeline {
    fn process(&mut self, sample: &Sample) -> Result<Option<PatternMatched>, SampleError> {
        self.check(sample)?;
        self.last_timestamp = Some(sample.timestamp);
        self.stats.samples_accepted += 1;

        let Some(activity) = self.smoother.process(sample) else {
            return Ok(None);
        };
        if activity > self.segmenter.threshold() {
            tracing::trace!(
                sample = self.smoother.samples_seen(),
                activity,
                "Event of interest"
            );
        }

        let Some(tap) = self.segmenter.process(activity, sample.timestamp) else {
            return Ok(None);
        };
        let Some(matched) = self.matcher.on_tap(tap.completed_at) else {
            return Ok(None);
        };

        self.stats.matches += 1;
        tracing::info!(
            gap1_ms = matched.gap1_ms() as u64,
            gap2_ms = matched.gap2_ms() as u64,
            matches = self.stats.matches,
            "Tap pattern matched"
        );
        if !self.sink.deliver(&matched) {
            self.stats.notifications_dropped += 1;
        }
        Ok(Some(matched))
    }

    /// Reject the sample without touching any pipeline state but the counters
    fn check(&mut self, sample: &Sample) -> Result<(), SampleError> {
        if let Some(axis) = sample.non_finite_axis() {
            self.stats.rejected_non_finite += 1;
            tracing::warn!(%axis, "Rejected non-finite sample");
            return Err(SampleError::NonFinite { axis });
        }
        if let Some(last) = self.last_timestamp {
            if sample.timestamp < last {
                let behind = last - sample.timestamp;
                self.stats.rejected_out_of_order += 1;
                tracing::warn!(
                    behind_us = behind.as_micros() as u64,
                    "Rejected out-of-order sample"
                );
                return Err(SampleError::OutOfOrder { behind });
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> DetectorStats {
        DetectorStats {
            excursions: self.segmenter.excursions(),
            taps: self.matcher.taps_seen(),
            long_excursions: self.segmenter.discarded(),
            evaluations: self.matcher.evaluations(),
            ..self.stats.clone()
        }
    }
}

/// Tap-pattern detector
///
/// Safe to share between threads (`Arc<TapDetector>`); concurrent calls to
/// [`Self::on_sample`] are serialized.
///
/// # Example
/// ```
/// use tapper_core::{DetectorConfig, GestureSynth, TapDetector};
/// use std::time::Instant;
///
/// let config = DetectorConfig {
///     alpha: 0.15,
///     threshold: 0.05,
///     max_event_duration_ms: 500,
///     pause1_min_ms: 1000,
///     pause1_max_ms: 2000,
///     pause2_min_ms: 2000,
///     pause2_max_ms: 3000,
/// };
/// let (detector, matches) = TapDetector::with_channel(config, 4).unwrap();
///
/// let synth = GestureSynth::new(100).with_taps(&[1000, 2500, 5000]);
/// for sample in synth.samples(Instant::now()) {
///     detector.on_sample(sample).unwrap();
/// }
/// assert_eq!(matches.try_iter().count(), 1);
/// ```
pub struct TapDetector {
    config: DetectorConfig,
    pipeline: Mutex<Pipeline>,
}

impl TapDetector {
    /// Create a detector delivering matches to `sink`
    pub fn new(
        config: DetectorConfig,
        sink: impl PatternSink + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pipeline = Pipeline {
            smoother: Smoother::new(config.alpha),
            segmenter: Segmenter::new(config.threshold, config.max_event_duration()),
            matcher: PatternMatcher::new(config.pause1(), config.pause2()),
            last_timestamp: None,
            stats: DetectorStats::new(Utc::now()),
            sink: Box::new(sink),
        };

        tracing::debug!(?config, "Tap detector created");

        Ok(Self {
            config,
            pipeline: Mutex::new(pipeline),
        })
    }

    /// Create a detector wired to a bounded channel of `capacity` matches
    pub fn with_channel(
        config: DetectorConfig,
        capacity: usize,
    ) -> Result<(Self, Receiver<PatternMatched>), ConfigError> {
        let (sink, rx) = ChannelSink::bounded(capacity);
        Ok((Self::new(config, sink)?, rx))
    }

    /// Run one sample through the pipeline
    ///
    /// Returns the match this sample completed, if any. A rejected sample
    /// leaves every buffer and the segmenter state unchanged.
    pub fn on_sample(&self, sample: Sample) -> Result<Option<PatternMatched>, SampleError> {
        self.lock().process(&sample)
    }

    /// Current counters
    pub fn stats(&self) -> DetectorStats {
        self.lock().snapshot()
    }

    /// Whether the segmenter is inside an excursion
    pub fn in_event(&self) -> bool {
        self.lock().segmenter.in_event()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Pipeline> {
        // A panicking sink poisons the lock; the counters and buffers are
        // still usable.
        self.pipeline.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TapDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapDetector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
