//! Detector thread handle
//!
//! A [`Listener`] owns a [`TapDetector`] running on its own thread. Samples
//! arrive through a bounded queue, so the sensor side never waits on the
//! detector: when the queue is full the sample is dropped and counted.
//!
//! The handle is the lifecycle. Starting one creates fresh detector state;
//! stopping it (or dropping it) processes what is already queued, ends the
//! thread and discards the state.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tapper_core::{DetectorConfig, DetectorStats, PatternSink, Sample, TapDetector};

/// Cloneable producer end of the sample queue
#[derive(Clone)]
pub struct SampleFeed {
    tx: Sender<Sample>,
    dropped: Arc<AtomicU64>,
}

impl SampleFeed {
    /// Queue a sample without blocking
    ///
    /// Returns `false` if the queue was full or the listener has stopped.
    pub fn push(&self, sample: Sample) -> bool {
        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    tracing::warn!(dropped, "Sample queue full, dropping samples");
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Samples dropped because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Final accounting of a stopped listener
#[derive(Debug, Clone)]
pub struct ListenerReport {
    pub stats: DetectorStats,
    /// Samples that never reached the detector
    pub queue_dropped: u64,
}

/// Running detector thread
pub struct Listener {
    feed: SampleFeed,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<DetectorStats>>,
}

impl Listener {
    /// Validate `config` and spawn the detector thread
    pub fn start(
        config: DetectorConfig,
        queue_capacity: usize,
        sink: impl PatternSink + 'static,
    ) -> Result<Self> {
        let detector = TapDetector::new(config, sink).context("invalid detector config")?;
        let threshold = detector.config().threshold;
        let (tx, rx) = crossbeam_channel::bounded::<Sample>(queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);

        let worker = std::thread::Builder::new()
            .name("tapper-detector".to_string())
            .spawn(move || run_detector(detector, rx, shutdown_rx))
            .context("spawning detector thread")?;

        tracing::info!(queue_capacity, threshold, "Listener started");

        Ok(Self {
            feed: SampleFeed {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
        })
    }

    /// Queue a sample; see [`SampleFeed::push`]
    pub fn feed(&self, sample: Sample) -> bool {
        self.feed.push(sample)
    }

    /// Producer handle for a sensor thread
    pub fn feeder(&self) -> SampleFeed {
        self.feed.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the detector thread and return its final counters
    pub fn stop(mut self) -> Result<ListenerReport> {
        let stats = self.shutdown()?;
        let queue_dropped = self.feed.dropped();
        tracing::info!(
            samples = stats.samples_accepted,
            matches = stats.matches,
            queue_dropped,
            "Listener stopped"
        );
        Ok(ListenerReport {
            stats,
            queue_dropped,
        })
    }

    fn shutdown(&mut self) -> Result<DetectorStats> {
        // Disconnecting the shutdown channel wakes the worker
        drop(self.shutdown.take());
        let worker = self
            .worker
            .take()
            .ok_or_else(|| anyhow!("listener already stopped"))?;
        worker
            .join()
            .map_err(|_| anyhow!("detector thread panicked"))
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.shutdown() {
                tracing::error!(error = %e, "Listener shutdown failed");
            }
        }
    }
}

fn run_detector(
    detector: TapDetector,
    samples: Receiver<Sample>,
    shutdown: Receiver<()>,
) -> DetectorStats {
    tracing::debug!("Detector thread running");

    loop {
        crossbeam_channel::select! {
            recv(samples) -> msg => match msg {
                Ok(sample) => process(&detector, sample),
                Err(_) => break,
            },
            recv(shutdown) -> _ => {
                // Finish what was queued before the stop request
                for sample in samples.try_iter() {
                    process(&detector, sample);
                }
                break;
            }
        }
    }

    tracing::debug!("Detector thread exited");
    detector.stats()
}

fn process(detector: &TapDetector, sample: Sample) {
    if let Err(e) = detector.on_sample(sample) {
        tracing::debug!(error = %e, "Sample skipped");
    }
}
