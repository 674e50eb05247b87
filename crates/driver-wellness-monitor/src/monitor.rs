//! Cancellable periodic ingestion task.
//!
//! Pulls one sample per period from a [`SampleSource`] and ingests it into a
//! shared [`TelemetryStore`]. Missed ticks are skipped rather than replayed.
//! Once [`MonitorHandle::shutdown`] returns, no further ingest happens.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use driver_wellness_core::{AlertTier, SampleSource, WellnessError, WellnessResult};
use driver_wellness_telemetry::TelemetryStore;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::sink::AlertSink;

/// Control handle for a running monitor.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    ingests: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MonitorHandle {
    /// Signal the task to stop. Idempotent; does not wait.
    pub fn stop(&self) {
        let was_stopped = self.stop_tx.send_replace(true);
        if !was_stopped {
            info!("monitor stop requested");
        }
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(&self) -> WellnessResult<()> {
        self.stop();
        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|e| WellnessError::internal(format!("monitor task failed: {e}")))?;
        }
        Ok(())
    }

    /// Whether the task loop is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ticks executed so far, including ticks where the source had no sample.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Samples ingested so far.
    #[must_use]
    pub fn ingests(&self) -> u64 {
        self.ingests.load(Ordering::Relaxed)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

struct MonitorTask<S> {
    store: Arc<TelemetryStore>,
    source: S,
    sinks: Vec<Box<dyn AlertSink>>,
    period: Duration,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    ingests: Arc<AtomicU64>,
}

/// Spawn a monitor on the current tokio runtime.
///
/// Fails if `period` is zero or no runtime is available.
pub fn spawn_monitor<S>(
    store: Arc<TelemetryStore>,
    source: S,
    period: Duration,
    sinks: Vec<Box<dyn AlertSink>>,
) -> WellnessResult<MonitorHandle>
where
    S: SampleSource + 'static,
{
    if period.is_zero() {
        return Err(WellnessError::configuration("monitor period must be non-zero"));
    }
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| WellnessError::invalid_state("tokio runtime", "no runtime"))?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let running = Arc::new(AtomicBool::new(true));
    let ticks = Arc::new(AtomicU64::new(0));
    let ingests = Arc::new(AtomicU64::new(0));

    info!(
        source = source.name(),
        period_ms = period.as_millis() as u64,
        sinks = sinks.len(),
        "starting monitor"
    );

    let task = MonitorTask {
        store,
        source,
        sinks,
        period,
        running: Arc::clone(&running),
        ticks: Arc::clone(&ticks),
        ingests: Arc::clone(&ingests),
    };
    let join = runtime.spawn(task.run(stop_rx));

    Ok(MonitorHandle {
        stop_tx,
        running,
        ticks,
        ingests,
        task: Mutex::new(Some(join)),
    })
}

/// Clears the running flag when the task exits, including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: SampleSource> MonitorTask<S> {
    async fn run(mut self, mut stop_rx: watch::Receiver<bool>) {
        let _running = RunningGuard(Arc::clone(&self.running));
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tier: Option<AlertTier> = self.store.last_alert().map(|e| e.tier);

        loop {
            tokio::select! {
                biased;
                // Err means every handle is gone.
                _ = stop_rx.changed() => break,
                _ = interval.tick() => {}
            }
            if *stop_rx.borrow() {
                break;
            }

            let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
            let Some(sample) = self.source.next_sample() else {
                debug!(tick, source = self.source.name(), "no sample this tick");
                continue;
            };

            let event = self.store.ingest(sample);
            self.ingests.fetch_add(1, Ordering::Relaxed);

            if last_tier != Some(event.tier) {
                last_tier = Some(event.tier);
                let settings = self.store.settings();
                for sink in &self.sinks {
                    if let Err(e) = sink.deliver(&event, &settings) {
                        warn!(sink = sink.name(), error = %e, "alert delivery failed");
                    }
                }
            }
        }

        info!(
            ticks = self.ticks.load(Ordering::Relaxed),
            ingests = self.ingests.load(Ordering::Relaxed),
            "monitor stopped"
        );
    }
}
