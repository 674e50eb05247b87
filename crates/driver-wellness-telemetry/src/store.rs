//! Telemetry store.
//!
//! The single authoritative holder of the current sample, the session log,
//! the settings and the last alert. State lives in an immutable
//! [`TelemetrySnapshot`] behind an [`ArcSwap`]; every mutation builds the next
//! snapshot and installs it with compare-and-swap, so readers never block and
//! concurrent writers never lose updates.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use driver_wellness_core::{
    AlertEvent, AlertTier, Settings, SettingsPatch, WellnessSample, DEFAULT_LOG_CAPACITY,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::analytics::{DualMetricPoint, SampleField, TierDistribution, TrendPoint, TrendStats};
use crate::classifier::classify;
use crate::export::{describe, ExportFilter, ExportRecord};
use crate::session_log::SessionLog;
use crate::summary::SessionSummary;

/// Buffered snapshot notifications per subscriber.
const NOTIFY_CAPACITY: usize = 64;

/// Immutable view of the store at one revision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    /// Most recently ingested sample.
    pub current: Option<WellnessSample>,
    /// Settings in force at this revision.
    pub settings: Settings,
    /// Bounded history, oldest first.
    pub log: SessionLog,
    /// Outcome of the most recent ingest.
    pub last_alert: Option<AlertEvent>,
    /// Incremented on every mutation.
    pub revision: u64,
}

impl TelemetrySnapshot {
    /// Empty snapshot with default settings.
    #[must_use]
    pub fn empty(capacity: usize) -> Self {
        Self {
            current: None,
            settings: Settings::default(),
            log: SessionLog::new(capacity),
            last_alert: None,
            revision: 0,
        }
    }

    fn next_revision(&self) -> Self {
        let mut next = self.clone();
        next.revision = self.revision.wrapping_add(1);
        next
    }
}

/// Shared telemetry store. Wrap in an `Arc` to share between tasks.
pub struct TelemetryStore {
    state: ArcSwap<TelemetrySnapshot>,
    notify: broadcast::Sender<Arc<TelemetrySnapshot>>,
}

impl std::fmt::Debug for TelemetryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.state.load();
        f.debug_struct("TelemetryStore")
            .field("revision", &snap.revision)
            .field("len", &snap.log.len())
            .field("capacity", &snap.log.capacity())
            .field("subscribers", &self.notify.receiver_count())
            .finish()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl TelemetryStore {
    /// Create a store whose log retains at most `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_settings(capacity, Settings::default())
    }

    /// Create a store with initial settings.
    #[must_use]
    pub fn with_settings(capacity: usize, settings: Settings) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        let snapshot = TelemetrySnapshot {
            settings,
            ..TelemetrySnapshot::empty(capacity)
        };
        Self {
            state: ArcSwap::from_pointee(snapshot),
            notify,
        }
    }

    /// Ingest one sample: append, classify against the current settings and
    /// record the resulting alert.
    pub fn ingest(&self, sample: WellnessSample) -> AlertEvent {
        let (snap, (event, previous, rewound)) = self.swap_with(|cur| {
            let rewound = cur
                .log
                .latest()
                .map(|prev| prev.timestamp)
                .filter(|prev| sample.timestamp < *prev);
            let mut next = cur.next_revision();
            let event = classify(&sample, &next.settings).into_event(&sample);
            next.log.push(sample.clone());
            next.current = Some(sample.clone());
            let previous = next.last_alert.replace(event.clone()).map(|e| e.tier);
            (next, (event, previous, rewound))
        });

        if let Some(previous) = rewound {
            warn!(
                %previous,
                timestamp = %sample.timestamp,
                "sample timestamp went backwards"
            );
        }
        debug!(
            revision = snap.revision,
            sample = %describe(&sample),
            perclos = sample.eye_closure_fraction,
            tier = %event.tier,
            "ingested sample"
        );
        if previous != Some(event.tier) {
            info!(
                from = previous.map_or("NONE", |t| t.as_str()),
                to = %event.tier,
                "alert tier changed"
            );
        }

        self.publish(snap);
        event
    }

    /// Merge a partial update into the settings and return the new settings.
    ///
    /// History is not reclassified and the last alert is left as is.
    pub fn update_settings(&self, patch: &SettingsPatch) -> Settings {
        let (snap, ()) = self.swap_with(|cur| {
            let mut next = cur.next_revision();
            next.settings.apply(patch);
            (next, ())
        });
        debug!(settings = ?snap.settings, "settings updated");
        let settings = snap.settings.clone();
        self.publish(snap);
        settings
    }

    /// Restore the default settings.
    pub fn reset_settings(&self) -> Settings {
        let (snap, ()) = self.swap_with(|cur| {
            let mut next = cur.next_revision();
            next.settings = Settings::default();
            (next, ())
        });
        info!("settings reset to defaults");
        let settings = snap.settings.clone();
        self.publish(snap);
        settings
    }

    /// Empty the session log. Current sample, last alert and settings stay.
    pub fn clear_log(&self) {
        let (snap, cleared) = self.swap_with(|cur| {
            let mut next = cur.next_revision();
            let cleared = next.log.len();
            next.log.clear();
            (next, cleared)
        });
        info!(cleared, "session log cleared");
        self.publish(snap);
    }

    /// Current immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TelemetrySnapshot> {
        self.state.load_full()
    }

    /// Receive every new snapshot. Slow receivers may lag; they can always
    /// fall back to [`snapshot`](Self::snapshot).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TelemetrySnapshot>> {
        self.notify.subscribe()
    }

    /// Settings currently in force.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.state.load().settings.clone()
    }

    /// Most recent alert, if any sample has been ingested.
    #[must_use]
    pub fn last_alert(&self) -> Option<AlertEvent> {
        self.state.load().last_alert.clone()
    }

    /// Most recently ingested sample.
    #[must_use]
    pub fn current(&self) -> Option<WellnessSample> {
        self.state.load().current.clone()
    }

    /// Log capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.load().log.capacity()
    }

    /// Number of samples in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.load().log.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.load().log.is_empty()
    }

    // ── Read-side conveniences over the current snapshot ───────────────────

    /// See [`TelemetrySnapshot::fatigue_trend`].
    #[must_use]
    pub fn fatigue_trend(&self, window: usize) -> Vec<TrendPoint> {
        self.state.load().fatigue_trend(window)
    }

    /// See [`TelemetrySnapshot::dual_metric_series`].
    #[must_use]
    pub fn dual_metric_series(
        &self,
        a: SampleField,
        b: SampleField,
        window: usize,
    ) -> Vec<DualMetricPoint> {
        self.state.load().dual_metric_series(a, b, window)
    }

    /// See [`TelemetrySnapshot::tier_distribution`].
    #[must_use]
    pub fn tier_distribution(&self) -> TierDistribution {
        self.state.load().tier_distribution()
    }

    /// See [`TelemetrySnapshot::trend_stats`].
    #[must_use]
    pub fn trend_stats(&self, field: SampleField, window: usize, alpha: f64) -> Option<TrendStats> {
        self.state.load().trend_stats(field, window, alpha)
    }

    /// See [`TelemetrySnapshot::session_summary`].
    #[must_use]
    pub fn session_summary(&self) -> Option<SessionSummary> {
        self.state.load().session_summary()
    }

    /// See [`TelemetrySnapshot::export_csv`].
    #[must_use]
    pub fn export_csv(&self, filter: ExportFilter) -> String {
        self.state.load().export_csv(filter)
    }

    /// See [`TelemetrySnapshot::export_records`].
    #[must_use]
    pub fn export_records(&self, filter: ExportFilter) -> Vec<ExportRecord> {
        self.state.load().export_records(filter)
    }

    /// Tier of the last alert, or NORMAL if nothing has been ingested.
    #[must_use]
    pub fn current_tier(&self) -> AlertTier {
        self.state
            .load()
            .last_alert
            .as_ref()
            .map_or(AlertTier::Normal, |e| e.tier)
    }

    /// Read-copy-update: retry `f` until its output is installed over the
    /// snapshot it was derived from.
    fn swap_with<R>(
        &self,
        mut f: impl FnMut(&TelemetrySnapshot) -> (TelemetrySnapshot, R),
    ) -> (Arc<TelemetrySnapshot>, R) {
        let mut cur = self.state.load_full();
        loop {
            let (next, out) = f(&cur);
            let next = Arc::new(next);
            let prev = self.state.compare_and_swap(&cur, Arc::clone(&next));
            if Arc::ptr_eq(&*prev, &cur) {
                return (next, out);
            }
            cur = Guard::into_inner(prev);
        }
    }

    fn publish(&self, snap: Arc<TelemetrySnapshot>) {
        // No receivers is not an error.
        let _ = self.notify.send(snap);
    }
}
