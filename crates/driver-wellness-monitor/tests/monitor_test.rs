//! Timer-driven tests for the periodic monitor, run on paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use driver_wellness_core::{
    AlertEvent, AlertTier, SampleSource, Settings, SettingsPatch, WellnessError, WellnessResult,
    WellnessSample,
};
use driver_wellness_monitor::{spawn_monitor, AlertSink};
use driver_wellness_telemetry::{RandomWalkSimulator, SampleClock, SimulatorConfig, TelemetryStore};
use parking_lot::Mutex;

/// Replays fixed fatigue values, then yields nothing.
struct Scripted {
    fatigues: Vec<f64>,
    next: usize,
}

impl Scripted {
    fn new(fatigues: &[f64]) -> Self {
        Self {
            fatigues: fatigues.to_vec(),
            next: 0,
        }
    }
}

impl SampleSource for Scripted {
    fn next_sample(&mut self) -> Option<WellnessSample> {
        let fatigue = *self.fatigues.get(self.next)?;
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let sample = WellnessSample {
            fatigue_score: fatigue,
            ..WellnessSample::nominal(t0 + chrono::Duration::seconds(self.next as i64))
        };
        self.next += 1;
        Some(sample)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct RecordingSink {
    tiers: Arc<Mutex<Vec<AlertTier>>>,
}

impl AlertSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn deliver(&self, event: &AlertEvent, _settings: &Settings) -> WellnessResult<()> {
        self.tiers.lock().push(event.tier);
        Ok(())
    }
}

fn simulator() -> RandomWalkSimulator {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    RandomWalkSimulator::seeded(SimulatorConfig::default(), 1)
        .with_clock(SampleClock::stepped(start, chrono::Duration::seconds(1)))
}

#[tokio::test(start_paused = true)]
async fn ticks_at_fixed_period() {
    let store = Arc::new(TelemetryStore::default());
    let monitor =
        spawn_monitor(Arc::clone(&store), simulator(), Duration::from_millis(1000), Vec::new())
            .unwrap();
    assert!(monitor.is_running());

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let ingested = monitor.ingests();
    assert!((3..=4).contains(&ingested), "ingested {ingested}");
    assert_eq!(store.len() as u64, ingested);

    monitor.shutdown().await.unwrap();
    assert!(!monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn no_ingest_after_shutdown() {
    let store = Arc::new(TelemetryStore::default());
    let monitor =
        spawn_monitor(Arc::clone(&store), simulator(), Duration::from_millis(100), Vec::new())
            .unwrap();

    tokio::time::sleep(Duration::from_millis(450)).await;
    monitor.stop();
    monitor.stop();
    monitor.shutdown().await.unwrap();
    let after_shutdown = store.len();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(store.len(), after_shutdown);
    assert_eq!(monitor.ingests() as usize, after_shutdown);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_task() {
    let store = Arc::new(TelemetryStore::default());
    let monitor =
        spawn_monitor(Arc::clone(&store), simulator(), Duration::from_millis(100), Vec::new())
            .unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    drop(monitor);

    // Let the task observe the stop signal.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let len = store.len();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(store.len(), len);
}

#[tokio::test(start_paused = true)]
async fn empty_ticks_are_counted_but_not_ingested() {
    let store = Arc::new(TelemetryStore::default());
    let monitor = spawn_monitor(
        Arc::clone(&store),
        Scripted::new(&[0.2]),
        Duration::from_millis(100),
        Vec::new(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(550)).await;
    monitor.shutdown().await.unwrap();
    assert_eq!(monitor.ingests(), 1);
    assert!(monitor.ticks() >= 5);
    assert_eq!(store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sinks_receive_tier_transitions_only() {
    let store = Arc::new(TelemetryStore::default());
    let tiers = Arc::new(Mutex::new(Vec::new()));
    let sink = RecordingSink {
        tiers: Arc::clone(&tiers),
    };
    let monitor = spawn_monitor(
        Arc::clone(&store),
        Scripted::new(&[0.2, 0.3, 0.5, 0.55, 0.75, 0.8, 0.1]),
        Duration::from_millis(100),
        vec![Box::new(sink)],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    monitor.shutdown().await.unwrap();

    assert_eq!(
        *tiers.lock(),
        vec![
            AlertTier::Normal,
            AlertTier::Caution,
            AlertTier::Critical,
            AlertTier::Normal
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn settings_update_applies_to_next_tick() {
    let store = Arc::new(TelemetryStore::default());
    let monitor = spawn_monitor(
        Arc::clone(&store),
        Scripted::new(&[0.5, 0.5]),
        Duration::from_millis(1000),
        Vec::new(),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.last_alert().map(|e| e.tier), Some(AlertTier::Caution));

    store.update_settings(&SettingsPatch::new().fatigue_threshold(0.45));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(store.last_alert().map(|e| e.tier), Some(AlertTier::Critical));

    monitor.shutdown().await.unwrap();
}

/// Source that fails on its first tick.
struct Failing;

impl SampleSource for Failing {
    fn next_sample(&mut self) -> Option<WellnessSample> {
        panic!("sensor pipeline crashed");
    }
}

#[tokio::test(start_paused = true)]
async fn panicked_task_is_not_reported_running() {
    let store = Arc::new(TelemetryStore::default());
    let monitor =
        spawn_monitor(Arc::clone(&store), Failing, Duration::from_millis(100), Vec::new())
            .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!monitor.is_running());
    assert!(store.is_empty());

    let err = monitor.shutdown().await.unwrap_err();
    assert!(matches!(err, WellnessError::Internal { .. }));
}

#[tokio::test]
async fn zero_period_is_rejected() {
    let store = Arc::new(TelemetryStore::default());
    let err = spawn_monitor(store, simulator(), Duration::ZERO, Vec::new()).unwrap_err();
    assert!(matches!(err, WellnessError::Configuration { .. }));
}

#[test]
fn spawn_outside_runtime_is_rejected() {
    let store = Arc::new(TelemetryStore::default());
    let err =
        spawn_monitor(store, simulator(), Duration::from_millis(100), Vec::new()).unwrap_err();
    assert!(matches!(err, WellnessError::InvalidState { .. }));
}
