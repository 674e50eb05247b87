//! Scheduling for driver wellness telemetry.
//!
//! [`spawn_monitor`] runs a cancellable periodic task that pulls samples from
//! a [`SampleSource`](driver_wellness_core::SampleSource), ingests them into a
//! shared [`TelemetryStore`](driver_wellness_telemetry::TelemetryStore) and
//! hands tier transitions to [`AlertSink`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use driver_wellness_monitor::{spawn_monitor, AlertSink, TracingAlertSink};
//! use driver_wellness_telemetry::{RandomWalkSimulator, SimulatorConfig, TelemetryStore};
//!
//! # async fn run() -> driver_wellness_core::WellnessResult<()> {
//! let store = Arc::new(TelemetryStore::default());
//! let source = RandomWalkSimulator::new(SimulatorConfig::default());
//! let sinks: Vec<Box<dyn AlertSink>> = vec![Box::new(TracingAlertSink)];
//!
//! let monitor = spawn_monitor(Arc::clone(&store), source, Duration::from_secs(1), sinks)?;
//! tokio::time::sleep(Duration::from_secs(10)).await;
//! monitor.shutdown().await?;
//!
//! println!("{:?}", store.session_summary());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod monitor;
pub mod sink;

pub use config::{MonitorConfig, DEFAULT_TICK_MS, MIN_TICK_MS};
pub use monitor::{spawn_monitor, MonitorHandle};
pub use sink::{AlertSink, TracingAlertSink};
