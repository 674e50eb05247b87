//! Driver wellness telemetry: ingestion, buffering, alert classification and
//! windowed analytics.
//!
//! # Architecture
//!
//! Samples flow through four stages:
//!
//! 1. **Source** ([`SampleSource`]): a sensing pipeline, or the
//!    [`RandomWalkSimulator`] with bounded per-field random walks.
//! 2. **Store** ([`TelemetryStore`]): appends to a bounded [`SessionLog`],
//!    classifies against the current [`Settings`](driver_wellness_core::Settings)
//!    and publishes an immutable [`TelemetrySnapshot`].
//! 3. **Classification** ([`classify`]): inclusive fatigue and PERCLOS
//!    thresholds for CRITICAL, a fixed bound for CAUTION.
//! 4. **Analytics**: fatigue trend, paired-metric series, tier distribution,
//!    trend statistics, session summary and CSV export, all derived on demand
//!    from a snapshot.
//!
//! # Example
//!
//! ```
//! use driver_wellness_core::{AlertTier, SettingsPatch, WellnessSample};
//! use driver_wellness_telemetry::{ExportFilter, TelemetryStore};
//! use chrono::{Duration, Utc};
//!
//! let store = TelemetryStore::new(100);
//! let t0 = Utc::now();
//!
//! for (i, fatigue) in [0.2, 0.5, 0.75].into_iter().enumerate() {
//!     let sample = WellnessSample {
//!         fatigue_score: fatigue,
//!         ..WellnessSample::nominal(t0 + Duration::seconds(i as i64))
//!     };
//!     store.ingest(sample);
//! }
//!
//! assert_eq!(store.last_alert().map(|a| a.tier), Some(AlertTier::Critical));
//! let dist = store.tier_distribution();
//! assert_eq!((dist.normal, dist.caution, dist.critical), (1, 1, 1));
//!
//! // Settings changes affect derived views, not past alerts.
//! store.update_settings(&SettingsPatch::new().fatigue_threshold(100.0));
//! assert_eq!(store.tier_distribution().critical, 0);
//!
//! let csv = store.export_csv(ExportFilter::All);
//! assert!(csv.starts_with("Timestamp,Tier,Message\n"));
//! ```

#![forbid(unsafe_code)]

pub mod analytics;
pub mod classifier;
pub mod export;
pub mod session_log;
pub mod simulator;
pub mod store;
pub mod summary;

pub use analytics::{DualMetricPoint, SampleField, TierDistribution, TrendPoint, TrendStats};
pub use classifier::{classify, classify_tier, Classification, CAUTION_FATIGUE_BOUND};
pub use driver_wellness_core::SampleSource;
pub use export::{describe, ExportFilter, ExportRecord, CSV_HEADER};
pub use session_log::SessionLog;
pub use simulator::{RandomWalkSimulator, SampleClock, SimulatorConfig, WalkBounds};
pub use store::{TelemetrySnapshot, TelemetryStore};
pub use summary::SessionSummary;
