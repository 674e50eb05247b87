//! # Driver Wellness Core
//!
//! Core types, settings and error handling shared by the driver wellness
//! telemetry crates.
//!
//! - **Data types**: [`WellnessSample`], [`AlertTier`], [`AlertEvent`] and
//!   [`ScoreScale`] for boundary normalization of percent-scale inputs.
//! - **Settings**: [`Settings`] with documented defaults and valid ranges,
//!   and [`SettingsPatch`] for partial, clamped updates.
//! - **Errors**: [`WellnessError`] via the [`error`] module.
//! - **Traits**: [`SampleSource`], the inbound seam for sensing pipelines
//!   and simulators.
//!
//! ## Example
//!
//! ```rust
//! use driver_wellness_core::{Settings, SettingsPatch};
//!
//! let mut settings = Settings::default();
//! let patch = SettingsPatch::from_json(r#"{"fatigueThreshold": 100, "theme": "dark"}"#).unwrap();
//! settings.apply(&patch);
//!
//! // Out-of-range values are clamped; unknown keys are ignored.
//! assert_eq!(settings.fatigue_threshold, 1.0);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{WellnessError, WellnessResult};
pub use settings::{Settings, SettingsPatch, FATIGUE_THRESHOLD_RANGE, PERCLOS_THRESHOLD_RANGE};
pub use traits::SampleSource;
pub use types::{AlertEvent, AlertTier, ScoreScale, WellnessSample};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default ring buffer capacity for the session log.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{WellnessError, WellnessResult};
    pub use crate::settings::{Settings, SettingsPatch};
    pub use crate::traits::SampleSource;
    pub use crate::types::{AlertEvent, AlertTier, ScoreScale, WellnessSample};
}
