//! Monitor configuration.
//!
//! Loaded from an optional JSON file; CLI flags override individual fields.
//!
//! ```json
//! {
//!   "tick_ms": 500,
//!   "log_capacity": 300,
//!   "score_scale": "percent",
//!   "settings": { "fatigueThreshold": 65, "llmAlertsEnabled": true }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use driver_wellness_core::{
    ScoreScale, Settings, SettingsPatch, WellnessError, WellnessResult, DEFAULT_LOG_CAPACITY,
};
use driver_wellness_telemetry::SimulatorConfig;
use serde::{Deserialize, Serialize};

/// Smallest accepted tick period.
pub const MIN_TICK_MS: u64 = 100;

/// Default tick period (1 Hz).
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Runtime configuration for the monitor binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Period between ticks in milliseconds.
    pub tick_ms: u64,
    /// Session log capacity.
    pub log_capacity: usize,
    /// Scale of thresholds in `settings`.
    pub score_scale: ScoreScale,
    /// Initial settings, applied over the defaults.
    pub settings: SettingsPatch,
    /// Random-walk parameters for the simulated source.
    pub simulator: SimulatorConfig,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            log_capacity: DEFAULT_LOG_CAPACITY,
            score_scale: ScoreScale::Unit,
            settings: SettingsPatch::default(),
            simulator: SimulatorConfig::default(),
            seed: None,
        }
    }
}

impl MonitorConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> WellnessResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> WellnessResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check the period, capacity and simulator parameters.
    pub fn validate(&self) -> WellnessResult<()> {
        if self.tick_ms < MIN_TICK_MS {
            return Err(WellnessError::configuration(format!(
                "tick_ms {} below minimum {MIN_TICK_MS}",
                self.tick_ms
            )));
        }
        if self.log_capacity == 0 {
            return Err(WellnessError::configuration("log_capacity must be at least 1"));
        }
        self.simulator.validate()
    }

    /// Tick period.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Initial settings: defaults with the normalized patch applied.
    #[must_use]
    pub fn initial_settings(&self) -> Settings {
        Settings::default().merged(&self.settings.clone().normalized(self.score_scale))
    }
}
