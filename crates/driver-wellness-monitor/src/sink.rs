//! Outbound alert delivery seam.
//!
//! The monitor hands every tier transition to its sinks. Delivery mechanisms
//! (audio playback, LLM voice prompts) live outside this crate; they inspect
//! the corresponding `Settings` toggles themselves.

use driver_wellness_core::{AlertEvent, AlertTier, Settings, WellnessResult};
use tracing::{info, warn};

/// Receives alert events on tier transitions.
pub trait AlertSink: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Deliver one event. `settings` are the settings in force when the
    /// transition was observed.
    fn deliver(&self, event: &AlertEvent, settings: &Settings) -> WellnessResult<()>;
}

/// Logs every transition through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn deliver(&self, event: &AlertEvent, settings: &Settings) -> WellnessResult<()> {
        let audio = settings.audio_alerts_enabled;
        let llm = settings.llm_alerts_enabled;
        match event.tier {
            AlertTier::Critical => warn!(
                tier = %event.tier,
                time = %event.time,
                audio,
                llm,
                "{}",
                event.message
            ),
            AlertTier::Caution | AlertTier::Normal => info!(
                tier = %event.tier,
                time = %event.time,
                audio,
                llm,
                "{}",
                event.message
            ),
        }
        Ok(())
    }
}
