//! Threshold-based alert classification.
//!
//! Pure function of `(sample, settings)`. Never looks at history.

use driver_wellness_core::{AlertEvent, AlertTier, Settings, WellnessSample};
use serde::Serialize;

/// Fixed fatigue bound above which a non-critical sample is CAUTION.
///
/// Independent of [`Settings`].
pub const CAUTION_FATIGUE_BOUND: f64 = 0.4;

/// Message attached to [`AlertTier::Critical`].
pub const CRITICAL_MESSAGE: &str = "Critical fatigue level detected! Consider taking a break.";
/// Message attached to [`AlertTier::Caution`].
pub const CAUTION_MESSAGE: &str = "Fatigue level increasing. Stay alert.";
/// Message attached to [`AlertTier::Normal`].
pub const NORMAL_MESSAGE: &str = "Driver alert. Monitoring.";

/// Tier and message for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Resulting tier.
    pub tier: AlertTier,
    /// Fixed human-readable message for the tier.
    pub message: &'static str,
}

impl Classification {
    fn for_tier(tier: AlertTier) -> Self {
        let message = match tier {
            AlertTier::Critical => CRITICAL_MESSAGE,
            AlertTier::Caution => CAUTION_MESSAGE,
            AlertTier::Normal => NORMAL_MESSAGE,
        };
        Self { tier, message }
    }

    /// Build the [`AlertEvent`] for a sample captured at `sample.timestamp`.
    #[must_use]
    pub fn into_event(self, sample: &WellnessSample) -> AlertEvent {
        AlertEvent::new(self.tier, self.message, sample.timestamp)
    }
}

/// Classify a sample against the given settings.
///
/// Threshold comparisons are inclusive, the caution bound is strict.
/// NaN scores compare false everywhere and therefore classify as NORMAL.
#[must_use]
pub fn classify(sample: &WellnessSample, settings: &Settings) -> Classification {
    Classification::for_tier(classify_tier(sample, settings))
}

/// Tier only; see [`classify`].
#[must_use]
pub fn classify_tier(sample: &WellnessSample, settings: &Settings) -> AlertTier {
    let is_critical = sample.fatigue_score >= settings.fatigue_threshold
        || sample.eye_closure_fraction >= settings.perclos_threshold;

    if is_critical {
        AlertTier::Critical
    } else if sample.fatigue_score > CAUTION_FATIGUE_BOUND {
        AlertTier::Caution
    } else {
        AlertTier::Normal
    }
}
