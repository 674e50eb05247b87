//! Alert settings and partial settings updates.
//!
//! Thresholds live on the unit interval. A finite out-of-range value in a
//! patch is clamped to the valid range; a non-finite value leaves the field
//! unchanged. Both cases are logged at `warn`.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::WellnessResult;
use crate::types::ScoreScale;

/// Valid range for [`Settings::fatigue_threshold`].
pub const FATIGUE_THRESHOLD_RANGE: RangeInclusive<f64> = 0.30..=1.00;

/// Valid range for [`Settings::perclos_threshold`].
pub const PERCLOS_THRESHOLD_RANGE: RangeInclusive<f64> = 0.10..=1.00;

/// Mutable alert configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Fatigue score at/above which the CRITICAL tier triggers.
    pub fatigue_threshold: f64,
    /// Eye-closure fraction at/above which the CRITICAL tier triggers.
    pub perclos_threshold: f64,
    /// Consulted by audio delivery sinks only.
    pub audio_alerts_enabled: bool,
    /// Consulted by LLM delivery sinks only.
    pub llm_alerts_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fatigue_threshold: 0.70,
            perclos_threshold: 0.80,
            audio_alerts_enabled: true,
            llm_alerts_enabled: false,
        }
    }
}

impl Settings {
    /// Merge `patch` into these settings field by field.
    ///
    /// Returns `true` if any field changed.
    pub fn apply(&mut self, patch: &SettingsPatch) -> bool {
        let before = self.clone();

        if let Some(value) = patch.fatigue_threshold {
            if let Some(v) = clamp_threshold("fatigueThreshold", value, &FATIGUE_THRESHOLD_RANGE) {
                self.fatigue_threshold = v;
            }
        }
        if let Some(value) = patch.perclos_threshold {
            if let Some(v) = clamp_threshold("perclosThreshold", value, &PERCLOS_THRESHOLD_RANGE) {
                self.perclos_threshold = v;
            }
        }
        if let Some(enabled) = patch.audio_alerts_enabled {
            self.audio_alerts_enabled = enabled;
        }
        if let Some(enabled) = patch.llm_alerts_enabled {
            self.llm_alerts_enabled = enabled;
        }

        *self != before
    }

    /// Return a copy with `patch` applied.
    #[must_use]
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

fn clamp_threshold(key: &'static str, value: f64, range: &RangeInclusive<f64>) -> Option<f64> {
    if !value.is_finite() {
        warn!(key, value, "ignoring non-finite threshold");
        return None;
    }
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warn!(
            key,
            requested = value,
            applied = clamped,
            "threshold outside valid range, clamped"
        );
    }
    Some(clamped)
}

/// A partial settings update. Absent fields leave settings unchanged.
///
/// Deserializes from the configuration surface keys; unrecognized keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    /// New fatigue threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatigue_threshold: Option<f64>,
    /// New PERCLOS threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perclos_threshold: Option<f64>,
    /// Toggle audio alert delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_alerts_enabled: Option<bool>,
    /// Toggle LLM alert delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_alerts_enabled: Option<bool>,
}

impl SettingsPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a patch from JSON.
    pub fn from_json(json: &str) -> WellnessResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the fatigue threshold.
    #[must_use]
    pub fn fatigue_threshold(mut self, value: f64) -> Self {
        self.fatigue_threshold = Some(value);
        self
    }

    /// Set the PERCLOS threshold.
    #[must_use]
    pub fn perclos_threshold(mut self, value: f64) -> Self {
        self.perclos_threshold = Some(value);
        self
    }

    /// Toggle audio alerts.
    #[must_use]
    pub fn audio_alerts_enabled(mut self, enabled: bool) -> Self {
        self.audio_alerts_enabled = Some(enabled);
        self
    }

    /// Toggle LLM alerts.
    #[must_use]
    pub fn llm_alerts_enabled(mut self, enabled: bool) -> Self {
        self.llm_alerts_enabled = Some(enabled);
        self
    }

    /// Convert threshold values from `scale` to the unit interval.
    #[must_use]
    pub fn normalized(mut self, scale: ScoreScale) -> Self {
        self.fatigue_threshold = self.fatigue_threshold.map(|v| scale.to_unit(v));
        self.perclos_threshold = self.perclos_threshold.map(|v| scale.to_unit(v));
        self
    }

    /// Whether this patch carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fatigue_threshold.is_none()
            && self.perclos_threshold.is_none()
            && self.audio_alerts_enabled.is_none()
            && self.llm_alerts_enabled.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let s = Settings::default();
        assert!((s.fatigue_threshold - 0.70).abs() < f64::EPSILON);
        assert!((s.perclos_threshold - 0.80).abs() < f64::EPSILON);
        assert!(s.audio_alerts_enabled);
        assert!(!s.llm_alerts_enabled);
        assert!(FATIGUE_THRESHOLD_RANGE.contains(&s.fatigue_threshold));
        assert!(PERCLOS_THRESHOLD_RANGE.contains(&s.perclos_threshold));
    }

    #[test]
    fn patch_merges_field_by_field() {
        let mut s = Settings::default();
        let changed = s.apply(&SettingsPatch::new().perclos_threshold(0.5));
        assert!(changed);
        assert!((s.perclos_threshold - 0.5).abs() < f64::EPSILON);
        assert!((s.fatigue_threshold - 0.70).abs() < f64::EPSILON);
        assert!(s.audio_alerts_enabled);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut s = Settings::default();
        s.apply(&SettingsPatch::new().fatigue_threshold(100.0).perclos_threshold(0.01));
        assert!((s.fatigue_threshold - 1.0).abs() < f64::EPSILON);
        assert!((s.perclos_threshold - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_values_leave_field_unchanged() {
        let mut s = Settings::default();
        let changed = s.apply(
            &SettingsPatch::new()
                .fatigue_threshold(f64::NAN)
                .perclos_threshold(f64::INFINITY)
                .llm_alerts_enabled(true),
        );
        assert!(changed);
        assert!((s.fatigue_threshold - 0.70).abs() < f64::EPSILON);
        assert!((s.perclos_threshold - 0.80).abs() < f64::EPSILON);
        assert!(s.llm_alerts_enabled);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut s = Settings::default();
        assert!(SettingsPatch::new().is_empty());
        assert!(!s.apply(&SettingsPatch::new()));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn json_patch_ignores_unknown_keys() {
        let patch = SettingsPatch::from_json(
            r#"{"fatigueThreshold": 0.6, "audioAlertsEnabled": false, "theme": "dark"}"#,
        )
        .unwrap();
        assert_eq!(patch.fatigue_threshold, Some(0.6));
        assert_eq!(patch.audio_alerts_enabled, Some(false));
        assert_eq!(patch.perclos_threshold, None);
    }

    #[test]
    fn json_patch_rejects_wrong_types() {
        assert!(SettingsPatch::from_json(r#"{"fatigueThreshold": "high"}"#).is_err());
    }

    #[test]
    fn percent_patch_normalizes_thresholds() {
        let patch = SettingsPatch::new()
            .fatigue_threshold(70.0)
            .perclos_threshold(80.0)
            .normalized(ScoreScale::Percent);
        let s = Settings::default().merged(&patch);
        assert_eq!(s, Settings::default());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn thresholds_always_within_range(fatigue in any::<f64>(), perclos in any::<f64>()) {
                let s = Settings::default()
                    .merged(&SettingsPatch::new().fatigue_threshold(fatigue).perclos_threshold(perclos));
                prop_assert!(FATIGUE_THRESHOLD_RANGE.contains(&s.fatigue_threshold));
                prop_assert!(PERCLOS_THRESHOLD_RANGE.contains(&s.perclos_threshold));
            }
        }
    }

    #[test]
    fn merged_leaves_original_untouched() {
        let s = Settings::default();
        let next = s.merged(&SettingsPatch::new().fatigue_threshold(0.9));
        assert!((s.fatigue_threshold - 0.70).abs() < f64::EPSILON);
        assert!((next.fatigue_threshold - 0.9).abs() < f64::EPSILON);
    }
}
