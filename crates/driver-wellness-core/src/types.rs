//! Wellness telemetry domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WellnessError;

// ── Score normalization ─────────────────────────────────────────────────────

/// Scale of an incoming score before it enters the core.
///
/// Everything inside the core is on the unit interval. Percent-scale inputs
/// are converted exactly once, at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScale {
    /// Scores already in `[0, 1]`.
    #[default]
    Unit,
    /// Scores in `[0, 100]`.
    Percent,
}

impl ScoreScale {
    /// Convert a value on this scale to the unit interval.
    #[must_use]
    pub fn to_unit(self, value: f64) -> f64 {
        match self {
            Self::Unit => value,
            Self::Percent => value / 100.0,
        }
    }
}

impl FromStr for ScoreScale {
    type Err = WellnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unit" => Ok(Self::Unit),
            "percent" => Ok(Self::Percent),
            other => Err(WellnessError::configuration(format!(
                "unknown score scale '{other}' (expected 'unit' or 'percent')"
            ))),
        }
    }
}

// ── WellnessSample ──────────────────────────────────────────────────────────

/// One telemetry observation produced by a sample source.
///
/// Out-of-domain values are accepted as-is; validation belongs to the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessSample {
    /// Capture time (monotonically non-decreasing per source).
    pub timestamp: DateTime<Utc>,
    /// Eye aspect ratio; lower means more closed.
    pub eye_aspect_ratio: f64,
    /// Blinks per minute.
    pub blink_rate_per_minute: f64,
    /// PERCLOS over a trailing 30 s window [0.0, 1.0].
    pub eye_closure_fraction: f64,
    /// CNN drowsiness confidence [0.0, 1.0].
    pub model_confidence: f64,
    /// Fused fatigue estimate [0.0, 1.0].
    pub fatigue_score: f64,
    /// Heart rate in BPM.
    pub heart_rate: f64,
    /// Heart rate variability in ms.
    pub heart_rate_variability: f64,
    /// Pipeline frame rate. Never used for alerting.
    pub frames_per_second: f64,
    /// Mouth aspect ratio (yawn proxy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth_aspect_ratio: Option<f64>,
    /// Gaze deviation from the road axis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze_deviation: Option<f64>,
    /// Whether a head nod was detected in this tick.
    #[serde(default)]
    pub head_nod_detected: bool,
}

impl WellnessSample {
    /// A sample with resting, alert-driver values at `timestamp`.
    #[must_use]
    pub fn nominal(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            eye_aspect_ratio: 0.28,
            blink_rate_per_minute: 18.0,
            eye_closure_fraction: 0.12,
            model_confidence: 0.15,
            fatigue_score: 0.35,
            heart_rate: 78.0,
            heart_rate_variability: 40.0,
            frames_per_second: 30.0,
            mouth_aspect_ratio: None,
            gaze_deviation: None,
            head_nod_detected: false,
        }
    }

    /// Convert the unit-interval scores from `scale` to the canonical scale.
    ///
    /// Affects `fatigue_score`, `eye_closure_fraction` and `model_confidence`.
    #[must_use]
    pub fn normalized(mut self, scale: ScoreScale) -> Self {
        self.fatigue_score = scale.to_unit(self.fatigue_score);
        self.eye_closure_fraction = scale.to_unit(self.eye_closure_fraction);
        self.model_confidence = scale.to_unit(self.model_confidence);
        self
    }

    /// Fatigue score as a whole percentage, for presentation.
    #[must_use]
    pub fn fatigue_percent(&self) -> f64 {
        (self.fatigue_score * 100.0).round()
    }
}

// ── AlertTier ───────────────────────────────────────────────────────────────

/// Classification tier, ordered `Normal < Caution < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertTier {
    /// No action needed.
    Normal,
    /// Fatigue rising above the fixed caution bound.
    Caution,
    /// A configured threshold was reached.
    Critical,
}

impl AlertTier {
    /// All tiers in ascending order.
    pub const ALL: [AlertTier; 3] = [AlertTier::Normal, AlertTier::Caution, AlertTier::Critical];

    /// Upper-case name used for display, export and serialization.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Caution => "CAUTION",
            Self::Critical => "CRITICAL",
        }
    }

    /// Whether this tier should reach an alert sink.
    #[must_use]
    pub fn is_alert(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for AlertTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertTier {
    type Err = WellnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(Self::Normal),
            "CAUTION" => Ok(Self::Caution),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(WellnessError::configuration(format!("unknown alert tier '{other}'"))),
        }
    }
}

// ── AlertEvent ──────────────────────────────────────────────────────────────

/// The classification outcome of the most recent ingest.
///
/// Ephemeral: only the latest event is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Classification tier.
    pub tier: AlertTier,
    /// Fixed, human-readable message for the tier.
    pub message: String,
    /// Capture time of the sample that produced this event.
    pub time: DateTime<Utc>,
}

impl AlertEvent {
    /// Create a new event.
    pub fn new(tier: AlertTier, message: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            tier,
            message: message.into(),
            time,
        }
    }
}
