//! Windowed analytics over a telemetry snapshot.
//!
//! Every series is derived on demand from the log; nothing is cached. A
//! window of zero yields an empty series.

use std::fmt;
use std::str::FromStr;

use driver_wellness_core::{AlertTier, WellnessError, WellnessSample};
use serde::{Deserialize, Serialize};

use crate::classifier::classify_tier;
use crate::store::TelemetrySnapshot;

/// Smoothing factor used when a caller passes a non-finite alpha.
pub const DEFAULT_EMA_ALPHA: f64 = 0.3;

/// Variance scale for the stability score.
const STABILITY_GAIN: f64 = 200.0;

/// A numeric field of [`WellnessSample`] that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleField {
    /// Eye aspect ratio.
    EyeAspectRatio,
    /// Blinks per minute.
    BlinkRate,
    /// PERCLOS.
    EyeClosureFraction,
    /// CNN drowsiness confidence.
    ModelConfidence,
    /// Fused fatigue score.
    FatigueScore,
    /// Heart rate (BPM).
    HeartRate,
    /// Heart rate variability (ms).
    HeartRateVariability,
    /// Pipeline frame rate.
    FramesPerSecond,
    /// Mouth aspect ratio, optional.
    MouthAspectRatio,
    /// Gaze deviation, optional.
    GazeDeviation,
}

impl SampleField {
    /// Every field, in declaration order.
    pub const ALL: [SampleField; 10] = [
        Self::EyeAspectRatio,
        Self::BlinkRate,
        Self::EyeClosureFraction,
        Self::ModelConfidence,
        Self::FatigueScore,
        Self::HeartRate,
        Self::HeartRateVariability,
        Self::FramesPerSecond,
        Self::MouthAspectRatio,
        Self::GazeDeviation,
    ];

    /// Read this field from a sample. Optional fields yield `None` if absent.
    #[must_use]
    pub fn value(self, sample: &WellnessSample) -> Option<f64> {
        match self {
            Self::EyeAspectRatio => Some(sample.eye_aspect_ratio),
            Self::BlinkRate => Some(sample.blink_rate_per_minute),
            Self::EyeClosureFraction => Some(sample.eye_closure_fraction),
            Self::ModelConfidence => Some(sample.model_confidence),
            Self::FatigueScore => Some(sample.fatigue_score),
            Self::HeartRate => Some(sample.heart_rate),
            Self::HeartRateVariability => Some(sample.heart_rate_variability),
            Self::FramesPerSecond => Some(sample.frames_per_second),
            Self::MouthAspectRatio => sample.mouth_aspect_ratio,
            Self::GazeDeviation => sample.gaze_deviation,
        }
    }

    /// camelCase key matching the sample's serialized field name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EyeAspectRatio => "eyeAspectRatio",
            Self::BlinkRate => "blinkRatePerMinute",
            Self::EyeClosureFraction => "eyeClosureFraction",
            Self::ModelConfidence => "modelConfidence",
            Self::FatigueScore => "fatigueScore",
            Self::HeartRate => "heartRate",
            Self::HeartRateVariability => "heartRateVariability",
            Self::FramesPerSecond => "framesPerSecond",
            Self::MouthAspectRatio => "mouthAspectRatio",
            Self::GazeDeviation => "gazeDeviation",
        }
    }
}

impl fmt::Display for SampleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleField {
    type Err = WellnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| WellnessError::configuration(format!("unknown sample field '{s}'")))
    }
}

/// One point of the fatigue trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Age relative to the newest sample in the window, e.g. `T-4s`.
    pub label: String,
    /// Fatigue as a whole percentage.
    pub fatigue: f64,
}

/// One point of a paired-metric chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualMetricPoint {
    /// Age relative to the newest sample in the window.
    pub label: String,
    /// First field, rounded to two decimals.
    pub a: Option<f64>,
    /// Second field, rounded to two decimals.
    pub b: Option<f64>,
}

/// Sample counts per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TierDistribution {
    /// NORMAL samples.
    pub normal: usize,
    /// CAUTION samples.
    pub caution: usize,
    /// CRITICAL samples.
    pub critical: usize,
}

impl TierDistribution {
    /// Count for one tier.
    #[must_use]
    pub fn get(&self, tier: AlertTier) -> usize {
        match tier {
            AlertTier::Normal => self.normal,
            AlertTier::Caution => self.caution,
            AlertTier::Critical => self.critical,
        }
    }

    /// Total number of classified samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.normal + self.caution + self.critical
    }

    fn record(&mut self, tier: AlertTier) {
        match tier {
            AlertTier::Normal => self.normal += 1,
            AlertTier::Caution => self.caution += 1,
            AlertTier::Critical => self.critical += 1,
        }
    }
}

/// Smoothed trend of one field over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendStats {
    /// Exponential moving average, seeded with the first value.
    pub ema: f64,
    /// Least-squares slope per sample; zero with fewer than two samples.
    pub slope: f64,
    /// `1 / (1 + k * variance)` in `[0, 1]`; 1.0 means flat.
    pub stability: f64,
    /// Number of values used.
    pub samples: usize,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Age relative to the newest sample; samples stamped after it read `T-0s`.
fn age_label(newest: &WellnessSample, sample: &WellnessSample) -> String {
    let secs = (newest.timestamp - sample.timestamp).num_seconds().max(0);
    format!("T-{secs}s")
}

impl TelemetrySnapshot {
    /// Fatigue over the last `window` samples, oldest first.
    #[must_use]
    pub fn fatigue_trend(&self, window: usize) -> Vec<TrendPoint> {
        let Some(newest) = self.log.recent(window).last() else {
            return Vec::new();
        };
        self.log
            .recent(window)
            .map(|sample| TrendPoint {
                label: age_label(newest, sample),
                fatigue: sample.fatigue_percent(),
            })
            .collect()
    }

    /// Two fields paired over the last `window` samples, oldest first.
    #[must_use]
    pub fn dual_metric_series(
        &self,
        a: SampleField,
        b: SampleField,
        window: usize,
    ) -> Vec<DualMetricPoint> {
        let Some(newest) = self.log.recent(window).last() else {
            return Vec::new();
        };
        self.log
            .recent(window)
            .map(|sample| DualMetricPoint {
                label: age_label(newest, sample),
                a: a.value(sample).map(round2),
                b: b.value(sample).map(round2),
            })
            .collect()
    }

    /// Reclassify the whole log against the current settings and count tiers.
    #[must_use]
    pub fn tier_distribution(&self) -> TierDistribution {
        self.log
            .iter()
            .fold(TierDistribution::default(), |mut dist, sample| {
                dist.record(classify_tier(sample, &self.settings));
                dist
            })
    }

    /// EMA, slope and stability of `field` over the last `window` samples.
    ///
    /// Samples where the field is absent or non-finite are skipped. Returns
    /// `None` when no usable value remains. `alpha` is clamped to `(0, 1]`.
    #[must_use]
    pub fn trend_stats(&self, field: SampleField, window: usize, alpha: f64) -> Option<TrendStats> {
        let values: Vec<f64> = self
            .log
            .recent(window)
            .filter_map(|s| field.value(s))
            .filter(|v| v.is_finite())
            .collect();
        let (&first, rest) = values.split_first()?;

        let alpha = if alpha.is_finite() {
            alpha.max(f64::EPSILON).min(1.0)
        } else {
            DEFAULT_EMA_ALPHA
        };
        let ema = rest
            .iter()
            .fold(first, |acc, &v| alpha * v + (1.0 - alpha) * acc);

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let slope = if values.len() < 2 {
            0.0
        } else {
            let x_mean = (n - 1.0) / 2.0;
            let (num, den) = values
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(num, den), (i, &v)| {
                    let dx = i as f64 - x_mean;
                    (num + dx * (v - mean), den + dx * dx)
                });
            num / den
        };

        let stability = (1.0 / (1.0 + STABILITY_GAIN * variance)).max(0.0).min(1.0);

        Some(TrendStats {
            ema,
            slope,
            stability,
            samples: values.len(),
        })
    }
}
