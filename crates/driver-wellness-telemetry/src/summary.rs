//! Session summary statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::TelemetrySnapshot;

/// Summary statistics over the retained session log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Number of samples in the log.
    pub count: usize,
    /// Timestamp of the oldest sample.
    pub started_at: DateTime<Utc>,
    /// Timestamp of the newest sample.
    pub ended_at: DateTime<Utc>,
    /// Span between oldest and newest sample, in seconds.
    pub duration_secs: f64,
    /// Mean fatigue score over finite samples; NaN if there are none.
    pub avg_fatigue: f64,
    /// Min finite fatigue score; NaN if there are none.
    pub min_fatigue: f64,
    /// Max finite fatigue score; NaN if there are none.
    pub max_fatigue: f64,
    /// Mean finite blink rate per minute; NaN if there are none.
    pub avg_blink_rate: f64,
    /// Mean finite heart rate (BPM); NaN if there are none.
    pub mean_heart_rate: f64,
    /// Seconds spent at or above the fatigue threshold.
    pub time_above_threshold_secs: f64,
}

impl TelemetrySnapshot {
    /// Summarize the session log. Returns `None` if the log is empty.
    ///
    /// Time above threshold sums the gap to the next sample for every sample
    /// at or above the current fatigue threshold; the newest sample adds
    /// nothing.
    #[must_use]
    pub fn session_summary(&self) -> Option<SessionSummary> {
        let first = self.log.oldest()?;
        let last = self.log.latest()?;

        let (mut fatigue, mut blink, mut hr) =
            (FiniteStats::default(), FiniteStats::default(), FiniteStats::default());
        for s in &self.log {
            fatigue.push(s.fatigue_score);
            blink.push(s.blink_rate_per_minute);
            hr.push(s.heart_rate);
        }

        let threshold = self.settings.fatigue_threshold;
        let time_above_threshold_secs = self
            .log
            .iter()
            .zip(self.log.iter().skip(1))
            .filter(|(earlier, _)| earlier.fatigue_score >= threshold)
            .map(|(earlier, later)| seconds_between(earlier.timestamp, later.timestamp))
            .sum();

        Some(SessionSummary {
            count: self.log.len(),
            started_at: first.timestamp,
            ended_at: last.timestamp,
            duration_secs: seconds_between(first.timestamp, last.timestamp),
            avg_fatigue: fatigue.mean(),
            min_fatigue: fatigue.min(),
            max_fatigue: fatigue.max(),
            avg_blink_rate: blink.mean(),
            mean_heart_rate: hr.mean(),
            time_above_threshold_secs,
        })
    }
}

/// Running mean/min/max over finite values only.
///
/// Every statistic is NaN until a finite value has been seen.
#[derive(Debug, Clone, Copy)]
struct FiniteStats {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for FiniteStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl FiniteStats {
    fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        self.sum += value;
        // f64::min/max return the non-NaN operand, so the NaN seeds fall away.
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    fn min(&self) -> f64 {
        self.min
    }

    fn max(&self) -> f64 {
        self.max
    }
}

/// Non-negative gap in seconds; out-of-order pairs count as zero.
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds().max(0);
    millis as f64 / 1000.0
}
