//! CSV export of the session log.
//!
//! One line per sample, oldest first. Tiers are derived from the settings in
//! force at export time.

use chrono::{DateTime, SecondsFormat, Utc};
use driver_wellness_core::{AlertTier, WellnessSample};
use serde::Serialize;

use crate::classifier::classify_tier;
use crate::store::TelemetrySnapshot;

/// CSV header line (without trailing newline).
pub const CSV_HEADER: &str = "Timestamp,Tier,Message";

/// Which samples to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFilter {
    /// Every sample.
    #[default]
    All,
    /// Only samples classified at this tier.
    Tier(AlertTier),
}

impl ExportFilter {
    fn accepts(self, tier: AlertTier) -> bool {
        match self {
            Self::All => true,
            Self::Tier(wanted) => wanted == tier,
        }
    }
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Tier under the current settings.
    pub tier: AlertTier,
    /// One-line description; sanitized only when written as CSV.
    pub message: String,
}

impl ExportRecord {
    /// Render as a CSV line including the trailing newline.
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.tier,
            sanitize(&self.message)
        )
    }
}

/// One-line description, e.g. `Fatigue: 35%, EAR: 0.280, Blinks: 18/min`.
#[must_use]
pub fn describe(sample: &WellnessSample) -> String {
    format!(
        "Fatigue: {:.0}%, EAR: {:.3}, Blinks: {:.0}/min",
        sample.fatigue_percent(),
        sample.eye_aspect_ratio,
        sample.blink_rate_per_minute
    )
}

/// Make a message safe for one CSV cell.
#[must_use]
pub fn sanitize(message: &str) -> String {
    message
        .chars()
        .map(|c| match c {
            ',' => ';',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect()
}

impl TelemetrySnapshot {
    /// Rows for every sample accepted by `filter`, oldest first.
    #[must_use]
    pub fn export_records(&self, filter: ExportFilter) -> Vec<ExportRecord> {
        self.log
            .iter()
            .filter_map(|sample| {
                let tier = classify_tier(sample, &self.settings);
                filter.accepts(tier).then(|| ExportRecord {
                    timestamp: sample.timestamp,
                    tier,
                    message: describe(sample),
                })
            })
            .collect()
    }

    /// Header plus one line per accepted sample. Every line ends in `\n`.
    #[must_use]
    pub fn export_csv(&self, filter: ExportFilter) -> String {
        let mut out = String::with_capacity(64 * (self.log.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for record in self.export_records(filter) {
            out.push_str(&record.to_csv_line());
        }
        out
    }
}
