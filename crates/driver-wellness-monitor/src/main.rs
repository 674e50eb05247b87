//! Driver wellness monitor.
//!
//! Runs the random-walk source against a telemetry store, logs tier
//! transitions and prints a session summary on exit.
//!
//! Usage:
//!   cargo run -p driver-wellness-monitor -- --duration-secs 30
//!   cargo run -p driver-wellness-monitor -- --config monitor.json --export-csv --tier-filter critical

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use driver_wellness_core::{AlertTier, ScoreScale};
use driver_wellness_monitor::{spawn_monitor, AlertSink, MonitorConfig, TracingAlertSink};
use driver_wellness_telemetry::{
    ExportFilter, RandomWalkSimulator, SampleField, SessionSummary, TelemetryStore,
};
use tracing::info;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "driver-wellness-monitor", about = "Driver wellness telemetry monitor", version)]
struct Args {
    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Session log capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Fatigue threshold, on the configured score scale
    #[arg(long)]
    fatigue_threshold: Option<f64>,

    /// PERCLOS threshold, on the configured score scale
    #[arg(long)]
    perclos_threshold: Option<f64>,

    /// Score scale for thresholds: unit or percent
    #[arg(long, value_name = "SCALE")]
    score_scale: Option<String>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Print the session log as CSV on exit
    #[arg(long)]
    export_csv: bool,

    /// Only export rows at this tier: normal, caution or critical
    #[arg(long, value_name = "TIER")]
    tier_filter: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<(MonitorConfig, Option<Duration>, ExportOptions)> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => MonitorConfig::default(),
        };

        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(capacity) = self.capacity {
            config.log_capacity = capacity;
        }
        if let Some(scale) = &self.score_scale {
            config.score_scale = scale.parse::<ScoreScale>()?;
        }
        if let Some(v) = self.fatigue_threshold {
            config.settings.fatigue_threshold = Some(v);
        }
        if let Some(v) = self.perclos_threshold {
            config.settings.perclos_threshold = Some(v);
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate().context("invalid monitor configuration")?;

        let filter = match &self.tier_filter {
            Some(tier) => ExportFilter::Tier(tier.parse::<AlertTier>()?),
            None => ExportFilter::All,
        };
        let export = ExportOptions {
            csv: self.export_csv,
            filter,
        };

        Ok((config, self.duration_secs.map(Duration::from_secs), export))
    }
}

struct ExportOptions {
    csv: bool,
    filter: ExportFilter,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (config, duration, export) = Args::parse().into_config()?;

    let store = Arc::new(TelemetryStore::with_settings(
        config.log_capacity,
        config.initial_settings(),
    ));
    let source = match config.seed {
        Some(seed) => RandomWalkSimulator::seeded(config.simulator.clone(), seed),
        None => RandomWalkSimulator::new(config.simulator.clone()),
    };
    let sinks: Vec<Box<dyn AlertSink>> = vec![Box::new(TracingAlertSink)];

    info!(
        tick_ms = config.tick_ms,
        capacity = config.log_capacity,
        settings = ?store.settings(),
        "driver wellness monitor starting"
    );
    let monitor = spawn_monitor(Arc::clone(&store), source, config.period(), sinks)?;

    match duration {
        Some(d) => tokio::select! {
            _ = tokio::time::sleep(d) => info!("run duration elapsed"),
            r = tokio::signal::ctrl_c() => {
                r.context("listening for Ctrl-C")?;
                info!("shutdown signal received");
            }
        },
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("listening for Ctrl-C")?;
            info!("shutdown signal received");
        }
    }

    monitor.shutdown().await?;
    info!(ticks = monitor.ticks(), ingests = monitor.ingests(), "monitor finished");

    match store.session_summary() {
        Some(summary) => print_summary(&summary, &store),
        None => println!("No samples recorded."),
    }

    if export.csv {
        print!("{}", store.export_csv(export.filter));
    }

    Ok(())
}

fn print_summary(summary: &SessionSummary, store: &TelemetryStore) {
    let dist = store.tier_distribution();
    println!("Session summary");
    println!("  samples:          {}", summary.count);
    println!(
        "  span:             {} .. {} ({:.1} s)",
        summary.started_at, summary.ended_at, summary.duration_secs
    );
    println!(
        "  fatigue:          avg {:.0}%, min {:.0}%, max {:.0}%",
        summary.avg_fatigue * 100.0,
        summary.min_fatigue * 100.0,
        summary.max_fatigue * 100.0
    );
    println!("  blink rate:       {:.1}/min", summary.avg_blink_rate);
    println!("  heart rate:       {:.1} BPM", summary.mean_heart_rate);
    println!("  above threshold:  {:.1} s", summary.time_above_threshold_secs);
    println!(
        "  tiers:            NORMAL {}, CAUTION {}, CRITICAL {}",
        dist.normal, dist.caution, dist.critical
    );
    if let Some(stats) = store.trend_stats(SampleField::FatigueScore, 30, 0.3) {
        println!(
            "  fatigue trend:    ema {:.2}, slope {:+.4}/sample, stability {:.2}",
            stats.ema, stats.slope, stats.stability
        );
    }
}
