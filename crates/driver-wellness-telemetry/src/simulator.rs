//! Bounded random-walk sample source.
//!
//! Stands in for the sensing pipeline during development and tests. Each
//! walked field moves by a uniform step in `[-delta, +delta]` and is clamped
//! to its bounds.

use chrono::{DateTime, Duration, Utc};
use driver_wellness_core::{SampleSource, WellnessError, WellnessResult, WellnessSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Start value, step size and bounds for one walked field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkBounds {
    /// Initial value.
    pub start: f64,
    /// Maximum absolute step per tick.
    pub delta: f64,
    /// Lower bound (inclusive).
    pub lower: f64,
    /// Upper bound (inclusive).
    pub upper: f64,
}

impl WalkBounds {
    /// Create bounds.
    #[must_use]
    pub const fn new(start: f64, delta: f64, lower: f64, upper: f64) -> Self {
        Self {
            start,
            delta,
            lower,
            upper,
        }
    }

    /// Whether `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    fn validate(&self, name: &str) -> WellnessResult<()> {
        let finite = [self.start, self.delta, self.lower, self.upper]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(WellnessError::configuration(format!(
                "{name}: walk parameters must be finite"
            )));
        }
        if self.lower > self.upper {
            return Err(WellnessError::configuration(format!(
                "{name}: lower bound {} exceeds upper bound {}",
                self.lower, self.upper
            )));
        }
        if !self.contains(self.start) {
            return Err(WellnessError::configuration(format!(
                "{name}: start {} outside [{}, {}]",
                self.start, self.lower, self.upper
            )));
        }
        let span = self.upper - self.lower;
        if !span.is_finite() {
            return Err(WellnessError::configuration(format!(
                "{name}: bounds [{}, {}] span is not representable",
                self.lower, self.upper
            )));
        }
        if self.delta.abs() > span {
            return Err(WellnessError::configuration(format!(
                "{name}: delta {} exceeds bound span {span}",
                self.delta
            )));
        }
        Ok(())
    }

    /// Largest usable step: `|delta|` capped at the bound span.
    ///
    /// Zero when the step cannot be sampled (non-finite or empty range).
    fn max_step(&self) -> f64 {
        let d = self.delta.abs().min(self.upper - self.lower);
        if d > 0.0 && (d + d).is_finite() {
            d
        } else {
            0.0
        }
    }

    fn step<R: Rng + ?Sized>(&self, rng: &mut R, value: f64) -> f64 {
        let d = self.max_step();
        let moved = if d > 0.0 {
            value + rng.gen_range(-d..=d)
        } else {
            value
        };
        moved.max(self.lower).min(self.upper)
    }
}

/// Random-walk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Eye aspect ratio.
    pub ear: WalkBounds,
    /// Blinks per minute.
    pub blink_rate: WalkBounds,
    /// PERCLOS.
    pub perclos: WalkBounds,
    /// CNN drowsiness confidence.
    pub model_confidence: WalkBounds,
    /// Fused fatigue score.
    pub fatigue: WalkBounds,
    /// Heart rate (BPM).
    pub heart_rate: WalkBounds,
    /// Heart rate variability (ms).
    pub hrv: WalkBounds,
    /// Pipeline frame rate.
    pub fps: WalkBounds,
    /// Mouth aspect ratio.
    pub mar: WalkBounds,
    /// Gaze deviation.
    pub gaze: WalkBounds,
    /// Per-tick head-nod probability.
    pub head_nod_probability: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ear: WalkBounds::new(0.28, 0.01, 0.15, 0.35),
            blink_rate: WalkBounds::new(18.0, 1.0, 10.0, 25.0),
            perclos: WalkBounds::new(0.12, 0.015, 0.0, 0.4),
            model_confidence: WalkBounds::new(0.15, 0.025, 0.0, 1.0),
            fatigue: WalkBounds::new(0.35, 0.02, 0.0, 1.0),
            heart_rate: WalkBounds::new(78.0, 1.5, 60.0, 100.0),
            hrv: WalkBounds::new(40.0, 2.0, 15.0, 80.0),
            fps: WalkBounds::new(30.0, 0.5, 28.0, 30.0),
            mar: WalkBounds::new(0.25, 0.025, 0.1, 0.7),
            gaze: WalkBounds::new(0.15, 0.04, 0.0, 0.6),
            head_nod_probability: 0.05,
        }
    }
}

impl SimulatorConfig {
    /// Check every field's bounds and the head-nod probability.
    pub fn validate(&self) -> WellnessResult<()> {
        self.ear.validate("ear")?;
        self.blink_rate.validate("blink_rate")?;
        self.perclos.validate("perclos")?;
        self.model_confidence.validate("model_confidence")?;
        self.fatigue.validate("fatigue")?;
        self.heart_rate.validate("heart_rate")?;
        self.hrv.validate("hrv")?;
        self.fps.validate("fps")?;
        self.mar.validate("mar")?;
        self.gaze.validate("gaze")?;
        if !(0.0..=1.0).contains(&self.head_nod_probability) {
            return Err(WellnessError::configuration(format!(
                "head_nod_probability {} outside [0, 1]",
                self.head_nod_probability
            )));
        }
        Ok(())
    }
}

/// Where sample timestamps come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleClock {
    /// Wall clock.
    System,
    /// Deterministic clock advancing by `step` per sample.
    Stepped {
        /// Timestamp of the next sample.
        next: DateTime<Utc>,
        /// Advance per sample.
        step: Duration,
    },
}

impl SampleClock {
    /// Stepped clock starting at `start`.
    #[must_use]
    pub fn stepped(start: DateTime<Utc>, step: Duration) -> Self {
        Self::Stepped { next: start, step }
    }

    fn now(&mut self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Stepped { next, step } => {
                let t = *next;
                *next = t + *step;
                t
            }
        }
    }
}

/// Random-walk simulator.
#[derive(Debug)]
pub struct RandomWalkSimulator<R = StdRng> {
    config: SimulatorConfig,
    rng: R,
    clock: SampleClock,
    last: WellnessSample,
}

impl RandomWalkSimulator<StdRng> {
    /// Simulator seeded from OS entropy.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible simulator.
    #[must_use]
    pub fn seeded(config: SimulatorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomWalkSimulator<R> {
    /// Simulator driven by a caller-supplied RNG.
    pub fn with_rng(config: SimulatorConfig, rng: R) -> Self {
        let mut clock = SampleClock::System;
        let last = WellnessSample {
            eye_aspect_ratio: config.ear.start,
            blink_rate_per_minute: config.blink_rate.start,
            eye_closure_fraction: config.perclos.start,
            model_confidence: config.model_confidence.start,
            fatigue_score: config.fatigue.start,
            heart_rate: config.heart_rate.start,
            heart_rate_variability: config.hrv.start,
            frames_per_second: config.fps.start,
            mouth_aspect_ratio: Some(config.mar.start),
            gaze_deviation: Some(config.gaze.start),
            head_nod_detected: false,
            timestamp: clock.now(),
        };
        Self {
            config,
            rng,
            clock,
            last,
        }
    }

    /// Replace the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: SampleClock) -> Self {
        self.clock = clock;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Most recently produced sample (the start values before the first tick).
    pub fn last(&self) -> &WellnessSample {
        &self.last
    }

    /// Advance every walked field by one step.
    pub fn tick(&mut self) -> WellnessSample {
        let c = &self.config;
        let rng = &mut self.rng;
        let prev = &self.last;

        let p = c.head_nod_probability;
        let p = if p.is_finite() { p.max(0.0).min(1.0) } else { 0.0 };

        let next = WellnessSample {
            timestamp: self.clock.now(),
            eye_aspect_ratio: c.ear.step(rng, prev.eye_aspect_ratio),
            blink_rate_per_minute: c.blink_rate.step(rng, prev.blink_rate_per_minute),
            eye_closure_fraction: c.perclos.step(rng, prev.eye_closure_fraction),
            model_confidence: c.model_confidence.step(rng, prev.model_confidence),
            fatigue_score: c.fatigue.step(rng, prev.fatigue_score),
            heart_rate: c.heart_rate.step(rng, prev.heart_rate),
            heart_rate_variability: c.hrv.step(rng, prev.heart_rate_variability),
            frames_per_second: c.fps.step(rng, prev.frames_per_second),
            mouth_aspect_ratio: Some(c.mar.step(rng, prev.mouth_aspect_ratio.unwrap_or(c.mar.start))),
            gaze_deviation: Some(c.gaze.step(rng, prev.gaze_deviation.unwrap_or(c.gaze.start))),
            head_nod_detected: rng.gen_bool(p),
        };
        self.last = next.clone();
        next
    }
}

impl<R: Rng + Send> SampleSource for RandomWalkSimulator<R> {
    fn next_sample(&mut self) -> Option<WellnessSample> {
        Some(self.tick())
    }

    fn name(&self) -> &str {
        "random-walk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SimulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = SimulatorConfig::default();
        config.fatigue = WalkBounds::new(0.5, 0.1, 0.8, 0.2);
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.heart_rate.start = 150.0;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.head_nod_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.gaze.delta = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.fatigue.delta = 1e308;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.heart_rate = WalkBounds::new(0.0, 1.0, -1e308, 1e308);
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_delta_is_capped_at_span() {
        let mut config = SimulatorConfig::default();
        config.fatigue.delta = 1e308;
        config.heart_rate = WalkBounds::new(0.0, 1e308, -1e308, 1e308);
        let mut sim = RandomWalkSimulator::seeded(config.clone(), 13);
        for _ in 0..100 {
            let s = sim.tick();
            assert!(config.fatigue.contains(s.fatigue_score));
            assert!(config.heart_rate.contains(s.heart_rate));
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let clock = SampleClock::stepped(t0(), Duration::seconds(1));
        let mut a = RandomWalkSimulator::seeded(SimulatorConfig::default(), 7).with_clock(clock.clone());
        let mut b = RandomWalkSimulator::seeded(SimulatorConfig::default(), 7).with_clock(clock);
        for _ in 0..50 {
            assert_eq!(a.tick(), b.tick());
        }
    }

    #[test]
    fn stepped_clock_advances() {
        let mut sim = RandomWalkSimulator::seeded(SimulatorConfig::default(), 1)
            .with_clock(SampleClock::stepped(t0(), Duration::milliseconds(500)));
        assert_eq!(sim.tick().timestamp, t0());
        assert_eq!(sim.tick().timestamp, t0() + Duration::milliseconds(500));
    }

    #[test]
    fn walk_stays_within_bounds() {
        let config = SimulatorConfig::default();
        let mut sim = RandomWalkSimulator::seeded(config.clone(), 42);
        for _ in 0..2_000 {
            let s = sim.tick();
            assert!(config.ear.contains(s.eye_aspect_ratio));
            assert!(config.blink_rate.contains(s.blink_rate_per_minute));
            assert!(config.perclos.contains(s.eye_closure_fraction));
            assert!(config.fatigue.contains(s.fatigue_score));
            assert!(config.heart_rate.contains(s.heart_rate));
            assert!(config.hrv.contains(s.heart_rate_variability));
            assert!(config.fps.contains(s.frames_per_second));
        }
    }

    #[test]
    fn step_never_exceeds_delta() {
        let config = SimulatorConfig::default();
        let mut sim = RandomWalkSimulator::seeded(config.clone(), 3);
        let mut prev = sim.last().clone();
        for _ in 0..500 {
            let next = sim.tick();
            assert!((next.heart_rate - prev.heart_rate).abs() <= config.heart_rate.delta + 1e-12);
            prev = next;
        }
    }

    #[test]
    fn zero_delta_holds_value() {
        let mut config = SimulatorConfig::default();
        config.fatigue.delta = 0.0;
        let mut sim = RandomWalkSimulator::seeded(config, 9);
        for _ in 0..20 {
            assert!((sim.tick().fatigue_score - 0.35).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn source_trait_always_yields() {
        let mut sim = RandomWalkSimulator::seeded(SimulatorConfig::default(), 5);
        assert_eq!(sim.name(), "random-walk");
        assert!(sim.next_sample().is_some());
    }
}
