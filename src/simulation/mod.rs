//! Process simulator
//!
//! Discrete-time demo generator: an industry profile turns its parameters into
//! a baseline input/output pair, a disturbance perturbs the input, and the
//! output follows with a first-order lag plus Gaussian noise.

pub mod observations;

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kpi::Industry;

pub use observations::{observations, performance_band};

/// Simulation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Unknown parameter '{parameter}' for {profile} profile")]
    UnknownParameter { profile: String, parameter: String },

    #[error("Parameter '{0}' must be a finite number")]
    InvalidParameter(String),

    #[error("Duration must be between 1 and 10 minutes")]
    InvalidDuration,

    #[error("Disturbance magnitude must be between 0 and 50 percent")]
    InvalidMagnitude,
}

/// Longest simulated run
pub const MAX_DURATION_MINUTES: u32 = 10;

/// Largest disturbance, in percent of the baseline input
pub const MAX_MAGNITUDE_PERCENT: f64 = 50.0;

/// Simulation model of one industry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    OilAndGas,
    FoodAndBeverage,
    Pharmaceutical,
    Generic,
}

impl Profile {
    pub fn for_industry(industry: &Industry) -> Self {
        match industry {
            Industry::OilAndGas => Profile::OilAndGas,
            Industry::FoodAndBeverage => Profile::FoodAndBeverage,
            Industry::Pharmaceutical => Profile::Pharmaceutical,
            Industry::Other(_) => Profile::Generic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Profile::OilAndGas => "Oil and Gas",
            Profile::FoodAndBeverage => "Food and Beverage",
            Profile::Pharmaceutical => "Pharmaceutical",
            Profile::Generic => "Generic",
        }
    }

    /// Parameter names and their defaults
    pub fn default_parameters(&self) -> &'static [(&'static str, f64)] {
        match self {
            Profile::OilAndGas => &[
                ("inlet_flow", 100.0),
                ("inlet_pressure", 25.0),
                ("inlet_temperature", 80.0),
                ("separator_pressure", 15.0),
                ("recycle_ratio", 10.0),
            ],
            Profile::FoodAndBeverage => &[
                ("feed_rate", 500.0),
                ("process_temperature", 85.0),
                ("mixing_speed", 200.0),
                ("cook_time", 45.0),
                ("cooling_rate", 2.0),
            ],
            Profile::Pharmaceutical => &[
                ("reactor_temperature", 65.0),
                ("catalyst_concentration", 1.5),
                ("reaction_time", 8.0),
                ("agitation_speed", 250.0),
                ("ph_value", 7.0),
            ],
            Profile::Generic => &[
                ("input_rate", 50.0),
                ("temperature", 80.0),
                ("pressure", 25.0),
                ("residence_time", 30.0),
                ("mixing_factor", 50.0),
            ],
        }
    }

    /// First-order response factor applied per step
    pub fn time_constant(&self) -> f64 {
        match self {
            Profile::OilAndGas => 0.10,
            Profile::FoodAndBeverage => 0.05,
            Profile::Pharmaceutical => 0.03,
            Profile::Generic => 0.08,
        }
    }

    /// Output noise standard deviation as a fraction of the base output
    pub fn noise(&self) -> f64 {
        match self {
            Profile::OilAndGas => 0.01,
            Profile::FoodAndBeverage => 0.02,
            Profile::Pharmaceutical => 0.005,
            Profile::Generic => 0.015,
        }
    }

    /// Baseline (input, output) for the given parameters
    pub fn baseline(&self, params: &BTreeMap<String, f64>) -> (f64, f64) {
        let p = |name: &str| params.get(name).copied().unwrap_or_default();

        match self {
            Profile::OilAndGas => {
                let input = p("inlet_flow");
                let mut output = input * (0.8 + 0.1 * p("separator_pressure") / 30.0);
                output *= 0.8 + 0.4 * (p("inlet_temperature") / 100.0);
                output *= 1.0 - p("recycle_ratio") / 200.0;
                (input, output)
            }
            Profile::FoodAndBeverage => {
                let input = p("feed_rate");
                let temp = (p("process_temperature") / 100.0).min(1.0);
                let mix = (p("mixing_speed") / 300.0).min(1.0);
                let time = (p("cook_time") / 60.0).min(1.0);
                (input, input * 0.7 * temp * mix * time)
            }
            Profile::Pharmaceutical => {
                // fixed batch size
                let input = 100.0;
                let temp = p("reactor_temperature") / 100.0;
                let catalyst = p("catalyst_concentration") / 2.5;
                let time = (p("reaction_time") / 12.0).min(1.0);
                (input, input * 0.6 * temp * catalyst * time)
            }
            Profile::Generic => {
                let input = p("input_rate");
                let temp = p("temperature") / 100.0;
                let pressure = p("pressure") / 30.0;
                (input, input * 0.7 * temp * pressure)
            }
        }
    }
}

/// Playback speed; scales the number of samples per second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    pub fn multiplier(&self) -> f64 {
        match self {
            Speed::Slow => 0.5,
            Speed::Normal => 1.0,
            Speed::Fast => 2.0,
        }
    }
}

impl From<&str> for Speed {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "slow" => Speed::Slow,
            "fast" => Speed::Fast,
            _ => Speed::Normal,
        }
    }
}

/// Input disturbance model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disturbance {
    #[default]
    None,
    /// Input rises by `magnitude`% from `at_percent` of the run onwards
    Step { magnitude: f64, at_percent: f64 },
    /// Input varies uniformly within ±`magnitude`%
    Random { magnitude: f64 },
    /// Five full sine periods over the run with amplitude `magnitude`%
    Sinusoidal { magnitude: f64 },
}

impl Disturbance {
    pub fn label(&self) -> &'static str {
        match self {
            Disturbance::None => "none",
            Disturbance::Step { .. } => "step change",
            Disturbance::Random { .. } => "random fluctuation",
            Disturbance::Sinusoidal { .. } => "sinusoidal",
        }
    }

    pub fn magnitude(&self) -> f64 {
        match *self {
            Disturbance::None => 0.0,
            Disturbance::Step { magnitude, .. }
            | Disturbance::Random { magnitude }
            | Disturbance::Sinusoidal { magnitude } => magnitude,
        }
    }

    /// Multiplier applied to the base input at step `i` of `n`
    fn factor<R: Rng>(&self, i: usize, n: usize, rng: &mut R) -> f64 {
        match *self {
            Disturbance::None => 1.0,
            Disturbance::Step {
                magnitude,
                at_percent,
            } => {
                let at = (n as f64 * at_percent / 100.0) as usize;
                if i >= at {
                    1.0 + magnitude / 100.0
                } else {
                    1.0
                }
            }
            Disturbance::Random { magnitude } => {
                1.0 + (rng.gen::<f64>() - 0.5) * 2.0 * (magnitude / 100.0)
            }
            Disturbance::Sinusoidal { magnitude } => {
                let phase = i as f64 / n as f64 * 10.0 * std::f64::consts::PI;
                1.0 + phase.sin() * (magnitude / 100.0)
            }
        }
    }
}

/// One simulation run request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub profile: Profile,
    /// Profile parameters; missing ones take the profile default
    pub parameters: BTreeMap<String, f64>,
    pub duration_minutes: u32,
    pub speed: Speed,
    pub disturbance: Disturbance,
    pub seed: u64,
}

impl SimulationConfig {
    /// Default parameters of `profile`
    pub fn new(profile: Profile, duration_minutes: u32, seed: u64) -> Self {
        let parameters = profile
            .default_parameters()
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();

        Self {
            profile,
            parameters,
            duration_minutes,
            speed: Speed::default(),
            disturbance: Disturbance::default(),
            seed,
        }
    }

    /// Override one parameter
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SimulationError> {
        if !self.profile.default_parameters().iter().any(|(n, _)| *n == name) {
            return Err(SimulationError::UnknownParameter {
                profile: self.profile.label().to_string(),
                parameter: name.to_string(),
            });
        }
        if !value.is_finite() {
            return Err(SimulationError::InvalidParameter(name.to_string()));
        }
        self.parameters.insert(name.to_string(), value);
        Ok(())
    }

    /// Number of samples: duration in seconds times the speed multiplier
    pub fn sample_count(&self) -> usize {
        (self.duration_minutes as f64 * 60.0 * self.speed.multiplier()) as usize
    }

    fn validate(&self) -> Result<(), SimulationError> {
        if !(1..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(SimulationError::InvalidDuration);
        }
        let magnitude = self.disturbance.magnitude();
        if !(0.0..=MAX_MAGNITUDE_PERCENT).contains(&magnitude) {
            return Err(SimulationError::InvalidMagnitude);
        }
        Ok(())
    }
}

/// One simulated time step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since start
    pub time: f64,
    pub input: f64,
    pub output: f64,
    /// output / input × 100, 0 when input <= 0
    pub efficiency: f64,
}

/// Result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub config: SimulationConfig,
    pub samples: Vec<Sample>,
    pub mean_efficiency: f64,
    pub stability: f64,
    pub performance: String,
    pub observations: Vec<String>,
}

fn efficiency(input: f64, output: f64) -> f64 {
    if input <= 0.0 {
        0.0
    } else {
        output / input * 100.0
    }
}

/// Mean efficiency and stability score of a run
///
/// Stability is 100 − σ/μ×100 with the population standard deviation; it is
/// 0 when the mean is not positive.
pub fn summarize(samples: &[Sample]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.efficiency).sum::<f64>() / n;
    if mean <= 0.0 {
        return (mean, 0.0);
    }
    let variance = samples
        .iter()
        .map(|s| (s.efficiency - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, 100.0 - variance.sqrt() / mean * 100.0)
}

/// Run a simulation; identical configs (seed included) give identical outcomes
pub fn run(config: &SimulationConfig) -> Result<SimulationOutcome, SimulationError> {
    config.validate()?;

    let profile = config.profile;
    let n = config.sample_count().max(1);
    let duration_seconds = config.duration_minutes as f64 * 60.0;
    let (base_in, base_out) = profile.baseline(&config.parameters);
    let tau = profile.time_constant();

    let mut rng = StdRng::seed_from_u64(config.seed);
    // std dev is non-negative and finite for finite parameters
    let noise = Normal::new(0.0, (base_out * profile.noise()).abs())
        .map_err(|_| SimulationError::InvalidParameter("noise".to_string()))?;

    let time_at = |i: usize| {
        if n > 1 {
            duration_seconds * i as f64 / (n - 1) as f64
        } else {
            0.0
        }
    };

    let mut samples = Vec::with_capacity(n);
    samples.push(Sample {
        time: 0.0,
        input: base_in,
        output: base_out,
        efficiency: efficiency(base_in, base_out),
    });

    for i in 1..n {
        let input = base_in * config.disturbance.factor(i, n, &mut rng);
        let previous = samples[i - 1].output;
        let target = if base_in != 0.0 {
            base_out * input / base_in
        } else {
            0.0
        };
        let output = previous + (target - previous) * tau + noise.sample(&mut rng);

        samples.push(Sample {
            time: time_at(i),
            input,
            output,
            efficiency: efficiency(input, output),
        });
    }

    let (mean_efficiency, stability) = summarize(&samples);
    tracing::info!(
        "Simulated {} profile: {} samples, efficiency {:.2}%, stability {:.2}%",
        profile.label(),
        samples.len(),
        mean_efficiency,
        stability
    );

    Ok(SimulationOutcome {
        config: config.clone(),
        samples,
        mean_efficiency,
        stability,
        performance: performance_band(mean_efficiency).to_string(),
        observations: observations(profile, &config.disturbance, mean_efficiency, stability),
    })
}

impl SimulationOutcome {
    /// JSON payload persisted with the simulation record
    pub fn record_data(&self) -> serde_json::Value {
        serde_json::json!({
            "duration": self.config.duration_minutes,
            "speed": self.config.speed,
            "seed": self.config.seed,
            "parameters": self.config.parameters,
            "disturbance": self.config.disturbance,
            "efficiency": self.mean_efficiency,
            "stability": self.stability,
            "samples": self.samples.len(),
        })
    }
}
