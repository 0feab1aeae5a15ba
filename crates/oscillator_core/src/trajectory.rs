//! Sampling of position, velocity and forcing curves over a time window.

use crate::cache::TimeKey;
use crate::error::{EngineError, EngineResult};
use crate::oscillator::OscillatorModel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest step the sampler accepts. Sample times are rounded to hundredths, so anything
/// finer would round back onto the previous sample.
pub const MIN_STEP: f64 = 0.01;

/// Upper bound on the number of samples in one trajectory.
pub const MAX_SAMPLES: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub t_min: f64,
    pub t_max: f64,
    pub step: f64,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            t_min: 0.0,
            t_max: 60.0,
            step: 0.1,
        }
    }
}

impl TimeWindow {
    pub fn new(t_min: f64, t_max: f64, step: f64) -> EngineResult<Self> {
        let window = Self { t_min, t_max, step };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.t_min.is_finite() && self.t_max.is_finite() && self.step.is_finite()) {
            return Err(EngineError::InvalidWindow {
                what: "bounds and step must be finite",
            });
        }
        if self.t_min >= self.t_max {
            return Err(EngineError::InvalidWindow {
                what: "t_min must be less than t_max",
            });
        }
        if self.step < MIN_STEP {
            return Err(EngineError::InvalidWindow {
                what: "step must be at least 0.01",
            });
        }
        Ok(())
    }

    /// Rough sample count when walking outward from `t0` past both ends of the window.
    fn sample_estimate(&self, t0: f64) -> f64 {
        let lo = self.t_min.min(t0) - self.step;
        let hi = self.t_max.max(t0) + self.step;
        (hi - lo) / self.step + 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub t: f64,
    pub position: f64,
    pub velocity: f64,
    pub forcing: f64,
}

/// Samples ordered by increasing time, one per distinct time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interleaved `[t, x, v, b, t, x, v, b, ...]`.
    pub fn to_flat(&self) -> Vec<f64> {
        self.samples
            .iter()
            .flat_map(|s| [s.t, s.position, s.velocity, s.forcing])
            .collect()
    }
}

/// `floor(x)` plus the fractional part rounded half-up to two decimals.
pub fn round_hundredths(x: f64) -> f64 {
    let whole = x.floor();
    whole + ((x - whole) * 100.0 + 0.5).floor() / 100.0
}

/// Samples `model` outward from its initial time: forward until past `t_max + step`, then
/// backward until past `t_min - step`.
///
/// Walking outward from `t0` keeps every integration pass anchored on the sample just before
/// it, so a forced model is integrated one step at a time instead of from scratch.
pub fn sample(model: &mut OscillatorModel, window: &TimeWindow) -> EngineResult<Trajectory> {
    window.validate()?;
    let t0 = round_hundredths(model.params().t0);
    if !t0.is_finite() || window.sample_estimate(t0) > MAX_SAMPLES as f64 {
        return Err(EngineError::InvalidWindow {
            what: "too many samples",
        });
    }

    let mut samples = Vec::new();

    let mut t = t0;
    while t <= window.t_max + window.step {
        samples.push(sample_at(model, t)?);
        t = round_hundredths(t + window.step);
    }

    let mut t = round_hundredths(t0 - window.step);
    while t >= window.t_min - window.step {
        samples.push(sample_at(model, t)?);
        t = round_hundredths(t - window.step);
    }

    samples.sort_by(|a, b| a.t.total_cmp(&b.t));
    samples.dedup_by_key(|s| TimeKey::new(s.t).ok());
    debug!(samples = samples.len(), "sampled trajectory");

    Ok(Trajectory { samples })
}

fn sample_at(model: &mut OscillatorModel, t: f64) -> EngineResult<TrajectorySample> {
    Ok(TrajectorySample {
        t,
        position: model.position(t)?,
        velocity: model.velocity(t)?,
        forcing: model.forcing_value(t)?,
    })
}
