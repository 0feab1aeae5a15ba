//! Named example configurations, one per damping regime plus two forced showcases.

use crate::oscillator::OscillatorParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    Undamped,
    UnderDamped,
    CriticallyDamped,
    OverDamped,
    SinusoidalForcing,
    DelayedStep,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Undamped,
        Preset::UnderDamped,
        Preset::CriticallyDamped,
        Preset::OverDamped,
        Preset::SinusoidalForcing,
        Preset::DelayedStep,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Undamped => "Undamped",
            Preset::UnderDamped => "Under Damped",
            Preset::CriticallyDamped => "Critically Damped",
            Preset::OverDamped => "Over Damped",
            Preset::SinusoidalForcing => "Sinusoidal Forcing",
            Preset::DelayedStep => "Delayed Step",
        }
    }

    pub fn params(self) -> OscillatorParams {
        let (mass, damping, stiffness, forcing, x0) = match self {
            Preset::Undamped => (2.0, 0.0, 8.0, "0", -4.0),
            Preset::UnderDamped => (5.0, 1.0, 10.0, "0", -4.0),
            Preset::CriticallyDamped => (2.0, 4.0, 2.0, "0", -4.0),
            Preset::OverDamped => (1.0, 4.0, 3.0, "0", -4.0),
            Preset::SinusoidalForcing => (5.0, 1.0, 10.0, "sin(t)", 5.0),
            Preset::DelayedStep => (5.0, 1.0, 10.0, "3*step(t-25)", 5.0),
        };
        OscillatorParams {
            mass,
            damping,
            stiffness,
            forcing: forcing.to_string(),
            t0: 0.0,
            x0,
            v0: 0.0,
        }
    }
}
