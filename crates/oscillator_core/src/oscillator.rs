//! The damped, possibly forced oscillator `m x'' + d x' + k x = b(t)`.

use crate::error::{EngineError, EngineResult, ParseError};
use crate::expression::{is_zero_forcing, Expression};
use crate::forced::{ForcedIntegrator, IntegratorSettings};
use crate::homogeneous::{
    Coefficients, FundamentalSet, HomogeneousSolution, SolutionType, SymbolicSolution,
};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DampingClass {
    Undamped,
    UnderDamped,
    CriticallyDamped,
    OverDamped,
}

impl DampingClass {
    pub fn name(self) -> &'static str {
        match self {
            DampingClass::Undamped => "Undamped",
            DampingClass::UnderDamped => "Under Damped",
            DampingClass::CriticallyDamped => "Critically Damped",
            DampingClass::OverDamped => "Over Damped",
        }
    }
}

impl fmt::Display for DampingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Roots of the characteristic polynomial `m r^2 + d r + k`.
///
/// Real roots live in `r1`/`r2`. For complex pairs `r1 == r2` holds the shared real part and
/// `imag` the (positive) imaginary part, so the roots are `r1 ± i imag`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roots {
    pub r1: f64,
    pub r2: f64,
    pub imag: f64,
}

impl Roots {
    pub fn as_complex(&self) -> [Complex<f64>; 2] {
        [
            Complex::new(self.r1, self.imag),
            Complex::new(self.r2, -self.imag),
        ]
    }

    pub fn is_real(&self) -> bool {
        self.imag == 0.0
    }
}

/// Classifies the damping regime of `m r^2 + d r + k = 0` and computes its roots.
///
/// `m` must be nonzero.
pub fn classify(m: f64, d: f64, k: f64) -> (DampingClass, Roots) {
    let discriminant = d * d - 4.0 * m * k;
    // `+ 0.0` turns a negative zero into a positive one.
    let roots = |r1: f64, r2: f64, imag: f64| Roots {
        r1: r1 + 0.0,
        r2: r2 + 0.0,
        imag: imag + 0.0,
    };

    if d == 0.0 {
        let ratio = k / m;
        if ratio > 0.0 {
            (DampingClass::Undamped, roots(0.0, 0.0, ratio.sqrt()))
        } else {
            let w = (-ratio).sqrt();
            (DampingClass::Undamped, roots(w, -w, 0.0))
        }
    } else if discriminant < 0.0 {
        let real = -d / (2.0 * m);
        let imag = discriminant.abs().sqrt() / (2.0 * m).abs();
        (DampingClass::UnderDamped, roots(real, real, imag))
    } else if discriminant > 0.0 {
        let sqrt = discriminant.sqrt();
        (
            DampingClass::OverDamped,
            roots((-d + sqrt) / (2.0 * m), (-d - sqrt) / (2.0 * m), 0.0),
        )
    } else {
        let r = -d / (2.0 * m);
        (DampingClass::CriticallyDamped, roots(r, r, 0.0))
    }
}

/// Coefficients, forcing term and initial conditions of one oscillator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub mass: f64,
    pub damping: f64,
    pub stiffness: f64,
    /// Forcing term `b(t)`; blank or a literal zero means unforced.
    pub forcing: String,
    pub t0: f64,
    pub x0: f64,
    pub v0: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            mass: 8.0,
            damping: 1.4,
            stiffness: 10.0,
            forcing: "0".to_string(),
            t0: 0.0,
            x0: -4.0,
            v0: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Resolution {
    Homogeneous(HomogeneousSolution),
    Forced(ForcedIntegrator),
    /// The forcing term did not parse. Every query reports the error.
    Unparsable(ParseError),
}

/// A solved oscillator.
///
/// Classification happens once at construction. Unforced models are solved in closed form
/// right away; forced models integrate lazily as position and velocity queries arrive.
/// Queries take `&mut self` because they fill the sample caches, so callers sharing one model
/// across threads need to wrap it in a lock.
#[derive(Debug, Clone)]
pub struct OscillatorModel {
    params: OscillatorParams,
    damping_class: DampingClass,
    roots: Roots,
    resolution: Resolution,
}

impl OscillatorModel {
    pub fn new(params: OscillatorParams) -> EngineResult<Self> {
        Self::with_settings(params, IntegratorSettings::default())
    }

    pub fn with_settings(
        params: OscillatorParams,
        settings: IntegratorSettings,
    ) -> EngineResult<Self> {
        if params.mass == 0.0 {
            return Err(EngineError::ZeroMass);
        }

        let (damping_class, roots) = classify(params.mass, params.damping, params.stiffness);
        debug!(
            class = %damping_class,
            r1 = roots.r1,
            r2 = roots.r2,
            imag = roots.imag,
            "classified oscillator"
        );

        let resolution = if is_zero_forcing(&params.forcing) {
            Resolution::Homogeneous(HomogeneousSolution::new(
                damping_class,
                roots,
                params.t0,
                params.x0,
                params.v0,
            )?)
        } else {
            match Expression::parse(&params.forcing) {
                Ok(forcing) => Resolution::Forced(ForcedIntegrator::new(
                    params.mass,
                    params.damping,
                    params.stiffness,
                    forcing,
                    params.t0,
                    params.x0,
                    params.v0,
                    settings,
                )),
                Err(err) => {
                    debug!(error = %err, "forcing term rejected");
                    Resolution::Unparsable(err)
                }
            }
        };

        Ok(Self {
            params,
            damping_class,
            roots,
            resolution,
        })
    }

    /// Positional constructor mirroring `newOscillator(m, d, k, b, t0, x0, v0)`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_coefficients(
        mass: f64,
        damping: f64,
        stiffness: f64,
        forcing: &str,
        t0: f64,
        x0: f64,
        v0: f64,
    ) -> EngineResult<Self> {
        Self::new(OscillatorParams {
            mass,
            damping,
            stiffness,
            forcing: forcing.to_string(),
            t0,
            x0,
            v0,
        })
    }

    pub fn params(&self) -> &OscillatorParams {
        &self.params
    }

    pub fn damping_class(&self) -> DampingClass {
        self.damping_class
    }

    pub fn roots(&self) -> Roots {
        self.roots
    }

    pub fn is_homogeneous(&self) -> bool {
        matches!(self.resolution, Resolution::Homogeneous(_))
    }

    /// Basis of the (associated) homogeneous solution space. Available for forced models too.
    pub fn fundamental_set(&self) -> FundamentalSet {
        match &self.resolution {
            Resolution::Homogeneous(solution) => *solution.fundamental_set(),
            _ => FundamentalSet::new(self.damping_class, self.roots),
        }
    }

    pub fn solution_type(&self) -> Option<SolutionType> {
        self.homogeneous().map(HomogeneousSolution::solution_type)
    }

    pub fn coefficients(&self) -> Option<Coefficients> {
        self.homogeneous().map(HomogeneousSolution::coefficients)
    }

    pub fn symbolic_solution(&self) -> Option<SymbolicSolution> {
        self.homogeneous().map(HomogeneousSolution::symbolic)
    }

    pub fn homogeneous(&self) -> Option<&HomogeneousSolution> {
        match &self.resolution {
            Resolution::Homogeneous(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn forced(&self) -> Option<&ForcedIntegrator> {
        match &self.resolution {
            Resolution::Forced(integrator) => Some(integrator),
            _ => None,
        }
    }

    /// The parse failure of the forcing term, if it had one.
    pub fn forcing_error(&self) -> Option<&ParseError> {
        match &self.resolution {
            Resolution::Unparsable(err) => Some(err),
            _ => None,
        }
    }

    pub fn position(&mut self, t: f64) -> EngineResult<f64> {
        match &mut self.resolution {
            Resolution::Homogeneous(solution) => solution.position(t),
            Resolution::Forced(integrator) => integrator.position(t),
            Resolution::Unparsable(err) => Err(err.clone().into()),
        }
    }

    pub fn velocity(&mut self, t: f64) -> EngineResult<f64> {
        match &mut self.resolution {
            Resolution::Homogeneous(solution) => solution.velocity(t),
            Resolution::Forced(integrator) => integrator.velocity(t),
            Resolution::Unparsable(err) => Err(err.clone().into()),
        }
    }

    /// `b(t)`; zero for unforced models.
    pub fn forcing_value(&self, t: f64) -> EngineResult<f64> {
        match &self.resolution {
            Resolution::Homogeneous(_) => Ok(0.0),
            Resolution::Forced(integrator) => Ok(integrator.forcing_value(t)),
            Resolution::Unparsable(err) => Err(err.clone().into()),
        }
    }
}
