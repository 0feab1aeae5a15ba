//! Anchored RK4 integration for oscillators with a nonzero forcing term.

use crate::cache::{AnchorTieBreak, SampleCache, TimeKey};
use crate::error::EngineResult;
use crate::expression::Expression;
use crate::solvers::RK4;
use crate::traits::{DynamicalSystem, Steppable};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Configuration for the forced integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    /// RK4 steps per integration pass, regardless of the distance covered.
    pub substeps: usize,
    pub tie_break: AnchorTieBreak,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            substeps: 75,
            tie_break: AnchorTieBreak::Earlier,
        }
    }
}

/// `m x'' + d x' + k x = b(t)` as the first-order system `[x, u]' = [u, (b - d u - k x) / m]`.
struct OscillatorSystem<'a> {
    mass: f64,
    damping: f64,
    stiffness: f64,
    forcing: &'a Expression,
}

impl DynamicalSystem<f64> for OscillatorSystem<'_> {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, t: f64, y: &[f64], out: &mut [f64]) {
        out[0] = y[1];
        out[1] = (self.forcing.eval(t) - self.damping * y[1] - self.stiffness * y[0]) / self.mass;
    }
}

/// Fills position and velocity caches on demand by integrating from the nearest cached sample.
#[derive(Debug, Clone)]
pub struct ForcedIntegrator {
    mass: f64,
    damping: f64,
    stiffness: f64,
    forcing: Expression,
    settings: IntegratorSettings,
    cache: SampleCache,
    stepper: RK4<f64>,
    /// `(t0, x0, v0)`, the starting point while no cached sample qualifies as an anchor.
    seed: [f64; 3],
    passes: usize,
}

impl ForcedIntegrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mass: f64,
        damping: f64,
        stiffness: f64,
        forcing: Expression,
        t0: f64,
        x0: f64,
        v0: f64,
        settings: IntegratorSettings,
    ) -> Self {
        let cache = match TimeKey::new(t0) {
            Ok(key) => SampleCache::seeded(key, x0, v0),
            Err(_) => SampleCache::new(),
        };
        Self {
            mass,
            damping,
            stiffness,
            forcing,
            settings,
            cache,
            stepper: RK4::new(2),
            seed: [t0, x0, v0],
            passes: 0,
        }
    }

    pub fn position(&mut self, t: f64) -> EngineResult<f64> {
        let key = TimeKey::new(t)?;
        if let Some(x) = self.cache.position(key) {
            trace!(t, "position cache hit");
            return Ok(x);
        }
        Ok(self.integrate_to(key)[0])
    }

    pub fn velocity(&mut self, t: f64) -> EngineResult<f64> {
        let key = TimeKey::new(t)?;
        if let Some(v) = self.cache.velocity(key) {
            trace!(t, "velocity cache hit");
            return Ok(v);
        }
        Ok(self.integrate_to(key)[1])
    }

    /// `b(t)`.
    pub fn forcing_value(&self, t: f64) -> f64 {
        self.forcing.eval(t)
    }

    pub fn settings(&self) -> IntegratorSettings {
        self.settings
    }

    /// Number of integration passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Number of cached samples, the initial condition included.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Runs one pass from the nearest anchor to `target` and caches the result under `target`.
    fn integrate_to(&mut self, target: TimeKey) -> [f64; 2] {
        let [mut t, x, u] = match self.cache.nearest_anchor(target, self.settings.tie_break) {
            Some(anchor) => [anchor.key.time(), anchor.position, anchor.velocity],
            None => self.seed,
        };
        let t_final = target.time();
        let mut state = [x, u];
        let substeps = self.settings.substeps.max(1);
        let h = (t_final - t) / substeps as f64;

        debug!(
            from = t,
            to = t_final,
            step = h,
            "integrating from nearest anchor"
        );

        if h != 0.0 {
            let system = OscillatorSystem {
                mass: self.mass,
                damping: self.damping,
                stiffness: self.stiffness,
                forcing: &self.forcing,
            };
            // Count steps rather than compare `t`: drift must not add a step past t_final.
            for _ in 0..substeps {
                self.stepper.step(&system, &mut t, &mut state, h);
            }
        }

        self.cache.insert(target, state[0], state[1]);
        self.passes += 1;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homogeneous::HomogeneousSolution;
    use crate::oscillator::classify;

    fn integrator(m: f64, d: f64, k: f64, forcing: &str, x0: f64, v0: f64) -> ForcedIntegrator {
        let forcing = Expression::parse(forcing).expect("forcing parses");
        ForcedIntegrator::new(m, d, k, forcing, 0.0, x0, v0, IntegratorSettings::default())
    }

    #[test]
    fn zero_forcing_agrees_with_closed_form_in_every_regime() {
        let regimes = [
            (2.0, 0.0, 8.0),
            (5.0, 1.0, 10.0),
            (2.0, 4.0, 2.0),
            (1.0, 4.0, 3.0),
            (1.0, 0.0, -1.0),
        ];
        let times = [0.5, 1.0, 2.0, 2.75, 3.5, 4.0, -0.5, -1.0];
        for (m, d, k) in regimes {
            let (class, roots) = classify(m, d, k);
            let exact =
                HomogeneousSolution::new(class, roots, 0.0, -4.0, 1.0).expect("closed form");
            let mut numeric = integrator(m, d, k, "0", -4.0, 1.0);
            for t in times {
                let x = numeric.position(t).expect("position");
                let v = numeric.velocity(t).expect("velocity");
                let x_exact = exact.position_at(t);
                let v_exact = exact.velocity_at(t);
                assert!(
                    (x - x_exact).abs() < 1e-3 * (1.0 + x_exact.abs()),
                    "x mismatch for ({m}, {d}, {k}) at {t}: {x} vs {x_exact}"
                );
                assert!(
                    (v - v_exact).abs() < 1e-3 * (1.0 + v_exact.abs()),
                    "v mismatch for ({m}, {d}, {k}) at {t}: {v} vs {v_exact}"
                );
            }
        }
    }

    #[test]
    fn initial_condition_is_served_from_the_seed() {
        let mut numeric = integrator(5.0, 1.0, 10.0, "sin(t)", 5.0, 0.0);
        assert_eq!(numeric.position(0.0), Ok(5.0));
        assert_eq!(numeric.velocity(0.0), Ok(0.0));
        assert_eq!(numeric.passes(), 0);
        assert_eq!(numeric.cache_len(), 1);
    }

    #[test]
    fn one_pass_fills_both_caches() {
        let mut numeric = integrator(5.0, 1.0, 10.0, "sin(t)", 5.0, 0.0);
        let x = numeric.position(1.5).expect("position");
        assert_eq!(numeric.passes(), 1);
        let v = numeric.velocity(1.5).expect("velocity");
        assert_eq!(numeric.passes(), 1);
        assert_eq!(numeric.cache_len(), 2);
        assert_eq!(numeric.position(1.5), Ok(x));
        assert_eq!(numeric.velocity(1.5), Ok(v));
        assert_eq!(numeric.passes(), 1);
    }

    #[test]
    fn constant_forcing_settles_at_static_deflection() {
        // x'' + 2x' + 4x = 8 settles at x = 2.
        let mut numeric = integrator(1.0, 2.0, 4.0, "8", 0.0, 0.0);
        let mut t = 0.0;
        while t < 30.0 {
            t += 0.5;
            numeric.position(t).expect("position");
        }
        assert!((numeric.position(30.0).expect("position") - 2.0).abs() < 1e-6);
        assert!(numeric.velocity(30.0).expect("velocity").abs() < 1e-6);
    }

    #[test]
    fn step_forcing_is_inert_before_it_switches_on() {
        let mut forced = integrator(5.0, 1.0, 10.0, "3*step(t-25)", 5.0, 0.0);
        let mut free = integrator(5.0, 1.0, 10.0, "0", 5.0, 0.0);
        for i in 1..=40 {
            let t = i as f64 * 0.5;
            assert_eq!(forced.position(t), free.position(t));
        }
        assert_eq!(forced.forcing_value(30.0), 3.0);
        assert_eq!(forced.forcing_value(20.0), 0.0);
    }

    #[test]
    fn non_finite_query_is_rejected_without_a_pass() {
        let mut numeric = integrator(1.0, 1.0, 1.0, "t", 0.0, 0.0);
        assert!(numeric.position(f64::NAN).is_err());
        assert!(numeric.velocity(f64::INFINITY).is_err());
        assert_eq!(numeric.passes(), 0);
    }

    #[test]
    fn tie_break_setting_selects_anchor() {
        let forcing = Expression::parse("cos(t)").expect("forcing parses");
        let later = IntegratorSettings {
            tie_break: AnchorTieBreak::Later,
            ..IntegratorSettings::default()
        };
        let mut a = integrator(1.0, 0.5, 2.0, "cos(t)", 1.0, 0.0);
        let mut b = ForcedIntegrator::new(1.0, 0.5, 2.0, forcing, 0.0, 1.0, 0.0, later);
        for numeric in [&mut a, &mut b] {
            numeric.position(2.0).expect("position");
        }
        // Equidistant from the anchors at 0 and 2.
        let xa = a.position(1.0).expect("position");
        let xb = b.position(1.0).expect("position");
        assert!((xa - xb).abs() < 1e-4);
        assert_eq!(b.settings().tie_break, AnchorTieBreak::Later);
    }
}
