//! WASM wrapper around a single oscillator model.

use js_sys::Float64Array;
use oscillator_core::error::{EngineError, EngineResult};
use oscillator_core::oscillator::OscillatorModel;
use oscillator_core::trajectory::{self, TimeWindow};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub(crate) fn engine_error(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn serialization_error(err: serde_wasm_bindgen::Error) -> JsValue {
    JsValue::from_str(&format!("Serialization error: {}", err))
}

#[wasm_bindgen]
pub struct WasmOscillator {
    model: OscillatorModel,
}

#[wasm_bindgen]
impl WasmOscillator {
    #[wasm_bindgen(constructor)]
    pub fn new(
        mass: f64,
        damping: f64,
        stiffness: f64,
        forcing: &str,
        t0: f64,
        x0: f64,
        v0: f64,
    ) -> Result<WasmOscillator, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let model =
            OscillatorModel::from_coefficients(mass, damping, stiffness, forcing, t0, x0, v0)
                .map_err(engine_error)?;
        Ok(WasmOscillator { model })
    }

    pub fn position(&mut self, t: f64) -> Result<f64, JsValue> {
        self.model.position(t).map_err(engine_error)
    }

    pub fn velocity(&mut self, t: f64) -> Result<f64, JsValue> {
        self.model.velocity(t).map_err(engine_error)
    }

    pub fn forcing_value(&self, t: f64) -> Result<f64, JsValue> {
        self.model.forcing_value(t).map_err(engine_error)
    }

    pub fn damping_class(&self) -> String {
        self.model.damping_class().name().to_string()
    }

    pub fn is_homogeneous(&self) -> bool {
        self.model.is_homogeneous()
    }

    /// Message of the forcing-term parse failure, if any.
    pub fn forcing_error(&self) -> Option<String> {
        self.model.forcing_error().map(|e| e.to_string())
    }

    pub fn roots(&self) -> Result<JsValue, JsValue> {
        to_value(&self.model.roots()).map_err(serialization_error)
    }

    /// `undefined` for forced models, which have no closed form.
    pub fn symbolic_solution(&self) -> Result<JsValue, JsValue> {
        to_value(&self.model.symbolic_solution()).map_err(serialization_error)
    }

    pub fn fundamental_set(&self) -> Result<JsValue, JsValue> {
        to_value(&self.model.fundamental_set()).map_err(serialization_error)
    }

    pub fn symbolic_solution_text(&self) -> Option<String> {
        self.model.symbolic_solution().map(|s| s.to_string())
    }

    pub fn fundamental_set_text(&self) -> String {
        self.model.fundamental_set().to_string()
    }

    /// Flat `[t, x, v, b, ...]` samples over `[t_min, t_max]`.
    pub fn sample_trajectory(
        &mut self,
        t_min: f64,
        t_max: f64,
        step: f64,
    ) -> Result<Float64Array, JsValue> {
        let flat = self.sample_flat(t_min, t_max, step).map_err(engine_error)?;
        Ok(Float64Array::from(flat.as_slice()))
    }
}

impl WasmOscillator {
    pub(crate) fn sample_flat(
        &mut self,
        t_min: f64,
        t_max: f64,
        step: f64,
    ) -> EngineResult<Vec<f64>> {
        let window = TimeWindow::new(t_min, t_max, step)?;
        Ok(trajectory::sample(&mut self.model, &window)?.to_flat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unforced_oscillator_answers_from_closed_form() {
        let mut osc = WasmOscillator::new(2.0, 0.0, 8.0, "0", 0.0, -4.0, 0.0).expect("oscillator");
        assert!(osc.is_homogeneous());
        assert_eq!(osc.damping_class(), "Undamped");
        assert_eq!(osc.position(0.0).expect("position"), -4.0);
        let x = osc.position(1.0).expect("position");
        assert!((x + 4.0 * 2.0_f64.cos()).abs() < 1e-12);
        assert_eq!(osc.forcing_value(3.0).expect("forcing"), 0.0);
        assert_eq!(
            osc.symbolic_solution_text().as_deref(),
            Some("x(t) = -4cos(2t)")
        );
        assert_eq!(osc.fundamental_set_text(), "{cos(2t), sin(2t)}");
        assert!(osc.forcing_error().is_none());
    }

    #[test]
    fn forced_oscillator_has_no_symbolic_text() {
        let mut osc =
            WasmOscillator::new(5.0, 1.0, 10.0, "sin(t)", 0.0, 5.0, 0.0).expect("oscillator");
        assert!(!osc.is_homogeneous());
        assert_eq!(osc.damping_class(), "Under Damped");
        assert!(osc.symbolic_solution_text().is_none());
        assert!(osc.velocity(2.0).expect("velocity").is_finite());
    }

    #[test]
    fn malformed_forcing_is_reported_not_thrown_at_construction() {
        let osc = WasmOscillator::new(1.0, 1.0, 1.0, "2+@", 0.0, 1.0, 0.0).expect("oscillator");
        let message = osc.forcing_error().expect("parse failure");
        assert!(message.contains('@'));
    }

    #[test]
    fn trajectory_is_flattened_in_quadruples() {
        let mut osc = WasmOscillator::new(1.0, 4.0, 3.0, "0", 0.0, -4.0, 0.0).expect("oscillator");
        let flat = osc.sample_flat(0.0, 1.0, 0.25).expect("trajectory");
        assert_eq!(flat.len() % 4, 0);
        assert_eq!(flat.len() / 4, 7);
        assert_eq!(&flat[4..8], &[0.0, -4.0, 0.0, 0.0]);
        assert!(osc.sample_flat(1.0, 0.0, 0.25).is_err());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::WasmOscillator;
    use oscillator_core::homogeneous::SymbolicSolution;
    use oscillator_core::oscillator::Roots;
    use serde_wasm_bindgen::from_value;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn zero_mass_is_rejected_with_message() {
        let result = WasmOscillator::new(0.0, 1.0, 1.0, "0", 0.0, 1.0, 0.0);
        let message = result
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("Mass must be nonzero"));
    }

    #[wasm_bindgen_test]
    fn malformed_forcing_fails_queries() {
        let mut osc = WasmOscillator::new(1.0, 1.0, 1.0, "sin(", 0.0, 1.0, 0.0).expect("oscillator");
        let message = osc
            .position(1.0)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.starts_with("Invalid forcing term"));
    }

    #[wasm_bindgen_test]
    fn roots_and_solution_serialize() {
        let osc = WasmOscillator::new(2.0, 4.0, 2.0, "0", 0.0, -4.0, 0.0).expect("oscillator");
        let roots: Roots = from_value(osc.roots().expect("roots")).expect("decode roots");
        assert_eq!(roots.r1, -1.0);
        let solution: SymbolicSolution =
            from_value(osc.symbolic_solution().expect("solution")).expect("decode solution");
        assert_eq!(solution.coefficients.a, -4.0);
    }

    #[wasm_bindgen_test]
    fn trajectory_array_matches_flat_samples() {
        let mut osc = WasmOscillator::new(5.0, 1.0, 10.0, "0", 0.0, 5.0, 0.0).expect("oscillator");
        let array = osc.sample_trajectory(0.0, 2.0, 0.5).expect("trajectory");
        assert_eq!(array.length(), 4 * 7);
        assert_eq!(array.get_index(4), 0.0);
        assert_eq!(array.get_index(5), 5.0);
    }
}
