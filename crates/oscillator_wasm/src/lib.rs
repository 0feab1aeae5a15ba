//! Browser bindings for the oscillator engine.

pub mod oscillator;

use oscillator::serialization_error;
use oscillator_core::oscillator::OscillatorParams;
use oscillator_core::presets::Preset;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub use oscillator::WasmOscillator;

#[derive(Debug, Serialize)]
struct PresetEntry {
    name: &'static str,
    params: OscillatorParams,
}

fn preset_entries() -> Vec<PresetEntry> {
    Preset::ALL
        .iter()
        .map(|preset| PresetEntry {
            name: preset.name(),
            params: preset.params(),
        })
        .collect()
}

/// Named example configurations as `[{ name, params }, ...]`.
#[wasm_bindgen]
pub fn presets() -> Result<JsValue, JsValue> {
    to_value(&preset_entries()).map_err(serialization_error)
}

/// The parameters the explorer resets to.
#[wasm_bindgen]
pub fn default_params() -> Result<JsValue, JsValue> {
    to_value(&OscillatorParams::default()).map_err(serialization_error)
}
