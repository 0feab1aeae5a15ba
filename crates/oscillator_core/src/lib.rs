//! The `oscillator_core` crate is the engine behind the damped-oscillator explorer.
//! It models `m x'' + d x' + k x = b(t)`, solving the unforced equation in closed form and
//! integrating the forced one with RK4 on demand.
//!
//! Key components:
//! - **Oscillator**: `OscillatorModel` classifies the damping regime and routes queries.
//! - **Homogeneous**: fundamental pairs, coefficient solve and symbolic solution descriptor.
//! - **Forced**: cached RK4 integration anchored at the nearest known sample.
//! - **Expression**: lexer, operator-precedence parser and stack VM for the forcing term `b(t)`.
//! - **Trajectory**: sampling of position, velocity and forcing over a time window.

pub mod cache;
pub mod error;
pub mod expression;
pub mod forced;
pub mod homogeneous;
pub mod oscillator;
pub mod presets;
pub mod solvers;
pub mod trajectory;
pub mod traits;
