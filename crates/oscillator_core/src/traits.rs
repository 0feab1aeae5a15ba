use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric type the integrators operate on.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A first-order system `y' = f(t, y)`.
///
/// The oscillator `m x'' + d x' + k x = b(t)` is handed to the steppers in this form,
/// with state `[x, x']`.
pub trait DynamicalSystem<T: Scalar> {
    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// Writes `f(t, y)` into `out`.
    fn apply(&self, t: T, y: &[T], out: &mut [T]);
}

/// A fixed-step integrator that advances a state in place.
pub trait Steppable<T: Scalar> {
    /// Advances `state` from `t` to `t + dt` and updates `t`.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
