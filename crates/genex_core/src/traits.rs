use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Number type a rate law is evaluated in: `f64` when integrating, `Dual` when
/// differentiating.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Lifts an `f64` constant into the scalar type.
/// A failed conversion yields NaN, which the integrator reports as a non-finite state.
#[inline]
pub fn lit<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Right-hand side of an autonomous or time-dependent ODE system.
pub trait DynamicalSystem<T: Scalar> {
    /// Number of species in the state vector.
    fn dimension(&self) -> usize;

    /// Writes dx/dt at `(t, x)` into `out`, which has the same length as `x`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

impl<T: Scalar, S: DynamicalSystem<T> + ?Sized> DynamicalSystem<T> for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (**self).apply(t, x, out)
    }
}

/// A one-step method with its own scratch buffers.
pub trait Steppable<T: Scalar> {
    /// Advances `state` and `t` in place by `dt`.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
