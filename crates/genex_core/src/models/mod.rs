//! Gene-expression circuits as immutable parameter structs.
//!
//! Every model implements [`DynamicalSystem`] for any [`Scalar`], so the same
//! rate law is integrated in `f64` and differentiated with [`Dual`] numbers.
//! The models are autonomous: the time argument is ignored.
//!
//! # Adding a model
//!
//! A new circuit needs a parameter struct, a rate law and its species labels:
//!
//! ```ignore
//! #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
//! pub struct MyCircuit { pub k: f64 }
//!
//! impl<T: Scalar> DynamicalSystem<T> for MyCircuit {
//!     fn dimension(&self) -> usize { 2 }
//!     fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
//!         out[0] = /* d(species 0)/dt */;
//!         out[1] = /* d(species 1)/dt */;
//!     }
//! }
//!
//! impl GeneCircuit for MyCircuit {
//!     fn name(&self) -> &'static str { "my circuit" }
//!     fn species(&self) -> &'static [&'static str] { &["X", "Y"] }
//!     fn validate(&self) -> Result<(), ParameterError> { require_positive("k", self.k) }
//! }
//! ```

pub mod auto_inhibition;
pub mod basic;
pub mod binding;
pub mod repressilator;

pub use auto_inhibition::AutoInhibition;
pub use basic::BasicExpression;
pub use binding::Binding;
pub use repressilator::{GeneParams, Repressilator};

use crate::autodiff::Dual;
use crate::error::ParameterError;
use crate::traits::{lit, DynamicalSystem, Scalar};

/// A model that can be integrated, differentiated and validated.
pub trait GeneCircuit: DynamicalSystem<f64> + DynamicalSystem<Dual> {
    fn name(&self) -> &'static str;

    /// Column labels, in state-vector order.
    fn species(&self) -> &'static [&'static str];

    /// Checks every rate constant. Evaluation itself never validates.
    fn validate(&self) -> Result<(), ParameterError>;

    fn species_count(&self) -> usize {
        self.species().len()
    }

    /// Rejects states of the wrong length or with negative / non-finite concentrations.
    fn validate_state(&self, state: &[f64]) -> Result<(), ParameterError> {
        let species = self.species();
        if state.len() != species.len() {
            return Err(ParameterError::SpeciesCountMismatch {
                expected: species.len(),
                got: state.len(),
            });
        }
        for (&value, &name) in state.iter().zip(species) {
            if !value.is_finite() || value < 0.0 {
                return Err(ParameterError::InvalidConcentration {
                    species: name,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// `x^n`, using repeated multiplication when `n` is integral.
#[inline]
pub(crate) fn pow_n<T: Scalar>(x: T, n: f64) -> T {
    if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 {
        x.powi(n as i32)
    } else {
        x.powf(lit(n))
    }
}

/// Saturating Hill term `x^n / (k + x^n)`.
pub fn hill_activation<T: Scalar>(x: T, k: f64, n: f64) -> T {
    let xn = pow_n(x, n);
    xn / (lit::<T>(k) + xn)
}

/// Fraction of transcription left under repression, `1 - x^n / (k + x^n)`.
pub fn hill_repression<T: Scalar>(x: T, k: f64, n: f64) -> T {
    T::one() - hill_activation(x, k, n)
}
