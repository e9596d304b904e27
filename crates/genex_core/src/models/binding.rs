use super::{pow_n, GeneCircuit};
use crate::error::{require_positive, ParameterError};
use crate::traits::{lit, DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

const BISECTION_STEPS: usize = 200;

/// Reversible binding `A + B ⇌ C` with forward rate `ka·A·B^n`.
///
/// Net forward flux `ka·A·B^n − kd·C` consumes one A and one B per complex, so
/// both `A + C` and `B + C` are conserved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Association rate constant (1/(s·M)).
    pub ka: f64,
    /// Dissociation rate constant (1/s).
    pub kd: f64,
    pub n: f64,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            ka: 0.005,
            kd: 0.00001,
            n: 1.0,
        }
    }
}

impl Binding {
    /// Equilibrium dissociation constant `Kd = kd/ka`.
    pub fn dissociation_constant(&self) -> f64 {
        self.kd / self.ka
    }

    /// Net association flux for concentrations `(a, b, c)`.
    pub fn flux<T: Scalar>(&self, a: T, b: T, c: T) -> T {
        lit::<T>(self.ka) * a * pow_n(b, self.n) - lit::<T>(self.kd) * c
    }

    /// Hill approximation of the complex at equilibrium, assuming ligand excess:
    /// `A0·B0^n/(Kd + B0^n)`.
    pub fn hill_bound(&self, a0: f64, b0: f64) -> f64 {
        let bn = pow_n(b0, self.n);
        a0 * bn / (self.dissociation_constant() + bn)
    }

    /// The free-receptor counterpart, `A0·(1 − B0^n/(Kd + B0^n))`.
    pub fn hill_unbound(&self, a0: f64, b0: f64) -> f64 {
        let bn = pow_n(b0, self.n);
        a0 * (1.0 - bn / (self.dissociation_constant() + bn))
    }

    /// `(A + C, B + C)` for a `[A, B, C]` state.
    pub fn conserved_totals(state: &[f64]) -> (f64, f64) {
        (state[0] + state[2], state[1] + state[2])
    }

    /// Exact equilibrium reached from `initial`, found by bisection on the complex.
    ///
    /// The flux decreases monotonically in C on `[0, min(A+C, B+C)]`.
    pub fn equilibrium(&self, initial: &[f64]) -> Result<[f64; 3], ParameterError> {
        self.validate()?;
        self.validate_state(initial)?;
        let (total_a, total_b) = Self::conserved_totals(initial);

        let mut lo = 0.0;
        let mut hi = total_a.min(total_b);
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if self.flux(total_a - mid, total_b - mid, mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let c = 0.5 * (lo + hi);
        Ok([total_a - c, total_b - c, c])
    }
}

impl<T: Scalar> DynamicalSystem<T> for Binding {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let rate = self.flux(x[0], x[1], x[2]);
        out[0] = -rate;
        out[1] = -rate;
        out[2] = rate;
    }
}

impl GeneCircuit for Binding {
    fn name(&self) -> &'static str {
        "binding"
    }

    fn species(&self) -> &'static [&'static str] {
        &["A", "B", "C"]
    }

    fn validate(&self) -> Result<(), ParameterError> {
        require_positive("ka", self.ka)?;
        require_positive("kd", self.kd)?;
        require_positive("n", self.n)
    }
}
