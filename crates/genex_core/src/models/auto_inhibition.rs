use super::{hill_repression, GeneCircuit};
use crate::error::{require_positive, ParameterError};
use crate::traits::{lit, DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

const BISECTION_STEPS: usize = 200;

/// A gene whose protein represses its own transcription.
///
/// `d[mRNA]/dt = ktx·(1 − P^n/(Kd + P^n)) − δm·mRNA`, translation as in the
/// basic model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoInhibition {
    pub ktx: f64,
    /// Dissociation constant of the repressor from its operator (M^n).
    pub kd: f64,
    pub delta_mrna: f64,
    /// Hill coefficient.
    pub n: f64,
    pub ktl: f64,
    pub delta_protein: f64,
}

impl Default for AutoInhibition {
    fn default() -> Self {
        Self {
            ktx: 1e-3,
            kd: 1e-8,
            delta_mrna: 1e-3,
            n: 1.0,
            ktl: 2e-3,
            delta_protein: 1e-3,
        }
    }
}

impl AutoInhibition {
    /// Residual of the steady-state balance for protein level `p`:
    /// `ktl·ktx·(1 − p^n/(Kd + p^n))/δm − δp·p`.
    ///
    /// Zero exactly at the fixed point; positive below it, negative above.
    pub fn hill_balance_residual(&self, protein: f64) -> f64 {
        let production = self.ktl * self.ktx * hill_repression(protein, self.kd, self.n)
            / self.delta_mrna;
        production - self.delta_protein * protein
    }

    /// Solves the Hill balance for the steady-state protein level by bisection.
    ///
    /// The residual decreases monotonically in `p`, so the root is unique and lies
    /// below the unrepressed level `ktl·ktx/(δm·δp)`.
    pub fn steady_state_protein(&self) -> Result<f64, ParameterError> {
        self.validate()?;
        let mut lo = 0.0;
        let mut hi = self.ktl * self.ktx / (self.delta_mrna * self.delta_protein);
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            if self.hill_balance_residual(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(0.5 * (lo + hi))
    }

    /// `[mRNA, Protein]` at the fixed point.
    pub fn steady_state(&self) -> Result<[f64; 2], ParameterError> {
        let protein = self.steady_state_protein()?;
        Ok([self.delta_protein * protein / self.ktl, protein])
    }
}

impl<T: Scalar> DynamicalSystem<T> for AutoInhibition {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let (mrna, protein) = (x[0], x[1]);
        out[0] = lit::<T>(self.ktx) * hill_repression(protein, self.kd, self.n)
            - lit::<T>(self.delta_mrna) * mrna;
        out[1] = lit::<T>(self.ktl) * mrna - lit::<T>(self.delta_protein) * protein;
    }
}

impl GeneCircuit for AutoInhibition {
    fn name(&self) -> &'static str {
        "auto-inhibition"
    }

    fn species(&self) -> &'static [&'static str] {
        &["mRNA", "Protein"]
    }

    fn validate(&self) -> Result<(), ParameterError> {
        require_positive("ktx", self.ktx)?;
        require_positive("kd", self.kd)?;
        require_positive("delta_mrna", self.delta_mrna)?;
        require_positive("n", self.n)?;
        require_positive("ktl", self.ktl)?;
        require_positive("delta_protein", self.delta_protein)
    }
}
