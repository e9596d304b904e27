use super::GeneCircuit;
use crate::error::{require_positive, ParameterError};
use crate::traits::{lit, DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

/// Constitutive transcription and translation with first-order decay.
///
/// State: `[mRNA, Protein]` in M, rates per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicExpression {
    /// Transcription rate (M/s).
    pub ktx: f64,
    pub delta_mrna: f64,
    /// Translation rate (1/s).
    pub ktl: f64,
    pub delta_protein: f64,
}

impl Default for BasicExpression {
    fn default() -> Self {
        Self {
            ktx: 1e-3,
            delta_mrna: 1e-3,
            ktl: 2e-3,
            delta_protein: 1e-3,
        }
    }
}

impl BasicExpression {
    /// The unique fixed point `[ktx/δm, ktl·ktx/(δm·δp)]`.
    pub fn steady_state(&self) -> [f64; 2] {
        let mrna = self.ktx / self.delta_mrna;
        [mrna, self.ktl * mrna / self.delta_protein]
    }

    /// Closed-form solution starting from `[0, 0]`.
    pub fn solution_from_zero(&self, t: f64) -> [f64; 2] {
        let [mrna_ss, _] = self.steady_state();
        let (dm, dp) = (self.delta_mrna, self.delta_protein);
        let mrna = mrna_ss * (1.0 - (-dm * t).exp());

        let relaxation = (1.0 - (-dp * t).exp()) / dp;
        let lag = if (dp - dm).abs() <= 1e-12 * dp.max(dm) {
            t * (-dp * t).exp()
        } else {
            ((-dm * t).exp() - (-dp * t).exp()) / (dp - dm)
        };
        [mrna, self.ktl * mrna_ss * (relaxation - lag)]
    }
}

impl<T: Scalar> DynamicalSystem<T> for BasicExpression {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let (mrna, protein) = (x[0], x[1]);
        out[0] = lit::<T>(self.ktx) - lit::<T>(self.delta_mrna) * mrna;
        out[1] = lit::<T>(self.ktl) * mrna - lit::<T>(self.delta_protein) * protein;
    }
}

impl GeneCircuit for BasicExpression {
    fn name(&self) -> &'static str {
        "basic gene expression"
    }

    fn species(&self) -> &'static [&'static str] {
        &["mRNA", "Protein"]
    }

    fn validate(&self) -> Result<(), ParameterError> {
        require_positive("ktx", self.ktx)?;
        require_positive("delta_mrna", self.delta_mrna)?;
        require_positive("ktl", self.ktl)?;
        require_positive("delta_protein", self.delta_protein)
    }
}
