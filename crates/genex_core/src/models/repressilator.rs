use super::{pow_n, GeneCircuit};
use crate::error::{require_non_negative, require_positive, ParameterError};
use crate::traits::{lit, DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

pub const GENES: usize = 3;

/// Rate constants of one repressilator gene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneParams {
    /// Maximal repressible transcription rate (M/s).
    pub alpha: f64,
    /// Leaky (basal) transcription rate (M/s).
    pub alpha0: f64,
    /// Repression threshold (M^n).
    pub kd: f64,
    pub delta_mrna: f64,
    pub n: f64,
    pub ktl: f64,
    pub delta_protein: f64,
}

impl Default for GeneParams {
    fn default() -> Self {
        Self {
            alpha: 1e-3,
            alpha0: 1e-6,
            kd: 1e-6,
            delta_mrna: 1e-3,
            n: 2.0,
            ktl: 2e-3,
            delta_protein: 1e-3,
        }
    }
}

impl GeneParams {
    /// Transcription rate under repressor level `repressor`:
    /// `α/(1 + r^n/K) + α0`.
    fn transcription<T: Scalar>(&self, repressor: T) -> T {
        let occupancy = pow_n(repressor, self.n) / lit::<T>(self.kd);
        lit::<T>(self.alpha) / (T::one() + occupancy) + lit::<T>(self.alpha0)
    }

    fn validate(&self) -> Result<(), ParameterError> {
        require_positive("alpha", self.alpha)?;
        require_non_negative("alpha0", self.alpha0)?;
        require_positive("kd", self.kd)?;
        require_positive("delta_mrna", self.delta_mrna)?;
        require_positive("n", self.n)?;
        require_positive("ktl", self.ktl)?;
        require_positive("delta_protein", self.delta_protein)
    }
}

/// Three-gene ring oscillator.
///
/// State: `[mRNA1, Protein1, mRNA2, Protein2, mRNA3, Protein3]`. Gene `i` is
/// repressed by the protein of the previous gene in the ring (1 by 3, 2 by 1,
/// 3 by 2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repressilator {
    pub genes: [GeneParams; GENES],
}

impl Default for Repressilator {
    fn default() -> Self {
        Self::symmetric(GeneParams::default())
    }
}

impl Repressilator {
    pub fn symmetric(gene: GeneParams) -> Self {
        Self {
            genes: [gene; GENES],
        }
    }

    pub fn mrna_index(gene: usize) -> usize {
        2 * gene
    }

    pub fn protein_index(gene: usize) -> usize {
        2 * gene + 1
    }

    /// Index of the gene whose protein represses `gene`.
    pub fn repressor_of(gene: usize) -> usize {
        (gene + GENES - 1) % GENES
    }
}

impl<T: Scalar> DynamicalSystem<T> for Repressilator {
    fn dimension(&self) -> usize {
        2 * GENES
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        for (gene, params) in self.genes.iter().enumerate() {
            let m = Self::mrna_index(gene);
            let p = Self::protein_index(gene);
            let repressor = x[Self::protein_index(Self::repressor_of(gene))];

            out[m] = params.transcription(repressor) - lit::<T>(params.delta_mrna) * x[m];
            out[p] = lit::<T>(params.ktl) * x[m] - lit::<T>(params.delta_protein) * x[p];
        }
    }
}

impl GeneCircuit for Repressilator {
    fn name(&self) -> &'static str {
        "repressilator"
    }

    fn species(&self) -> &'static [&'static str] {
        &["mRNA1", "Protein1", "mRNA2", "Protein2", "mRNA3", "Protein3"]
    }

    fn validate(&self) -> Result<(), ParameterError> {
        self.genes.iter().try_for_each(GeneParams::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_wiring_is_cyclic() {
        assert_eq!(Repressilator::repressor_of(0), 2);
        assert_eq!(Repressilator::repressor_of(1), 0);
        assert_eq!(Repressilator::repressor_of(2), 1);
    }

    #[test]
    fn each_mrna_sees_only_its_repressor() {
        let model = Repressilator::default();
        // Only protein 3 is present, so only gene 1 is repressed.
        let state = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let mut out = [0.0; 6];
        DynamicalSystem::<f64>::apply(&model, 0.0, &state, &mut out);

        let free = 1e-3 + 1e-6;
        let repressed = 1e-3 / (1.0 + 1.0 / 1e-6) + 1e-6;
        assert!((out[0] - repressed).abs() < 1e-18);
        assert!((out[2] - free).abs() < 1e-18);
        assert!((out[4] - free).abs() < 1e-18);
        assert!((out[5] + 1e-3).abs() < 1e-18);
    }

    #[test]
    fn per_gene_parameters_are_independent() {
        let mut model = Repressilator::default();
        model.genes[1].ktl = 5e-3;
        let state = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let mut out = [0.0; 6];
        DynamicalSystem::<f64>::apply(&model, 0.0, &state, &mut out);
        assert!((out[1] - 2e-3).abs() < 1e-18);
        assert!((out[3] - 5e-3).abs() < 1e-18);
        assert!((out[5] - 2e-3).abs() < 1e-18);
    }

    #[test]
    fn validation_accepts_zero_leak_but_not_negative() {
        let mut model = Repressilator::default();
        model.genes[2].alpha0 = 0.0;
        assert!(model.validate().is_ok());
        model.genes[2].alpha0 = -1e-6;
        assert!(matches!(
            model.validate(),
            Err(ParameterError::Negative { name: "alpha0", .. })
        ));
    }
}
