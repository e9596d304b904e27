use crate::{autodiff::Dual, models::GeneCircuit, traits::DynamicalSystem};
use anyhow::{anyhow, bail, Context, Result};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub damping: f64,
    /// Convergence threshold on ‖f(x)‖. Rates in these models are small, so this
    /// is far below the usual 1e-9.
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 50,
            damping: 1.0,
            tolerance: 1e-16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteadyState {
    pub state: Vec<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    /// Row-major Jacobian at `state`.
    pub jacobian: Vec<f64>,
    pub stability: Stability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityKind {
    /// All eigenvalues real and negative.
    StableNode,
    /// Negative real parts with a complex pair: damped oscillations.
    StableFocus,
    /// Some eigenvalue with zero real part (within tolerance).
    Marginal,
    /// A positive real eigenvalue and no complex pair crossing.
    Unstable,
    /// A complex pair with positive real part: the fixed point sheds oscillations.
    UnstableOscillatory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stability {
    pub kind: StabilityKind,
    pub eigenvalues: Vec<Complex<f64>>,
}

impl Stability {
    pub fn is_stable(&self) -> bool {
        matches!(
            self.kind,
            StabilityKind::StableNode | StabilityKind::StableFocus
        )
    }

    /// Largest real part, the growth rate of the fastest mode.
    pub fn spectral_abscissa(&self) -> f64 {
        self.eigenvalues
            .iter()
            .map(|l| l.re)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Newton iteration for `f(x) = 0` starting from `initial_guess`.
pub fn find_steady_state<M>(
    model: &M,
    initial_guess: &[f64],
    settings: NewtonSettings,
) -> Result<SteadyState>
where
    M: GeneCircuit + ?Sized,
{
    let dim = DynamicalSystem::<f64>::dimension(model);
    if dim == 0 {
        bail!("System has zero dimension.");
    }
    if initial_guess.len() != dim {
        bail!(
            "Initial guess dimension mismatch. Expected {}, got {}.",
            dim,
            initial_guess.len()
        );
    }
    if settings.max_steps == 0 {
        bail!("max_steps must be greater than zero.");
    }
    if settings.damping <= 0.0 {
        bail!("damping must be positive.");
    }
    if settings.tolerance <= 0.0 {
        bail!("tolerance must be positive.");
    }
    model
        .validate()
        .with_context(|| format!("Invalid parameters for {}.", model.name()))?;

    let mut state = initial_guess.to_vec();
    let mut residual = vec![0.0; dim];
    DynamicalSystem::<f64>::apply(model, 0.0, &state, &mut residual);
    let mut residual_norm = l2_norm(&residual);
    let mut iterations = 0usize;

    while residual_norm > settings.tolerance {
        if iterations >= settings.max_steps {
            bail!(
                "Newton solver failed to converge in {} steps (‖f(x)‖ = {}).",
                settings.max_steps,
                residual_norm
            );
        }

        let jac = jacobian(model, &state);
        let delta = solve_linear_system(dim, &jac, &residual)
            .context("Failed to solve linear system during Newton iteration.")?;

        for (x, d) in state.iter_mut().zip(&delta) {
            *x -= settings.damping * d;
        }

        iterations += 1;
        DynamicalSystem::<f64>::apply(model, 0.0, &state, &mut residual);
        residual_norm = l2_norm(&residual);
        if !residual_norm.is_finite() {
            bail!("Newton iterate left the domain of the model at step {iterations}.");
        }
    }

    debug!(
        model = model.name(),
        iterations, residual_norm, "steady state converged"
    );

    let jacobian = jacobian(model, &state);
    let stability = classify(dim, &jacobian)?;
    Ok(SteadyState {
        state,
        residual_norm,
        iterations,
        jacobian,
        stability,
    })
}

/// Exact Jacobian `∂f_i/∂x_j` at `state`, row-major, from one Dual sweep per column.
pub fn jacobian<M>(model: &M, state: &[f64]) -> Vec<f64>
where
    M: DynamicalSystem<Dual> + ?Sized,
{
    let dim = state.len();
    let mut jacobian = vec![0.0; dim * dim];
    let mut dual_state = vec![Dual::constant(0.0); dim];
    let mut dual_out = vec![Dual::constant(0.0); dim];

    for j in 0..dim {
        for (i, slot) in dual_state.iter_mut().enumerate() {
            *slot = Dual::new(state[i], if i == j { 1.0 } else { 0.0 });
        }
        model.apply(Dual::constant(0.0), &dual_state, &mut dual_out);
        for i in 0..dim {
            jacobian[i * dim + j] = dual_out[i].eps;
        }
    }
    jacobian
}

/// Eigenvalue-based stability of a fixed point.
pub fn stability<M>(model: &M, state: &[f64]) -> Result<Stability>
where
    M: DynamicalSystem<Dual> + ?Sized,
{
    let jac = jacobian(model, state);
    classify(state.len(), &jac)
}

fn classify(dim: usize, jacobian: &[f64]) -> Result<Stability> {
    let matrix = DMatrix::from_row_slice(dim, dim, jacobian);
    if matrix.iter().any(|v| !v.is_finite()) {
        bail!("Jacobian contains non-finite entries.");
    }
    let eigenvalues: Vec<Complex<f64>> = matrix.complex_eigenvalues().iter().copied().collect();

    // Scale-aware zero test: rates here are ~1e-3, so an absolute cutoff would not do.
    let scale = eigenvalues.iter().map(|l| l.norm()).fold(0.0, f64::max);
    let tol = 1e-9 * scale.max(f64::MIN_POSITIVE);
    let is_complex = |l: &Complex<f64>| l.im.abs() > tol;

    let kind = if eigenvalues.iter().any(|l| l.re > tol && is_complex(l)) {
        StabilityKind::UnstableOscillatory
    } else if eigenvalues.iter().any(|l| l.re > tol) {
        StabilityKind::Unstable
    } else if eigenvalues.iter().any(|l| l.re.abs() <= tol) {
        StabilityKind::Marginal
    } else if eigenvalues.iter().any(is_complex) {
        StabilityKind::StableFocus
    } else {
        StabilityKind::StableNode
    };

    Ok(Stability { kind, eigenvalues })
}

fn solve_linear_system(dim: usize, jacobian: &[f64], residual: &[f64]) -> Result<Vec<f64>> {
    let j_matrix = DMatrix::from_row_slice(dim, dim, jacobian);
    let rhs = DVector::from_column_slice(residual);
    j_matrix
        .lu()
        .solve(&rhs)
        .map(|v| v.iter().cloned().collect())
        .ok_or_else(|| anyhow!("Jacobian is singular."))
}

fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AutoInhibition, BasicExpression, Binding, Repressilator};

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn jacobian_of_basic_model_is_constant() {
        let model = BasicExpression::default();
        let jac = jacobian(&model, &[0.3, 0.7]);
        assert_eq!(jac, vec![-1e-3, 0.0, 2e-3, -1e-3]);
    }

    #[test]
    fn basic_model_is_a_stable_node() {
        let model = BasicExpression::default();
        let ss = find_steady_state(&model, &[0.0, 0.0], NewtonSettings::default()).unwrap();
        assert!((ss.state[0] - 1.0).abs() < 1e-12);
        assert!((ss.state[1] - 2.0).abs() < 1e-12);
        // Linear system: one Newton step lands exactly.
        assert_eq!(ss.iterations, 1);
        // Repeated eigenvalue -δ from a defective matrix.
        assert!(ss.stability.is_stable());
        assert!((ss.stability.spectral_abscissa() + 1e-3).abs() < 1e-9);
    }

    #[test]
    fn auto_inhibition_newton_agrees_with_bisection() {
        let model = AutoInhibition::default();
        let ss = find_steady_state(&model, &[0.0, 1e-4], NewtonSettings::default()).unwrap();
        let p = model.steady_state_protein().unwrap();
        assert!((ss.state[1] - p).abs() / p < 1e-8);
        assert!(model.hill_balance_residual(ss.state[1]).abs() < 1e-14);
        assert!(ss.stability.is_stable());
    }

    #[test]
    fn repressilator_fixed_point_is_oscillatory_unstable() {
        let model = Repressilator::default();
        // Symmetric fixed point near p³ ≈ 2·10⁻⁶.
        let guess = [0.0063, 0.0126, 0.0063, 0.0126, 0.0063, 0.0126];
        let ss = find_steady_state(&model, &guess, NewtonSettings::default()).unwrap();

        let p = ss.state[1];
        assert!((ss.state[3] - p).abs() < 1e-12);
        assert!((ss.state[5] - p).abs() < 1e-12);
        assert_eq!(ss.stability.kind, StabilityKind::UnstableOscillatory);
        assert!(ss.stability.spectral_abscissa() > 0.0);
    }

    #[test]
    fn binding_equilibria_form_a_line_so_newton_fails() {
        // Conservation laws make the Jacobian singular everywhere.
        let model = Binding::default();
        assert_err_contains(
            find_steady_state(&model, &[1.0, 5.0, 0.0], NewtonSettings::default()),
            "singular",
        );
    }

    #[test]
    fn rejects_invalid_inputs() {
        let model = BasicExpression::default();
        assert_err_contains(
            find_steady_state(&model, &[0.0], NewtonSettings::default()),
            "dimension mismatch",
        );
        let settings = NewtonSettings {
            max_steps: 0,
            ..NewtonSettings::default()
        };
        assert_err_contains(find_steady_state(&model, &[0.0, 0.0], settings), "max_steps");

        let broken = BasicExpression {
            ktl: -1.0,
            ..BasicExpression::default()
        };
        assert_err_contains(
            find_steady_state(&broken, &[0.0, 0.0], NewtonSettings::default()),
            "ktl",
        );
    }
}
