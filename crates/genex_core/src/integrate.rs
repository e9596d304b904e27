use crate::{
    error::IntegrationError,
    grid::{IntegrationStats, TimeGrid, Trajectory},
    solvers::{Tsit5, RK4},
    traits::{DynamicalSystem, Steppable},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Tsitouras 5(4) with embedded error control.
    AdaptiveTsit5,
    /// Classic RK4, one step per grid interval.
    FixedRk4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    pub method: IntegrationMethod,
    pub rtol: f64,
    pub atol: f64,
    /// First trial step; `None` picks one from the derivative scale.
    pub initial_step: Option<f64>,
    pub min_step: f64,
    /// Upper bound on attempted steps inside a single grid interval.
    pub max_steps_per_interval: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            method: IntegrationMethod::AdaptiveTsit5,
            rtol: 1e-8,
            atol: 1e-12,
            initial_step: None,
            min_step: 1e-12,
            max_steps_per_interval: 10_000,
        }
    }
}

impl IntegratorSettings {
    pub fn fixed_rk4() -> Self {
        Self {
            method: IntegrationMethod::FixedRk4,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), IntegrationError> {
        let bad = |msg: String| Err(IntegrationError::InvalidSettings(msg));
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return bad(format!("rtol must be positive, got {}", self.rtol));
        }
        if !(self.atol.is_finite() && self.atol >= 0.0) {
            return bad(format!("atol must be non-negative, got {}", self.atol));
        }
        if !(self.min_step.is_finite() && self.min_step > 0.0) {
            return bad(format!("min_step must be positive, got {}", self.min_step));
        }
        if let Some(h) = self.initial_step {
            if !(h.is_finite() && h > 0.0) {
                return bad(format!("initial_step must be positive, got {h}"));
            }
        }
        if self.max_steps_per_interval == 0 {
            return bad("max_steps_per_interval must be at least 1".to_string());
        }
        Ok(())
    }
}

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const REJECTION_WARN_RATIO: f64 = 0.5;

/// Solves the initial value problem and samples the solution at every grid time.
///
/// The first row is `initial` itself. Integration stops with an error rather than
/// returning a partial or NaN-filled table.
pub fn integrate<S>(
    system: &S,
    initial: &[f64],
    grid: &TimeGrid,
    settings: &IntegratorSettings,
) -> Result<Trajectory, IntegrationError>
where
    S: DynamicalSystem<f64> + ?Sized,
{
    let dim = system.dimension();
    if dim == 0 {
        return Err(IntegrationError::InvalidSettings(
            "system has zero dimension".to_string(),
        ));
    }
    if initial.len() != dim {
        return Err(IntegrationError::DimensionMismatch {
            expected: dim,
            got: initial.len(),
        });
    }
    if let Some((component, &value)) = initial.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(IntegrationError::NonFiniteInitialState { component, value });
    }
    settings.validate()?;

    let times = grid.times();
    let mut values = Vec::with_capacity(times.len() * dim);
    values.extend_from_slice(initial);

    let stats = match settings.method {
        IntegrationMethod::AdaptiveTsit5 => {
            run_adaptive(system, initial, times, settings, &mut values)?
        }
        IntegrationMethod::FixedRk4 => run_fixed(system, initial, times, &mut values)?,
    };

    debug!(
        rows = times.len(),
        dimension = dim,
        accepted = stats.accepted_steps,
        rejected = stats.rejected_steps,
        evaluations = stats.evaluations,
        "integration finished"
    );
    let total = stats.accepted_steps + stats.rejected_steps;
    if total > 0 && stats.rejected_steps as f64 / total as f64 > REJECTION_WARN_RATIO {
        warn!(
            rejected = stats.rejected_steps,
            total, "more than half of the attempted steps were rejected; the system may be stiff"
        );
    }

    Ok(Trajectory::new(times.to_vec(), Vec::new(), dim, values, stats))
}

fn run_fixed<S>(
    system: &S,
    initial: &[f64],
    times: &[f64],
    values: &mut Vec<f64>,
) -> Result<IntegrationStats, IntegrationError>
where
    S: DynamicalSystem<f64> + ?Sized,
{
    let dim = initial.len();
    let mut solver = RK4::new(dim);
    let mut state = initial.to_vec();
    let mut stats = IntegrationStats::default();

    for window in times.windows(2) {
        let mut t = window[0];
        solver.step(&system, &mut t, &mut state, window[1] - window[0]);
        stats.accepted_steps += 1;
        stats.evaluations += 4;
        check_finite(&state, window[1])?;
        values.extend_from_slice(&state);
    }
    Ok(stats)
}

fn run_adaptive<S>(
    system: &S,
    initial: &[f64],
    times: &[f64],
    settings: &IntegratorSettings,
    values: &mut Vec<f64>,
) -> Result<IntegrationStats, IntegrationError>
where
    S: DynamicalSystem<f64> + ?Sized,
{
    let dim = initial.len();
    let mut solver = Tsit5::new(dim);
    let mut stats = IntegrationStats::default();
    let mut state = initial.to_vec();
    let mut proposal = vec![0.0; dim];
    let mut error = vec![0.0; dim];
    let mut t = times[0];

    let mut h = match settings.initial_step {
        Some(h) => h,
        None => {
            stats.evaluations += 1;
            initial_step_guess(system, t, &state, settings)
        }
    };

    for &target in &times[1..] {
        let mut attempts = 0usize;
        while t < target {
            if attempts >= settings.max_steps_per_interval {
                return Err(IntegrationError::StepBudgetExhausted {
                    t,
                    target,
                    max_steps: settings.max_steps_per_interval,
                });
            }
            attempts += 1;

            let remaining = target - t;
            // Land exactly on the grid point instead of leaving a sliver behind.
            let lands = h >= remaining * (1.0 - 1e-12);
            let dt = if lands { remaining } else { h };

            solver.try_step(&system, t, &state, dt, &mut proposal, &mut error);
            stats.evaluations += 7;

            let err = error_norm(&state, &proposal, &error, settings);
            if !err.is_finite() {
                // Shrink hard and retry; a non-finite proposal is an overshoot, not yet a failure.
                stats.rejected_steps += 1;
                h = dt * MIN_FACTOR;
                if h < settings.min_step {
                    check_finite(&proposal, t + dt)?;
                    return Err(IntegrationError::StepSizeUnderflow { t, step: h });
                }
                continue;
            }

            let factor = if err == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if err <= 1.0 {
                stats.accepted_steps += 1;
                state.copy_from_slice(&proposal);
                t = if lands { target } else { t + dt };
                // A step shortened to hit the grid should not shrink the next proposal.
                h = if lands { h.max(dt * factor) } else { dt * factor };
            } else {
                stats.rejected_steps += 1;
                h = dt * factor;
                if h < settings.min_step {
                    return Err(IntegrationError::StepSizeUnderflow { t, step: h });
                }
            }
        }
        check_finite(&state, target)?;
        values.extend_from_slice(&state);
    }

    Ok(stats)
}

/// Weighted RMS norm of the local error estimate.
fn error_norm(state: &[f64], proposal: &[f64], error: &[f64], settings: &IntegratorSettings) -> f64 {
    let sum: f64 = state
        .iter()
        .zip(proposal)
        .zip(error)
        .map(|((&y0, &y1), &e)| {
            let scale = settings.atol + settings.rtol * y0.abs().max(y1.abs());
            let r = if scale > 0.0 { e / scale } else { e };
            r * r
        })
        .sum();
    (sum / state.len() as f64).sqrt()
}

/// Heuristic first step: a small fraction of the time scale set by |y| / |f(y)|.
fn initial_step_guess<S>(system: &S, t: f64, state: &[f64], settings: &IntegratorSettings) -> f64
where
    S: DynamicalSystem<f64> + ?Sized,
{
    let mut deriv = vec![0.0; state.len()];
    system.apply(t, state, &mut deriv);

    let mut d0 = 0.0;
    let mut d1 = 0.0;
    for (&y, &f) in state.iter().zip(&deriv) {
        let scale = settings.atol + settings.rtol * y.abs();
        let scale = if scale > 0.0 { scale } else { 1.0 };
        d0 += (y / scale).powi(2);
        d1 += (f / scale).powi(2);
    }
    let n = state.len() as f64;
    let (d0, d1) = ((d0 / n).sqrt(), (d1 / n).sqrt());

    let guess = if d0 < 1e-5 || d1 < 1e-5 || !d1.is_finite() {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    guess.max(settings.min_step)
}

fn check_finite(state: &[f64], t: f64) -> Result<(), IntegrationError> {
    match state.iter().position(|v| !v.is_finite()) {
        Some(component) => Err(IntegrationError::NonFiniteState { t, component }),
        None => Ok(()),
    }
}
