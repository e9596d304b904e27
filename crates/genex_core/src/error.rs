use thiserror::Error;

/// Failures of the integration driver. A trajectory is only returned when every
/// grid point was reached with a finite state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("Initial state dimension mismatch. Expected {expected}, got {got}.")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid time grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid integrator settings: {0}")]
    InvalidSettings(String),

    #[error("Initial state component {component} is not finite ({value}).")]
    NonFiniteInitialState { component: usize, value: f64 },

    #[error("Step size underflow at t = {t}: h = {step} fell below the minimum step.")]
    StepSizeUnderflow { t: f64, step: f64 },

    #[error("Step budget of {max_steps} exhausted before reaching t = {target} (stopped at t = {t}).")]
    StepBudgetExhausted { t: f64, target: f64, max_steps: usize },

    #[error("State component {component} became non-finite at t = {t}.")]
    NonFiniteState { t: f64, component: usize },
}

/// Rejections raised by explicit model and scenario validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Parameter `{name}` must be finite, got {value}.")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Parameter `{name}` must be positive, got {value}.")]
    NonPositive { name: &'static str, value: f64 },

    #[error("Parameter `{name}` must be non-negative, got {value}.")]
    Negative { name: &'static str, value: f64 },

    #[error("Initial concentration of {species} must be finite and non-negative, got {value}.")]
    InvalidConcentration { species: &'static str, value: f64 },

    #[error("Initial state has {got} components but the model has {expected} species.")]
    SpeciesCountMismatch { expected: usize, got: usize },
}

pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if !value.is_finite() {
        return Err(ParameterError::NonFinite { name, value });
    }
    if value <= 0.0 {
        return Err(ParameterError::NonPositive { name, value });
    }
    Ok(())
}

pub(crate) fn require_non_negative(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if !value.is_finite() {
        return Err(ParameterError::NonFinite { name, value });
    }
    if value < 0.0 {
        return Err(ParameterError::Negative { name, value });
    }
    Ok(())
}
