pub mod analysis;
pub mod autodiff;
pub mod equilibrium;
pub mod error;
pub mod grid;
pub mod integrate;
pub mod models;
pub mod plot;
pub mod scenario;
pub mod solvers;
/// The `genex_core` crate simulates small gene-expression circuits written as
/// systems of ordinary differential equations.
/// Model code is generic over the scalar type, so the same derivative rules run on
/// `f64` for integration and on Dual numbers for exact Jacobians.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (right-hand sides), `Steppable` (Solvers).
/// - **Models**: basic expression, auto-inhibition, reversible binding and the repressilator.
/// - **Solvers / Integrate**: RK4 and Tsit5 steppers, and the adaptive driver that samples a `TimeGrid`.
/// - **Equilibrium / Analysis**: Newton steady states, eigenvalue stability, peak and period detection.
/// - **Plot / Scenario**: figure descriptions and the preset runs matching each model.
pub mod traits;
