//! Property-based checks of the rate laws, independent of the integrator.

use genex_core::equilibrium::jacobian;
use genex_core::models::{
    hill_activation, hill_repression, AutoInhibition, BasicExpression, Binding, GeneParams,
    Repressilator,
};
use genex_core::traits::DynamicalSystem;
use proptest::prelude::*;

fn rate() -> impl Strategy<Value = f64> {
    1e-5f64..1e-1
}

proptest! {
    /// Whatever A, B and C are, the binding flux moves one A and one B per C.
    #[test]
    fn binding_derivatives_conserve_totals(
        a in 0.0f64..10.0,
        b in 0.0f64..10.0,
        c in 0.0f64..10.0,
        ka in rate(),
        kd in rate(),
        n in 1.0f64..4.0,
    ) {
        let model = Binding { ka, kd, n };
        let mut out = [0.0; 3];
        DynamicalSystem::<f64>::apply(&model, 0.0, &[a, b, c], &mut out);
        prop_assert_eq!(out[0] + out[2], 0.0);
        prop_assert_eq!(out[1] + out[2], 0.0);
    }

    #[test]
    fn hill_terms_stay_in_unit_interval(
        x in 0.0f64..1e3,
        k in 1e-9f64..1e3,
        n in 0.5f64..4.0,
    ) {
        let up: f64 = hill_activation(x, k, n);
        let down: f64 = hill_repression(x, k, n);
        prop_assert!((0.0..=1.0).contains(&up), "activation {}", up);
        prop_assert!((0.0..=1.0).contains(&down), "repression {}", down);
    }

    /// With no mRNA left, transcription still runs at least at the leak rate.
    #[test]
    fn repressilator_mrna_never_decays_from_zero(
        p1 in 0.0f64..1.0,
        p2 in 0.0f64..1.0,
        p3 in 0.0f64..1.0,
        alpha0 in 1e-9f64..1e-5,
    ) {
        let model = Repressilator::symmetric(GeneParams { alpha0, ..GeneParams::default() });
        let mut out = [0.0; 6];
        DynamicalSystem::<f64>::apply(&model, 0.0, &[0.0, p1, 0.0, p2, 0.0, p3], &mut out);
        for gene in 0..3 {
            prop_assert!(out[Repressilator::mrna_index(gene)] >= alpha0);
        }
    }

    #[test]
    fn basic_steady_state_is_a_fixed_point(
        ktx in rate(),
        delta_mrna in rate(),
        ktl in rate(),
        delta_protein in rate(),
    ) {
        let model = BasicExpression { ktx, delta_mrna, ktl, delta_protein };
        let state = model.steady_state();
        let mut out = [0.0; 2];
        DynamicalSystem::<f64>::apply(&model, 0.0, &state, &mut out);
        prop_assert!(out[0].abs() <= 1e-12 * ktx);
        prop_assert!(out[1].abs() <= 1e-12 * ktl * state[0]);
    }

    /// The Hill balance falls with protein, and the bisection root sits where it crosses zero.
    #[test]
    fn auto_inhibition_balance_is_decreasing(
        kd in 1e-10f64..1e-4,
        p in 1e-9f64..1e-2,
    ) {
        let model = AutoInhibition { kd, ..AutoInhibition::default() };
        prop_assert!(model.hill_balance_residual(p) > model.hill_balance_residual(2.0 * p));

        let root = model.steady_state_protein().unwrap();
        let scale = model.ktl * model.ktx / model.delta_mrna;
        prop_assert!(model.hill_balance_residual(root).abs() <= 1e-12 * scale);
    }

    /// Dual-number Jacobian against the hand-derived entries for n = 1.
    #[test]
    fn auto_inhibition_jacobian_matches_closed_form(
        mrna in 0.0f64..1e-2,
        protein in 0.0f64..1e-4,
    ) {
        let model = AutoInhibition::default();
        let jac = jacobian(&model, &[mrna, protein]);
        let expected = -model.ktx * model.kd / (model.kd + protein).powi(2);
        prop_assert_eq!(jac[0], -model.delta_mrna);
        prop_assert!((jac[1] - expected).abs() <= 1e-9 * expected.abs());
        prop_assert_eq!(jac[2], model.ktl);
        prop_assert_eq!(jac[3], -model.delta_protein);
    }
}
