use crate::traits::{lit, DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half: T = lit(0.5);
        let sixth: T = lit(1.0 / 6.0);
        let two: T = lit(2.0);
        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

// Tsitouras (2011) 5(4) tableau.
const C: [f64; 6] = [0.161, 0.327, 0.9, 0.9800255409045097, 1.0, 1.0];

const A2: [f64; 1] = [0.161];
const A3: [f64; 2] = [-0.008480655492356989, 0.335480655492357];
const A4: [f64; 3] = [2.897153057105493, -6.359448489975075, 4.3622954328695815];
const A5: [f64; 4] = [
    5.325864828439257,
    -11.748883564062828,
    7.4955393428898365,
    -0.09249506636175525,
];
const A6: [f64; 5] = [
    5.86145544294642,
    -12.92096931784711,
    8.159367898576159,
    -0.071584973281401,
    -0.028269050394068383,
];
// 5th order weights (the seventh stage is FSAL and carries weight zero).
const B: [f64; 6] = [
    0.09646076681806523,
    0.01,
    0.4798896504144996,
    1.379008574103742,
    -3.290069515436081,
    2.324710524099774,
];
// b - b̂, including the seventh stage evaluated at the new state.
const BTILDE: [f64; 7] = [
    -0.00178001105222577714,
    -0.0008164344596567469,
    0.007880878010261995,
    -0.1447110071732629,
    0.5823571654525552,
    -0.45808210592918697,
    1.0 / 66.0,
];

/// Tsitouras 5/4 Solver
///
/// `step` advances with the 5th order solution only; `try_step` additionally
/// evaluates the FSAL stage and writes a per-component local error estimate.
pub struct Tsit5<T: Scalar> {
    k: [Vec<T>; 7],
    tmp: Vec<T>,
    next: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k: std::array::from_fn(|_| vec![z; dim]),
            tmp: vec![z; dim],
            next: vec![z; dim],
        }
    }

    /// Evaluates stages k1..k6 at (t0, state) and writes y_{n+1} into `out`.
    fn stages(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t0: T,
        state: &[T],
        dt: T,
        out: &mut [T],
    ) {
        let dim = state.len();
        system.apply(t0, state, &mut self.k[0]);

        let rows: [&[f64]; 5] = [&A2, &A3, &A4, &A5, &A6];
        for (stage, row) in rows.iter().enumerate() {
            for i in 0..dim {
                let mut acc = T::zero();
                for (j, &a) in row.iter().enumerate() {
                    acc = acc + lit::<T>(a) * self.k[j][i];
                }
                self.tmp[i] = state[i] + dt * acc;
            }
            system.apply(t0 + lit::<T>(C[stage]) * dt, &self.tmp, &mut self.k[stage + 1]);
        }

        for i in 0..dim {
            let mut acc = T::zero();
            for (j, &b) in B.iter().enumerate() {
                acc = acc + lit::<T>(b) * self.k[j][i];
            }
            out[i] = state[i] + dt * acc;
        }
    }

    /// Attempts one step without committing it.
    /// Writes the candidate state into `proposal` and the local error estimate into `error`.
    pub fn try_step(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        proposal: &mut [T],
        error: &mut [T],
    ) {
        self.stages(system, t, state, dt, proposal);
        system.apply(t + dt, &*proposal, &mut self.k[6]);

        for i in 0..state.len() {
            let mut acc = T::zero();
            for (j, &e) in BTILDE.iter().enumerate() {
                acc = acc + lit::<T>(e) * self.k[j][i];
            }
            error[i] = dt * acc;
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;
        let mut next = std::mem::take(&mut self.next);
        self.stages(system, t0, state, dt, &mut next);
        state.copy_from_slice(&next);
        self.next = next;
        *t = t0 + dt;
    }
}

#[cfg(test)]
mod tests {
    use super::{Tsit5, RK4};
    use crate::traits::{DynamicalSystem, Steppable};

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    struct Oscillator;

    impl DynamicalSystem<f64> for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = x[1];
            out[1] = -x[0];
        }
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let system = Decay { rate: 0.5 };
        let mut solver = RK4::new(1);
        let mut t = 0.0;
        let mut state = vec![1.0];
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, 0.02);
        }
        assert!((t - 2.0).abs() < 1e-12);
        assert!((state[0] - (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn tsit5_is_fifth_order_accurate_on_rotation() {
        let system = Oscillator;
        let mut solver = Tsit5::new(2);
        let mut t = 0.0;
        let mut state = vec![1.0, 0.0];
        let dt = std::f64::consts::PI / 50.0;
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, dt);
        }
        // One full period returns to the start.
        assert!((state[0] - 1.0).abs() < 1e-7);
        assert!(state[1].abs() < 1e-7);
    }

    #[test]
    fn tsit5_converges_at_fifth_order() {
        let system = Decay { rate: 1.0 };
        let exact = (-1.0f64).exp();
        let errors: Vec<f64> = [10, 20, 40]
            .iter()
            .map(|&n| {
                let mut solver = Tsit5::new(1);
                let mut t = 0.0;
                let mut state = vec![1.0];
                for _ in 0..n {
                    solver.step(&system, &mut t, &mut state, 1.0 / n as f64);
                }
                (state[0] - exact).abs()
            })
            .collect();
        // Halving h cuts the error by about 2^5.
        assert!(errors[0] / errors[1] > 20.0, "errors {errors:?}");
        assert!(errors[1] / errors[2] > 20.0, "errors {errors:?}");
    }

    #[test]
    fn tsit5_step_matches_try_step_proposal() {
        let system = Oscillator;
        let mut stepper = Tsit5::new(2);
        let mut checker = Tsit5::new(2);
        let mut t = 0.0;
        let mut state = vec![1.0, 0.0];
        let mut proposal = [0.0; 2];
        let mut error = [0.0; 2];
        for _ in 0..3 {
            checker.try_step(&system, t, &state, 0.1, &mut proposal, &mut error);
            stepper.step(&system, &mut t, &mut state, 0.1);
            assert_eq!(state, proposal);
        }
        assert!((t - 0.3).abs() < 1e-15);
    }

    #[test]
    fn tsit5_error_estimate_shrinks_with_step() {
        let system = Decay { rate: 1.0 };
        let mut solver = Tsit5::new(1);
        let mut proposal = [0.0];
        let mut error = [0.0];

        solver.try_step(&system, 0.0, &[1.0], 0.2, &mut proposal, &mut error);
        let coarse = error[0].abs();
        assert!((proposal[0] - (-0.2f64).exp()).abs() < 1e-6);

        solver.try_step(&system, 0.0, &[1.0], 0.1, &mut proposal, &mut error);
        let fine = error[0].abs();

        assert!(coarse > 0.0);
        // Embedded 4th order estimate: halving h shrinks the error by about 2^5.
        assert!(fine < coarse / 16.0);
    }
}
