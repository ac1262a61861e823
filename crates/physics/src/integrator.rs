//! # Numerical Integration
//!
//! This module advances the state `x = [q, v]` of the engine. Two solvers are
//! available:
//!
//! -   [`Solver::ExplicitEuler`]: fixed steps of at most `dt_max`.
//! -   [`Solver::RungeKuttaDopri5`]: the Dormand–Prince 5(4) pair with
//!     first-same-as-last reuse and error-controlled step size.
//!
//! The derivative at the current state is carried between steps (`dxdt`), so
//! the caller must refresh it whenever the dynamics change, e.g. after a new
//! command is latched.

use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    ExplicitEuler,
    #[default]
    RungeKuttaDopri5,
}

/// Smallest step the adaptive solver may shrink to.
const MIN_STEP: f64 = 1.0e-12;
const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 5.0;
const MAX_SHRINK: f64 = 0.2;

const A: [[f64; 6]; 7] = [
    [0.0; 6],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];
/// Difference between the fifth and fourth order weights.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339_200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attempt {
    Accepted,
    Rejected,
}

pub(crate) struct Stepper {
    solver: Solver,
    tol_abs: f64,
    tol_rel: f64,
    /// Step size the next attempt should use.
    pub dt: f64,
    stages: Vec<Vec<f64>>,
    scratch: Vec<f64>,
}

impl Stepper {
    pub(crate) fn new(solver: Solver, tol_abs: f64, tol_rel: f64, dt: f64, nx: usize) -> Self {
        Self {
            solver,
            tol_abs,
            tol_rel,
            dt,
            stages: vec![vec![0.0; nx]; 7],
            scratch: vec![0.0; nx],
        }
    }

    /// Tries one step of length `h` from `(t, x)` with `dxdt = f(x)`.
    ///
    /// On acceptance `t`, `x` and `dxdt` move to the end of the step. On
    /// rejection they are untouched and `self.dt` holds a smaller step.
    pub(crate) fn try_step<F>(
        &mut self,
        rhs: &mut F,
        t: &mut f64,
        x: &mut [f64],
        dxdt: &mut [f64],
        h: f64,
    ) -> Result<Attempt, PhysicsError>
    where
        F: FnMut(&[f64], &mut [f64]) -> Result<(), PhysicsError>,
    {
        match self.solver {
            Solver::ExplicitEuler => {
                for (xi, di) in x.iter_mut().zip(dxdt.iter()) {
                    *xi += h * di;
                }
                *t += h;
                rhs(x, dxdt)?;
                Ok(Attempt::Accepted)
            }
            Solver::RungeKuttaDopri5 => self.try_dopri5(rhs, t, x, dxdt, h),
        }
    }

    fn try_dopri5<F>(
        &mut self,
        rhs: &mut F,
        t: &mut f64,
        x: &mut [f64],
        dxdt: &mut [f64],
        h: f64,
    ) -> Result<Attempt, PhysicsError>
    where
        F: FnMut(&[f64], &mut [f64]) -> Result<(), PhysicsError>,
    {
        self.stages[0].copy_from_slice(dxdt);
        for (stage, weights) in A.iter().enumerate().skip(1) {
            for (i, (next, &xi)) in self.scratch.iter_mut().zip(x.iter()).enumerate() {
                let increment: f64 =
                    weights[..stage].iter().zip(&self.stages).map(|(a, k)| a * k[i]).sum();
                *next = xi + h * increment;
            }
            rhs(&self.scratch, &mut self.stages[stage])?;
        }

        // The last stage input is the fifth-order solution.
        let mut error = 0.0_f64;
        for (i, (&xi, &next)) in x.iter().zip(&self.scratch).enumerate() {
            let estimate: f64 = E.iter().zip(&self.stages).map(|(e, k)| e * k[i]).sum::<f64>() * h;
            let scale = self.tol_abs + self.tol_rel * xi.abs().max(next.abs());
            error = error.max((estimate / scale).abs());
        }
        if !error.is_finite() {
            return Err(PhysicsError::Diverged { time: *t });
        }

        if error <= 1.0 {
            x.copy_from_slice(&self.scratch);
            dxdt.copy_from_slice(&self.stages[6]);
            *t += h;
            let growth = if error < 0.5 {
                if error > 0.0 {
                    (SAFETY * error.powf(-0.2)).min(MAX_GROWTH)
                } else {
                    MAX_GROWTH
                }
            } else {
                1.0
            };
            // A step clipped to hit a breakpoint must not shrink the next one.
            self.dt = self.dt.max(h * growth);
            Ok(Attempt::Accepted)
        } else {
            let shrink = (SAFETY * error.powf(-1.0 / 3.0)).max(MAX_SHRINK);
            self.dt = h * shrink;
            if self.dt < MIN_STEP {
                return Err(PhysicsError::StepSizeUnderflow { time: *t });
            }
            Ok(Attempt::Rejected)
        }
    }
}
