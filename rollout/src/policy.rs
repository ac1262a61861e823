//! Policies the driver can run without training.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait Policy {
    fn act(&mut self, observation: &[f64; 4]) -> usize;
}

/// Uniform choice among `actions` discrete actions.
pub struct RandomPolicy {
    rng: StdRng,
    actions: usize,
}

impl RandomPolicy {
    #[must_use]
    pub fn new(actions: usize, seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), actions }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _observation: &[f64; 4]) -> usize {
        self.rng.gen_range(0..self.actions)
    }
}

/// Pushes the cart under the pole: right when the pole leans or falls right.
pub struct CartPoleHeuristic;

impl Policy for CartPoleHeuristic {
    fn act(&mut self, observation: &[f64; 4]) -> usize {
        let [x, theta, x_dot, theta_dot] = *observation;
        let lean = theta + 0.3 * theta_dot + 0.01 * x + 0.02 * x_dot;
        usize::from(lean > 0.0)
    }
}

/// Pumps energy into the swing by torquing along the upper link's motion.
pub struct AcrobotHeuristic;

impl Policy for AcrobotHeuristic {
    fn act(&mut self, observation: &[f64; 4]) -> usize {
        let theta_1_dot = observation[2];
        if theta_1_dot > 0.0 {
            2
        } else if theta_1_dot < 0.0 {
            0
        } else {
            1
        }
    }
}
