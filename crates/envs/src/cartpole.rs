//! Cart-pole balancing task.
//!
//! A pole is hinged on a cart that slides along a frictionless rail. Each
//! step pushes the cart left or right with a constant force for `dt`
//! seconds. The episode ends once the cart leaves the rail section or the
//! pole leans too far; every step until then earns a reward of one.

use std::sync::{Arc, Mutex};

use physics::{Engine, Frame};
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{Env, Info, RenderMode, Space, Step};
use crate::episode::EpisodeTracker;
use crate::error::EnvError;
use crate::simulator::{build_engine, Simulator};

/// Model description of the cart and pole.
pub const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/cartpole/cartpole.json");
/// Episode length the task is usually run with, see [`crate::TimeLimit`].
pub const MAX_EPISODE_STEPS: usize = 200;

const MOTOR: &str = "slider_to_cart";
const ENCODERS: [(&str, &str); 2] = [("Slider", "slider_to_cart"), ("Pole", "cart_to_pole")];
/// Half-width of the initial state distribution.
const RESET_SCALE: [f64; 4] = [0.5, 0.15, 0.1, 0.1];

/// Constants of the task.
#[derive(Clone, Debug, PartialEq)]
pub struct CartPoleConfig {
    /// Control period in seconds
    pub dt: f64,
    /// Force applied to the cart by each action (N)
    pub force_mag: f64,
    /// Pole angle beyond which the episode fails (radians)
    pub theta_threshold: f64,
    /// Cart position beyond which the episode fails (meters)
    pub x_threshold: f64,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            dt: 2.0e-3,
            force_mag: 40.0,
            theta_threshold: 25.0_f64.to_radians(),
            x_threshold: 0.75,
        }
    }
}

impl CartPoleConfig {
    /// Nominal observation bound. Twice the failure thresholds so that
    /// failing observations remain inside the space.
    #[must_use]
    pub fn high(&self) -> [f64; 4] {
        [2.0 * self.x_threshold, 2.0 * self.theta_threshold, f64::MAX, f64::MAX]
    }

    /// Failure rule. Observations on a threshold still count as balanced.
    #[must_use]
    pub fn is_terminal(&self, observation: &[f64; 4]) -> bool {
        let [x, theta, ..] = *observation;
        x < -self.x_threshold
            || x > self.x_threshold
            || theta < -self.theta_threshold
            || theta > self.theta_threshold
    }
}

/// Observation `[x, θ, ẋ, θ̇]`. Action `0` pushes left, `1` pushes right.
pub struct CartPoleEnv<S = Engine> {
    simulator: S,
    config: CartPoleConfig,
    rng: StdRng,
    episode: EpisodeTracker,
    action_space: Space,
    observation_space: Space,
    render_lock: Option<Arc<Mutex<()>>>,
}

impl CartPoleEnv<Engine> {
    /// Loads the cart-pole model and seeds from entropy.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::Simulation`] when the model description cannot
    /// be loaded.
    pub fn new() -> Result<Self, EnvError> {
        let config = CartPoleConfig::default();
        let engine = build_engine(MODEL_PATH, &[MOTOR], &ENCODERS, config.dt)?;
        Ok(Self::with_simulator(engine, config))
    }
}

impl<S: Simulator> CartPoleEnv<S> {
    /// Runs the task over `simulator`, whose state must be `[x, θ, ẋ, θ̇]`
    /// with the cart force as its only command.
    #[must_use]
    pub fn with_simulator(simulator: S, config: CartPoleConfig) -> Self {
        let observation_space = Space::symmetric(&config.high());
        let mut env = Self {
            simulator,
            config,
            rng: StdRng::seed_from_u64(0),
            episode: EpisodeTracker::new(),
            action_space: Space::Discrete(2),
            observation_space,
            render_lock: None,
        };
        env.seed(None);
        env
    }

    #[must_use]
    pub fn config(&self) -> &CartPoleConfig {
        &self.config
    }

    #[must_use]
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.simulator
    }

    #[must_use]
    pub fn steps_beyond_done(&self) -> Option<u32> {
        self.episode.steps_beyond_done()
    }

    /// Lock held while drawing, shared with other environments that draw to
    /// the same output.
    pub fn set_render_lock(&mut self, lock: Arc<Mutex<()>>) {
        self.render_lock = Some(lock);
    }

    /// Current simulation state as an observation.
    #[must_use]
    pub fn observation(&self) -> [f64; 4] {
        let state = self.simulator.state();
        std::array::from_fn(|i| state[i])
    }
}

impl<S: Simulator> Env for CartPoleEnv<S> {
    type Action = usize;
    type Observation = [f64; 4];

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn seed(&mut self, seed: Option<u64>) -> u64 {
        let seed = seed.unwrap_or_else(rand::random);
        self.rng = StdRng::seed_from_u64(seed);
        self.simulator.seed(seed);
        seed
    }

    fn reset(&mut self) -> Result<[f64; 4], EnvError> {
        let unit = Uniform::new_inclusive(-1.0, 1.0);
        let x0: Vec<f64> = RESET_SCALE.iter().map(|scale| scale * self.rng.sample(unit)).collect();
        self.simulator.reset(&x0)?;
        self.episode.clear();
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step<[f64; 4]>, EnvError> {
        if !self.action_space.contains_action(action) {
            return Err(EnvError::InvalidAction { action, n: self.action_space.size() });
        }
        let force = if action == 1 { self.config.force_mag } else { -self.config.force_mag };
        self.simulator.set_command(&[force])?;
        self.simulator.step(self.config.dt)?;

        let observation = self.observation();
        let terminal = self.config.is_terminal(&observation);
        let reward = self.episode.record(terminal, 1.0);
        Ok(Step { observation, reward, terminal, info: Info::new() })
    }

    fn render(&mut self, mode: RenderMode) -> Result<Frame, EnvError> {
        match mode {
            RenderMode::Human => Ok(self.simulator.render(self.render_lock.as_deref())?),
        }
    }

    fn close(&mut self) {
        self.simulator.close();
    }
}
