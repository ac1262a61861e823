//! Acrobot swing-up task.
//!
//! Two links hang from a fixed pivot and only the elbow is actuated. The
//! goal is to swing the tip of the lower link above a target height. Every
//! step before reaching it costs a reward of minus one.
//!
//! The elbow takes either three discrete torques ([`DiscreteTorque`], the
//! default) or any torque clipped to the motor range ([`ContinuousTorque`]).
//! [`AcrobotGoalEnv`] turns either into a goal-conditioned task whose target
//! height changes every episode.

use std::f64::consts::{PI, TAU};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use physics::{Engine, Frame};
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{Env, Info, InfoValue, RenderMode, Space, Step};
use crate::episode::EpisodeTracker;
use crate::error::EnvError;
use crate::simulator::{build_engine, Simulator};

pub const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/acrobot/acrobot.json");
pub const MAX_EPISODE_STEPS: usize = 500;
/// Info key telling whether the tip is above the desired goal.
pub const SUCCESS_KEY: &str = "is_success";

const MOTOR: &str = "second_joint";
const ENCODERS: [(&str, &str); 2] = [("First", "first_joint"), ("Second", "second_joint")];
const RESET_SCALE: f64 = 0.1;
/// Nominal joint speed bounds (rad/s).
const MAX_VEL_1: f64 = 4.0 * PI;
const MAX_VEL_2: f64 = 9.0 * PI;
/// Highest sampled goal, as a fraction of the reach.
const GOAL_FRACTION: f64 = 0.95;

#[derive(Clone, Debug, PartialEq)]
pub struct AcrobotConfig {
    /// Control period in seconds
    pub dt: f64,
    /// Elbow torque applied per action unit (N·m)
    pub torque_mag: f64,
    /// Upper link length (m), must match the model description
    pub link_length_1: f64,
    /// Lower link length (m), must match the model description
    pub link_length_2: f64,
    /// Tip height above the pivot that ends the episode (m)
    pub goal_height: f64,
}

impl Default for AcrobotConfig {
    fn default() -> Self {
        Self {
            dt: 0.05,
            torque_mag: 1.0,
            link_length_1: 1.0,
            link_length_2: 1.0,
            goal_height: 1.0,
        }
    }
}

impl AcrobotConfig {
    /// Height of the tip above the pivot, zero angles hanging straight down.
    #[must_use]
    pub fn tip_height(&self, theta_1: f64, theta_2: f64) -> f64 {
        -self.link_length_1 * theta_1.cos() - self.link_length_2 * (theta_1 + theta_2).cos()
    }

    /// Highest tip height the chain can reach.
    #[must_use]
    pub fn reach(&self) -> f64 {
        self.link_length_1 + self.link_length_2
    }

    #[must_use]
    pub fn is_terminal(&self, observation: &[f64; 4]) -> bool {
        self.tip_height(observation[0], observation[1]) > self.goal_height
    }
}

/// How an action turns into an elbow torque.
pub trait TorqueControl {
    type Action: Copy;

    fn action_space(torque_mag: f64) -> Space;

    /// # Errors
    ///
    /// Fails when `action` does not belong to `space`.
    fn torque(action: Self::Action, space: &Space, torque_mag: f64) -> Result<f64, EnvError>;
}

/// Actions `0`, `1` and `2` apply a negative, zero and positive torque.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscreteTorque;

impl TorqueControl for DiscreteTorque {
    type Action = usize;

    fn action_space(_torque_mag: f64) -> Space {
        Space::Discrete(3)
    }

    #[allow(clippy::cast_precision_loss)]
    fn torque(action: usize, space: &Space, torque_mag: f64) -> Result<f64, EnvError> {
        if !space.contains_action(action) {
            return Err(EnvError::InvalidAction { action, n: space.size() });
        }
        Ok((action as f64 - 1.0) * torque_mag)
    }
}

/// The action is the torque itself, clipped to `±torque_mag`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContinuousTorque;

impl TorqueControl for ContinuousTorque {
    type Action = f64;

    fn action_space(torque_mag: f64) -> Space {
        Space::symmetric(&[torque_mag])
    }

    fn torque(action: f64, _space: &Space, torque_mag: f64) -> Result<f64, EnvError> {
        if !action.is_finite() {
            return Err(EnvError::NonFiniteAction(action));
        }
        Ok(action.clamp(-torque_mag, torque_mag))
    }
}

/// Wraps an angle to `[-π, π)`.
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Observation `[θ₁, θ₂, θ̇₁, θ̇₂]`, angles wrapped to `[-π, π)`. The action
/// type follows the [`TorqueControl`] parameter.
pub struct AcrobotEnv<S = Engine, C = DiscreteTorque> {
    simulator: S,
    config: AcrobotConfig,
    rng: StdRng,
    episode: EpisodeTracker,
    action_space: Space,
    observation_space: Space,
    render_lock: Option<Arc<Mutex<()>>>,
    control: PhantomData<C>,
}

impl AcrobotEnv<Engine> {
    /// Loads the acrobot model with discrete actions and seeds from entropy.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::Simulation`] when the model description cannot
    /// be loaded.
    pub fn new() -> Result<Self, EnvError> {
        let config = AcrobotConfig::default();
        let engine = build_engine(MODEL_PATH, &[MOTOR], &ENCODERS, config.dt)?;
        Ok(Self::with_simulator(engine, config))
    }
}

impl AcrobotEnv<Engine, ContinuousTorque> {
    /// Same as [`AcrobotEnv::new`] with a continuous torque action.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::Simulation`] when the model description cannot
    /// be loaded.
    pub fn continuous() -> Result<Self, EnvError> {
        let config = AcrobotConfig::default();
        let engine = build_engine(MODEL_PATH, &[MOTOR], &ENCODERS, config.dt)?;
        Ok(Self::with_simulator(engine, config))
    }
}

impl<S: Simulator, C: TorqueControl> AcrobotEnv<S, C> {
    #[must_use]
    pub fn with_simulator(simulator: S, config: AcrobotConfig) -> Self {
        let mut env = Self {
            simulator,
            action_space: C::action_space(config.torque_mag),
            config,
            rng: StdRng::seed_from_u64(0),
            episode: EpisodeTracker::new(),
            observation_space: Space::symmetric(&[PI, PI, MAX_VEL_1, MAX_VEL_2]),
            render_lock: None,
            control: PhantomData,
        };
        env.seed(None);
        env
    }

    #[must_use]
    pub fn config(&self) -> &AcrobotConfig {
        &self.config
    }

    /// Moves the target tip height. Takes effect from the next step.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::InvalidGoal`] for a height out of reach.
    pub fn set_goal_height(&mut self, height: f64) -> Result<(), EnvError> {
        let reach = self.config.reach();
        if !(-reach..=reach).contains(&height) {
            return Err(EnvError::InvalidGoal { height, reach });
        }
        self.config.goal_height = height;
        Ok(())
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

    pub fn set_render_lock(&mut self, lock: Arc<Mutex<()>>) {
        self.render_lock = Some(lock);
    }

    #[must_use]
    pub fn observation(&self) -> [f64; 4] {
        let state = self.simulator.state();
        [wrap_angle(state[0]), wrap_angle(state[1]), state[2], state[3]]
    }

    /// Current height of the tip above the pivot.
    #[must_use]
    pub fn tip_height(&self) -> f64 {
        let state = self.simulator.state();
        self.config.tip_height(state[0], state[1])
    }
}

impl<S: Simulator, C: TorqueControl> Env for AcrobotEnv<S, C> {
    type Action = C::Action;
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
        let unit = Uniform::new_inclusive(-RESET_SCALE, RESET_SCALE);
        let x0: Vec<f64> = (0..4).map(|_| self.rng.sample(unit)).collect();
        self.simulator.reset(&x0)?;
        self.episode.clear();
        Ok(self.observation())
    }

    fn step(&mut self, action: C::Action) -> Result<Step<[f64; 4]>, EnvError> {
        let torque = C::torque(action, &self.action_space, self.config.torque_mag)?;
        self.simulator.set_command(&[torque])?;
        self.simulator.step(self.config.dt)?;

        let observation = self.observation();
        let terminal = self.config.is_terminal(&observation);
        let reward = self.episode.record(terminal, if terminal { 0.0 } else { -1.0 });
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

/// Reward of reaching `achieved` when `desired` was asked, for relabelling
/// stored transitions with another goal.
#[must_use]
pub fn goal_reward(achieved: f64, desired: f64) -> f64 {
    if achieved > desired {
        0.0
    } else {
        -1.0
    }
}

/// Observation of the goal-conditioned task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalObservation {
    pub observation: [f64; 4],
    /// Tip height reached.
    pub achieved_goal: f64,
    /// Tip height to exceed.
    pub desired_goal: f64,
}

impl GoalObservation {
    /// `[θ₁, θ₂, θ̇₁, θ̇₂, achieved, desired]`, the layout of the observation space.
    #[must_use]
    pub fn to_array(self) -> [f64; 6] {
        let [a, b, c, d] = self.observation;
        [a, b, c, d, self.achieved_goal, self.desired_goal]
    }
}

/// Goal-conditioned acrobot.
///
/// Every reset draws a new goal height uniformly from the goal range, which
/// defaults to `[0, 0.95 · reach]`. The goal can also be forced for the
/// running episode with [`AcrobotGoalEnv::set_desired_goal`]. Each step
/// reports [`SUCCESS_KEY`] in its info.
pub struct AcrobotGoalEnv<S = Engine, C = DiscreteTorque> {
    env: AcrobotEnv<S, C>,
    rng: StdRng,
    goal_range: (f64, f64),
    observation_space: Space,
}

impl<S: Simulator, C: TorqueControl> AcrobotGoalEnv<S, C> {
    #[must_use]
    pub fn new(env: AcrobotEnv<S, C>) -> Self {
        let reach = env.config().reach();
        Self {
            env,
            rng: StdRng::seed_from_u64(rand::random()),
            goal_range: (0.0, GOAL_FRACTION * reach),
            observation_space: Space::symmetric(&[PI, PI, MAX_VEL_1, MAX_VEL_2, reach, reach]),
        }
    }

    #[must_use]
    pub fn goal_range(&self) -> (f64, f64) {
        self.goal_range
    }

    /// # Errors
    ///
    /// Fails with [`EnvError::InvalidGoalRange`] when either end is out of
    /// reach or `low > high`.
    pub fn set_goal_range(&mut self, low: f64, high: f64) -> Result<(), EnvError> {
        let reach = self.env.config().reach();
        let within = -reach..=reach;
        if !(within.contains(&low) && within.contains(&high) && low <= high) {
            return Err(EnvError::InvalidGoalRange { low, high, reach });
        }
        self.goal_range = (low, high);
        Ok(())
    }

    #[must_use]
    pub fn desired_goal(&self) -> f64 {
        self.env.config().goal_height
    }

    /// Replaces the goal of the running episode.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::InvalidGoal`] for a height out of reach.
    pub fn set_desired_goal(&mut self, height: f64) -> Result<(), EnvError> {
        self.env.set_goal_height(height)
    }

    #[must_use]
    pub fn observation(&self) -> GoalObservation {
        GoalObservation {
            observation: self.env.observation(),
            achieved_goal: self.env.tip_height(),
            desired_goal: self.desired_goal(),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &AcrobotEnv<S, C> {
        &self.env
    }

    pub fn inner_mut(&mut self) -> &mut AcrobotEnv<S, C> {
        &mut self.env
    }
}

impl<S: Simulator, C: TorqueControl> Env for AcrobotGoalEnv<S, C> {
    type Action = C::Action;
    type Observation = GoalObservation;

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn seed(&mut self, seed: Option<u64>) -> u64 {
        let seed = self.env.seed(seed);
        self.rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        seed
    }

    fn reset(&mut self) -> Result<GoalObservation, EnvError> {
        let (low, high) = self.goal_range;
        let goal = self.rng.sample(Uniform::new_inclusive(low, high));
        self.env.set_goal_height(goal)?;
        self.env.reset()?;
        Ok(self.observation())
    }

    fn step(&mut self, action: C::Action) -> Result<Step<GoalObservation>, EnvError> {
        let Step { reward, terminal, mut info, .. } = self.env.step(action)?;
        let observation = self.observation();
        let success = observation.achieved_goal > observation.desired_goal;
        info.insert(SUCCESS_KEY.to_string(), InfoValue::Bool(success));
        Ok(Step { observation, reward, terminal, info })
    }

    fn render(&mut self, mode: RenderMode) -> Result<Frame, EnvError> {
        self.env.render(mode)
    }

    fn close(&mut self) {
        self.env.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tip_height_spans_both_links() {
        let config = AcrobotConfig::default();
        assert_relative_eq!(config.tip_height(0.0, 0.0), -2.0, epsilon = 1e-12);
        assert_relative_eq!(config.tip_height(PI, 0.0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(config.tip_height(PI / 2.0, 0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(config.reach(), 2.0);
        assert!(!config.is_terminal(&[PI / 2.0, PI / 2.0, 0.0, 0.0]));
        assert!(config.is_terminal(&[PI, 0.3, 0.0, 0.0]));
    }

    #[test]
    fn angles_wrap_into_half_open_range() {
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-0.25), -0.25, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(PI), -PI, epsilon = 1e-12);
    }

    #[test]
    fn discrete_torque_maps_three_actions() {
        let space = DiscreteTorque::action_space(2.0);
        assert_relative_eq!(DiscreteTorque::torque(0, &space, 2.0).unwrap(), -2.0);
        assert_relative_eq!(DiscreteTorque::torque(1, &space, 2.0).unwrap(), 0.0);
        assert_relative_eq!(DiscreteTorque::torque(2, &space, 2.0).unwrap(), 2.0);
        assert!(matches!(
            DiscreteTorque::torque(3, &space, 2.0),
            Err(EnvError::InvalidAction { action: 3, n: 3 })
        ));
    }

    #[test]
    fn continuous_torque_is_clipped() {
        let space = ContinuousTorque::action_space(1.0);
        assert_eq!(space, Space::symmetric(&[1.0]));
        assert_relative_eq!(ContinuousTorque::torque(0.25, &space, 1.0).unwrap(), 0.25);
        assert_relative_eq!(ContinuousTorque::torque(7.0, &space, 1.0).unwrap(), 1.0);
        assert_relative_eq!(ContinuousTorque::torque(-7.0, &space, 1.0).unwrap(), -1.0);
        assert!(matches!(
            ContinuousTorque::torque(f64::NAN, &space, 1.0),
            Err(EnvError::NonFiniteAction(_))
        ));
    }

    #[test]
    fn goal_reward_needs_the_tip_above_the_goal() {
        assert_relative_eq!(goal_reward(1.2, 1.0), 0.0);
        assert_relative_eq!(goal_reward(1.0, 1.0), -1.0);
    }
}
