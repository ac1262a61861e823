#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Classic-Control Environments
//!
//! Reinforcement-learning environments built on the [`physics`] engine,
//! following the familiar seed/reset/step/render/close contract.
//!
//! ## Key Components
//!
//! -   **[`Env`]:** the environment contract, with its [`Space`]s and the
//!     [`Step`] record returned by every transition.
//! -   **[`CartPoleEnv`]:** balance a pole hinged on a cart sliding along a
//!     rail by pushing the cart left or right.
//! -   **[`AcrobotEnv`]:** swing the tip of a two-link pendulum above a goal
//!     height by torquing the elbow, with discrete or continuous torques.
//! -   **[`AcrobotGoalEnv`]:** the same task with a new goal height every
//!     episode, carried in the observation.
//! -   **[`TimeLimit`]:** caps the length of an episode.
//! -   **[`Simulator`]:** the seam between an environment and the engine, so
//!     tests can drive the task rules with a scripted simulator.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use envs::{CartPoleEnv, Env, TimeLimit};
//!
//! let mut env = TimeLimit::new(CartPoleEnv::new()?, envs::cartpole::MAX_EPISODE_STEPS);
//! env.seed(Some(42));
//! let mut observation = env.reset()?;
//! loop {
//!     let action = usize::from(observation[1] > 0.0);
//!     let step = env.step(action)?;
//!     observation = step.observation;
//!     if step.terminal {
//!         break;
//!     }
//! }
//! env.close();
//! ```

pub mod acrobot;
pub mod cartpole;
pub mod env;
pub mod episode;
pub mod error;
pub mod simulator;
pub mod time_limit;

pub use acrobot::{
    AcrobotConfig, AcrobotEnv, AcrobotGoalEnv, ContinuousTorque, DiscreteTorque, GoalObservation,
    TorqueControl,
};
pub use cartpole::{CartPoleConfig, CartPoleEnv};
pub use env::{Env, Info, InfoValue, RenderMode, Space, Step};
pub use episode::EpisodeTracker;
pub use error::EnvError;
pub use physics::Frame;
pub use simulator::Simulator;
pub use time_limit::{TimeLimit, TRUNCATED_KEY};
