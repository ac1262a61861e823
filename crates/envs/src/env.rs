//! # Environment Contract
//!
//! Inspired by classic frameworks like `OpenAI` Gym, the [`Env`] trait defines
//! the interface every environment provides. Each call to [`Env::step`]
//! advances the simulation by one action and returns a [`Step`]: the new
//! observation, a reward signal, whether the episode has terminated and a
//! small diagnostic [`Info`] map.
//!
//! Episodes are not forced to stop: stepping past a terminal transition is
//! allowed, the reward is then zero and a warning is logged once.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use physics::Frame;

use crate::error::EnvError;

/// Set of valid actions or observations.
#[derive(Clone, Debug, PartialEq)]
pub enum Space {
    /// The integers `0..n`.
    Discrete(usize),
    /// A box of real vectors, bounds inclusive.
    Box { low: Vec<f64>, high: Vec<f64> },
}

impl Space {
    /// A box symmetric around the origin.
    #[must_use]
    pub fn symmetric(high: &[f64]) -> Self {
        Self::Box { low: high.iter().map(|h| -h).collect(), high: high.to_vec() }
    }

    /// Whether `action` is an element of a discrete space.
    #[must_use]
    pub fn contains_action(&self, action: usize) -> bool {
        matches!(self, Self::Discrete(n) if action < *n)
    }

    /// Whether `point` lies inside a box space.
    #[must_use]
    pub fn contains_point(&self, point: &[f64]) -> bool {
        match self {
            Self::Discrete(_) => false,
            Self::Box { low, high } => {
                point.len() == low.len()
                    && point
                        .iter()
                        .zip(low.iter().zip(high))
                        .all(|(value, (low, high))| (*low..=*high).contains(value))
            }
        }
    }

    /// Number of elements of a discrete space, or the dimension of a box.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Discrete(n) => *n,
            Self::Box { high, .. } => high.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    F64(f64),
}

/// Diagnostic values attached to a transition, ordered by key.
pub type Info = BTreeMap<String, InfoValue>;

/// Outcome of one [`Env::step`].
#[derive(Clone, Debug, PartialEq)]
pub struct Step<O> {
    pub observation: O,
    pub reward: f64,
    pub terminal: bool,
    pub info: Info,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Draw for a human watching.
    #[default]
    Human,
}

impl FromStr for RenderMode {
    type Err = EnvError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "human" => Ok(Self::Human),
            other => Err(EnvError::UnsupportedRenderMode(other.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => f.write_str("human"),
        }
    }
}

pub trait Env {
    type Action;
    type Observation;

    fn action_space(&self) -> &Space;

    fn observation_space(&self) -> &Space;

    /// Reseeds every generator of the environment and returns the seed used.
    ///
    /// `None` draws a fresh seed from entropy.
    fn seed(&mut self, seed: Option<u64>) -> u64;

    /// Starts a new episode and returns its first observation.
    ///
    /// # Errors
    ///
    /// Fails when the simulation cannot be reset.
    fn reset(&mut self) -> Result<Self::Observation, EnvError>;

    /// Applies `action` for one control period.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::InvalidAction`] without touching the episode
    /// when `action` is outside the action space, and with
    /// [`EnvError::Simulation`] when the engine fails.
    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>, EnvError>;

    /// Draws the current state, opening the viewer on first use.
    ///
    /// # Errors
    ///
    /// Fails with [`EnvError::Simulation`] when the viewer cannot draw.
    fn render(&mut self, mode: RenderMode) -> Result<Frame, EnvError>;

    /// Releases the viewer. Safe to call any number of times.
    fn close(&mut self);
}
