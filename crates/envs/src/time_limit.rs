//! Episode length cap.

use physics::Frame;

use crate::env::{Env, InfoValue, RenderMode, Space, Step};
use crate::error::EnvError;

/// Info key set on the step that hit the cap.
pub const TRUNCATED_KEY: &str = "TimeLimit.truncated";

/// Ends every episode after `max_episode_steps` steps.
///
/// The capped step is reported as terminal. Its info carries
/// [`TRUNCATED_KEY`], `true` unless the wrapped environment terminated on
/// that same step.
pub struct TimeLimit<E> {
    env: E,
    max_episode_steps: usize,
    elapsed_steps: usize,
}

impl<E: Env> TimeLimit<E> {
    #[must_use]
    pub fn new(env: E, max_episode_steps: usize) -> Self {
        Self { env, max_episode_steps, elapsed_steps: 0 }
    }

    #[must_use]
    pub fn max_episode_steps(&self) -> usize {
        self.max_episode_steps
    }

    /// Steps taken since the last reset.
    #[must_use]
    pub fn elapsed_steps(&self) -> usize {
        self.elapsed_steps
    }

    #[must_use]
    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    #[must_use]
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Env> Env for TimeLimit<E> {
    type Action = E::Action;
    type Observation = E::Observation;

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn observation_space(&self) -> &Space {
        self.env.observation_space()
    }

    fn seed(&mut self, seed: Option<u64>) -> u64 {
        self.env.seed(seed)
    }

    fn reset(&mut self) -> Result<Self::Observation, EnvError> {
        self.elapsed_steps = 0;
        self.env.reset()
    }

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::Observation>, EnvError> {
        let mut step = self.env.step(action)?;
        self.elapsed_steps += 1;
        if self.elapsed_steps >= self.max_episode_steps {
            step.info.insert(TRUNCATED_KEY.to_string(), InfoValue::Bool(!step.terminal));
            step.terminal = true;
        }
        Ok(step)
    }

    fn render(&mut self, mode: RenderMode) -> Result<Frame, EnvError> {
        self.env.render(mode)
    }

    fn close(&mut self) {
        self.env.close();
    }
}
