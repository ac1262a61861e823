//! Reward bookkeeping past the end of an episode.

/// Tracks how many steps were taken after the episode terminated.
///
/// Until the first terminal transition the environment's reward passes
/// through unchanged. Every later step earns nothing, and the first of them
/// logs a warning since stepping a finished episode is undefined.
#[derive(Clone, Debug, Default)]
pub struct EpisodeTracker {
    steps_beyond_done: Option<u32>,
}

impl EpisodeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.steps_beyond_done = None;
    }

    /// `None` while the episode runs, then the number of steps taken after
    /// the first terminal one.
    #[must_use]
    pub fn steps_beyond_done(&self) -> Option<u32> {
        self.steps_beyond_done
    }

    /// Returns the reward of a transition the environment scored `reward`.
    pub fn record(&mut self, terminal: bool, reward: f64) -> f64 {
        if !terminal {
            return reward;
        }
        match self.steps_beyond_done {
            None => {
                self.steps_beyond_done = Some(0);
                reward
            }
            Some(steps) => {
                if steps == 0 {
                    tracing::warn!(
                        "step() called after the episode terminated; call reset() first, \
                         further steps are undefined"
                    );
                }
                self.steps_beyond_done = Some(steps.saturating_add(1));
                0.0
            }
        }
    }
}
