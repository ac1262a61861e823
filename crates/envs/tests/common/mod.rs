#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use envs::{Frame, Simulator};
use physics::PhysicsError;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Simulator with trivial dynamics: the first coordinate moves at
/// `gain * command`, unless a scripted state is queued for the next step.
#[derive(Debug, Default)]
pub struct ScriptedSimulator {
    pub state: Vec<f64>,
    pub command: f64,
    pub gain: f64,
    pub script: VecDeque<[f64; 4]>,
    pub seeds: Vec<u64>,
    pub steps: usize,
    pub fail_step: bool,
    pub viewer_open: bool,
    pub closes: usize,
}

impl ScriptedSimulator {
    pub fn new(gain: f64) -> Self {
        Self { state: vec![0.0; 4], gain, ..Self::default() }
    }

    pub fn scripted(states: &[[f64; 4]]) -> Self {
        Self { script: states.iter().copied().collect(), ..Self::new(0.0) }
    }
}

impl Simulator for ScriptedSimulator {
    fn seed(&mut self, seed: u64) {
        self.seeds.push(seed);
    }

    fn reset(&mut self, x0: &[f64]) -> Result<(), PhysicsError> {
        self.state = x0.to_vec();
        Ok(())
    }

    fn set_command(&mut self, command: &[f64]) -> Result<(), PhysicsError> {
        self.command = command[0];
        Ok(())
    }

    fn step(&mut self, dt: f64) -> Result<(), PhysicsError> {
        if self.fail_step {
            return Err(PhysicsError::Diverged { time: 0.0 });
        }
        self.steps += 1;
        match self.script.pop_front() {
            Some(next) => self.state = next.to_vec(),
            None => self.state[0] += self.gain * self.command * dt,
        }
        Ok(())
    }

    fn state(&self) -> &[f64] {
        &self.state
    }

    fn render(&mut self, lock: Option<&Mutex<()>>) -> Result<Frame, PhysicsError> {
        let _guard = lock.map(Mutex::lock).transpose().map_err(|_| PhysicsError::ViewerLock)?;
        self.viewer_open = true;
        Ok(Frame { time: 0.0, rows: vec![format!("{:?}", self.state)] })
    }

    fn close(&mut self) {
        self.viewer_open = false;
        self.closes += 1;
    }
}

/// Counts `WARN` events.
#[derive(Clone, Default)]
pub struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` with `counter` observing every event of the current thread.
pub fn with_warn_counter<T>(counter: &WarnCounter, f: impl FnOnce() -> T) -> T {
    use tracing_subscriber::layer::SubscriberExt;

    let subscriber = tracing_subscriber::registry().with(counter.clone());
    tracing::subscriber::with_default(subscriber, f)
}
