//! The engine as seen by an environment.

use std::path::Path;
use std::sync::Mutex;

use physics::{
    Engine, EngineOptions, EngineTelemetryOptions, Frame, Model, ModelOptions, PhysicsError, Solver,
};

/// Runtime interface an environment needs from its simulation.
///
/// Implemented by [`Engine`]. Tests implement it with scripted dynamics to
/// exercise the task rules in isolation.
pub trait Simulator {
    fn seed(&mut self, seed: u64);

    /// # Errors
    ///
    /// Fails when `x0` does not fit the model.
    fn reset(&mut self, x0: &[f64]) -> Result<(), PhysicsError>;

    /// # Errors
    ///
    /// Fails when `command` does not fit the motors.
    fn set_command(&mut self, command: &[f64]) -> Result<(), PhysicsError>;

    /// # Errors
    ///
    /// Fails when integration gives up.
    fn step(&mut self, dt: f64) -> Result<(), PhysicsError>;

    /// State `[q, v]` after the last reset or step.
    fn state(&self) -> &[f64];

    /// # Errors
    ///
    /// Fails when the shared lock is poisoned.
    fn render(&mut self, lock: Option<&Mutex<()>>) -> Result<Frame, PhysicsError>;

    fn close(&mut self);
}

impl Simulator for Engine {
    fn seed(&mut self, seed: u64) {
        Engine::seed(self, seed);
    }

    fn reset(&mut self, x0: &[f64]) -> Result<(), PhysicsError> {
        Engine::reset(self, x0)
    }

    fn set_command(&mut self, command: &[f64]) -> Result<(), PhysicsError> {
        Engine::set_command(self, command)
    }

    fn step(&mut self, dt: f64) -> Result<(), PhysicsError> {
        Engine::step(self, dt)
    }

    fn state(&self) -> &[f64] {
        Engine::state(self)
    }

    fn render(&mut self, lock: Option<&Mutex<()>>) -> Result<Frame, PhysicsError> {
        Engine::render(self, lock)
    }

    fn close(&mut self) {
        Engine::close(self);
    }
}

/// Loads a model and configures an engine the way the environments run it:
/// adaptive integration without an iteration cap, sensors and controller
/// updated once per control period, telemetry off.
pub(crate) fn build_engine(
    path: impl AsRef<Path>,
    motors: &[&str],
    encoders: &[(&str, &str)],
    dt: f64,
) -> Result<Engine, PhysicsError> {
    let mut model = Model::load(path, motors)?;
    for (sensor, joint) in encoders {
        model.add_encoder_sensor(sensor, joint)?;
    }
    let mut model_options = ModelOptions::default();
    model_options.telemetry.enable_encoder_sensors = false;
    model.set_options(model_options);

    let mut options = EngineOptions::default();
    options.stepper.solver = Solver::RungeKuttaDopri5;
    options.stepper.iter_max = None;
    options.stepper.sensors_update_period = dt;
    options.stepper.controller_update_period = dt;
    options.telemetry = EngineTelemetryOptions::disabled();
    Engine::with_options(model, options)
}
