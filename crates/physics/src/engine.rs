//! # Engine
//!
//! [`Engine`] owns a [`Model`] and its state `x = [q, v]`, and advances it in
//! time with the stepper selected in [`EngineOptions`].
//!
//! A call to [`Engine::step`] is split into integration segments at every
//! multiple of the update period (the smallest non-zero period among the
//! sensors and controller periods). At the start of a segment the requested
//! command is latched if the controller is due; at the end the sensors are
//! refreshed if due and one telemetry row is recorded.
//!
//! After any error from `step` the state is left wherever integration
//! stopped and the engine should be reset.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Mutex;

use crate::dynamics;
use crate::error::PhysicsError;
use crate::integrator::Stepper;
use crate::model::Model;
use crate::options::{ControllerOptions, EngineOptions, ModelOptions, SensorsOptions};
use crate::telemetry::{Snapshot, TelemetryLog, TelemetryRecorder};
use crate::types::Vec2;
use crate::viewer::{Frame, Viewer};

/// Remaining time below which a segment counts as done.
const TIME_EPS: f64 = 1.0e-10;
/// Distance to a period multiple below which a time is on the breakpoint.
const BREAKPOINT_EPS: f64 = 1.0e-8;

fn is_multiple(t: f64, period: f64) -> bool {
    period > 0.0 && (t - (t / period).round() * period).abs() < BREAKPOINT_EPS
}

/// First multiple of `period` strictly after `t`.
fn next_breakpoint(t: f64, period: f64) -> f64 {
    let next = ((t / period).floor() + 1.0) * period;
    if next - t < BREAKPOINT_EPS {
        next + period
    } else {
        next
    }
}

fn derivative(
    model: &Model,
    gravity: Vec2,
    tau: &[f64],
    x: &[f64],
    dxdt: &mut [f64],
) -> Result<(), PhysicsError> {
    let nq = model.nq();
    let (q, v) = x.split_at(nq);
    let a = dynamics::acceleration(model, gravity, q, v, tau)?;
    dxdt[..nq].copy_from_slice(v);
    dxdt[nq..].copy_from_slice(&a);
    Ok(())
}

#[derive(Debug, Default)]
struct EngineState {
    t: f64,
    x: Vec<f64>,
    dxdt: Vec<f64>,
    /// Command requested by the controller, one entry per motor.
    command: Vec<f64>,
    /// Command currently applied, after effort limits.
    latched: Vec<f64>,
    /// Generalized force of the latched command, one entry per joint.
    tau: Vec<f64>,
    energy: f64,
    sensors: Vec<[f64; 2]>,
}

/// Simulation engine of one articulated model.
pub struct Engine {
    model: Model,
    options: EngineOptions,
    controller: ControllerOptions,
    state: EngineState,
    stepper: Stepper,
    rng: fastrand::Rng,
    telemetry: TelemetryRecorder,
    viewer: Option<Viewer>,
}

impl Engine {
    /// Creates an engine at rest in the zero configuration.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::SingularMassMatrix`] when some joint moves
    /// no mass.
    pub fn new(model: Model) -> Result<Self, PhysicsError> {
        Self::with_options(model, EngineOptions::default())
    }

    /// # Errors
    ///
    /// Fails when `options` does not validate or the model is singular.
    pub fn with_options(model: Model, options: EngineOptions) -> Result<Self, PhysicsError> {
        options.validate()?;
        let nx = model.nx();
        let stepper = Self::build_stepper(&options, nx);
        let mut engine = Self {
            model,
            options,
            controller: ControllerOptions::default(),
            state: EngineState::default(),
            stepper,
            rng: fastrand::Rng::with_seed(0),
            telemetry: TelemetryRecorder::default(),
            viewer: None,
        };
        engine.reset(&vec![0.0; nx])?;
        tracing::debug!(model = engine.model.name(), nx, "engine ready");
        Ok(engine)
    }

    fn build_stepper(options: &EngineOptions, nx: usize) -> Stepper {
        let stepper = &options.stepper;
        let period = stepper.update_period();
        let dt = if period > 0.0 { period } else { stepper.dt_max };
        Stepper::new(stepper.solver, stepper.tol_abs, stepper.tol_rel, dt, nx)
    }

    /// Seeds the generator behind sensor noise.
    pub fn seed(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
    }

    /// Restarts the simulation at `t = 0` from the state `x0 = [q, v]`.
    ///
    /// The command is zeroed, sensors are refreshed and telemetry starts a
    /// new log with the initial row.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::BadInput`] when `x0` has the wrong size or
    /// a non-finite entry.
    pub fn reset(&mut self, x0: &[f64]) -> Result<(), PhysicsError> {
        let nx = self.model.nx();
        if x0.len() != nx {
            return Err(PhysicsError::BadInput(format!(
                "initial state has {} entries, model `{}` expects {nx}",
                x0.len(),
                self.model.name()
            )));
        }
        if x0.iter().any(|value| !value.is_finite()) {
            return Err(PhysicsError::BadInput("initial state is not finite".into()));
        }

        let motors = self.model.motor_count();
        self.state = EngineState {
            t: 0.0,
            x: x0.to_vec(),
            dxdt: vec![0.0; nx],
            command: vec![0.0; motors],
            latched: vec![0.0; motors],
            tau: vec![0.0; self.model.nv()],
            energy: 0.0,
            sensors: vec![[0.0; 2]; self.model.sensors.len()],
        };
        self.stepper = Self::build_stepper(&self.options, nx);
        self.latch_command();
        self.refresh_derivative()?;
        self.refresh_sensors();
        self.refresh_energy();
        self.telemetry.configure(
            &self.model,
            &self.options.telemetry,
            &self.model.options().telemetry,
        );
        self.record();
        Ok(())
    }

    /// Requests a new command, applied when the controller is next due.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::BadInput`] unless there is one finite
    /// value per motor.
    pub fn set_command(&mut self, command: &[f64]) -> Result<(), PhysicsError> {
        if command.len() != self.state.command.len() {
            return Err(PhysicsError::BadInput(format!(
                "command has {} entries, model `{}` has {} motors",
                command.len(),
                self.model.name(),
                self.state.command.len()
            )));
        }
        if command.iter().any(|value| !value.is_finite()) {
            return Err(PhysicsError::BadInput("command is not finite".into()));
        }
        self.state.command.copy_from_slice(command);
        Ok(())
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::BadInput`] for a non-positive `dt`, and
    /// with the integration errors when the stepper gives up.
    pub fn step(&mut self, dt: f64) -> Result<(), PhysicsError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::BadInput(format!(
                "step duration must be finite and positive, got {dt}"
            )));
        }
        let end = self.state.t + dt;
        let period = self.options.stepper.update_period();
        let mut iterations = 0;
        while end - self.state.t > TIME_EPS {
            let t = self.state.t;
            let mut target = if period > 0.0 { next_breakpoint(t, period).min(end) } else { end };
            if end - target < TIME_EPS {
                target = end;
            }
            self.begin_segment(t)?;
            self.integrate_to(target, &mut iterations)?;
            self.end_segment();
        }
        Ok(())
    }

    /// Resets to `x0` and runs until `t_end`, asking `controller` for the
    /// motor command before every controller update. The controller gets
    /// `(t, q, v, command)` and keeps its previous output unless it writes a
    /// new one. A zero controller period polls it every `dt_max`.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::BadInput`] for a non-positive end time, a
    /// badly sized `x0` or a non-finite command, and like [`Engine::step`]
    /// when integration gives up.
    pub fn simulate<F>(
        &mut self,
        x0: &[f64],
        t_end: f64,
        mut controller: F,
    ) -> Result<(), PhysicsError>
    where
        F: FnMut(f64, &[f64], &[f64], &mut [f64]),
    {
        if !(t_end.is_finite() && t_end > 0.0) {
            return Err(PhysicsError::BadInput(format!(
                "end time must be finite and positive, got {t_end}"
            )));
        }
        self.reset(x0)?;
        let stepper = &self.options.stepper;
        let period = if stepper.controller_update_period > 0.0 {
            stepper.controller_update_period
        } else {
            stepper.dt_max
        };
        let nq = self.model.nq();
        let mut command = vec![0.0; self.state.command.len()];
        while t_end - self.state.t > TIME_EPS {
            let t = self.state.t;
            let (q, v) = self.state.x.split_at(nq);
            controller(t, q, v, &mut command);
            self.set_command(&command)?;
            let target = next_breakpoint(t, period).min(t_end);
            self.step(target - t)?;
        }
        tracing::debug!(model = %self.model.name(), t_end, "simulation finished");
        Ok(())
    }

    fn begin_segment(&mut self, t: f64) -> Result<(), PhysicsError> {
        let controller = self.options.stepper.controller_update_period;
        if controller <= 0.0 || is_multiple(t, controller) {
            self.latch_command();
        }
        self.refresh_derivative()
    }

    fn end_segment(&mut self) {
        let sensors = self.options.stepper.sensors_update_period;
        if sensors <= 0.0 || is_multiple(self.state.t, sensors) {
            self.refresh_sensors();
        }
        self.refresh_energy();
        self.record();
    }

    fn integrate_to(&mut self, target: f64, iterations: &mut u64) -> Result<(), PhysicsError> {
        let Self { model, options, state, stepper, .. } = self;
        let model = &*model;
        let gravity = options.world.gravity();
        let dt_max = options.stepper.dt_max;
        let iter_max = options.stepper.iter_max;
        let tau = &state.tau;
        let mut rhs = |x: &[f64], dxdt: &mut [f64]| derivative(model, gravity, tau, x, dxdt);

        while target - state.t > TIME_EPS {
            *iterations += 1;
            if let Some(limit) = iter_max {
                if *iterations > limit {
                    return Err(PhysicsError::IterationLimit { limit, time: state.t });
                }
            }
            let h = stepper.dt.min(dt_max).min(target - state.t);
            stepper.try_step(&mut rhs, &mut state.t, &mut state.x, &mut state.dxdt, h)?;
            if state.x.iter().any(|value| !value.is_finite()) {
                return Err(PhysicsError::Diverged { time: state.t });
            }
        }
        state.t = target;
        Ok(())
    }

    fn latch_command(&mut self) {
        let limit_effort = self.controller.enable_effort_limit;
        let state = &mut self.state;
        state.tau.fill(0.0);
        let motors = self.model.motors.iter().zip(self.model.motor_limits());
        for (i, (&joint, limit)) in motors.enumerate() {
            let requested = state.command[i];
            let applied = match limit {
                Some(limit) if limit_effort => requested.clamp(-limit, limit),
                _ => requested,
            };
            state.latched[i] = applied;
            state.tau[joint] = applied;
        }
    }

    fn refresh_derivative(&mut self) -> Result<(), PhysicsError> {
        let gravity = self.options.world.gravity();
        let state = &mut self.state;
        derivative(&self.model, gravity, &state.tau, &state.x, &mut state.dxdt)
    }

    fn refresh_sensors(&mut self) {
        let (q, v) = self.state.x.split_at(self.model.nq());
        let options = &self.model.sensors_options().encoder;
        for (reading, sensor) in self.state.sensors.iter_mut().zip(&self.model.sensors) {
            *reading = sensor.measure(q, v, options, &mut self.rng);
        }
    }

    fn refresh_energy(&mut self) {
        let (q, v) = self.state.x.split_at(self.model.nq());
        self.state.energy = dynamics::energy(&self.model, self.options.world.gravity(), q, v);
    }

    fn record(&mut self) {
        let nq = self.model.nq();
        let state = &self.state;
        let (q, v) = state.x.split_at(nq);
        self.telemetry.record(&Snapshot {
            time: state.t,
            q,
            v,
            a: &state.dxdt[nq..],
            command: &state.latched,
            energy: state.energy,
            sensors: &state.sensors,
        });
    }

    /// Current state `[q, v]`.
    #[must_use]
    pub fn state(&self) -> &[f64] {
        &self.state.x
    }

    #[must_use]
    pub fn time(&self) -> f64 {
        self.state.t
    }

    /// Joint accelerations at the current state.
    #[must_use]
    pub fn acceleration(&self) -> &[f64] {
        &self.state.dxdt[self.model.nq()..]
    }

    /// Command currently applied to the motors.
    #[must_use]
    pub fn latched_command(&self) -> &[f64] {
        &self.state.latched
    }

    /// Mechanical energy at the last breakpoint.
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.state.energy
    }

    /// Last `[position, velocity]` reading of an encoder.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::UnknownSensor`] for an unregistered name.
    pub fn sensor_data(&self, name: &str) -> Result<[f64; 2], PhysicsError> {
        self.model
            .sensors
            .iter()
            .position(|sensor| sensor.name == name)
            .map(|index| self.state.sensors[index])
            .ok_or_else(|| PhysicsError::UnknownSensor(name.to_string()))
    }

    /// Draws the current configuration, opening the viewer on first use.
    ///
    /// `lock` serializes viewers shared between several engines.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::ViewerLock`] when `lock` is poisoned.
    pub fn render(&mut self, lock: Option<&Mutex<()>>) -> Result<Frame, PhysicsError> {
        let _guard = lock
            .map(Mutex::lock)
            .transpose()
            .map_err(|_| PhysicsError::ViewerLock)?;
        let (q, v) = self.state.x.split_at(self.model.nq());
        let frames = dynamics::forward_kinematics(&self.model, q, v);
        let model = &self.model;
        let viewer = self.viewer.get_or_insert_with(|| {
            tracing::debug!(model = model.name(), "viewer opened");
            Viewer::new()
        });
        Ok(viewer.draw(model, &frames, self.state.t))
    }

    /// Closes the viewer. Does nothing when none is open.
    pub fn close(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            tracing::debug!(frames = viewer.frames_drawn(), "viewer closed");
        }
    }

    #[must_use]
    pub fn is_viewer_open(&self) -> bool {
        self.viewer.is_some()
    }

    /// Rows recorded since the last reset.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryLog {
        self.telemetry.log()
    }

    /// Writes the telemetry recorded since the last reset as CSV.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::Telemetry`] when the file cannot be written.
    pub fn write_log(&self, path: impl AsRef<Path>) -> Result<(), PhysicsError> {
        let path = path.as_ref();
        let to_error = |source| PhysicsError::Telemetry { path: path.to_path_buf(), source };
        let file = File::create(path).map_err(to_error)?;
        self.telemetry().write_csv(BufWriter::new(file)).map_err(to_error)
    }

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Replaces the engine options. The stepper restarts from its initial
    /// step size and telemetry toggles apply from the next reset.
    ///
    /// # Errors
    ///
    /// Fails with [`PhysicsError::InvalidOption`] when `options` does not
    /// validate. The previous options are kept.
    pub fn set_options(&mut self, options: EngineOptions) -> Result<(), PhysicsError> {
        options.validate()?;
        self.stepper = Self::build_stepper(&options, self.model.nx());
        self.options = options;
        Ok(())
    }

    #[must_use]
    pub fn model_options(&self) -> &ModelOptions {
        self.model.options()
    }

    pub fn set_model_options(&mut self, options: ModelOptions) {
        self.model.set_options(options);
    }

    #[must_use]
    pub fn sensors_options(&self) -> &SensorsOptions {
        self.model.sensors_options()
    }

    /// # Errors
    ///
    /// Fails with [`PhysicsError::InvalidOption`] for a negative noise level
    /// or a non-finite bias.
    pub fn set_sensors_options(&mut self, options: SensorsOptions) -> Result<(), PhysicsError> {
        self.model.set_sensors_options(options)
    }

    #[must_use]
    pub fn controller_options(&self) -> &ControllerOptions {
        &self.controller
    }

    pub fn set_controller_options(&mut self, options: ControllerOptions) {
        self.controller = options;
    }
}
