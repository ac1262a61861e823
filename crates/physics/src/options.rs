//! # Option Groups
//!
//! Every tunable of the engine lives in one of four option groups. They all
//! implement `Default`, round-trip through `serde`, and reject unknown keys so
//! a misspelled field in a JSON overlay fails loudly instead of being ignored.
//!
//! -   [`ModelOptions`] and [`SensorsOptions`] belong to the [`Model`].
//! -   [`EngineOptions`] and [`ControllerOptions`] belong to the [`Engine`].
//!
//! Changes to the telemetry toggles take effect at the next `reset`.
//!
//! [`Model`]: crate::Model
//! [`Engine`]: crate::Engine

use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;
use crate::integrator::Solver;
use crate::types::Vec2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelOptions {
    pub telemetry: ModelTelemetryOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelTelemetryOptions {
    /// Log encoder readings alongside the engine state.
    pub enable_encoder_sensors: bool,
}

impl Default for ModelTelemetryOptions {
    fn default() -> Self {
        Self { enable_encoder_sensors: true }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorsOptions {
    pub encoder: EncoderOptions,
}

/// Measurement model shared by every encoder sensor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderOptions {
    /// Standard deviation of the gaussian noise added to each reading.
    pub noise_std: f64,
    /// Constant offset added to the position reading.
    pub bias: f64,
}

impl SensorsOptions {
    /// # Errors
    ///
    /// [`PhysicsError::InvalidOption`] on a negative or non-finite noise
    /// level, or a non-finite bias.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let encoder = &self.encoder;
        if !(encoder.noise_std.is_finite() && encoder.noise_std >= 0.0) {
            return Err(PhysicsError::InvalidOption(format!(
                "encoder noise_std must be finite and non-negative, got {}",
                encoder.noise_std
            )));
        }
        if !encoder.bias.is_finite() {
            return Err(PhysicsError::InvalidOption(format!(
                "encoder bias must be finite, got {}",
                encoder.bias
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    pub world: WorldOptions,
    pub stepper: StepperOptions,
    pub telemetry: EngineTelemetryOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldOptions {
    /// Gravity in the x–z plane (m/s²).
    pub gravity: [f64; 2],
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self { gravity: [0.0, -9.81] }
    }
}

impl WorldOptions {
    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        Vec2::from_array(self.gravity)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepperOptions {
    pub solver: Solver,
    pub tol_abs: f64,
    pub tol_rel: f64,
    /// Largest internal integration step (s).
    pub dt_max: f64,
    /// Integrator attempts allowed per `step` call. `None` is unlimited.
    pub iter_max: Option<u64>,
    /// Sensor refresh period (s). Zero refreshes after every integration segment.
    pub sensors_update_period: f64,
    /// Command latch period (s). Zero latches at the start of every `step`.
    pub controller_update_period: f64,
}

impl Default for StepperOptions {
    fn default() -> Self {
        Self {
            solver: Solver::RungeKuttaDopri5,
            tol_abs: 1.0e-5,
            tol_rel: 1.0e-4,
            dt_max: 1.0e-3,
            iter_max: Some(100_000),
            sensors_update_period: 0.0,
            controller_update_period: 0.0,
        }
    }
}

impl StepperOptions {
    /// Period of the integration breakpoints, zero when both updates are continuous.
    #[must_use]
    pub fn update_period(&self) -> f64 {
        let sensors = self.sensors_update_period;
        let controller = self.controller_update_period;
        if sensors <= 0.0 {
            controller
        } else if controller <= 0.0 {
            sensors
        } else {
            sensors.min(controller)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)] // one toggle per recorded column group
pub struct EngineTelemetryOptions {
    pub enable_configuration: bool,
    pub enable_velocity: bool,
    pub enable_acceleration: bool,
    pub enable_command: bool,
    pub enable_energy: bool,
}

impl Default for EngineTelemetryOptions {
    fn default() -> Self {
        Self {
            enable_configuration: true,
            enable_velocity: true,
            enable_acceleration: true,
            enable_command: true,
            enable_energy: true,
        }
    }
}

impl EngineTelemetryOptions {
    /// Every toggle switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enable_configuration: false,
            enable_velocity: false,
            enable_acceleration: false,
            enable_command: false,
            enable_energy: false,
        }
    }
}

impl EngineOptions {
    /// # Errors
    ///
    /// [`PhysicsError::InvalidOption`] when a tolerance or `dt_max` is not
    /// positive, or an update period is negative.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let stepper = &self.stepper;
        let positive = [
            ("tol_abs", stepper.tol_abs),
            ("tol_rel", stepper.tol_rel),
            ("dt_max", stepper.dt_max),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PhysicsError::InvalidOption(format!(
                    "stepper {name} must be finite and positive, got {value}"
                )));
            }
        }
        let periods = [
            ("sensors_update_period", stepper.sensors_update_period),
            ("controller_update_period", stepper.controller_update_period),
        ];
        for (name, value) in periods {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PhysicsError::InvalidOption(format!(
                    "stepper {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if stepper.iter_max == Some(0) {
            return Err(PhysicsError::InvalidOption(
                "stepper iter_max must allow at least one iteration".into(),
            ));
        }
        if !self.world.gravity.iter().all(|g| g.is_finite()) {
            return Err(PhysicsError::InvalidOption("gravity must be finite".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerOptions {
    /// Clamp each latched command to its joint's effort limit.
    pub enable_effort_limit: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self { enable_effort_limit: true }
    }
}
