use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("failed to read model description `{path}`")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model description: {0}")]
    ModelParse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("unknown joint `{0}`")]
    UnknownJoint(String),
    #[error("unknown sensor `{0}`")]
    UnknownSensor(String),
    #[error("sensor `{0}` is already registered")]
    DuplicateSensor(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("mass matrix is not positive definite")]
    SingularMassMatrix,
    #[error("integrator gave up after {limit} iterations at t = {time}")]
    IterationLimit { limit: u64, time: f64 },
    #[error("integrator step size underflow at t = {time}")]
    StepSizeUnderflow { time: f64 },
    #[error("simulation diverged at t = {time}")]
    Diverged { time: f64 },
    #[error("viewer lock poisoned")]
    ViewerLock,
    #[error("failed to write telemetry log `{path}`")]
    Telemetry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
