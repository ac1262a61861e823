use physics::PhysicsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("invalid action {action}, expected a value in 0..{n}")]
    InvalidAction { action: usize, n: usize },
    #[error("action {0} is not a finite torque")]
    NonFiniteAction(f64),
    #[error("goal height {height} is out of reach, expected a value in -{reach}..={reach}")]
    InvalidGoal { height: f64, reach: f64 },
    #[error("goal range {low}..={high} is empty or out of reach ±{reach}")]
    InvalidGoalRange { low: f64, high: f64, reach: f64 },
    #[error("simulation failed: {0}")]
    Simulation(#[from] PhysicsError),
    #[error("unsupported render mode `{0}`, only `human` is available")]
    UnsupportedRenderMode(String),
}
