#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::many_single_char_names)]
//! # Planar Articulated Physics
//!
//! A small rigid-body engine for planar chains of links, the simulator behind
//! the classic-control environments of this workspace.
//!
//! Bodies move in the x–z plane and rotate about +y. A [`Model`] is a tree of
//! links joined by prismatic and revolute joints, loaded from a JSON
//! description. The [`Engine`] owns a model and integrates its equations of
//! motion with an adaptive Runge–Kutta scheme or explicit Euler.
//!
//! ## Key Components
//!
//! -   **Model:** [`Model`] validates the link/joint tree, names the actuated
//!     joints (motors) and registers encoder sensors.
//! -   **Engine:** [`Engine`] holds the state `x = [q, v]`, latches motor
//!     commands, refreshes sensors and records telemetry.
//! -   **Options:** four option groups in [`options`] tune the model, the
//!     sensors, the stepper and the controller.
//! -   **Viewer:** [`Engine::render`] draws the scene as a text [`Frame`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use physics::{Engine, Model};
//!
//! let model = Model::load("data/cartpole/cartpole.json", &["slider_to_cart"])?;
//! let mut engine = Engine::new(model)?;
//! engine.reset(&[0.0, 0.05, 0.0, 0.0])?;
//! engine.set_command(&[10.0])?;
//! engine.step(0.02)?;
//! println!("{:?}", engine.state());
//! ```

mod dynamics;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod model;
pub mod options;
mod sensors;
pub mod telemetry;
pub mod types;
pub mod viewer;

pub use engine::Engine;
pub use error::PhysicsError;
pub use integrator::Solver;
pub use model::{JointDescription, JointKind, LinkDescription, Model, ModelDescription};
pub use options::{
    ControllerOptions, EncoderOptions, EngineOptions, EngineTelemetryOptions, ModelOptions,
    ModelTelemetryOptions, SensorsOptions, StepperOptions, WorldOptions,
};
pub use telemetry::{TelemetryLog, TIME_COLUMN};
pub use types::Vec2;
pub use viewer::Frame;
