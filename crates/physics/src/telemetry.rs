//! In-memory telemetry.
//!
//! The recorder keeps one row per breakpoint with the columns selected by the
//! telemetry toggles. Nothing is recorded when every toggle is off.

use std::io::{self, Write};

use crate::model::Model;
use crate::options::{EngineTelemetryOptions, ModelTelemetryOptions};

pub const TIME_COLUMN: &str = "Global.Time";

/// Recorded columns and rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetryLog {
    header: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TelemetryLog {
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every recorded value of one column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.header.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Writes the header then one line per row.
    ///
    /// # Errors
    ///
    /// Propagates any failure of `out`.
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", self.header.join(","))?;
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(out, "{}", line.join(","))?;
        }
        out.flush()
    }
}

/// Values of one breakpoint.
pub(crate) struct Snapshot<'a> {
    pub time: f64,
    pub q: &'a [f64],
    pub v: &'a [f64],
    pub a: &'a [f64],
    pub command: &'a [f64],
    pub energy: f64,
    pub sensors: &'a [[f64; 2]],
}

#[derive(Default)]
pub(crate) struct TelemetryRecorder {
    engine: Option<EngineTelemetryOptions>,
    sensors: bool,
    log: TelemetryLog,
}

impl TelemetryRecorder {
    /// Rebuilds the header and drops previous rows.
    pub(crate) fn configure(
        &mut self,
        model: &Model,
        engine: &EngineTelemetryOptions,
        sensors: &ModelTelemetryOptions,
    ) {
        let sensors = sensors.enable_encoder_sensors && !model.sensors.is_empty();
        let mut header = vec![TIME_COLUMN.to_string()];
        let joints: Vec<&str> = model.joint_names().collect();
        let mut push_vector = |prefix: &str, names: &[&str]| {
            header.extend(names.iter().map(|name| format!("{prefix}.{name}")));
        };
        if engine.enable_configuration {
            push_vector("q", &joints);
        }
        if engine.enable_velocity {
            push_vector("v", &joints);
        }
        if engine.enable_acceleration {
            push_vector("a", &joints);
        }
        if engine.enable_command {
            let motors: Vec<&str> = model.motor_names().collect();
            push_vector("u", &motors);
        }
        if engine.enable_energy {
            header.push("energy".into());
        }
        if sensors {
            for name in model.sensor_names() {
                header.push(format!("{name}.position"));
                header.push(format!("{name}.velocity"));
            }
        }
        let enabled = header.len() > 1;
        self.engine = enabled.then(|| engine.clone());
        self.sensors = sensors;
        if !enabled {
            header.clear();
        }
        self.log = TelemetryLog { header, rows: Vec::new() };
    }

    pub(crate) fn record(&mut self, snapshot: &Snapshot<'_>) {
        let Some(engine) = &self.engine else {
            return;
        };
        let mut row = Vec::with_capacity(self.log.header.len());
        row.push(snapshot.time);
        if engine.enable_configuration {
            row.extend_from_slice(snapshot.q);
        }
        if engine.enable_velocity {
            row.extend_from_slice(snapshot.v);
        }
        if engine.enable_acceleration {
            row.extend_from_slice(snapshot.a);
        }
        if engine.enable_command {
            row.extend_from_slice(snapshot.command);
        }
        if engine.enable_energy {
            row.push(snapshot.energy);
        }
        if self.sensors {
            row.extend(snapshot.sensors.iter().flatten());
        }
        self.log.rows.push(row);
    }

    pub(crate) fn log(&self) -> &TelemetryLog {
        &self.log
    }
}
