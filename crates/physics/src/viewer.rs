//! Headless viewer.
//!
//! Draws the model as a character raster: the rail of prismatic joints as
//! `-`, sliding bodies as `[#]`, hinges as `o` and links as `*` from their
//! origin to twice their centre of mass.

use std::fmt;

use crate::dynamics::LinkFrame;
use crate::model::{JointType, Model};
use crate::types::Vec2;

const WIDTH: usize = 61;
const HEIGHT: usize = 25;
const CELLS_PER_METER_X: f64 = 10.0;
const CELLS_PER_METER_Z: f64 = 5.0;

/// One rendered picture of the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub time: f64,
    pub rows: Vec<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "t = {:.3} s", self.time)?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new() -> Self {
        Self { cells: vec![vec![' '; WIDTH]; HEIGHT] }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cell(point: Vec2) -> Option<(usize, usize)> {
        let col = (WIDTH / 2) as f64 + point.x * CELLS_PER_METER_X;
        let row = (HEIGHT / 2) as f64 - point.z * CELLS_PER_METER_Z;
        let (col, row) = (col.round(), row.round());
        let inside = (0.0..WIDTH as f64).contains(&col) && (0.0..HEIGHT as f64).contains(&row);
        inside.then_some((row as usize, col as usize))
    }

    fn put(&mut self, point: Vec2, glyph: char) {
        if let Some((row, col)) = Self::cell(point) {
            self.cells[row][col] = glyph;
        }
    }

    fn put_text(&mut self, point: Vec2, text: &str) {
        if let Some((row, col)) = Self::cell(point) {
            let start = col.saturating_sub(text.len() / 2);
            for (offset, glyph) in text.chars().enumerate() {
                if let Some(cell) = self.cells[row].get_mut(start + offset) {
                    *cell = glyph;
                }
            }
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn line(&mut self, from: Vec2, to: Vec2, glyph: char) {
        let samples = ((to - from).length() * CELLS_PER_METER_X * 2.0).ceil().max(1.0);
        let count = samples as usize;
        for i in 0..=count {
            let s = i as f64 / samples;
            self.put(from + (to - from) * s, glyph);
        }
    }
}

pub(crate) struct Viewer {
    frames_drawn: u64,
}

impl Viewer {
    pub(crate) fn new() -> Self {
        Self { frames_drawn: 0 }
    }

    pub(crate) fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub(crate) fn draw(&mut self, model: &Model, frames: &[LinkFrame], time: f64) -> Frame {
        let mut canvas = Canvas::new();
        if model.joints.iter().any(|j| matches!(j.kind, JointType::Prismatic { .. })) {
            canvas.cells[HEIGHT / 2].fill('-');
        }
        for (index, link) in model.links.iter().enumerate() {
            if link.parent_joint.is_some() && link.com != Vec2::ZERO {
                let frame = &frames[index];
                let tip = frame.origin + link.com.rotate(frame.angle) * 2.0;
                canvas.line(frame.origin, tip, '*');
            }
        }
        for joint in &model.joints {
            let origin = frames[joint.child_link].origin;
            match joint.kind {
                JointType::Prismatic { .. } => canvas.put_text(origin, "[#]"),
                JointType::Revolute { .. } => canvas.put(origin, 'o'),
            }
        }
        self.frames_drawn += 1;
        Frame {
            time,
            rows: canvas.cells.into_iter().map(|row| row.into_iter().collect()).collect(),
        }
    }
}
