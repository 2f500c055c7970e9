//! Draw surface collaborator.
//!
//! The core never rasterizes anything itself. Render-side systems write
//! primitives to a [`DrawSurface`] supplied by the host (a canvas, a GPU
//! batcher, a terminal...). [`RecordingSurface`] keeps the primitives as a
//! command list, which is what headless hosts and tests use.

use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// RGBA color, 8-bit channels plus float alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const FUCHSIA: Color = Color::rgb(255, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Primitive drawing target.
pub trait DrawSurface {
    /// Surface dimensions in pixels.
    fn size(&self) -> (f64, f64);

    fn clear(&mut self, width: f64, height: f64);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);

    /// Draw text with its top-left corner at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_size: f64, color: Color);

    fn stroke_line(&mut self, from: Vector, to: Vector, color: Color);

    /// Rendered width of `text`. Defaults to a monospace estimate.
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * 0.6
    }
}

/// A primitive recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    FillRect { x: f64, y: f64, width: f64, height: f64, color: Color },
    FillText { text: String, x: f64, y: f64, font_size: f64, color: Color },
    StrokeLine { from: Vector, to: Vector, color: Color },
}

/// Surface that records every primitive since the last clear.
///
/// Clones share the same command log, so a host can keep a handle while the
/// engine owns the boxed surface.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    commands: Rc<RefCell<Vec<DrawCommand>>>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Commands recorded since (and including) the last clear.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.borrow().clone()
    }

    fn push(&self, command: DrawCommand) {
        self.commands.borrow_mut().push(command);
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.commands.borrow_mut().clear();
        self.push(DrawCommand::Clear { width, height });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.push(DrawCommand::FillRect { x, y, width, height, color });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_size: f64, color: Color) {
        self.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font_size,
            color,
        });
    }

    fn stroke_line(&mut self, from: Vector, to: Vector, color: Color) {
        self.push(DrawCommand::StrokeLine { from, to, color });
    }
}
