//! Components for the arena simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::surface::Color;
use crate::vector::Vector;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// MARKERS
// ============================================================================

/// Entity takes part in simulation and rendering.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Active;

/// Physics integrates the body's position. Bodies without it still bounce
/// other bodies but never move.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mobile;

/// Entity follows keyboard steering.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controllable;

// ============================================================================
// PHYSICS
// ============================================================================

/// Axis-aligned rigid body.
///
/// `position` is the top-left corner; `size` extends right and down.
/// Velocity is in units per second.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub position: Vector,
    pub size: Vector,
    /// Unit steering direction, set by control.
    pub direction: Vector,
    pub velocity: Vector,
    /// Velocity gained per step while steering.
    pub acceleration: f64,
    pub mass: f64,
    pub friction: f64,
}

impl Body {
    pub fn new(position: Vector, size: Vector) -> Self {
        Self {
            position,
            size,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn center(&self) -> Vector {
        self.position + self.size * 0.5
    }

    pub fn right(&self) -> f64 {
        self.position.x + self.size.x
    }

    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.y
    }

    /// AABB overlap test. Touching edges count as overlapping.
    pub fn overlaps(&self, other: &Body) -> bool {
        if self.right() < other.position.x || self.position.x > other.right() {
            return false;
        }
        if self.bottom() < other.position.y || self.position.y > other.bottom() {
            return false;
        }
        true
    }
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vector::ZERO,
            size: Vector::splat(10.0),
            direction: Vector::ZERO,
            velocity: Vector::ZERO,
            acceleration: 100.0,
            mass: 10.0,
            friction: 0.7,
        }
    }
}

// ============================================================================
// PRESENTATION
// ============================================================================

/// Fill color used by the render system.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Renderable {
    pub color: Color,
}

impl Renderable {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for Renderable {
    fn default() -> Self {
        Self::new(Color::FUCHSIA)
    }
}

/// Text panel state owned by the debug overlay.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub text: Vec<String>,
    pub position: Vector,
    pub enabled: bool,
}
