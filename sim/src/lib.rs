//! Arena - Simulation Core
//!
//! A fixed-rate 2D simulation core: entity/component storage, a scheduler
//! that decouples simulation steps from render frames, debounced input, and
//! impulse-based collisions between axis-aligned boxes.
//! Uses `bevy_ecs` for component storage.

pub mod clock;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod profiler;
pub mod snapshot;
pub mod store;
pub mod surface;
pub mod systems;
pub mod vector;

pub use clock::{Clock, ManualClock, SystemClock};
pub use components::*;
pub use config::{EngineConfig, SECOND};
pub use engine::{Context, Engine, Stats, System};
pub use error::{EngineError, EngineResult};
pub use input::{InputEntry, InputEvent, InputHandler, Key};
pub use snapshot::Snapshot;
pub use store::{EntityId, Store};
pub use surface::{Color, DrawCommand, DrawSurface, RecordingSurface};
pub use systems::*;
pub use vector::Vector;
