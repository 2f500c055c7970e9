//! Stock systems for the arena simulation.
//!
//! Systems run in the order they are registered with the engine. The usual
//! order is:
//!
//! 1. `Control` - turns held arrow keys into acceleration
//! 2. `Physics` - collisions, damping and integration
//! 3. `Render` - draws bodies
//! 4. `DebugOverlay` - statistics panel drawn over everything else

pub mod control;
pub mod debug;
pub mod physics;
pub mod render;

pub use control::Control;
pub use debug::DebugOverlay;
pub use physics::{resolve_collision, Physics, MAX_SPEED};
pub use render::Render;
