//! Control system - steers controllable bodies with the arrow keys.

use crate::components::{Active, Body, Controllable, Mobile};
use crate::engine::{Context, System};
use crate::error::EngineResult;
use crate::input::{InputHandler, Key};
use crate::vector::Vector;
use bevy_ecs::prelude::*;

/// Applies arrow-key steering as acceleration.
#[derive(Debug, Default)]
pub struct Control;

impl Control {
    /// Unit direction from the held arrow keys. Screen y grows downward.
    pub fn direction(input: &InputHandler) -> Vector {
        let mut direction = Vector::ZERO;
        if input.is_pressed(Key::ArrowLeft) {
            direction.x -= 1.0;
        }
        if input.is_pressed(Key::ArrowRight) {
            direction.x += 1.0;
        }
        if input.is_pressed(Key::ArrowUp) {
            direction.y -= 1.0;
        }
        if input.is_pressed(Key::ArrowDown) {
            direction.y += 1.0;
        }
        direction.normalized()
    }
}

impl System for Control {
    fn update(&mut self, ctx: &mut Context, _delta: f64) -> EngineResult<()> {
        let direction = Self::direction(&ctx.input);
        let ids = ctx
            .state
            .query::<(With<Active>, With<Controllable>, With<Mobile>, With<Body>)>();

        for id in ids {
            let body = ctx.state.component_mut::<Body>(id)?;
            body.direction = direction;
            body.velocity += direction * body.acceleration;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;

    #[test]
    fn test_direction_normalized() {
        let mut input = InputHandler::new();
        for key in [Key::ArrowRight, Key::ArrowDown] {
            input.handle(InputEvent::Press { key, timestamp: 0.0, coordinates: None, repeat: false });
        }
        input.commit(10.0, 10.0);

        let direction = Control::direction(&input);
        assert!((direction.length() - 1.0).abs() < 1e-12);
        assert!(direction.x > 0.0 && direction.y > 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut input = InputHandler::new();
        for key in [Key::ArrowLeft, Key::ArrowRight] {
            input.handle(InputEvent::Press { key, timestamp: 0.0, coordinates: None, repeat: false });
        }
        input.commit(10.0, 10.0);
        assert_eq!(Control::direction(&input), Vector::ZERO);
    }
}
