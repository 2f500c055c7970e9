//! Render system - draws every visible body as a filled rectangle.

use crate::components::{Active, Body, Renderable};
use crate::engine::{Context, System};
use crate::error::EngineResult;
use bevy_ecs::prelude::*;

#[derive(Debug, Default)]
pub struct Render;

impl System for Render {
    fn draw(&mut self, ctx: &mut Context, _delta: f64) -> EngineResult<()> {
        let ids = ctx.state.query::<(With<Active>, With<Body>, With<Renderable>)>();
        let (state, surface) = ctx.canvas();

        for id in ids {
            let body = state.component::<Body>(id)?;
            let renderable = state.component::<Renderable>(id)?;
            surface.fill_rect(
                body.position.x.round(),
                body.position.y.round(),
                body.size.x,
                body.size.y,
                renderable.color,
            );
        }
        Ok(())
    }
}
