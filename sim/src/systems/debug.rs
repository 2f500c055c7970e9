//! Debug overlay - engine statistics panel and velocity arrows.
//!
//! Toggled by the configured debug key (`KeyD` by default). While enabled the
//! text is rebuilt every [`REFRESH_INTERVAL`] of wall time; the held-keys line
//! is refreshed every step.

use crate::components::{Active, Body, Overlay, Renderable};
use crate::engine::{Context, Stats, System};
use crate::error::{EngineError, EngineResult};
use crate::input::InputHandler;
use crate::store::EntityId;
use crate::surface::Color;
use bevy_ecs::prelude::*;

/// Wall time between full text refreshes, in milliseconds.
pub const REFRESH_INTERVAL: f64 = 300.0;

const LINE_HEIGHT: f64 = 14.0;
const FONT_SIZE: f64 = 12.0;
const PANEL_WIDTH: f64 = 135.0;
const KEYS_LINE: usize = 12;

#[derive(Debug, Default)]
pub struct DebugOverlay {
    entity: Option<EntityId>,
    checkpoint: f64,
}

impl DebugOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity holding the overlay state, once installed.
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    fn overlay_entity(&self) -> EngineResult<EntityId> {
        self.entity
            .ok_or_else(|| EngineError::InvalidConfiguration("debug overlay not installed".to_string()))
    }
}

fn line(label: &str, value: f64) -> String {
    format!("{label:<10}{value:>10.2}")
}

fn header(title: &str) -> String {
    format!("{title:-<20}")
}

fn keys_line(input: &InputHandler) -> String {
    let keys: Vec<String> = input.keys().iter().map(|key| key.to_string()).collect();
    format!("{:<10}{}", "Keys", keys.join(","))
}

/// Full overlay text for the given statistics.
pub fn overlay_text(stats: &Stats, steps_per_second: f64, keys: String) -> Vec<String> {
    vec![
        header("--Rendering"),
        line("Count", stats.rendering.frames as f64),
        line("Rate", stats.rendering.rate),
        line("Delta", stats.rendering.delta),
        line("Duration", stats.rendering.duration),
        header("--Simulation"),
        line("Steps", stats.simulation.steps as f64),
        line("Rate", steps_per_second),
        line("Delta", stats.simulation.delta),
        line("Duration", stats.simulation.duration),
        line("Drift", stats.simulation.drift),
        header("--Input"),
        keys,
    ]
}

impl System for DebugOverlay {
    fn install(&mut self, ctx: &mut Context) -> EngineResult<()> {
        self.checkpoint = ctx.stats().time;
        let id = ctx.state.create_entity(None);
        ctx.state.set_component(id, Overlay::default())?;
        self.entity = Some(id);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context, _delta: f64) -> EngineResult<()> {
        let id = self.overlay_entity()?;
        let toggled = ctx.input.is_fresh(ctx.config().debug_toggle);
        let keys = keys_line(&ctx.input);
        let stats = *ctx.stats();
        let steps_per_second = ctx.config().steps_per_second();

        let overlay = ctx.state.component_mut::<Overlay>(id)?;
        if toggled {
            overlay.enabled = !overlay.enabled;
        }
        if !overlay.enabled {
            return Ok(());
        }

        if overlay.text.len() > KEYS_LINE {
            overlay.text[KEYS_LINE] = keys.clone();
        }

        if stats.time - self.checkpoint < REFRESH_INTERVAL && !overlay.text.is_empty() {
            return Ok(());
        }

        overlay.text = overlay_text(&stats, steps_per_second, keys);
        self.checkpoint = stats.time;
        Ok(())
    }

    fn draw(&mut self, ctx: &mut Context, _delta: f64) -> EngineResult<()> {
        let id = self.overlay_entity()?;
        let bodies = ctx.state.query::<(With<Active>, With<Body>, With<Renderable>)>();
        let (state, surface) = ctx.canvas();

        let overlay = state.component::<Overlay>(id)?;
        if !overlay.enabled {
            return Ok(());
        }

        let origin = overlay.position;
        surface.fill_rect(
            origin.x,
            origin.y,
            PANEL_WIDTH,
            overlay.text.len() as f64 * LINE_HEIGHT,
            Color::rgba(0, 0, 0, 0.8),
        );
        for (i, text) in overlay.text.iter().enumerate() {
            surface.fill_text(text, origin.x, origin.y + i as f64 * LINE_HEIGHT, FONT_SIZE, Color::WHITE);
        }

        for body_id in bodies {
            let body = state.component::<Body>(body_id)?;
            let center = body.center();
            surface.stroke_line(center, center + body.velocity / 10.0, Color::GREEN);

            let speed = format!("{:.2}", body.velocity.length());
            let width = surface.measure_text(&speed, FONT_SIZE);
            surface.fill_text(&speed, body.position.x - width, body.position.y - 10.0, FONT_SIZE, Color::GREEN);
        }
        Ok(())
    }
}
