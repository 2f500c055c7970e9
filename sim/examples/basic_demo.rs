//! Basic demonstration of the arena simulation core.
//!
//! Run with: cargo run --example basic_demo
//! Set `RUST_LOG=arena_sim=debug` for engine logs.

use arena_sim::{
    Active, Body, Color, Control, Controllable, DebugOverlay, DrawCommand, Engine, EngineConfig,
    EngineResult, InputEvent, Key, ManualClock, Mobile, Physics, RecordingSurface, Render,
    Renderable, Vector,
};
use tracing_subscriber::EnvFilter;

/// Display refresh interval, about 60 Hz.
const FRAME: f64 = 16.0;

fn main() -> EngineResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Arena - Simulation Demo ===\n");

    let clock = ManualClock::new(0.0);
    let surface = RecordingSurface::new(640.0, 480.0);
    let mut engine = Engine::new(
        EngineConfig::default(),
        clock.clone(),
        Some(Box::new(surface.clone())),
    )?;

    engine.add_system(Control)?;
    engine.add_system(Physics::new())?;
    engine.add_system(Render)?;
    engine.add_system(DebugOverlay::new())?;

    let state = engine.state_mut();
    let player = state.spawn((
        Active,
        Mobile,
        Controllable,
        Body::new(Vector::new(100.0, 240.0), Vector::splat(20.0)),
        Renderable::new(Color::BLUE),
    ));
    let ball = state.spawn((
        Active,
        Mobile,
        Body::new(Vector::new(300.0, 240.0), Vector::splat(10.0)).with_velocity(Vector::new(-400.0, 0.0)),
        Renderable::new(Color::RED),
    ));
    state.spawn((
        Active,
        Body::new(Vector::new(20.0, 200.0), Vector::new(10.0, 100.0)).with_mass(1000.0),
        Renderable::new(Color::BLACK),
    ));

    engine.start();

    // Hold right for half a second, then show the debug panel.
    engine.handle_input(InputEvent::Press {
        key: Key::ArrowRight,
        timestamp: 0.0,
        coordinates: None,
        repeat: false,
    });
    for frame in 0..120 {
        clock.advance(FRAME);
        if frame == 30 {
            engine.handle_input(InputEvent::Release { key: Key::ArrowRight, timestamp: clock_time(frame) });
            engine.handle_input(InputEvent::Press {
                key: Key::KeyD,
                timestamp: clock_time(frame),
                coordinates: None,
                repeat: false,
            });
        }
        if frame == 32 {
            engine.handle_input(InputEvent::Release { key: Key::KeyD, timestamp: clock_time(frame) });
        }
        engine.tick()?;

        if (frame + 1) % 30 == 0 {
            let stats = engine.stats();
            println!(
                "--- Frame {} (t={:.0}ms) steps={} drift={:.1}ms ---",
                stats.rendering.frames, stats.simulation.time, stats.simulation.steps, stats.simulation.drift
            );
            for id in [player, ball] {
                let body = engine.state().component::<Body>(id)?;
                println!("  {id}: pos={} vel={}", body.position, body.velocity);
            }
        }
    }

    let commands = surface.commands();
    let rects = commands.iter().filter(|c| matches!(c, DrawCommand::FillRect { .. })).count();
    let texts = commands.iter().filter(|c| matches!(c, DrawCommand::FillText { .. })).count();
    println!("\nLast frame: {} commands ({rects} rects, {texts} text lines)", commands.len());

    engine.stop();

    println!("\n=== Final State (JSON) ===\n");
    match engine.snapshot()?.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot serialization failed: {err}"),
    }
    Ok(())
}

fn clock_time(frame: usize) -> f64 {
    (frame + 1) as f64 * FRAME
}
