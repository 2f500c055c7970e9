//! Engine: system registry and the fixed-rate simulation loop.
//!
//! ## Fixed Timestep
//!
//! The host calls [`Engine::tick`] once per display refresh. Each call reads
//! the wall clock, adds the frame delta (capped at `max_frame_delta`) to the
//! drift, runs as many fixed simulation steps as the drift covers, then draws
//! exactly one frame. Simulation therefore advances at `simulation_rate`
//! regardless of frame rate, and a long pause (suspended tab, debugger) costs
//! at most one second of catch-up.
//!
//! ## Step order
//!
//! A simulation step commits staged input first, then calls `update` on every
//! system in registration order. A render step clears the surface once, then
//! calls `draw` on every system in registration order. There is no priority
//! mechanism; ordering dependencies are expressed by registration order.
//!
//! Errors returned by a system stop the engine and reach the caller.

use crate::clock::Clock;
use crate::config::{EngineConfig, SECOND};
use crate::error::{EngineError, EngineResult};
use crate::input::{InputEvent, InputHandler};
use crate::store::Store;
use crate::surface::DrawSurface;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::time::Instant;

#[cfg(feature = "profile")]
use crate::profiler::Profiler;

/// Upcast helper so registered systems can be looked up by concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of logic run by the engine every step and every frame.
///
/// All hooks default to doing nothing. `delta` is in milliseconds.
pub trait System: AsAny {
    /// Called once when the system is registered. May create entities.
    fn install(&mut self, _ctx: &mut Context) -> EngineResult<()> {
        Ok(())
    }

    /// Advance simulation state by one fixed step.
    fn update(&mut self, _ctx: &mut Context, _delta: f64) -> EngineResult<()> {
        Ok(())
    }

    /// Draw a frame. `delta` is the wall time since the previous frame.
    fn draw(&mut self, _ctx: &mut Context, _delta: f64) -> EngineResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Simulation step counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Total simulation steps.
    pub steps: u64,
    /// Length of the last step.
    pub delta: f64,
    /// Wall time spent in the last step.
    pub duration: f64,
    /// Time not yet consumed by simulation steps, always in `[0, rate)`
    /// between frames.
    pub drift: f64,
    /// Total simulated time.
    pub time: f64,
}

/// Render frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderingStats {
    /// Total frames drawn.
    pub frames: u64,
    /// Frames per second derived from the last frame delta.
    pub rate: f64,
    /// Wall time since the previous frame.
    pub delta: f64,
    /// Wall time spent in the last frame.
    pub duration: f64,
}

/// Engine statistics. Written only by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Frame-clock time of the last frame.
    pub time: f64,
    pub simulation: SimulationStats,
    pub rendering: RenderingStats,
}

/// Everything a system may touch during a hook.
pub struct Context {
    pub state: Store,
    pub input: InputHandler,
    stats: Stats,
    config: EngineConfig,
    surface: Box<dyn DrawSurface>,
}

impl Context {
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&mut self) -> &mut dyn DrawSurface {
        self.surface.as_mut()
    }

    /// Read the store while drawing.
    pub fn canvas(&mut self) -> (&Store, &mut dyn DrawSurface) {
        (&self.state, self.surface.as_mut())
    }
}

/// The engine owns the systems, the shared [`Context`] and the clock.
pub struct Engine {
    systems: Vec<Box<dyn System>>,
    ctx: Context,
    clock: Box<dyn Clock>,
    last_time: f64,
    running: bool,
    /// Timings of `update` hooks, one tick per simulation step.
    #[cfg(feature = "profile")]
    profiler: Profiler,
    /// Timings of `draw` hooks, one tick per frame.
    #[cfg(feature = "profile")]
    draw_profiler: Profiler,
}

impl Engine {
    /// Create an engine drawing to `surface`.
    ///
    /// Fails with [`EngineError::InvalidConfiguration`] when no surface could
    /// be acquired or the config is invalid.
    pub fn new(
        config: EngineConfig,
        clock: impl Clock + 'static,
        surface: Option<Box<dyn DrawSurface>>,
    ) -> EngineResult<Self> {
        let surface = surface.ok_or_else(|| {
            EngineError::InvalidConfiguration("couldn't acquire a draw surface".to_string())
        })?;
        config.validate()?;

        Ok(Self {
            systems: Vec::new(),
            ctx: Context {
                state: Store::new(),
                input: InputHandler::new(),
                stats: Stats::default(),
                config,
                surface,
            },
            clock: Box::new(clock),
            last_time: 0.0,
            running: false,
            #[cfg(feature = "profile")]
            profiler: Profiler::new(),
            #[cfg(feature = "profile")]
            draw_profiler: Profiler::new(),
        })
    }

    /// Register a system and install it.
    ///
    /// A system of the same type that is already registered is replaced in
    /// place, keeping its position in the run order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> EngineResult<()> {
        let mut system: Box<dyn System> = Box::new(system);
        system.install(&mut self.ctx)?;

        let existing = self
            .systems
            .iter()
            .position(|s| <dyn System as AsAny>::as_any(s.as_ref()).is::<S>());
        match existing {
            Some(index) => {
                tracing::debug!(system = system.name(), "system replaced");
                self.systems[index] = system;
            }
            None => {
                tracing::debug!(system = system.name(), "system installed");
                self.systems.push(system);
            }
        }
        Ok(())
    }

    pub fn system<S: System + 'static>(&self) -> EngineResult<&S> {
        self.systems
            .iter()
            .find_map(|s| <dyn System as AsAny>::as_any(s.as_ref()).downcast_ref::<S>())
            .ok_or(EngineError::SystemNotFound(type_name::<S>()))
    }

    pub fn system_mut<S: System + 'static>(&mut self) -> EngineResult<&mut S> {
        self.systems
            .iter_mut()
            .find_map(|s| <dyn System as AsAny>::as_any_mut(s.as_mut()).downcast_mut::<S>())
            .ok_or(EngineError::SystemNotFound(type_name::<S>()))
    }

    /// Unregister a system. Entities it created stay in the store.
    pub fn remove_system<S: System + 'static>(&mut self) -> EngineResult<()> {
        let index = self
            .systems
            .iter()
            .position(|s| <dyn System as AsAny>::as_any(s.as_ref()).is::<S>())
            .ok_or(EngineError::SystemNotFound(type_name::<S>()))?;
        self.systems.remove(index);
        Ok(())
    }

    /// Names of registered systems, in run order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn state(&self) -> &Store {
        &self.ctx.state
    }

    pub fn state_mut(&mut self) -> &mut Store {
        &mut self.ctx.state
    }

    pub fn input(&self) -> &InputHandler {
        &self.ctx.input
    }

    /// Stage a raw host event. Safe to call at any time between ticks.
    pub fn handle_input(&mut self, event: InputEvent) {
        self.ctx.input.handle(event);
    }

    pub fn stats(&self) -> &Stats {
        &self.ctx.stats
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    #[cfg(feature = "profile")]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    #[cfg(feature = "profile")]
    pub fn draw_profiler(&self) -> &Profiler {
        &self.draw_profiler
    }

    /// Change the step length. Only allowed before [`Engine::start`].
    pub fn set_simulation_rate(&mut self, rate: f64) -> EngineResult<()> {
        if self.running {
            return Err(EngineError::InvalidConfiguration(
                "simulation rate can't change while running".to_string(),
            ));
        }
        let config = EngineConfig {
            simulation_rate: rate,
            ..self.ctx.config.clone()
        };
        config.validate()?;
        self.ctx.config = config;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the loop. The first tick measures its delta from now.
    /// Profiler data from an earlier run is discarded.
    pub fn start(&mut self) {
        self.last_time = self.clock.now();
        self.ctx.stats.time = self.last_time;
        self.running = true;
        #[cfg(feature = "profile")]
        {
            self.profiler.reset();
            self.draw_profiler.reset();
        }
        tracing::info!(
            rate = self.ctx.config.simulation_rate,
            systems = self.systems.len(),
            "engine started"
        );
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::info!(
                steps = self.ctx.stats.simulation.steps,
                frames = self.ctx.stats.rendering.frames,
                "engine stopped"
            );
        }
        self.running = false;
        #[cfg(feature = "profile")]
        tracing::info!("\n{}\n{}", self.profiler.summary(), self.draw_profiler.summary());
    }

    /// Run one frame against the engine clock. Returns the number of
    /// simulation steps executed. A stopped engine does nothing.
    pub fn tick(&mut self) -> EngineResult<u32> {
        if !self.running {
            return Ok(0);
        }

        let now = self.clock.now();
        let delta = now - self.last_time;
        self.last_time = now;
        self.ctx.stats.time = now;

        self.checked_frame(delta)
    }

    /// Run one frame with an externally measured frame delta. The frame
    /// clock (`Stats::time`) moves forward by `frame_delta`.
    pub fn advance(&mut self, frame_delta: f64) -> EngineResult<u32> {
        if !self.running {
            return Ok(0);
        }

        self.ctx.stats.time += frame_delta.max(0.0);
        self.checked_frame(frame_delta)
    }

    fn checked_frame(&mut self, frame_delta: f64) -> EngineResult<u32> {
        let result = self.frame(frame_delta);
        if let Err(err) = &result {
            tracing::error!(error = %err, "system error, engine halted");
            self.stop();
        }
        result
    }

    /// Drive `frames` frames, or fewer if the engine stops.
    pub fn run(&mut self, frames: usize) -> EngineResult<()> {
        for _ in 0..frames {
            if !self.running {
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    /// Drive frames until `done` returns true or the engine stops.
    pub fn run_until<F>(&mut self, mut done: F) -> EngineResult<()>
    where
        F: FnMut(&Engine) -> bool,
    {
        while self.running && !done(self) {
            self.tick()?;
        }
        Ok(())
    }

    fn frame(&mut self, frame_delta: f64) -> EngineResult<u32> {
        let rate = self.ctx.config.simulation_rate;

        // Prevent drift from ballooning.
        self.ctx.stats.simulation.drift += frame_delta.clamp(0.0, self.ctx.config.max_frame_delta);

        let mut steps = 0;
        while self.ctx.stats.simulation.drift >= rate {
            self.ctx.stats.simulation.drift -= rate;
            self.update(rate)?;
            steps += 1;
        }

        self.draw(frame_delta)?;
        Ok(steps)
    }

    /// One fixed simulation step.
    fn update(&mut self, delta: f64) -> EngineResult<()> {
        let started = Instant::now();

        self.ctx.stats.simulation.time += delta;
        self.ctx.input.commit(delta, self.ctx.stats.simulation.time);

        for system in &mut self.systems {
            #[cfg(feature = "profile")]
            self.profiler.time_section(system.name(), || system.update(&mut self.ctx, delta))?;
            #[cfg(not(feature = "profile"))]
            system.update(&mut self.ctx, delta)?;
        }

        #[cfg(feature = "profile")]
        self.profiler.tick();

        let stats = &mut self.ctx.stats.simulation;
        stats.steps += 1;
        stats.delta = delta;
        stats.duration = started.elapsed().as_secs_f64() * SECOND;
        tracing::trace!(step = stats.steps, "simulation step");
        Ok(())
    }

    /// One render frame.
    fn draw(&mut self, delta: f64) -> EngineResult<()> {
        let started = Instant::now();

        let (width, height) = self.ctx.surface.size();
        self.ctx.surface.clear(width, height);

        for system in &mut self.systems {
            #[cfg(feature = "profile")]
            self.draw_profiler.time_section(system.name(), || system.draw(&mut self.ctx, delta))?;
            #[cfg(not(feature = "profile"))]
            system.draw(&mut self.ctx, delta)?;
        }

        #[cfg(feature = "profile")]
        self.draw_profiler.tick();

        let stats = &mut self.ctx.stats.rendering;
        stats.frames += 1;
        stats.rate = if delta > 0.0 { SECOND / delta } else { 0.0 };
        stats.delta = delta;
        stats.duration = started.elapsed().as_secs_f64() * SECOND;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::input::Key;
    use crate::surface::{DrawCommand, RecordingSurface};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        label: &'static str,
        log: Log,
    }

    impl System for Probe {
        fn install(&mut self, _ctx: &mut Context) -> EngineResult<()> {
            self.log.borrow_mut().push(format!("{}:install", self.label));
            Ok(())
        }

        fn update(&mut self, ctx: &mut Context, _delta: f64) -> EngineResult<()> {
            let fresh = if ctx.input.is_fresh(Key::Space) { "+space" } else { "" };
            self.log.borrow_mut().push(format!("{}:update{}", self.label, fresh));
            Ok(())
        }

        fn draw(&mut self, _ctx: &mut Context, _delta: f64) -> EngineResult<()> {
            self.log.borrow_mut().push(format!("{}:draw", self.label));
            Ok(())
        }
    }

    struct Other;
    impl System for Other {}

    struct Failing;
    impl System for Failing {
        fn update(&mut self, ctx: &mut Context, _delta: f64) -> EngineResult<()> {
            ctx.state.component::<crate::components::Body>(crate::store::EntityId(999))?;
            Ok(())
        }
    }

    fn engine(rate: f64) -> (Engine, ManualClock) {
        let clock = ManualClock::new(0.0);
        let surface = RecordingSurface::new(320.0, 240.0);
        let engine = Engine::new(EngineConfig::with_rate(rate), clock.clone(), Some(Box::new(surface))).unwrap();
        (engine, clock)
    }

    #[test]
    fn test_missing_surface_is_fatal() {
        let result = Engine::new(EngineConfig::default(), ManualClock::new(0.0), None);
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_rate_is_fatal() {
        let surface = RecordingSurface::new(1.0, 1.0);
        let result = Engine::new(EngineConfig::with_rate(0.0), ManualClock::new(0.0), Some(Box::new(surface)));
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_drift_leftover() {
        let (mut engine, clock) = engine(10.0);
        engine.start();
        clock.set(35.0);

        assert_eq!(engine.tick().unwrap(), 3);
        assert_eq!(engine.stats().simulation.steps, 3);
        assert_eq!(engine.stats().simulation.drift, 5.0);
        assert_eq!(engine.stats().rendering.frames, 1);

        clock.advance(5.0);
        assert_eq!(engine.tick().unwrap(), 1);
        assert_eq!(engine.stats().simulation.drift, 0.0);
    }

    #[test]
    fn test_step_count_tracks_elapsed_time() {
        let (mut engine, clock) = engine(16.0);
        engine.start();

        let deltas = [3.0, 17.5, 40.0, 0.0, 16.0, 9.25, 120.0, 1.0, 33.3];
        let mut total = 0.0;
        for delta in deltas {
            clock.advance(delta);
            total += delta;
            engine.tick().unwrap();
            let drift = engine.stats().simulation.drift;
            assert!((0.0..16.0).contains(&drift), "drift {drift} out of range");
        }

        let expected = (total / 16.0_f64).floor() as i64;
        let steps = engine.stats().simulation.steps as i64;
        assert!((steps - expected).abs() <= 1);
        assert_eq!(engine.stats().rendering.frames, deltas.len() as u64);
    }

    #[test]
    fn test_frame_delta_is_capped() {
        let (mut engine, clock) = engine(10.0);
        engine.start();
        clock.set(60_000.0);

        assert_eq!(engine.tick().unwrap(), 100);
        assert_eq!(engine.stats().rendering.delta, 60_000.0);
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let (mut engine, clock) = engine(10.0);
        let log: Log = Rc::default();
        engine.add_system(Probe { label: "a", log: log.clone() }).unwrap();
        engine.add_system(Other).unwrap();
        engine.add_system(Probe2 { inner: Probe { label: "b", log: log.clone() } }).unwrap();

        engine.start();
        engine.handle_input(InputEvent::Press {
            key: Key::Space,
            timestamp: 0.0,
            coordinates: None,
            repeat: false,
        });
        clock.set(20.0);
        engine.tick().unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "a:install",
                "b:install",
                "a:update+space",
                "b:update+space",
                "a:update",
                "b:update",
                "a:draw",
                "b:draw",
            ]
        );
    }

    struct Probe2 {
        inner: Probe,
    }

    impl System for Probe2 {
        fn install(&mut self, ctx: &mut Context) -> EngineResult<()> {
            self.inner.install(ctx)
        }

        fn update(&mut self, ctx: &mut Context, delta: f64) -> EngineResult<()> {
            self.inner.update(ctx, delta)
        }

        fn draw(&mut self, ctx: &mut Context, delta: f64) -> EngineResult<()> {
            self.inner.draw(ctx, delta)
        }
    }

    #[test]
    fn test_surface_cleared_once_per_frame() {
        let clock = ManualClock::new(0.0);
        let surface = RecordingSurface::new(320.0, 240.0);
        let probe = surface.clone();
        let mut engine = Engine::new(EngineConfig::with_rate(10.0), clock.clone(), Some(Box::new(surface))).unwrap();
        engine.start();
        clock.set(8.0);
        engine.tick().unwrap();

        assert_eq!(engine.stats().simulation.steps, 0);
        assert_eq!(probe.commands(), vec![DrawCommand::Clear { width: 320.0, height: 240.0 }]);
        assert_eq!(engine.stats().rendering.rate, 125.0);
    }

    #[test]
    fn test_system_lookup_and_replacement() {
        let (mut engine, _clock) = engine(10.0);
        let log: Log = Rc::default();
        engine.add_system(Probe { label: "first", log: log.clone() }).unwrap();
        engine.add_system(Other).unwrap();
        engine.add_system(Probe { label: "second", log: log.clone() }).unwrap();

        assert_eq!(engine.system_names().len(), 2);
        assert_eq!(engine.system::<Probe>().unwrap().label, "second");
        assert!(engine.system_names()[0].ends_with("Probe"));

        engine.system_mut::<Probe>().unwrap().label = "third";
        assert_eq!(engine.system::<Probe>().unwrap().label, "third");

        engine.remove_system::<Other>().unwrap();
        assert!(matches!(engine.system::<Other>(), Err(EngineError::SystemNotFound(_))));
        assert!(matches!(engine.remove_system::<Other>(), Err(EngineError::SystemNotFound(_))));
    }

    #[test]
    fn test_system_error_halts_loop() {
        let (mut engine, clock) = engine(10.0);
        engine.add_system(Failing).unwrap();
        engine.start();
        clock.set(10.0);

        assert!(matches!(engine.tick(), Err(EngineError::NotFound(_))));
        assert!(!engine.is_running());
        assert_eq!(engine.stats().simulation.steps, 0);

        clock.set(100.0);
        assert_eq!(engine.tick().unwrap(), 0);
        assert!(engine.run(5).is_ok());
    }

    #[test]
    fn test_rate_locked_while_running() {
        let (mut engine, _clock) = engine(10.0);
        engine.set_simulation_rate(15.0).unwrap();
        assert_eq!(engine.config().simulation_rate, 15.0);
        assert!(engine.set_simulation_rate(-1.0).is_err());

        engine.start();
        assert!(matches!(
            engine.set_simulation_rate(20.0),
            Err(EngineError::InvalidConfiguration(_))
        ));
        engine.stop();
        engine.set_simulation_rate(20.0).unwrap();
    }

    #[test]
    fn test_run_until() {
        let (mut engine, clock) = engine(10.0);
        engine.start();
        engine
            .run_until(|engine| {
                clock.advance(16.0);
                engine.stats().simulation.steps >= 10
            })
            .unwrap();
        assert!(engine.stats().simulation.steps >= 10);
        assert_eq!(engine.stats().simulation.time, engine.stats().simulation.steps as f64 * 10.0);
    }

    #[test]
    fn test_advance_moves_frame_clock() {
        let (mut engine, _clock) = engine(10.0);
        engine.start();

        assert_eq!(engine.advance(25.0).unwrap(), 2);
        assert_eq!(engine.stats().time, 25.0);

        assert_eq!(engine.advance(-5.0).unwrap(), 0);
        assert_eq!(engine.stats().time, 25.0);
        assert_eq!(engine.stats().simulation.drift, 5.0);
    }

    #[cfg(feature = "profile")]
    #[test]
    fn test_profiler_covers_update_and_draw() {
        let (mut engine, clock) = engine(10.0);
        engine.add_system(Other).unwrap();
        engine.start();
        clock.set(25.0);
        engine.tick().unwrap();

        let name = engine.system_names()[0];
        assert_eq!(engine.profiler().get_section(name).map(|s| s.call_count), Some(2));
        assert_eq!(engine.profiler().tick_count(), 2);
        assert_eq!(engine.draw_profiler().get_section(name).map(|s| s.call_count), Some(1));
        assert_eq!(engine.draw_profiler().tick_count(), 1);

        engine.stop();
        engine.start();
        assert!(engine.profiler().get_section(name).is_none());
        assert_eq!(engine.draw_profiler().tick_count(), 0);
    }
}
