//! Engine configuration.

use crate::error::{EngineError, EngineResult};
use crate::input::Key;
use serde::{Deserialize, Serialize};

/// Milliseconds per second; every engine time value is in milliseconds.
pub const SECOND: f64 = 1000.0;

/// Tunables for the engine loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of one fixed simulation step in milliseconds (20 = 50 Hz).
    pub simulation_rate: f64,
    /// Largest frame delta added to the drift at once.
    pub max_frame_delta: f64,
    /// Key that toggles the debug overlay.
    pub debug_toggle: Key,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            simulation_rate: SECOND / 50.0,
            max_frame_delta: SECOND,
            debug_toggle: Key::KeyD,
        }
    }
}

impl EngineConfig {
    /// Config with the given step length and defaults elsewhere.
    pub fn with_rate(simulation_rate: f64) -> Self {
        Self {
            simulation_rate,
            ..Default::default()
        }
    }

    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.simulation_rate.is_finite() && self.simulation_rate > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "simulation rate must be a positive number of milliseconds, got {}",
                self.simulation_rate
            )));
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "max frame delta must be positive, got {}",
                self.max_frame_delta
            )));
        }
        Ok(())
    }

    /// Simulation steps per second.
    pub fn steps_per_second(&self) -> f64 {
        SECOND / self.simulation_rate
    }
}
