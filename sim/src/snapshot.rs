//! Read-only snapshot of the simulation for hosts and debug tooling.
//!
//! The `Snapshot` struct provides a serializable view of the engine
//! statistics and every physical body.

use crate::components::{Active, Body, Mobile};
use crate::engine::{Engine, Stats};
use crate::error::EngineResult;
use crate::store::Store;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub active: bool,
    pub mobile: bool,
}

/// Engine statistics plus all bodies, ordered by entity id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stats: Stats,
    pub bodies: Vec<BodySnapshot>,
}

impl Snapshot {
    /// Capture the bodies held by a store.
    pub fn capture(store: &mut Store, stats: &Stats) -> EngineResult<Self> {
        let ids = store.query::<With<Body>>();
        let mut bodies = Vec::with_capacity(ids.len());

        for id in ids {
            let body = store.component::<Body>(id)?;
            bodies.push(BodySnapshot {
                id: id.0,
                x: body.position.x,
                y: body.position.y,
                width: body.size.x,
                height: body.size.y,
                vx: body.velocity.x,
                vy: body.velocity.y,
                mass: body.mass,
                active: store.has::<Active>(id)?,
                mobile: store.has::<Mobile>(id)?,
            });
        }

        Ok(Self { stats: *stats, bodies })
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Engine {
    /// Snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> EngineResult<Snapshot> {
        let stats = *self.stats();
        Snapshot::capture(self.state_mut(), &stats)
    }
}
