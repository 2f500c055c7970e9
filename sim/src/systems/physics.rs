//! Physics system - AABB collisions, elastic impulses and Euler integration.
//!
//! Every step, over all entities with `Active` and `Body`, in query order:
//!
//! 1. each unordered pair `(i, j)`, `i < j`, whose boxes overlap exchanges an
//!    elastic impulse along the line between their centers;
//! 2. once all of body `i`'s pairs are resolved, its velocity is damped by
//!    `1 + mass / 1000`, clamped to [`MAX_SPEED`], and, if it is `Mobile`,
//!    integrated into its position.
//!
//! Resolution is sequential: when several collisions touch one body the
//! result depends on pair order. That is accepted for a simple resolver.
//!
//! A body's position only changes after its own pairs are done, so every
//! overlap test sees start-of-step positions. Detection is therefore done up
//! front, on the rayon pool when the `parallel` feature is enabled.

use crate::components::{Active, Body, Mobile};
use crate::config::SECOND;
use crate::engine::{Context, System};
use crate::error::{EngineError, EngineResult};
use crate::store::EntityId;
use bevy_ecs::prelude::*;

/// Velocity ceiling, in units per second.
pub const MAX_SPEED: f64 = 1000.0;

/// Mass at which damping halves velocity per step.
pub const DAMPING_MASS: f64 = 1000.0;

/// Pairwise collision and integration system.
#[derive(Debug, Default)]
pub struct Physics {
    /// Colliding pairs resolved in the last step.
    collisions: usize,
    /// Pairs skipped over a degenerate mass sum, since creation.
    skipped_pairs: u64,
}

impl Physics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn skipped_pairs(&self) -> u64 {
        self.skipped_pairs
    }

    /// Run one step over a set of bodies. `mobile[i]` tells whether body `i`
    /// may move.
    pub fn step(&mut self, ids: &[EntityId], bodies: &mut [Body], mobile: &[bool], delta: f64) {
        let pairs = overlapping_pairs(bodies);
        let mut next = 0;
        self.collisions = 0;

        for i in 0..bodies.len() {
            while next < pairs.len() && pairs[next].0 == i {
                let j = pairs[next].1;
                next += 1;

                let (head, tail) = bodies.split_at_mut(j);
                match resolve_collision(ids[i], &mut head[i], ids[j], &mut tail[0]) {
                    Ok(()) => self.collisions += 1,
                    Err(err) => {
                        tracing::trace!(error = %err, "collision pair skipped");
                        self.skipped_pairs += 1;
                    }
                }
            }

            let body = &mut bodies[i];
            let damping = 1.0 + body.mass / DAMPING_MASS;
            if damping > 0.0 {
                body.velocity /= damping;
            }
            body.velocity.clamp(MAX_SPEED);

            if mobile[i] {
                body.position += body.velocity * (delta / SECOND);
            }
        }
    }
}

impl System for Physics {
    fn update(&mut self, ctx: &mut Context, delta: f64) -> EngineResult<()> {
        let ids = ctx.state.query::<(With<Active>, With<Body>)>();

        let mut bodies = Vec::with_capacity(ids.len());
        let mut mobile = Vec::with_capacity(ids.len());
        for &id in &ids {
            bodies.push(*ctx.state.component::<Body>(id)?);
            mobile.push(ctx.state.has::<Mobile>(id)?);
        }

        self.step(&ids, &mut bodies, &mobile, delta);

        for (&id, body) in ids.iter().zip(bodies) {
            *ctx.state.component_mut::<Body>(id)? = body;
        }
        Ok(())
    }
}

/// Exchange an elastic impulse between two colliding bodies.
///
/// The normal points from `b`'s center to `a`'s. Fails with
/// [`EngineError::DivisionGuard`] when the mass sum is not strictly positive,
/// leaving both bodies untouched.
pub fn resolve_collision(a_id: EntityId, a: &mut Body, b_id: EntityId, b: &mut Body) -> EngineResult<()> {
    let mass = a.mass + b.mass;
    if !(mass.is_finite() && mass > 0.0) {
        return Err(EngineError::DivisionGuard { a: a_id, b: b_id });
    }

    let normal = (a.center() - b.center()).normalized();
    let relative_velocity = normal.dot(a.velocity - b.velocity);
    let impulse = (2.0 * relative_velocity) / mass;

    a.velocity -= normal * (impulse * b.mass);
    b.velocity += normal * (impulse * a.mass);
    Ok(())
}

/// All overlapping pairs `(i, j)` with `i < j`, sorted.
fn overlapping_pairs(bodies: &[Body]) -> Vec<(usize, usize)> {
    let n = bodies.len();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n)
            .into_par_iter()
            .flat_map_iter(|i| {
                ((i + 1)..n)
                    .filter(move |&j| bodies[i].overlaps(&bodies[j]))
                    .map(move |j| (i, j))
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..n)
            .flat_map(|i| {
                ((i + 1)..n)
                    .filter(move |&j| bodies[i].overlaps(&bodies[j]))
                    .map(move |j| (i, j))
            })
            .collect()
    }
}
