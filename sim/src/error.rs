//! Error types for the simulation core.

use crate::store::EntityId;
use thiserror::Error;

/// Errors raised by the store, the engine and the stock systems.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The entity does not exist (never created, or already removed).
    #[error("entity {0} not found")]
    NotFound(EntityId),

    /// No system of the requested type is registered.
    #[error("system {0} not registered")]
    SystemNotFound(&'static str),

    /// The entity exists but does not carry the requested component.
    #[error("entity {entity} has no {component} component")]
    ComponentAbsent {
        entity: EntityId,
        component: &'static str,
    },

    /// Engine could not be constructed or reconfigured.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Two colliding bodies whose combined mass cannot divide an impulse.
    #[error("degenerate mass sum between {a} and {b}")]
    DivisionGuard { a: EntityId, b: EntityId },

    /// Key code string that does not name a known input key.
    #[error("unknown key code: {0}")]
    UnknownKey(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for simulation operations.
pub type EngineResult<T> = Result<T, EngineError>;
