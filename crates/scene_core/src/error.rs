//! Error taxonomy for scene construction and stepping.
//!
//! Predicates whose inputs are merely absent return `Option` instead of an
//! error; `SceneError` is reserved for structural problems.

use thiserror::Error;

use crate::entity::{Attr, EntityId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("entity {entity} is missing required attribute {attr:?}")]
    MissingAttribute { entity: EntityId, attr: Attr },

    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("duplicate entity identifier {0}")]
    DuplicateEntity(EntityId),

    #[error("unknown entity identifier {0}")]
    UnknownEntity(EntityId),

    #[error("scene timestamp {next} is not after {last}")]
    NonMonotonicTimestamp { last: f64, next: f64 },

    #[error("time step must be positive, got {0}")]
    InvalidTimeStep(f64),

    #[error("cannot simulate an empty scenario")]
    EmptyScenario,
}
