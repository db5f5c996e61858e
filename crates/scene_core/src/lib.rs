//! Spatio-temporal traffic scene modeling.
//!
//! Models scenes of mobile entities (vehicles, pedestrians, cyclists) over a
//! static scenery and derives safety-critical geometric relationships:
//!
//! - [`prediction`]: kinematic trajectory prediction with memoization
//! - [`oracle`]: path-intersection detection over predicted trajectories
//! - [`relations`]: distance, topological and directional predicates
//! - [`reachable`]: one-second reachable areas and small distances
//! - [`occlusion`]: field-of-view occlusion rates
//! - [`stepper`] / [`rules`]: scene stepping with per-category update rules
//! - [`runner`]: fixed-step scenario simulation with early stop

pub mod entity;
pub mod error;
pub mod geometry;
pub mod occlusion;
pub mod oracle;
pub mod prediction;
pub mod reachable;
pub mod relations;
pub mod rules;
pub mod runner;
pub mod scenario;
pub mod scene;
pub mod stepper;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use entity::{Attr, Category, Entity, EntityId};
pub use error::SceneError;
pub use geometry::Footprint;
pub use occlusion::{occlusions, Occlusion, OcclusionConfig};
pub use oracle::{CriticalityConfig, PathCrossing, PathOracle};
pub use prediction::{PredictionConfig, Predictor, TrajectorySample};
pub use runner::{simulate, simulate_with_hook, SimulationParams, SimulationReport};
pub use scenario::{build_scenario, Scenario, ScenarioParams};
pub use scene::{Scene, SceneBuilder, Scenery};
pub use stepper::{
    Accident, PriorityKey, RuleRegistry, SceneDraft, SceneStepper, StepOutcome, StepPolicy,
    UpdateRule,
};
