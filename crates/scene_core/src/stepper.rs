//! Scene stepping: derives the scene at `t + Δt` from the scene at `t`.
//!
//! Every entity is copied with its identity, classification, driving links,
//! footprint and preserved attributes, then handed to the most specific
//! update rule registered for one of its categories (falling back to plain
//! carry-over). Kinematic writes are tracked so the caller can invalidate
//! prediction and oracle caches afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{Attr, Category, Entity, EntityId};
use crate::error::SceneError;
use crate::geometry::Footprint;
use crate::scene::Scene;

/// Attributes whose mutation invalidates cached predictions.
pub const KINEMATIC_ATTRS: [Attr; 10] = [
    Attr::Speed,
    Attr::Yaw,
    Attr::YawRate,
    Attr::Acceleration,
    Attr::VelocityX,
    Attr::VelocityY,
    Attr::VelocityZ,
    Attr::AccelerationX,
    Attr::AccelerationY,
    Attr::AccelerationZ,
];

/// Per-category update rule. Reads the previous scene, writes the successor
/// entity through the draft.
pub trait UpdateRule: Send + Sync {
    fn apply(
        &self,
        id: EntityId,
        prev: &Scene,
        draft: &mut SceneDraft,
        delta_t: f64,
    ) -> Result<(), SceneError>;
}

/// Fallback rule: carries over every attribute the copy step left unset.
#[derive(Debug, Default)]
pub struct CarryOverRule;

impl UpdateRule for CarryOverRule {
    fn apply(
        &self,
        id: EntityId,
        prev: &Scene,
        draft: &mut SceneDraft,
        _delta_t: f64,
    ) -> Result<(), SceneError> {
        let old = prev.entity(id).ok_or(SceneError::UnknownEntity(id))?;
        draft.carry_over(id, old)
    }
}

/// Maps categories to update rules. Registration order is specificity: the
/// first registered category an entity carries wins.
pub struct RuleRegistry {
    rules: Vec<(Category, Arc<dyn UpdateRule>)>,
    fallback: Arc<dyn UpdateRule>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Arc::new(CarryOverRule),
        }
    }

    pub fn register(&mut self, category: Category, rule: Arc<dyn UpdateRule>) {
        self.rules.push((category, rule));
    }

    pub fn with_rule(mut self, category: Category, rule: Arc<dyn UpdateRule>) -> Self {
        self.register(category, rule);
        self
    }

    pub fn resolve(&self, entity: &Entity) -> Arc<dyn UpdateRule> {
        self.rules
            .iter()
            .find(|(category, _)| entity.is_a(*category))
            .map(|(_, rule)| Arc::clone(rule))
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

/// Key of the execution-priority list: entities matching an earlier key step
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityKey {
    Category(Category),
    Attribute(Attr),
}

impl PriorityKey {
    fn matches(&self, entity: &Entity) -> bool {
        match self {
            PriorityKey::Category(category) => entity.is_a(*category),
            PriorityKey::Attribute(attr) => entity.float(*attr).is_some(),
        }
    }
}

/// What to do when a rule fails for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepPolicy {
    /// Log, keep the entity's preserved copy, continue with the rest.
    #[default]
    IsolateFailures,
    /// Abort the whole step with the rule's error.
    AbortStep,
}

/// Mutable successor scene handed to update rules. Writes to kinematic
/// attributes or the footprint mark the entity dirty.
pub struct SceneDraft {
    timestamp: f64,
    scenery: Arc<crate::scene::Scenery>,
    entities: BTreeMap<EntityId, Entity>,
    dirty: BTreeSet<EntityId>,
}

impl SceneDraft {
    /// Looks up a successor entity, falling back to the static scenery.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).or_else(|| self.scenery.entity(id))
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn set_float(&mut self, id: EntityId, attr: Attr, value: f64) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))?;
        entity.set_float(attr, value);
        if KINEMATIC_ATTRS.contains(&attr) {
            self.dirty.insert(id);
        }
        Ok(())
    }

    pub fn set_footprint(&mut self, id: EntityId, footprint: Footprint) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))?;
        entity.set_footprint(footprint);
        self.dirty.insert(id);
        Ok(())
    }

    /// Copies every attribute of `old` the successor does not carry yet.
    /// Does not mark the entity dirty: carried-over values are unchanged.
    pub fn carry_over(&mut self, id: EntityId, old: &Entity) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))?;
        for (attr, value) in old.attributes() {
            if entity.float(attr).is_none() {
                entity.set_float(attr, value);
            }
        }
        if entity.footprint().is_none() {
            if let Some(fp) = old.footprint() {
                entity.set_footprint(fp.clone());
            }
        }
        Ok(())
    }

    fn freeze(self) -> (Scene, BTreeSet<EntityId>) {
        (
            Scene::from_parts(self.timestamp, self.scenery, self.entities),
            self.dirty,
        )
    }
}

/// Two entities whose footprints collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accident {
    pub a: EntityId,
    pub b: EntityId,
}

/// Result of one step.
pub struct StepOutcome {
    pub scene: Scene,
    pub accidents: Vec<Accident>,
    /// Entities whose rule failed under [`StepPolicy::IsolateFailures`].
    pub failures: Vec<(EntityId, SceneError)>,
    /// Entities with kinematic writes; their cached predictions are stale.
    pub updated: BTreeSet<EntityId>,
}

pub struct SceneStepper {
    registry: RuleRegistry,
    priority: Vec<PriorityKey>,
    preserve: BTreeSet<Attr>,
    policy: StepPolicy,
}

impl SceneStepper {
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            priority: Vec::new(),
            preserve: BTreeSet::from([Attr::Height]),
            policy: StepPolicy::default(),
        }
    }

    pub fn with_priority(mut self, priority: Vec<PriorityKey>) -> Self {
        self.priority = priority;
        self
    }

    /// Extends the preserved attribute set (footprint and `Height` are
    /// always preserved).
    pub fn with_preserve(mut self, extra: impl IntoIterator<Item = Attr>) -> Self {
        self.preserve.extend(extra);
        self
    }

    pub fn with_policy(mut self, policy: StepPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Produces the scene at `prev.timestamp() + delta_t`.
    pub fn step(&self, prev: &Scene, delta_t: f64) -> Result<StepOutcome, SceneError> {
        if delta_t < 0.0 {
            return Err(SceneError::InvalidTimeStep(delta_t));
        }

        let mut entities = BTreeMap::new();
        for old in prev.dynamic_entities() {
            let mut copy = Entity::new(old.id(), old.classify().iter().copied());
            copy.pilots = old.pilots;
            copy.piloted_by = old.piloted_by;
            if let Some(fp) = old.footprint() {
                copy.set_footprint(fp.clone());
            }
            for attr in &self.preserve {
                if let Some(value) = old.float(*attr) {
                    copy.set_float(*attr, value);
                }
            }
            entities.insert(old.id(), copy);
        }

        let mut draft = SceneDraft {
            timestamp: prev.timestamp() + delta_t,
            scenery: Arc::clone(prev.scenery()),
            entities,
            dirty: BTreeSet::new(),
        };

        let mut order: Vec<EntityId> = prev.dynamic_entities().map(|e| e.id()).collect();
        order.sort_by_key(|id| (self.rank(prev, *id), *id));

        let mut failures = Vec::new();
        for id in order {
            let Some(old) = prev.entity(id) else { continue };
            let rule = self.registry.resolve(old);
            if let Err(error) = rule.apply(id, prev, &mut draft, delta_t) {
                match self.policy {
                    StepPolicy::IsolateFailures => {
                        warn!(entity = %id, %error, "update rule failed, keeping preserved copy");
                        failures.push((id, error));
                    }
                    StepPolicy::AbortStep => return Err(error),
                }
            }
        }

        let (scene, updated) = draft.freeze();
        let accidents = detect_accidents(&scene);
        debug!(
            timestamp = scene.timestamp(),
            updated = updated.len(),
            accidents = accidents.len(),
            "stepped scene"
        );
        Ok(StepOutcome {
            scene,
            accidents,
            failures,
            updated,
        })
    }

    fn rank(&self, prev: &Scene, id: EntityId) -> usize {
        let Some(entity) = prev.entity(id) else {
            return usize::MAX;
        };
        self.priority
            .iter()
            .position(|key| key.matches(entity))
            .unwrap_or(usize::MAX)
    }
}

/// Accidents in a scene: both entities extend above the ground, their
/// footprints intersect, and neither drives the other.
pub fn detect_accidents(scene: &Scene) -> Vec<Accident> {
    let entities: Vec<&Entity> = scene.dynamic_entities().collect();
    let mut accidents = Vec::new();
    for (i, a) in entities.iter().enumerate() {
        let Some(fa) = a.footprint() else { continue };
        if a.height().map_or(true, |h| h <= 0.0) {
            continue;
        }
        for b in entities.iter().skip(i + 1) {
            let Some(fb) = b.footprint() else { continue };
            if b.height().map_or(true, |h| h <= 0.0) {
                continue;
            }
            if a.pilots == Some(b.id()) || b.pilots == Some(a.id()) {
                continue;
            }
            if fa.intersects(fb) {
                accidents.push(Accident { a: a.id(), b: b.id() });
            }
        }
    }
    accidents
}
