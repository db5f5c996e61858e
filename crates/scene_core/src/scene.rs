//! Scenes and sceneries.
//!
//! A `Scenery` holds the static environment (roads, lanes, crossings) and is
//! shared by every scene of a scenario through an `Arc`. A `Scene` is an
//! immutable snapshot of the dynamic entities at one timestamp; it is
//! assembled through [`SceneBuilder`], which enforces identifier uniqueness
//! across both the dynamic set and the scenery.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entity::{Entity, EntityId};
use crate::error::SceneError;
use crate::geometry::Footprint;

/// Static environment entities, append-only.
#[derive(Debug, Default, Clone)]
pub struct Scenery {
    entities: BTreeMap<EntityId, Entity>,
}

impl Scenery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> Result<(), SceneError> {
        if self.entities.contains_key(&entity.id()) {
            return Err(SceneError::DuplicateEntity(entity.id()));
        }
        self.entities.insert(entity.id(), entity);
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Immutable snapshot of all dynamic entities at one point in time.
#[derive(Debug, Clone)]
pub struct Scene {
    timestamp: f64,
    scenery: Arc<Scenery>,
    entities: BTreeMap<EntityId, Entity>,
}

impl Scene {
    pub(crate) fn from_parts(
        timestamp: f64,
        scenery: Arc<Scenery>,
        entities: BTreeMap<EntityId, Entity>,
    ) -> Self {
        Self {
            timestamp,
            scenery,
            entities,
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn scenery(&self) -> &Arc<Scenery> {
        &self.scenery
    }

    /// Looks up a dynamic entity first, then the shared scenery.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).or_else(|| self.scenery.entity(id))
    }

    pub fn dynamic_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().chain(self.scenery.entities())
    }

    pub fn dynamic_len(&self) -> usize {
        self.entities.len()
    }

    /// Footprint of `id`, resolving through the driving relation: a driver
    /// without its own footprint answers with the driven vehicle's.
    pub fn footprint_of(&self, id: EntityId) -> Option<&Footprint> {
        let e = self.entity(id)?;
        if let Some(fp) = e.footprint() {
            return Some(fp);
        }
        let vehicle = self.entity(e.pilots?)?;
        vehicle.footprint()
    }

    /// Yaw of `id`, falling back to the driven vehicle's yaw for drivers.
    pub fn yaw_of(&self, id: EntityId) -> Option<f64> {
        let e = self.entity(id)?;
        if let Some(yaw) = e.yaw() {
            return Some(yaw);
        }
        self.entity(e.pilots?)?.yaw()
    }
}

/// Builder enforcing the unique-identifier invariant.
#[derive(Debug)]
pub struct SceneBuilder {
    timestamp: f64,
    scenery: Arc<Scenery>,
    entities: BTreeMap<EntityId, Entity>,
}

impl SceneBuilder {
    pub fn new(timestamp: f64, scenery: Arc<Scenery>) -> Self {
        Self {
            timestamp,
            scenery,
            entities: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entity: Entity) -> Result<&mut Self, SceneError> {
        let id = entity.id();
        if self.entities.contains_key(&id) || self.scenery.contains(id) {
            return Err(SceneError::DuplicateEntity(id));
        }
        self.entities.insert(id, entity);
        Ok(self)
    }

    pub fn build(self) -> Scene {
        Scene::from_parts(self.timestamp, self.scenery, self.entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Attr, Category};

    fn vehicle(id: u64) -> Entity {
        Entity::new(EntityId(id), [Category::Vehicle])
            .with_footprint(Footprint::rect(0.0, 0.0, 4.0, 2.0))
            .with_float(Attr::Yaw, 45.0)
    }

    #[test]
    fn builder_rejects_duplicate_dynamic_ids() {
        let mut builder = SceneBuilder::new(0.0, Arc::new(Scenery::new()));
        builder.insert(vehicle(1)).expect("first insert");
        assert!(matches!(
            builder.insert(vehicle(1)),
            Err(SceneError::DuplicateEntity(EntityId(1)))
        ));
    }

    #[test]
    fn builder_rejects_ids_already_in_scenery() {
        let mut scenery = Scenery::new();
        scenery
            .insert(Entity::new(EntityId(9), [Category::Road]))
            .expect("scenery insert");
        let mut builder = SceneBuilder::new(0.0, Arc::new(scenery));
        assert!(matches!(
            builder.insert(vehicle(9)),
            Err(SceneError::DuplicateEntity(EntityId(9)))
        ));
    }

    #[test]
    fn lookup_falls_through_to_scenery() {
        let mut scenery = Scenery::new();
        scenery
            .insert(Entity::new(EntityId(9), [Category::Road]))
            .expect("scenery insert");
        let mut builder = SceneBuilder::new(0.0, Arc::new(scenery));
        builder.insert(vehicle(1)).expect("insert");
        let scene = builder.build();
        assert!(scene.entity(EntityId(1)).is_some());
        assert!(scene.entity(EntityId(9)).is_some());
        assert_eq!(scene.dynamic_len(), 1);
        assert_eq!(scene.all_entities().count(), 2);
    }

    #[test]
    fn driver_footprint_resolves_to_vehicle() {
        let mut builder = SceneBuilder::new(0.0, Arc::new(Scenery::new()));
        builder.insert(vehicle(1)).expect("vehicle");
        let mut driver = Entity::new(EntityId(2), [Category::Driver]);
        driver.pilots = Some(EntityId(1));
        builder.insert(driver).expect("driver");
        let scene = builder.build();
        let fp = scene.footprint_of(EntityId(2)).expect("delegated");
        assert!(matches!(fp, Footprint::Polygon(_)));
        assert_eq!(scene.yaw_of(EntityId(2)), Some(45.0));
    }
}
