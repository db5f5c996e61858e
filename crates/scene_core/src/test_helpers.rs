//! Convenience constructors for tests, benches and examples.
//!
//! Compiled behind the default-on `test-helpers` feature.

use std::sync::Arc;

use crate::entity::{Attr, Category, Entity, EntityId};
use crate::geometry::Footprint;
use crate::scenario::Scenario;
use crate::scene::{Scene, SceneBuilder, Scenery};

pub fn empty_scenery() -> Arc<Scenery> {
    Arc::new(Scenery::new())
}

/// Car-sized vehicle (4.3 m × 1.8 m, 1.5 m tall) at `(x, y)` heading `yaw`.
pub fn vehicle(id: u64, x: f64, y: f64, yaw: f64, speed: f64) -> Entity {
    Entity::new(EntityId(id), [Category::Vehicle])
        .with_footprint(Footprint::oriented_rect(x, y, 4.3, 1.8, yaw))
        .with_float(Attr::Speed, speed)
        .with_float(Attr::Yaw, yaw)
        .with_float(Attr::Height, 1.5)
        .with_float(Attr::Length, 4.3)
        .with_float(Attr::Width, 1.8)
}

/// Pedestrian (0.6 m × 0.3 m, 1.7 m tall) at `(x, y)` heading `yaw`.
pub fn pedestrian(id: u64, x: f64, y: f64, yaw: f64, speed: f64) -> Entity {
    Entity::new(EntityId(id), [Category::Pedestrian])
        .with_footprint(Footprint::rect(x, y, 0.6, 0.3))
        .with_float(Attr::Speed, speed)
        .with_float(Attr::Yaw, yaw)
        .with_float(Attr::Height, 1.7)
}

/// Static obstacle of the given extent and height.
pub fn obstacle(id: u64, x: f64, y: f64, length: f64, width: f64, height: f64) -> Entity {
    Entity::new(EntityId(id), [Category::Road])
        .with_footprint(Footprint::rect(x, y, length, width))
        .with_float(Attr::Height, height)
}

/// Driver point entity piloting `vehicle`; call before inserting either.
pub fn driver_for(id: u64, vehicle: &mut Entity) -> Entity {
    let centroid = vehicle
        .footprint()
        .map(|fp| fp.centroid())
        .unwrap_or_else(|| geo::Point::new(0.0, 0.0));
    let mut driver = Entity::new(EntityId(id), [Category::Driver])
        .with_footprint(Footprint::Point(centroid));
    if let Some(speed) = vehicle.speed() {
        driver.set_float(Attr::Speed, speed);
    }
    if let Some(yaw) = vehicle.yaw() {
        driver.set_float(Attr::Yaw, yaw);
    }
    driver.pilots = Some(vehicle.id());
    vehicle.piloted_by = Some(driver.id());
    driver
}

pub fn scene_at(timestamp: f64, entities: Vec<Entity>) -> Scene {
    let mut builder = SceneBuilder::new(timestamp, empty_scenery());
    for entity in entities {
        builder.insert(entity).expect("test entity ids must be unique");
    }
    builder.build()
}

pub fn scene(entities: Vec<Entity>) -> Scene {
    scene_at(0.0, entities)
}

/// Single-scene scenario wrapping `scene`, sharing its scenery.
pub fn scenario(name: &str, scene: Scene) -> Scenario {
    let mut scenario = Scenario::new(name, Arc::clone(scene.scenery()));
    scenario.push(scene).expect("first scene always appends");
    scenario
}
