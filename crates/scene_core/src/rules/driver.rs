//! Driver update: follows the driven vehicle.

use crate::entity::{Attr, EntityId};
use crate::error::SceneError;
use crate::geometry::Footprint;
use crate::scene::Scene;
use crate::stepper::{SceneDraft, UpdateRule};

/// Snaps a driver to its vehicle's pose. Reads the vehicle's already-stepped
/// state from the draft when available (run vehicles first), falling back to
/// the previous scene. A driver without a vehicle just carries over.
#[derive(Debug, Default)]
pub struct DriverRule;

impl UpdateRule for DriverRule {
    fn apply(
        &self,
        id: EntityId,
        prev: &Scene,
        draft: &mut SceneDraft,
        _delta_t: f64,
    ) -> Result<(), SceneError> {
        let old = prev.entity(id).ok_or(SceneError::UnknownEntity(id))?;
        let Some(vehicle_id) = old.pilots else {
            return draft.carry_over(id, old);
        };

        let fresh = draft.entity(vehicle_id).cloned();
        let stale = prev.entity(vehicle_id).cloned();
        if fresh.is_none() && stale.is_none() {
            return Err(SceneError::UnknownEntity(vehicle_id));
        }
        let speed = fresh
            .as_ref()
            .and_then(|e| e.speed())
            .or_else(|| stale.as_ref().and_then(|e| e.speed()));
        let yaw = fresh
            .as_ref()
            .and_then(|e| e.yaw())
            .or_else(|| stale.as_ref().and_then(|e| e.yaw()));
        let centroid = fresh
            .as_ref()
            .and_then(|e| e.footprint())
            .or_else(|| stale.as_ref().and_then(|e| e.footprint()))
            .map(|fp| fp.centroid());
        if let Some(c) = centroid {
            draft.set_footprint(id, Footprint::Point(c))?;
        }
        if let Some(speed) = speed {
            draft.set_float(id, Attr::Speed, speed)?;
        }
        if let Some(yaw) = yaw {
            draft.set_float(id, Attr::Yaw, yaw)?;
        }
        draft.carry_over(id, old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Category, Entity};
    use crate::rules::{standard_priority, VehicleRule};
    use crate::scene::{SceneBuilder, Scenery};
    use crate::stepper::{RuleRegistry, SceneStepper};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn driver_snaps_to_the_fresh_vehicle_pose() {
        let mut vehicle = Entity::new(EntityId(1), [Category::Vehicle])
            .with_footprint(Footprint::rect(0.0, 0.0, 4.0, 2.0))
            .with_float(Attr::Speed, 10.0)
            .with_float(Attr::Yaw, 0.0);
        let mut driver = Entity::new(EntityId(2), [Category::Driver])
            .with_footprint(Footprint::point(0.0, 0.0));
        driver.pilots = Some(EntityId(1));
        vehicle.piloted_by = Some(EntityId(2));

        let mut builder = SceneBuilder::new(0.0, Arc::new(Scenery::new()));
        builder.insert(vehicle).expect("vehicle");
        builder.insert(driver).expect("driver");
        let scene = builder.build();

        let registry = RuleRegistry::new()
            .with_rule(Category::Driver, Arc::new(DriverRule))
            .with_rule(Category::Vehicle, Arc::new(VehicleRule));
        let stepper = SceneStepper::new(registry).with_priority(standard_priority());
        let outcome = stepper.step(&scene, 1.0).expect("step");

        let driver = outcome.scene.entity(EntityId(2)).expect("driver");
        let pos = driver.footprint().expect("footprint").centroid();
        assert_relative_eq!(pos.x(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(pos.y(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(driver.speed().expect("speed"), 10.0);
    }

    #[test]
    fn driver_without_vehicle_carries_over() {
        let driver = Entity::new(EntityId(1), [Category::Driver])
            .with_footprint(Footprint::point(2.0, 2.0))
            .with_float(Attr::Height, 1.8);
        let mut builder = SceneBuilder::new(0.0, Arc::new(Scenery::new()));
        builder.insert(driver).expect("driver");
        let scene = builder.build();

        let registry = RuleRegistry::new().with_rule(Category::Driver, Arc::new(DriverRule));
        let outcome = SceneStepper::new(registry).step(&scene, 1.0).expect("step");
        let copy = outcome.scene.entity(EntityId(1)).expect("present");
        assert_eq!(copy.float(Attr::Height), Some(1.8));
        let pos = copy.footprint().expect("footprint").centroid();
        assert_relative_eq!(pos.x(), 2.0);
    }
}
