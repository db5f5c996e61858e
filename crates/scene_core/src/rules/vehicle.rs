//! Vehicle update: constant speed, yaw-rate steering.

use crate::entity::{Attr, EntityId};
use crate::error::SceneError;
use crate::geometry::heading_vec;
use crate::scene::Scene;
use crate::stepper::{SceneDraft, UpdateRule};

/// Advances a vehicle by `speed·Δt` along its heading, turning by
/// `yaw_rate·Δt`, and refreshes the velocity components to match.
#[derive(Debug, Default)]
pub struct VehicleRule;

impl UpdateRule for VehicleRule {
    fn apply(
        &self,
        id: EntityId,
        prev: &Scene,
        draft: &mut SceneDraft,
        delta_t: f64,
    ) -> Result<(), SceneError> {
        let old = prev.entity(id).ok_or(SceneError::UnknownEntity(id))?;
        let speed = old.speed().unwrap_or(0.0);
        let old_yaw = old.yaw().unwrap_or(0.0);
        let yaw_rate = old.yaw_rate();
        let yaw = (old_yaw + yaw_rate.unwrap_or(0.0) * delta_t).rem_euclid(360.0);
        let (hx, hy) = heading_vec(yaw);

        if let Some(fp) = old.footprint() {
            let moved = fp
                .rotate_around(yaw - old_yaw, fp.centroid())
                .translate(speed * delta_t * hx, speed * delta_t * hy);
            draft.set_footprint(id, moved)?;
        }

        draft.set_float(id, Attr::Speed, speed)?;
        draft.set_float(id, Attr::Yaw, yaw)?;
        if let Some(rate) = yaw_rate {
            draft.set_float(id, Attr::YawRate, rate)?;
        }
        draft.set_float(id, Attr::VelocityX, speed * hx)?;
        draft.set_float(id, Attr::VelocityY, speed * hy)?;
        draft.carry_over(id, old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Category, Entity};
    use crate::geometry::Footprint;
    use crate::scene::{SceneBuilder, Scenery};
    use crate::stepper::{RuleRegistry, SceneStepper};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn stepper() -> SceneStepper {
        SceneStepper::new(
            RuleRegistry::new().with_rule(Category::Vehicle, Arc::new(VehicleRule)),
        )
    }

    fn scene_with(entity: Entity) -> Scene {
        let mut builder = SceneBuilder::new(0.0, Arc::new(Scenery::new()));
        builder.insert(entity).expect("insert");
        builder.build()
    }

    #[test]
    fn advances_along_heading() {
        let scene = scene_with(
            Entity::new(EntityId(1), [Category::Vehicle])
                .with_footprint(Footprint::rect(0.0, 0.0, 4.0, 2.0))
                .with_float(Attr::Speed, 8.0)
                .with_float(Attr::Yaw, 90.0)
                .with_float(Attr::Height, 1.5),
        );
        let outcome = stepper().step(&scene, 0.5).expect("step");
        let moved = outcome.scene.entity(EntityId(1)).expect("present");
        let c = moved.footprint().expect("footprint").centroid();
        assert_relative_eq!(c.x(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(c.y(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(moved.float(Attr::VelocityY).expect("vy"), 8.0, epsilon = 1e-9);
        assert!(outcome.updated.contains(&EntityId(1)));
    }

    #[test]
    fn yaw_rate_turns_the_heading() {
        let scene = scene_with(
            Entity::new(EntityId(1), [Category::Vehicle])
                .with_footprint(Footprint::rect(0.0, 0.0, 4.0, 2.0))
                .with_float(Attr::Speed, 5.0)
                .with_float(Attr::Yaw, 0.0)
                .with_float(Attr::YawRate, 30.0),
        );
        let outcome = stepper().step(&scene, 1.0).expect("step");
        let moved = outcome.scene.entity(EntityId(1)).expect("present");
        assert_relative_eq!(moved.yaw().expect("yaw"), 30.0, epsilon = 1e-9);
        let c = moved.footprint().expect("footprint").centroid();
        assert!(c.y() > 2.0);
    }

    #[test]
    fn missing_kinematics_defaults_to_standstill() {
        let scene = scene_with(
            Entity::new(EntityId(1), [Category::Vehicle])
                .with_footprint(Footprint::rect(3.0, 3.0, 4.0, 2.0)),
        );
        let outcome = stepper().step(&scene, 1.0).expect("step");
        let moved = outcome.scene.entity(EntityId(1)).expect("present");
        let c = moved.footprint().expect("footprint").centroid();
        assert_relative_eq!(c.x(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(c.y(), 3.0, epsilon = 1e-9);
    }
}
