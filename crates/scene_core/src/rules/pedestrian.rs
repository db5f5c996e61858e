//! Pedestrian update: straight-line walk along the current heading.

use crate::entity::{Attr, EntityId};
use crate::error::SceneError;
use crate::geometry::heading_vec;
use crate::scene::Scene;
use crate::stepper::{SceneDraft, UpdateRule};

#[derive(Debug, Default)]
pub struct PedestrianRule;

impl UpdateRule for PedestrianRule {
    fn apply(
        &self,
        id: EntityId,
        prev: &Scene,
        draft: &mut SceneDraft,
        delta_t: f64,
    ) -> Result<(), SceneError> {
        let old = prev.entity(id).ok_or(SceneError::UnknownEntity(id))?;
        let speed = old.speed().unwrap_or(0.0);
        let yaw = old.yaw().unwrap_or(0.0);
        let (hx, hy) = heading_vec(yaw);

        if let Some(fp) = old.footprint() {
            draft.set_footprint(id, fp.translate(speed * delta_t * hx, speed * delta_t * hy))?;
        }
        draft.set_float(id, Attr::Speed, speed)?;
        draft.set_float(id, Attr::Yaw, yaw)?;
        draft.set_float(id, Attr::VelocityX, speed * hx)?;
        draft.set_float(id, Attr::VelocityY, speed * hy)?;
        draft.carry_over(id, old)
    }
}
