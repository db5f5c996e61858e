//! Pairwise spatial relations: distance classes, DE-9IM topology, and
//! directional predicates.
//!
//! Every predicate returns `Option` — `None` means the relation is not
//! defined for the pair (missing footprints, coincident centroids, out of
//! range), never that it failed. Footprints and yaw resolve through the
//! driving relation, so a driver without geometry answers with its vehicle.

use crate::entity::EntityId;
use crate::geometry::{relative_bearing_deg, Footprint};
use crate::scene::Scene;

/// Range in meters beyond which distance-class relations are not reported.
pub const MAX_RELATION_DISTANCE: f64 = 50.0;
/// "Near" bound in meters.
pub const NEARNESS_THRESHOLD: f64 = 4.0;
/// "In proximity" bound in meters.
pub const PROXIMITY_THRESHOLD: f64 = 15.0;

fn pair<'a>(scene: &'a Scene, a: EntityId, b: EntityId) -> Option<(&'a Footprint, &'a Footprint)> {
    if a == b {
        return None;
    }
    Some((scene.footprint_of(a)?, scene.footprint_of(b)?))
}

/// Euclidean distance, absent beyond [`MAX_RELATION_DISTANCE`].
pub fn distance(scene: &Scene, a: EntityId, b: EntityId) -> Option<f64> {
    let (fa, fb) = pair(scene, a, b)?;
    let d = fa.distance(fb);
    (d <= MAX_RELATION_DISTANCE).then_some(d)
}

pub fn is_near(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.distance(fb) < NEARNESS_THRESHOLD)
}

pub fn is_in_proximity(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.distance(fb) < PROXIMITY_THRESHOLD)
}

pub fn intersects(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.intersects(fb))
}

pub fn overlaps(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.overlaps(fb))
}

pub fn touches(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.touches(fb))
}

pub fn crosses(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.crosses(fb))
}

pub fn is_within(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.within(fb))
}

pub fn contains(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    Some(fa.contains(fb))
}

/// Disjointness, reported only within [`MAX_RELATION_DISTANCE`] like the
/// distance relation itself.
pub fn is_disjoint(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    let (fa, fb) = pair(scene, a, b)?;
    let d = fa.distance(fb);
    (d <= MAX_RELATION_DISTANCE).then(|| fa.disjoint(fb))
}

/// Bearing of `target`'s centroid relative to `reference`'s heading, in
/// `[0, 360)`. Absent without footprints on both, yaw on the reference, or
/// when the centroids coincide.
pub fn relative_bearing(scene: &Scene, reference: EntityId, target: EntityId) -> Option<f64> {
    if reference == target {
        return None;
    }
    let from = scene.footprint_of(reference)?.centroid();
    let to = scene.footprint_of(target)?.centroid();
    if from == to {
        return None;
    }
    let yaw = scene.yaw_of(reference)?;
    Some(relative_bearing_deg(yaw, from, to))
}

/// `target` lies in the half-plane ahead of `reference`. Exactly one of
/// in-front-of / behind holds whenever the bearing is defined.
pub fn is_in_front_of(scene: &Scene, target: EntityId, reference: EntityId) -> Option<bool> {
    let bearing = relative_bearing(scene, reference, target)?;
    Some(!(90.0..270.0).contains(&bearing))
}

pub fn is_behind(scene: &Scene, target: EntityId, reference: EntityId) -> Option<bool> {
    is_in_front_of(scene, target, reference).map(|v| !v)
}

/// `target` lies to the left of `reference`'s heading; a target dead ahead
/// (bearing 0) counts as right-of, dead astern (bearing 180) as left-of.
pub fn is_left_of(scene: &Scene, target: EntityId, reference: EntityId) -> Option<bool> {
    let bearing = relative_bearing(scene, reference, target)?;
    Some(bearing > 0.0 && bearing <= 180.0)
}

pub fn is_right_of(scene: &Scene, target: EntityId, reference: EntityId) -> Option<bool> {
    is_left_of(scene, target, reference).map(|v| !v)
}
