//! One-second reachable areas and the small-distance predicate.
//!
//! A vehicle's reachable area is a fan of constant-yaw-rate arc endpoints
//! swept across its steering envelope, anchored at the yaw-appropriate front
//! corner; a walking pedestrian's is a disc around its centroid. Two
//! entities are at small distance when their reachable areas intersect.

use geo::{BooleanOps, Intersects, LineString, MultiPolygon, Point, Polygon};

use crate::entity::{Attr, Category, EntityId};
use crate::geometry::{disc, Footprint};
use crate::scene::Scene;

/// Horizon in seconds within which distances count as "small".
pub const SMALL_DISTANCE_HORIZON: f64 = 1.0;

/// Yaw-rate sampling step across the steering envelope, in °/s.
const YAW_RATE_SAMPLING: f64 = 1.0;
/// Sampling step for the disc around a walking pedestrian, in degrees.
const PEDESTRIAN_DISC_STEP: f64 = 5.0;

const DEFAULT_MAX_YAW: f64 = 45.0;
const DEFAULT_MAX_YAW_RATE: f64 = 25.0;

/// Area an entity can plausibly cover within [`SMALL_DISTANCE_HORIZON`].
/// Entities that are neither moving vehicles nor walking pedestrians answer
/// with their footprint. Absent without a footprint (resolved through the
/// driving relation).
pub fn relevant_area(scene: &Scene, id: EntityId) -> Option<MultiPolygon<f64>> {
    let entity = scene.entity(id)?;
    let footprint = scene.footprint_of(id)?;
    let speed = entity.speed().unwrap_or(0.0);
    let yaw = entity.yaw().unwrap_or(0.0);

    if (entity.is_a(Category::Vehicle) || entity.is_a(Category::Bicycle)) && speed > 0.0 {
        let max_yaw = entity.float(Attr::MaxYaw).unwrap_or(DEFAULT_MAX_YAW);
        let max_yaw_rate = entity
            .float(Attr::MaxYawRate)
            .unwrap_or(DEFAULT_MAX_YAW_RATE);
        Some(steering_fan(footprint, speed, yaw, max_yaw_rate, max_yaw))
    } else if entity.is_a(Category::Pedestrian) && speed > 0.0 {
        let radius = SMALL_DISTANCE_HORIZON * speed + footprint.area().sqrt();
        let circle = disc(footprint.centroid(), radius, PEDESTRIAN_DISC_STEP);
        Some(MultiPolygon::new(vec![circle]))
    } else {
        Some(footprint.to_multi())
    }
}

/// Whether the reachable areas of `a` and `b` intersect. Requires footprints
/// on both, speed on `a` (plus yaw when `a` is a vehicle), and a positive
/// height on `b`; absent otherwise.
pub fn has_small_distance(scene: &Scene, a: EntityId, b: EntityId) -> Option<bool> {
    if a == b {
        return None;
    }
    let ea = scene.entity(a)?;
    ea.speed()?;
    if ea.is_a(Category::Vehicle) || ea.is_a(Category::Bicycle) {
        ea.yaw()?;
    }
    let height_b = scene.entity(b)?.height()?;
    if height_b <= 0.0 {
        return None;
    }
    let area_a = relevant_area(scene, a)?;
    let area_b = relevant_area(scene, b)?;
    Some(area_a.intersects(&area_b))
}

/// Arc endpoint of a constant-yaw-rate maneuver after `t` seconds, with the
/// heading saturating once the accumulated yaw reaches `max_yaw`.
fn arc_position(
    anchor: Point<f64>,
    speed: f64,
    yaw: f64,
    yaw_rate: f64,
    max_yaw: f64,
    t: f64,
) -> (f64, f64) {
    let theta = if (yaw_rate * t).abs() <= max_yaw {
        (yaw + yaw_rate * t * t / 2.0).rem_euclid(360.0)
    } else {
        (yaw + (-(max_yaw * max_yaw) / (2.0 * yaw_rate) + yaw_rate.signum() * max_yaw * t))
            .rem_euclid(360.0)
    };
    let rad = theta.to_radians();
    (
        anchor.x() + speed * t * rad.cos(),
        anchor.y() + speed * t * rad.sin(),
    )
}

fn steering_fan(
    footprint: &Footprint,
    speed: f64,
    yaw: f64,
    max_yaw_rate: f64,
    max_yaw: f64,
) -> MultiPolygon<f64> {
    let left_front = footprint.corner_toward(yaw, 270.0, 360.0);
    let right_front = footprint.corner_toward(yaw, 0.0, 90.0);

    let steps = (2.0 * max_yaw_rate / YAW_RATE_SAMPLING).round() as usize;
    let mut paths: Vec<Vec<(f64, f64)>> = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let rate = -max_yaw_rate + i as f64 * YAW_RATE_SAMPLING;
        let anchor = if rate < 0.0 { left_front } else { right_front };
        let mut path = Vec::new();
        if i == 0 || i == steps {
            // full arc along the extreme maneuvers
            let mut t = 0.0;
            while t <= SMALL_DISTANCE_HORIZON + 1e-9 {
                path.push(arc_position(anchor, speed, yaw, rate, max_yaw, t));
                t += 0.2;
            }
        } else {
            path.push(arc_position(
                anchor,
                speed,
                yaw,
                rate,
                max_yaw,
                SMALL_DISTANCE_HORIZON,
            ));
        }
        paths.push(path);
    }

    let mut ring: Vec<(f64, f64)> = paths[0].clone();
    ring.extend(paths.iter().filter_map(|p| p.last().copied()));
    ring.extend(paths[paths.len() - 1].iter().rev().copied());
    let fan = Polygon::new(LineString::from(ring), vec![]);

    MultiPolygon::new(vec![fan]).union(&footprint.to_multi())
}
