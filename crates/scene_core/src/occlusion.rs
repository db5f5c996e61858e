//! Occlusion computation.
//!
//! For one observer, determines which entities inside its circular field of
//! view are hidden behind others, and to what degree. Each occluder casts a
//! shadow: its footprint clipped to the FOV, extended by a sampled wedge out
//! to the FOV radius across the footprint's angular extent as seen from the
//! viewpoint. An occlusion record is emitted when the hidden share of an
//! entity's in-FOV area exceeds the reporting threshold.

use geo::{Area, BooleanOps, Coord, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::{Attr, Entity, EntityId};
use crate::geometry::{bearing_deg, disc, heading_vec, Footprint};
use crate::scene::Scene;

/// Sampling step for the FOV boundary disc, in degrees.
const FOV_DISC_STEP: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcclusionConfig {
    /// FOV radius in meters, used when the observer carries no
    /// `VisibilityRange` of its own.
    pub visibility: f64,
    /// Angular step for sampling shadow wedges, in degrees.
    pub sampling_step: f64,
    /// Minimum occlusion rate worth reporting.
    pub min_rate: f64,
    /// Entities at or below this height do not cast shadows.
    pub min_occluder_height: f64,
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            visibility: 50.0,
            sampling_step: 0.25,
            min_rate: 0.2,
            min_occluder_height: 0.1,
        }
    }
}

impl OcclusionConfig {
    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_min_rate(mut self, min_rate: f64) -> Self {
        self.min_rate = min_rate;
        self
    }
}

/// One occlusion: `occluded` is hidden behind `occluders` to degree `rate`
/// (share of its in-FOV area, in `[0, 1]`, floored to 0.01 steps).
#[derive(Debug, Clone, PartialEq)]
pub struct Occlusion {
    pub observer: EntityId,
    pub occluded: EntityId,
    pub occluders: Vec<EntityId>,
    pub rate: f64,
}

/// All occlusions from the viewpoint of `observer`. Empty when the observer
/// lacks its own footprint or a yaw (own or via the driven vehicle).
pub fn occlusions(scene: &Scene, observer: EntityId, config: &OcclusionConfig) -> Vec<Occlusion> {
    let Some(obs) = scene.entity(observer) else {
        return Vec::new();
    };
    let Some(obs_fp) = obs.footprint() else {
        return Vec::new();
    };
    let Some(yaw) = scene.yaw_of(observer) else {
        return Vec::new();
    };

    let head = viewpoint(scene, obs, obs_fp, yaw);
    let visibility = obs
        .float(Attr::VisibilityRange)
        .unwrap_or(config.visibility);
    let fov = Footprint::Polygon(disc(head, visibility, FOV_DISC_STEP));
    let fov_multi = fov.to_multi();

    let occluders: Vec<&Entity> = scene
        .all_entities()
        .filter(|e| e.id() != observer)
        .filter(|e| e.height().map_or(false, |h| h > config.min_occluder_height))
        .filter(|e| match e.footprint() {
            Some(fp) => {
                fp.intersects(&fov)
                    && !obs_fp.within(fp)
                    && !fp.within(obs_fp)
                    && fp != obs_fp
            }
            None => false,
        })
        .collect();

    let shadows: Vec<(EntityId, MultiPolygon<f64>)> = occluders
        .iter()
        .filter_map(|e| {
            let fp = e.footprint()?;
            Some((e.id(), shadow_of(fp, &fov_multi, head, visibility, config)))
        })
        .collect();

    let mut records = Vec::new();
    for candidate in scene
        .all_entities()
        .filter(|e| e.id() != observer)
        .filter(|e| e.footprint().map_or(false, |fp| fp.intersects(&fov)))
    {
        let Some(fp) = candidate.footprint() else {
            continue;
        };
        let geom = fp.to_multi();
        let in_fov = geom.intersection(&fov_multi).unsigned_area();
        if in_fov <= 0.0 {
            continue;
        }
        let mut hidden: Option<MultiPolygon<f64>> = None;
        let mut by = Vec::new();
        for (occluder, shadow) in &shadows {
            if *occluder == candidate.id() {
                continue;
            }
            let overlap = geom.intersection(shadow);
            if overlap.unsigned_area() > 0.0 {
                hidden = Some(match hidden {
                    Some(acc) => acc.union(&overlap),
                    None => overlap,
                });
                by.push(*occluder);
            }
        }
        if let Some(hidden) = hidden {
            let rate = (hidden.unsigned_area() / in_fov * 100.0).floor() / 100.0;
            let rate = rate.min(1.0);
            if rate > config.min_rate {
                records.push(Occlusion {
                    observer,
                    occluded: candidate.id(),
                    occluders: by,
                    rate,
                });
            }
        }
    }
    records
}

/// Eye position: the observer's centroid, pushed forward by a quarter of the
/// driven vehicle's length when the observer pilots one. Without a `Length`
/// attribute the length is measured along the footprint's left side.
fn viewpoint(scene: &Scene, obs: &Entity, obs_fp: &Footprint, yaw: f64) -> Point<f64> {
    let centroid = obs_fp.centroid();
    let Some(vehicle) = obs.pilots.and_then(|id| scene.entity(id)) else {
        return centroid;
    };
    let length = vehicle.length().or_else(|| {
        let sides = vehicle.footprint()?.split_boundaries().ok()?;
        let (a, b) = (sides.left.0.first()?, sides.left.0.last()?);
        let (dx, dy) = (a.x - b.x, a.y - b.y);
        Some((dx * dx + dy * dy).sqrt())
    });
    match length {
        Some(length) => {
            let (hx, hy) = heading_vec(yaw);
            Point::new(centroid.x() + hx * length / 4.0, centroid.y() + hy * length / 4.0)
        }
        None => centroid,
    }
}

/// Shadow cast by one occluder: its FOV clip unioned with the wedge between
/// its angular extent and the FOV boundary.
fn shadow_of(
    footprint: &Footprint,
    fov: &MultiPolygon<f64>,
    head: Point<f64>,
    visibility: f64,
    config: &OcclusionConfig,
) -> MultiPolygon<f64> {
    let clip = footprint.to_multi().intersection(fov);
    let points: Vec<Coord<f64>> = if clip.0.is_empty() {
        // point footprints have no area to clip, shade from the point itself
        footprint.boundary_coords()
    } else {
        clip.0
            .iter()
            .flat_map(|poly| {
                let ring = &poly.exterior().0;
                ring[..ring.len().saturating_sub(1)].iter().copied()
            })
            .collect()
    };
    if points.is_empty() {
        warn!("occluder inside the field of view has no boundary points");
        return clip;
    }

    let angles: Vec<f64> = points
        .iter()
        .map(|c| bearing_deg(head, Point::new(c.x, c.y)))
        .collect();

    // extent straddling 0° needs the wrap-around split at 180°
    let min_y = points.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max);
    let wraps = min_y <= head.y()
        && head.y() <= max_y
        && angles.iter().any(|a| *a < 90.0)
        && angles.iter().any(|a| *a > 270.0);
    let (min_angle, max_angle) = if wraps {
        let min_angle = angles
            .iter()
            .copied()
            .filter(|a| *a >= 180.0)
            .fold(f64::INFINITY, f64::min);
        let max_angle = angles
            .iter()
            .copied()
            .filter(|a| *a < 180.0)
            .fold(f64::NEG_INFINITY, f64::max);
        (min_angle, max_angle)
    } else {
        (
            angles.iter().copied().fold(f64::INFINITY, f64::min),
            angles.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    };

    let span = (max_angle - min_angle).rem_euclid(360.0);
    let mut ring: Vec<Coord<f64>> = Vec::new();
    let mut alpha = 0.0;
    while alpha < span {
        let rad = ((min_angle + alpha) % 360.0).to_radians();
        ring.push(Coord {
            x: head.x() + visibility * rad.cos(),
            y: head.y() + visibility * rad.sin(),
        });
        alpha += config.sampling_step;
    }
    let at = |target: f64| {
        angles
            .iter()
            .position(|a| *a == target)
            .map(|i| points[i])
    };
    if let Some(p) = at(max_angle) {
        ring.push(p);
    }
    if let Some(p) = at(min_angle) {
        ring.push(p);
    }

    if ring.len() < 3 {
        return clip;
    }
    let wedge = geo::Polygon::new(geo::LineString::new(ring), vec![]);
    MultiPolygon::new(vec![wedge]).union(&clip)
}
