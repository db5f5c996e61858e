//! Path intersection oracle.
//!
//! Decides whether two entities' predicted paths cross, and when. Results
//! are memoized per unordered entity pair; a lookup with the arguments
//! reversed answers from the same entry with the times swapped.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use geo::{BooleanOps, Intersects, MultiPolygon, Point};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{Category, EntityId};
use crate::prediction::{Predictor, TrajectorySample};
use crate::scene::Scene;

const CACHE_CAPACITY: usize = 512;

/// Earliest predicted overlap of two paths. `t_self` is the elapsed time at
/// which the queried entity reaches the overlap, `t_other` the other's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathCrossing {
    pub t_self: f64,
    pub t_other: f64,
    pub location: Point<f64>,
}

impl PathCrossing {
    fn swapped(self) -> Self {
        Self {
            t_self: self.t_other,
            t_other: self.t_self,
            location: self.location,
        }
    }
}

/// Thresholds for the derived criticality predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalityConfig {
    /// Combined-time window in seconds: a crossing with `t₁+t₂` beyond it is
    /// not considered critical.
    pub window: f64,
    /// Post-encroachment-time bound in seconds.
    pub max_pet: f64,
    /// Relaxed bound applied when either entity is a pedestrian or bicycle.
    pub vulnerable_max_pet: f64,
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            window: 8.0,
            max_pet: 3.0,
            vulnerable_max_pet: 5.0,
        }
    }
}

impl CriticalityConfig {
    pub fn with_window(mut self, window: f64) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_pet(mut self, max_pet: f64) -> Self {
        self.max_pet = max_pet;
        self
    }

    pub fn with_vulnerable_max_pet(mut self, max_pet: f64) -> Self {
        self.vulnerable_max_pet = max_pet;
        self
    }
}

type PairKey = (EntityId, EntityId);

/// Oracle over predicted paths with an unordered-pair cache.
#[derive(Debug)]
pub struct PathOracle {
    config: CriticalityConfig,
    cache: Mutex<LruCache<PairKey, Option<PathCrossing>>>,
}

impl Default for PathOracle {
    fn default() -> Self {
        Self::new(CriticalityConfig::default())
    }
}

impl PathOracle {
    pub fn new(config: CriticalityConfig) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &CriticalityConfig {
        &self.config
    }

    /// Earliest crossing of the predicted paths of `a` and `b`, minimizing
    /// `t_self + t_other`. Absent when the entities coincide, when either
    /// lacks footprint, yaw or speed (resolved through the driving
    /// relation), when their centroids coincide, or when the paths simply
    /// never cross.
    pub fn crossing(
        &self,
        scene: &Scene,
        predictor: &Predictor,
        a: EntityId,
        b: EntityId,
    ) -> Option<PathCrossing> {
        if a == b {
            return None;
        }
        let key = if a <= b { (a, b) } else { (b, a) };
        let forward = a == key.0;

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return hit.map(|c| if forward { c } else { c.swapped() });
            }
        }

        // preconditions: absence is not cached, the attribute may appear later
        let pa = scene.footprint_of(a)?.centroid();
        let pb = scene.footprint_of(b)?.centroid();
        scene.yaw_of(a)?;
        scene.yaw_of(b)?;
        scene.entity(a)?.speed()?;
        scene.entity(b)?.speed()?;

        let result = if pa == pb {
            None
        } else {
            let pred_a = predictor.predict(scene, a)?;
            let pred_b = predictor.predict(scene, b)?;
            earliest_crossing(&pred_a, &pred_b)
        };

        if let Ok(mut cache) = self.cache.lock() {
            let stored = if forward { result } else { result.map(PathCrossing::swapped) };
            cache.put(key, stored);
            debug!(a = %a, b = %b, hit = result.is_some(), "cached path crossing");
        }
        result
    }

    /// Criticality predicate: the paths cross within the combined-time
    /// window and the arrival-time gap stays under the PET bound (relaxed
    /// for pedestrians and bicycles).
    pub fn has_intersecting_path(
        &self,
        scene: &Scene,
        predictor: &Predictor,
        a: EntityId,
        b: EntityId,
    ) -> bool {
        let Some(crossing) = self.crossing(scene, predictor, a, b) else {
            return false;
        };
        let pet_bound = if self.is_vulnerable(scene, a) || self.is_vulnerable(scene, b) {
            self.config.vulnerable_max_pet
        } else {
            self.config.max_pet
        };
        crossing.t_self + crossing.t_other < self.config.window
            && (crossing.t_self - crossing.t_other).abs() < pet_bound
    }

    fn is_vulnerable(&self, scene: &Scene, id: EntityId) -> bool {
        scene
            .entity(id)
            .map(|e| e.is_a(Category::Pedestrian) || e.is_a(Category::Bicycle))
            .unwrap_or(false)
    }

    /// Drops every cached pair involving `id`.
    pub fn invalidate(&self, id: EntityId) {
        if let Ok(mut cache) = self.cache.lock() {
            let stale: Vec<PairKey> = cache
                .iter()
                .map(|(key, _)| *key)
                .filter(|(x, y)| *x == id || *y == id)
                .collect();
            for key in stale {
                cache.pop(&key);
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

fn earliest_crossing(
    pred_a: &[TrajectorySample],
    pred_b: &[TrajectorySample],
) -> Option<PathCrossing> {
    // cheap rejection: if the swept unions never touch, no pair can overlap
    let union_a = swept_union(pred_a);
    let union_b = swept_union(pred_b);
    if !union_a.0.is_empty() && !union_b.0.is_empty() && !union_a.intersects(&union_b) {
        return None;
    }

    let mut best: Option<PathCrossing> = None;
    for sa in pred_a {
        for sb in pred_b {
            if let Some(location) = sa.footprint.overlap_centroid(&sb.footprint) {
                let candidate = PathCrossing {
                    t_self: sa.elapsed,
                    t_other: sb.elapsed,
                    location,
                };
                let keep = match &best {
                    Some(current) => {
                        candidate.t_self + candidate.t_other < current.t_self + current.t_other
                    }
                    None => true,
                };
                if keep {
                    best = Some(candidate);
                }
            }
        }
    }
    best
}

fn swept_union(samples: &[TrajectorySample]) -> MultiPolygon<f64> {
    samples
        .iter()
        .fold(MultiPolygon::new(vec![]), |acc, sample| {
            let multi = sample.footprint.to_multi();
            if multi.0.is_empty() {
                acc
            } else if acc.0.is_empty() {
                multi
            } else {
                acc.union(&multi)
            }
        })
}
