//! Kinematic trajectory prediction.
//!
//! Samples an entity's future footprint at fixed steps out to a horizon,
//! under constant speed and a decaying yaw rate. Results are memoized per
//! (entity, Δt, horizon); the cache is deliberately oblivious to scene
//! content, so callers invalidate after kinematic writes (the scene stepper
//! reports the dirty set for exactly this purpose).

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use geo::Point;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EntityId;
use crate::geometry::{heading_vec, Footprint};
use crate::scene::Scene;

const CACHE_CAPACITY: usize = 256;

/// Speed substituted when an entity reports exactly zero, so that parked
/// entities still over-approximate a reachable area.
pub const CREEPING_SPEED: f64 = 0.5;

/// Fraction of the yaw rate lost per simulated second.
const YAW_RATE_DECAY_PER_SECOND: f64 = 0.6;

/// Rearward pivot offset as a fraction of half the entity length.
const REAR_PIVOT_FRACTION: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Sampling step in seconds.
    pub delta_t: f64,
    /// Prediction horizon in seconds.
    pub horizon: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            delta_t: 0.25,
            horizon: 8.0,
        }
    }
}

impl PredictionConfig {
    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = delta_t;
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }
}

/// One predicted pose: the footprint and the elapsed time it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub footprint: Footprint,
    pub elapsed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PredictionKey {
    entity: EntityId,
    delta_t_ms: u64,
    horizon_ms: u64,
}

impl PredictionKey {
    fn new(entity: EntityId, config: &PredictionConfig) -> Self {
        Self {
            entity,
            delta_t_ms: (config.delta_t * 1000.0).round() as u64,
            horizon_ms: (config.horizon * 1000.0).round() as u64,
        }
    }
}

/// Trajectory predictor with an engine-owned memoization cache.
#[derive(Debug)]
pub struct Predictor {
    config: PredictionConfig,
    cache: Mutex<LruCache<PredictionKey, Arc<Vec<TrajectorySample>>>>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(PredictionConfig::default())
    }
}

impl Predictor {
    pub fn new(config: PredictionConfig) -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Predicted footprints for `id`, `horizon/Δt + 1` samples with the first
    /// equal to the current footprint. Absent when the entity has no
    /// footprint (resolved through the driving relation). Missing speed, yaw
    /// or yaw rate count as zero; a speed of exactly zero is replaced by the
    /// creeping floor.
    pub fn predict(&self, scene: &Scene, id: EntityId) -> Option<Arc<Vec<TrajectorySample>>> {
        let key = PredictionKey::new(id, &self.config);
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(_) => {
                // poisoned cache, compute uncached
                return compute(scene, id, &self.config).map(Arc::new);
            }
        };
        if let Some(hit) = cache.get(&key) {
            return Some(Arc::clone(hit));
        }
        let samples = Arc::new(compute(scene, id, &self.config)?);
        cache.put(key, Arc::clone(&samples));
        debug!(entity = %id, samples = samples.len(), "cached trajectory");
        Some(samples)
    }

    /// Drops every cached trajectory of `id`.
    pub fn invalidate(&self, id: EntityId) {
        if let Ok(mut cache) = self.cache.lock() {
            let stale: Vec<PredictionKey> = cache
                .iter()
                .map(|(key, _)| *key)
                .filter(|key| key.entity == id)
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

fn compute(scene: &Scene, id: EntityId, config: &PredictionConfig) -> Option<Vec<TrajectorySample>> {
    let entity = scene.entity(id)?;
    let body = entity
        .pilots
        .and_then(|vehicle| scene.entity(vehicle))
        .unwrap_or(entity);
    let mut footprint = body.footprint()?.clone();

    let raw_speed = entity.speed().unwrap_or(0.0);
    let speed = if raw_speed == 0.0 {
        CREEPING_SPEED
    } else {
        raw_speed
    };
    let mut yaw = entity.yaw().unwrap_or(0.0);
    let mut yaw_rate = entity.yaw_rate().unwrap_or(0.0);
    let half_length = entity
        .length()
        .or_else(|| body.length())
        .map(|l| l / 2.0)
        .filter(|hl| *hl > 0.0);

    let steps = (config.horizon / config.delta_t).round() as usize;
    let mut samples = Vec::with_capacity(steps + 1);
    samples.push(TrajectorySample {
        footprint: footprint.clone(),
        elapsed: 0.0,
    });

    for step in 1..=steps {
        let new_yaw = (yaw + yaw_rate * config.delta_t).rem_euclid(360.0);
        let delta_yaw = new_yaw - yaw;

        // steer around a rear pivot when the body has a usable length
        let centroid = footprint.centroid();
        let pivot = match half_length {
            Some(hl) => {
                let (hx, hy) = heading_vec(yaw);
                let offset = REAR_PIVOT_FRACTION * hl;
                Point::new(centroid.x() - hx * offset, centroid.y() - hy * offset)
            }
            None => centroid,
        };
        let (dx, dy) = heading_vec(new_yaw);
        footprint = footprint
            .rotate_around(delta_yaw, pivot)
            .translate(speed * config.delta_t * dx, speed * config.delta_t * dy);

        samples.push(TrajectorySample {
            footprint: footprint.clone(),
            elapsed: step as f64 * config.delta_t,
        });

        yaw = new_yaw;
        yaw_rate *= 1.0 - YAW_RATE_DECAY_PER_SECOND * config.delta_t;
    }

    Some(samples)
}
