//! Scenarios: ordered scene sequences and seeded random population.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::{Attr, Category, Entity, EntityId};
use crate::error::SceneError;
use crate::geometry::Footprint;
use crate::scene::{Scene, SceneBuilder, Scenery};

/// A temporally ordered sequence of scenes over one shared scenery.
/// Timestamps are strictly increasing.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    scenery: Arc<Scenery>,
    scenes: Vec<Scene>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, scenery: Arc<Scenery>) -> Self {
        Self {
            name: name.into(),
            scenery,
            scenes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scenery(&self) -> &Arc<Scenery> {
        &self.scenery
    }

    pub fn push(&mut self, scene: Scene) -> Result<(), SceneError> {
        if let Some(last) = self.scenes.last() {
            if scene.timestamp() <= last.timestamp() {
                return Err(SceneError::NonMonotonicTimestamp {
                    last: last.timestamp(),
                    next: scene.timestamp(),
                });
            }
        }
        self.scenes.push(scene);
        Ok(())
    }

    pub fn latest(&self) -> Option<&Scene> {
        self.scenes.last()
    }

    pub fn get(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Parameters for random scenario population. Same seed, same scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub name: String,
    pub num_vehicles: usize,
    pub num_pedestrians: usize,
    pub seed: Option<u64>,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub vehicle_length: f64,
    pub vehicle_width: f64,
    pub vehicle_height: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    /// Placement attempts per entity before giving up on a free spot.
    pub max_spawn_tries: usize,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            name: "random-scenario".into(),
            num_vehicles: 3,
            num_pedestrians: 2,
            seed: None,
            x_min: 0.0,
            x_max: 100.0,
            y_min: 0.0,
            y_max: 100.0,
            vehicle_length: 4.3,
            vehicle_width: 1.8,
            vehicle_height: 1.7,
            speed_min: 0.0,
            speed_max: 14.0,
            max_spawn_tries: 25,
        }
    }
}

impl ScenarioParams {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_counts(mut self, vehicles: usize, pedestrians: usize) -> Self {
        self.num_vehicles = vehicles;
        self.num_pedestrians = pedestrians;
        self
    }

    pub fn with_bounds(mut self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        self.x_min = x_min;
        self.x_max = x_max;
        self.y_min = y_min;
        self.y_max = y_max;
        self
    }

    pub fn with_speed_range(mut self, min: f64, max: f64) -> Self {
        self.speed_min = min;
        self.speed_max = max;
        self
    }
}

/// Builds a single-scene scenario at t=0: a road covering the bounds plus
/// randomly placed, non-overlapping vehicles (each with a driver) and
/// pedestrians. Entities that find no free spot within `max_spawn_tries`
/// attempts are skipped.
pub fn build_scenario(params: &ScenarioParams) -> Result<Scenario, SceneError> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut next_id = 1u64;
    let mut alloc = |ids: &mut u64| {
        let id = EntityId(*ids);
        *ids += 1;
        id
    };

    let mut scenery = Scenery::new();
    let road_id = alloc(&mut next_id);
    let road = Entity::new(road_id, [Category::Road]).with_footprint(Footprint::rect(
        (params.x_min + params.x_max) / 2.0,
        (params.y_min + params.y_max) / 2.0,
        params.x_max - params.x_min,
        params.y_max - params.y_min,
    ));
    scenery.insert(road)?;
    let scenery = Arc::new(scenery);

    let mut builder = SceneBuilder::new(0.0, Arc::clone(&scenery));
    let mut placed: Vec<Footprint> = Vec::new();

    for _ in 0..params.num_vehicles {
        let Some((footprint, yaw)) = place(
            &mut rng,
            params,
            &placed,
            params.vehicle_length,
            params.vehicle_width,
        ) else {
            debug!(name = %params.name, "no free spot for vehicle, skipping");
            continue;
        };
        let speed = rng.gen_range(params.speed_min..=params.speed_max);
        let vehicle_id = alloc(&mut next_id);
        let mut vehicle = Entity::new(vehicle_id, [Category::Vehicle])
            .with_footprint(footprint.clone())
            .with_float(Attr::Speed, speed)
            .with_float(Attr::Yaw, yaw)
            .with_float(Attr::Height, params.vehicle_height)
            .with_float(Attr::Length, params.vehicle_length)
            .with_float(Attr::Width, params.vehicle_width);

        let driver_id = alloc(&mut next_id);
        let mut driver = Entity::new(driver_id, [Category::Driver])
            .with_footprint(Footprint::Point(footprint.centroid()))
            .with_float(Attr::Speed, speed)
            .with_float(Attr::Yaw, yaw);
        driver.pilots = Some(vehicle_id);
        vehicle.piloted_by = Some(driver_id);

        placed.push(footprint);
        builder.insert(vehicle)?;
        builder.insert(driver)?;
    }

    for _ in 0..params.num_pedestrians {
        let Some((footprint, yaw)) = place(&mut rng, params, &placed, 0.6, 0.3) else {
            debug!(name = %params.name, "no free spot for pedestrian, skipping");
            continue;
        };
        let speed = rng.gen_range(0.0..=2.0f64);
        let id = alloc(&mut next_id);
        let pedestrian = Entity::new(id, [Category::Pedestrian])
            .with_footprint(footprint.clone())
            .with_float(Attr::Speed, speed)
            .with_float(Attr::Yaw, yaw)
            .with_float(Attr::Height, 1.7);
        placed.push(footprint);
        builder.insert(pedestrian)?;
    }

    let mut scenario = Scenario::new(params.name.clone(), scenery);
    scenario.push(builder.build())?;
    Ok(scenario)
}

fn place(
    rng: &mut StdRng,
    params: &ScenarioParams,
    placed: &[Footprint],
    length: f64,
    width: f64,
) -> Option<(Footprint, f64)> {
    for _ in 0..params.max_spawn_tries {
        let x = rng.gen_range(params.x_min..params.x_max);
        let y = rng.gen_range(params.y_min..params.y_max);
        let yaw = rng.gen_range(0.0..360.0f64);
        let candidate = Footprint::oriented_rect(x, y, length, width, yaw);
        if placed.iter().all(|other| !candidate.intersects(other)) {
            return Some((candidate, yaw));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_requires_increasing_timestamps() {
        let scenery = Arc::new(Scenery::new());
        let mut scenario = Scenario::new("t", Arc::clone(&scenery));
        scenario
            .push(SceneBuilder::new(0.0, Arc::clone(&scenery)).build())
            .expect("first scene");
        let result = scenario.push(SceneBuilder::new(0.0, scenery).build());
        assert!(matches!(
            result,
            Err(SceneError::NonMonotonicTimestamp { .. })
        ));
    }

    #[test]
    fn seeded_population_is_reproducible() {
        let params = ScenarioParams::default().with_seed(42).with_counts(4, 3);
        let a = build_scenario(&params).expect("build");
        let b = build_scenario(&params).expect("build");
        let scene_a = a.latest().expect("scene");
        let scene_b = b.latest().expect("scene");
        assert_eq!(scene_a.dynamic_len(), scene_b.dynamic_len());
        for (ea, eb) in scene_a.dynamic_entities().zip(scene_b.dynamic_entities()) {
            assert_eq!(ea, eb);
        }
    }

    #[test]
    fn populated_vehicles_do_not_overlap() {
        let params = ScenarioParams::default().with_seed(7).with_counts(6, 4);
        let scenario = build_scenario(&params).expect("build");
        let scene = scenario.latest().expect("scene");
        let footprints: Vec<_> = scene
            .dynamic_entities()
            .filter(|e| !e.is_a(Category::Driver))
            .filter_map(|e| e.footprint().cloned())
            .collect();
        for (i, a) in footprints.iter().enumerate() {
            for b in footprints.iter().skip(i + 1) {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn drivers_are_linked_to_their_vehicles() {
        let params = ScenarioParams::default().with_seed(3).with_counts(2, 0);
        let scenario = build_scenario(&params).expect("build");
        let scene = scenario.latest().expect("scene");
        for driver in scene
            .dynamic_entities()
            .filter(|e| e.is_a(Category::Driver))
        {
            let vehicle_id = driver.pilots.expect("pilots link");
            let vehicle = scene.entity(vehicle_id).expect("vehicle");
            assert_eq!(vehicle.piloted_by, Some(driver.id()));
        }
    }
}
