use scene_core::occlusion::{occlusions, OcclusionConfig};
use scene_core::oracle::PathOracle;
use scene_core::prediction::{PredictionConfig, Predictor};
use scene_core::reachable::has_small_distance;
use scene_core::relations;
use scene_core::test_helpers::{obstacle, pedestrian, scene, vehicle};
use scene_core::EntityId;

#[test]
fn approaching_pedestrian_crossing_is_critical() {
    // ego heads east along y=0, the pedestrian walks north across its lane
    let scene = scene(vec![
        vehicle(1, 0.0, 0.0, 0.0, 8.0),
        pedestrian(2, 10.0, -6.0, 90.0, 2.0),
    ]);
    let predictor = Predictor::default();
    let oracle = PathOracle::default();

    let crossing = oracle
        .crossing(&scene, &predictor, EntityId(1), EntityId(2))
        .expect("paths cross");
    assert!(crossing.t_self < crossing.t_other);
    assert!((crossing.location.x() - 10.0).abs() < 2.0);

    // the PET gap is under the relaxed pedestrian bound
    assert!(oracle.has_intersecting_path(&scene, &predictor, EntityId(1), EntityId(2)));
    // reversed arguments agree
    assert!(oracle.has_intersecting_path(&scene, &predictor, EntityId(2), EntityId(1)));
}

#[test]
fn strict_pet_bound_declassifies_vehicle_pairs() {
    // same geometry, but the crossing entity is another vehicle: the strict
    // 3 s PET bound applies instead of the relaxed pedestrian bound
    let slow_crosser = vehicle(2, 10.0, -6.0, 90.0, 0.6);
    let scene = scene(vec![vehicle(1, 0.0, 0.0, 0.0, 8.0), slow_crosser]);
    let predictor = Predictor::new(PredictionConfig::default().with_horizon(10.0));
    let oracle = PathOracle::default();
    let crossing = oracle
        .crossing(&scene, &predictor, EntityId(1), EntityId(2))
        .expect("paths cross");
    assert!((crossing.t_self - crossing.t_other).abs() >= 3.0);
    assert!(!oracle.has_intersecting_path(&scene, &predictor, EntityId(1), EntityId(2)));
}

#[test]
fn relations_describe_the_crossing_scene() {
    let scene = scene(vec![
        vehicle(1, 0.0, 0.0, 0.0, 8.0),
        pedestrian(2, 10.0, -6.0, 90.0, 2.0),
    ]);
    assert_eq!(
        relations::is_in_front_of(&scene, EntityId(2), EntityId(1)),
        Some(true)
    );
    assert_eq!(
        relations::is_right_of(&scene, EntityId(2), EntityId(1)),
        Some(true)
    );
    assert_eq!(
        relations::is_behind(&scene, EntityId(1), EntityId(2)),
        Some(false)
    );
    let d = relations::distance(&scene, EntityId(1), EntityId(2)).expect("in range");
    assert!(d > 0.0 && d < 15.0);
    assert_eq!(
        relations::is_in_proximity(&scene, EntityId(1), EntityId(2)),
        Some(true)
    );
    assert_eq!(relations::intersects(&scene, EntityId(1), EntityId(2)), Some(false));
}

#[test]
fn fast_vehicle_reaches_a_nearby_pedestrian() {
    let scene = scene(vec![
        vehicle(1, 0.0, 0.0, 0.0, 10.0),
        pedestrian(2, 9.0, 0.0, 90.0, 1.0),
    ]);
    assert_eq!(has_small_distance(&scene, EntityId(1), EntityId(2)), Some(true));
    // the reachable areas intersect regardless of which side asks
    assert_eq!(has_small_distance(&scene, EntityId(2), EntityId(1)), Some(true));
}

#[test]
fn parked_vehicle_is_out_of_a_walkers_reach() {
    let scene = scene(vec![
        vehicle(1, 0.0, 0.0, 0.0, 0.0),
        pedestrian(2, 12.0, 0.0, 90.0, 1.0),
    ]);
    assert_eq!(has_small_distance(&scene, EntityId(2), EntityId(1)), Some(false));
}

#[test]
fn wall_hides_the_pedestrian_from_the_ego() {
    let scene = scene(vec![
        vehicle(1, 0.0, 0.0, 0.0, 5.0),
        obstacle(2, 12.0, 0.0, 2.0, 24.0, 2.5),
        pedestrian(3, 22.0, 0.0, 90.0, 1.0),
    ]);
    let records = occlusions(&scene, EntityId(1), &OcclusionConfig::default());
    let hidden = records
        .iter()
        .find(|o| o.occluded == EntityId(3))
        .expect("pedestrian occluded");
    assert!(hidden.occluders.contains(&EntityId(2)));
    assert!(hidden.rate > 0.9);
    // the wall itself is visible, not occluded
    assert!(records.iter().all(|o| o.occluded != EntityId(2)));
}
