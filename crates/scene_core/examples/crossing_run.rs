//! Seeded end-to-end run: populate a scenario, simulate it, report
//! accidents and criticality along the way.
//!
//! ```sh
//! cargo run --example crossing_run
//! ```

use scene_core::occlusion::{occlusions, OcclusionConfig};
use scene_core::oracle::PathOracle;
use scene_core::prediction::Predictor;
use scene_core::rules::{standard_priority, standard_registry};
use scene_core::runner::{simulate, SimulationParams};
use scene_core::scenario::{build_scenario, ScenarioParams};
use scene_core::stepper::SceneStepper;
use scene_core::Category;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let params = ScenarioParams::default()
        .with_name("crossing-run")
        .with_seed(42)
        .with_counts(6, 4)
        .with_bounds(0.0, 80.0, 0.0, 80.0);
    let mut scenario = build_scenario(&params)?;

    let stepper = SceneStepper::new(standard_registry()).with_priority(standard_priority());
    let predictor = Predictor::default();
    let oracle = PathOracle::default();

    let report = simulate(
        &mut scenario,
        &stepper,
        &predictor,
        &oracle,
        &SimulationParams::default()
            .with_duration(12.0)
            .with_delta_t(0.5),
    )?;

    println!("scenario '{}'", scenario.name());
    println!(
        "  simulated {} steps up to t={:.1}s over {} scenes",
        report.steps,
        report.final_timestamp,
        scenario.len()
    );
    for accident in &report.accidents {
        println!(
            "  accident at t={:.1}s between {} and {}",
            accident.timestamp, accident.accident.a, accident.accident.b
        );
    }
    for failure in &report.failures {
        println!(
            "  isolated failure at t={:.1}s for {}: {}",
            failure.timestamp, failure.entity, failure.reason
        );
    }

    let last = scenario.latest().expect("scenario has scenes");
    let vehicles: Vec<_> = last
        .dynamic_entities()
        .filter(|e| e.is_a(Category::Vehicle))
        .map(|e| e.id())
        .collect();
    for (i, a) in vehicles.iter().enumerate() {
        for b in vehicles.iter().skip(i + 1) {
            if oracle.has_intersecting_path(last, &predictor, *a, *b) {
                println!("  {a} and {b} are on intersecting paths");
            }
        }
    }
    if let Some(ego) = vehicles.first() {
        for occ in occlusions(last, *ego, &OcclusionConfig::default()) {
            println!(
                "  {} occluded for {} at rate {:.2}",
                occ.occluded, occ.observer, occ.rate
            );
        }
    }
    Ok(())
}
