//! Scenario sequencer: drives the stepper over a scenario for a fixed
//! duration, invalidating prediction/oracle caches after each step and
//! optionally stopping early on the first accident.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::entity::EntityId;
use crate::error::SceneError;
use crate::oracle::PathOracle;
use crate::prediction::Predictor;
use crate::scenario::Scenario;
use crate::stepper::{Accident, SceneStepper, StepOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Simulated duration in seconds.
    pub duration: f64,
    /// Step size in seconds.
    pub delta_t: f64,
    /// Stop immediately after the first scene containing an accident.
    pub stop_on_accident: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            duration: 10.0,
            delta_t: 0.5,
            stop_on_accident: true,
        }
    }
}

impl SimulationParams {
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = delta_t;
        self
    }

    pub fn with_stop_on_accident(mut self, stop: bool) -> Self {
        self.stop_on_accident = stop;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccidentReport {
    pub timestamp: f64,
    pub accident: Accident,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailure {
    pub timestamp: f64,
    pub entity: EntityId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationReport {
    pub steps: usize,
    pub final_timestamp: f64,
    pub accidents: Vec<AccidentReport>,
    pub failures: Vec<StepFailure>,
}

/// Simulates `round(duration / Δt)` steps from the scenario's latest scene,
/// appending every produced scene.
pub fn simulate(
    scenario: &mut Scenario,
    stepper: &SceneStepper,
    predictor: &Predictor,
    oracle: &PathOracle,
    params: &SimulationParams,
) -> Result<SimulationReport, SceneError> {
    simulate_with_hook(scenario, stepper, predictor, oracle, params, |_| true)
}

/// Like [`simulate`], with a cancellation hook called after each step (before
/// the scene is appended); returning `false` stops the run.
pub fn simulate_with_hook(
    scenario: &mut Scenario,
    stepper: &SceneStepper,
    predictor: &Predictor,
    oracle: &PathOracle,
    params: &SimulationParams,
    mut hook: impl FnMut(&StepOutcome) -> bool,
) -> Result<SimulationReport, SceneError> {
    if scenario.is_empty() {
        warn!(name = scenario.name(), "refusing to simulate an empty scenario");
        return Err(SceneError::EmptyScenario);
    }
    if params.delta_t <= 0.0 {
        return Err(SceneError::InvalidTimeStep(params.delta_t));
    }

    let steps = (params.duration / params.delta_t).round() as usize;
    info!(
        name = scenario.name(),
        steps,
        delta_t = params.delta_t,
        "starting simulation"
    );

    let mut report = SimulationReport {
        final_timestamp: scenario.latest().map(|s| s.timestamp()).unwrap_or(0.0),
        ..SimulationReport::default()
    };

    for _ in 0..steps {
        let outcome = {
            // is_empty was checked above, a latest scene exists
            let Some(prev) = scenario.latest() else {
                return Err(SceneError::EmptyScenario);
            };
            stepper.step(prev, params.delta_t)?
        };

        for id in &outcome.updated {
            predictor.invalidate(*id);
            oracle.invalidate(*id);
        }

        let timestamp = outcome.scene.timestamp();
        report.steps += 1;
        report.final_timestamp = timestamp;
        report
            .accidents
            .extend(outcome.accidents.iter().map(|accident| AccidentReport {
                timestamp,
                accident: *accident,
            }));
        report
            .failures
            .extend(outcome.failures.iter().map(|(entity, error)| StepFailure {
                timestamp,
                entity: *entity,
                reason: error.to_string(),
            }));

        let keep_going = hook(&outcome);
        let had_accident = !outcome.accidents.is_empty();
        scenario.push(outcome.scene)?;

        if !keep_going {
            debug!(timestamp, "simulation cancelled by hook");
            break;
        }
        if params.stop_on_accident && had_accident {
            info!(timestamp, "stopping on first accident");
            break;
        }
    }

    Ok(report)
}
