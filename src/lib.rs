mod compare_floats;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod input;
pub mod output;
mod statistics;

#[macro_use]
extern crate is_close;

use crate::core::environment::assessor::WholeLifeCarbon;
use crate::core::monitoring::performance::PerformanceReport;
use crate::engine::{AssessmentEngine, RetrofitAssessment};
use crate::errors::{AssessmentError, EngineError, OutputError};
use crate::input::ingest_request;
use crate::output::{write_json_record, Output};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::{instrument, warn};

/// Everything produced by one assessment run, keyed the same way as the written output.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AssessmentOutput {
    pub scenarios: IndexMap<String, RetrofitAssessment>,
    pub performance: Option<PerformanceReport>,
    pub building_lca: Option<WholeLifeCarbon>,
}

/// Read a JSON request, run every assessment in it and write one JSON record per result.
///
/// Scenario results are written under `scenario_<name>`, the M&V report under
/// `performance` and the whole-building LCA under `building_lca`. A failing scenario
/// does not stop the others from being written; the first failure is returned once
/// everything else has been.
#[instrument(skip_all)]
pub fn run_assessment(
    input: impl Read,
    output: impl Output,
) -> Result<AssessmentOutput, AssessmentError> {
    let mut request = ingest_request(input)?;
    if request.use_embedded_reference_data {
        request.config.fill_reference_defaults()?;
    }
    let engine = AssessmentEngine::new(request.config)?;

    let mut results = AssessmentOutput::default();
    let mut first_failure: Option<EngineError> = None;

    for (scenario, result) in request
        .scenarios
        .iter()
        .zip(engine.assess_scenarios(&request.scenarios))
    {
        match result {
            Ok(assessment) => {
                write_json_record(&output, &scenario.output_key(), &assessment)
                    .map_err(|e| AssessmentError::ErrorInOutput(OutputError::new(e)))?;
                results.scenarios.insert(scenario.name.clone(), assessment);
            }
            Err(error) => {
                warn!(scenario = %scenario.name, %error, "scenario could not be assessed");
                first_failure.get_or_insert(error);
            }
        }
    }

    if let Some(request) = &request.measurement_and_verification {
        let report = engine.verify_performance(request)?;
        write_json_record(&output, "performance", &report)
            .map_err(|e| AssessmentError::ErrorInOutput(OutputError::new(e)))?;
        results.performance = Some(report);
    }

    if let Some(lca) = &request.building_lca {
        let whole_life_carbon = engine.assess_building_lca(lca)?;
        write_json_record(&output, "building_lca", &whole_life_carbon)
            .map_err(|e| AssessmentError::ErrorInOutput(OutputError::new(e)))?;
        results.building_lca = Some(whole_life_carbon);
    }

    match first_failure {
        Some(error) => Err(error.into()),
        None => Ok(results),
    }
}
