use crate::config::EngineConfig;
use crate::core::building::BuildingProfile;
use crate::core::envelope::diagnostics::EnvelopeDiagnostics;
use crate::core::environment::assessor::{BuildingLca, MaterialQuantity};
use crate::core::finance::portfolio::InvestmentMeasure;
use crate::core::monitoring::measurement::EnergyReading;
use crate::core::monitoring::plan::{MvPlan, ReportingPeriod};
use anyhow::bail;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read};

pub fn ingest_request(json: impl Read) -> anyhow::Result<Input> {
    let reader = BufReader::new(json);

    let input: Input = serde_json::from_reader(reader)?;
    input.check_request()?;

    Ok(input)
}

/// A full assessment request.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Input {
    #[serde(default)]
    pub config: EngineConfig,
    /// Fill reference tables the config leaves out with the built-in data.
    #[serde(default = "default_use_embedded_reference_data")]
    pub use_embedded_reference_data: bool,
    #[serde(default)]
    pub scenarios: Vec<RetrofitScenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_and_verification: Option<MeasurementAndVerification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_lca: Option<BuildingLca>,
}

fn default_use_embedded_reference_data() -> bool {
    true
}

impl Input {
    fn check_request(&self) -> anyhow::Result<()> {
        if self.scenarios.is_empty()
            && self.measurement_and_verification.is_none()
            && self.building_lca.is_none()
        {
            bail!("Request contains no scenarios, measurement and verification or building LCA");
        }
        if let Some(name) = self
            .scenarios
            .iter()
            .map(|scenario| &scenario.name)
            .duplicates()
            .next()
        {
            bail!("Scenario name '{name}' is used more than once");
        }
        if let Some(clash) = self
            .scenarios
            .iter()
            .duplicates_by(|scenario| scenario.output_key())
            .next()
        {
            let key = clash.output_key();
            let first = self
                .scenarios
                .iter()
                .find(|scenario| scenario.output_key() == key)
                .map(|scenario| scenario.name.as_str())
                .unwrap_or_default();
            bail!(
                "Scenario names '{first}' and '{}' both write their results to '{key}'",
                clash.name
            );
        }
        Ok(())
    }
}

/// A building as it is now and as it would be after a retrofit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrofitScenario {
    pub name: String,
    pub baseline: BuildingProfile,
    pub retrofit: BuildingProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_diagnostics: Option<EnvelopeDiagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrofit_diagnostics: Option<EnvelopeDiagnostics>,
    /// Total cost of the retrofit; defaults to the sum of the measure costs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment: Option<f64>,
    #[serde(default)]
    pub measures: Vec<InvestmentMeasure>,
    /// Materials installed by the retrofit.
    #[serde(default)]
    pub materials: Vec<MaterialQuantity>,
    /// Years over which the retrofit's carbon balance is followed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifespan_years: Option<u32>,
}

impl RetrofitScenario {
    pub fn new(name: impl Into<String>, baseline: BuildingProfile, retrofit: BuildingProfile) -> Self {
        Self {
            name: name.into(),
            baseline,
            retrofit,
            baseline_diagnostics: None,
            retrofit_diagnostics: None,
            investment: None,
            measures: vec![],
            materials: vec![],
            lifespan_years: None,
        }
    }

    pub fn investment(&self) -> f64 {
        self.investment
            .unwrap_or_else(|| self.measures.iter().map(|measure| measure.cost).sum())
    }

    /// File-name-safe key under which the scenario's results are written.
    pub fn output_key(&self) -> String {
        let name = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect::<String>();
        format!("scenario_{name}")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeasurementAndVerification {
    pub plan: MvPlan,
    #[serde(default)]
    pub baseline_readings: Vec<EnergyReading>,
    pub reporting_period: ReportingPeriod,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::building::tests::family_house;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    fn building() -> serde_json::Value {
        json!({
            "building_type": "family_house",
            "heated_floor_area": 150.0,
            "construction_year": 1985,
            "elements": [
                {"name": "wall", "kind": "wall", "area": 120.0, "u_value": 0.5}
            ],
            "heating_system": {"system_type": "gas_boiler", "carrier": "natural_gas", "efficiency": 0.9}
        })
    }

    #[rstest]
    fn should_ingest_scenario_with_defaults() {
        let request = json!({
            "Scenarios": [{
                "name": "wall insulation",
                "baseline": building(),
                "retrofit": building(),
                "measures": [
                    {"name": "wall", "cost": 8000.0, "annual_energy_savings": 5000.0,
                     "annual_cost_savings": 400.0, "lifetime_years": 30},
                    {"name": "windows", "cost": 4000.0, "annual_energy_savings": 2000.0,
                     "annual_cost_savings": 160.0, "lifetime_years": 25}
                ]
            }]
        });
        let input = ingest_request(request.to_string().as_bytes()).unwrap();

        assert!(input.use_embedded_reference_data);
        assert_eq!(input.scenarios.len(), 1);
        assert_eq!(input.scenarios[0].investment(), 12000.);
        assert!(input.config.emission_factors.is_none());
    }

    #[rstest]
    fn should_prefer_explicit_investment() {
        let mut scenario: RetrofitScenario = serde_json::from_value(json!({
            "name": "heat pump",
            "baseline": building(),
            "retrofit": building(),
            "investment": 15000.0
        }))
        .unwrap();
        assert_eq!(scenario.investment(), 15000.);
        scenario.investment = None;
        assert_eq!(scenario.investment(), 0.);
    }

    #[rstest]
    fn should_reject_empty_request() {
        assert!(ingest_request(json!({}).to_string().as_bytes()).is_err());
    }

    #[rstest]
    fn should_reject_duplicate_scenario_names() {
        let scenario = json!({"name": "a", "baseline": building(), "retrofit": building()});
        let request = json!({"Scenarios": [scenario.clone(), scenario]});
        let error = ingest_request(request.to_string().as_bytes()).unwrap_err();
        assert_eq!(error.to_string(), "Scenario name 'a' is used more than once");
    }

    #[rstest]
    fn should_reject_names_sharing_an_output_key() {
        let request = json!({"Scenarios": [
            {"name": "Wall Insulation", "baseline": building(), "retrofit": building()},
            {"name": "wall_insulation", "baseline": building(), "retrofit": building()}
        ]});
        let error = ingest_request(request.to_string().as_bytes()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Scenario names 'Wall Insulation' and 'wall_insulation' both write their results \
             to 'scenario_wall_insulation'"
        );
    }

    #[rstest]
    #[case("Wall Insulation", "scenario_wall_insulation")]
    #[case("PV + battery (2024)", "scenario_pv___battery__2024_")]
    #[case("heat-pump", "scenario_heat_pump")]
    fn should_derive_file_safe_output_key(#[case] name: &str, #[case] expected: &str) {
        let scenario = RetrofitScenario::new(name, family_house(), family_house());
        assert_eq!(scenario.output_key(), expected);
    }
}
