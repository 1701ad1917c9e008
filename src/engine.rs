use crate::config::{required, EngineConfig};
use crate::core::building::BuildingProfile;
use crate::core::demand::energy_demand::{DemandEngine, DemandResult};
use crate::core::envelope::diagnostics::EnvelopeDiagnostics;
use crate::core::envelope::thermal_balance::{EnvelopeModel, ThermalBalanceResult};
use crate::core::environment::assessor::{
    BuildingLca, EnergyMix, EnvironmentalAssessment, EnvironmentalAssessor, RenovationProject,
    WholeLifeCarbon, DEFAULT_PROJECT_LIFESPAN_YEARS,
};
use crate::core::finance::cash_flow::FinancialParameters;
use crate::core::finance::energy_prices::{EnergyCost, EnergyPrices};
use crate::core::finance::feasibility::{analyze_feasibility_with, FeasibilityResult};
use crate::core::finance::portfolio::{analyze_portfolio, PortfolioAnalysis};
use crate::core::finance::sensitivity::{sensitivity_analysis, SensitivityAnalysis};
use crate::core::monitoring::performance::{PerformanceEngine, PerformanceReport};
use crate::errors::{merge_exclusions, EngineError, ExclusionNote};
use crate::input::{MeasurementAndVerification, RetrofitScenario};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Thermal balance, demand and running cost of one building state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BuildingAssessment {
    pub thermal_balance: ThermalBalanceResult,
    pub demand: DemandResult,
    pub energy_cost: EnergyCost,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RetrofitAssessment {
    pub name: String,
    pub baseline: BuildingAssessment,
    pub retrofit: BuildingAssessment,
    pub investment: f64,
    /// Delivered energy saved, in kWh/yr.
    pub annual_energy_savings: f64,
    pub primary_energy_savings: f64,
    pub annual_cost_savings: f64,
    pub feasibility: FeasibilityResult,
    pub sensitivity: SensitivityAnalysis,
    /// Present when the scenario lists individual measures.
    pub portfolio: Option<PortfolioAnalysis>,
    pub environment: EnvironmentalAssessment,
    pub exclusions: Vec<ExclusionNote>,
}

/// Holds one configured instance of each component and composes them into
/// retrofit assessments.
#[derive(Clone, Debug)]
pub struct AssessmentEngine {
    envelope: EnvelopeModel,
    demand: DemandEngine,
    finance: FinancialParameters,
    energy_prices: EnergyPrices,
    environment: EnvironmentalAssessor,
    monitoring: PerformanceEngine,
}

impl AssessmentEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.finance.validate()?;
        let energy_prices = required(config.energy_prices, "energy prices")?;
        energy_prices.validate()?;

        Ok(Self {
            envelope: EnvelopeModel::new(config.climate)?,
            demand: DemandEngine::new(
                required(config.demand_factors, "demand factors")?,
                required(config.classification, "energy class")?,
            )?,
            finance: config.finance,
            energy_prices,
            environment: EnvironmentalAssessor::new(
                required(config.emission_factors, "emission factors")?,
                required(config.materials, "materials")?,
                required(config.benchmarks, "benchmarks")?,
                config.transport_emission_factor,
            )?,
            monitoring: PerformanceEngine::new(required(
                config.measurement_prices,
                "measurement prices",
            )?)?,
        })
    }

    pub fn envelope(&self) -> &EnvelopeModel {
        &self.envelope
    }

    pub fn demand(&self) -> &DemandEngine {
        &self.demand
    }

    pub fn finance(&self) -> &FinancialParameters {
        &self.finance
    }

    pub fn environment(&self) -> &EnvironmentalAssessor {
        &self.environment
    }

    pub fn monitoring(&self) -> &PerformanceEngine {
        &self.monitoring
    }

    pub fn assess_building(
        &self,
        profile: &BuildingProfile,
        diagnostics: Option<&EnvelopeDiagnostics>,
    ) -> Result<BuildingAssessment, EngineError> {
        let thermal_balance = self.envelope.compute_thermal_balance(profile, diagnostics)?;
        let demand = self.demand.compute_demand(profile, &thermal_balance)?;
        let energy_cost = self.energy_prices.annual_cost(&demand.delivered_energy);

        Ok(BuildingAssessment {
            thermal_balance,
            demand,
            energy_cost,
        })
    }

    #[instrument(skip_all, fields(scenario = %scenario.name))]
    pub fn assess_retrofit(
        &self,
        scenario: &RetrofitScenario,
    ) -> Result<RetrofitAssessment, EngineError> {
        let baseline = self.assess_building(&scenario.baseline, scenario.baseline_diagnostics.as_ref())?;
        let retrofit = self.assess_building(&scenario.retrofit, scenario.retrofit_diagnostics.as_ref())?;

        let investment = scenario.investment();
        let annual_energy_savings =
            baseline.demand.total_delivered_energy() - retrofit.demand.total_delivered_energy();
        let primary_energy_savings =
            baseline.demand.primary_energy - retrofit.demand.primary_energy;
        let annual_cost_savings = baseline.energy_cost.total - retrofit.energy_cost.total;

        let feasibility = analyze_feasibility_with(investment, annual_cost_savings, &self.finance)?;
        let sensitivity = sensitivity_analysis(investment, annual_cost_savings, &self.finance)?;
        let portfolio = if scenario.measures.is_empty() {
            None
        } else {
            Some(analyze_portfolio(&scenario.measures, &self.finance)?)
        };

        let environment = self.environment.assess_renovation(&RenovationProject {
            building_type: scenario.retrofit.building_type,
            heated_floor_area: scenario.retrofit.heated_floor_area,
            current_energy_mix: energy_mix(&baseline.demand),
            projected_energy_mix: energy_mix(&retrofit.demand),
            materials: scenario.materials.clone(),
            lifespan_years: scenario
                .lifespan_years
                .unwrap_or(DEFAULT_PROJECT_LIFESPAN_YEARS),
        })?;
        debug!(
            annual_energy_savings,
            annual_cost_savings,
            npv = feasibility.npv,
            "retrofit assessed"
        );

        Ok(RetrofitAssessment {
            name: scenario.name.clone(),
            exclusions: merge_exclusions([
                &baseline.energy_cost.exclusions,
                &retrofit.energy_cost.exclusions,
                &environment.exclusions,
            ]),
            baseline,
            retrofit,
            investment,
            annual_energy_savings,
            primary_energy_savings,
            annual_cost_savings,
            feasibility,
            sensitivity,
            portfolio,
            environment,
        })
    }

    /// Assess independent scenarios in parallel. Results keep the order of the input.
    pub fn assess_scenarios(
        &self,
        scenarios: &[RetrofitScenario],
    ) -> Vec<Result<RetrofitAssessment, EngineError>> {
        scenarios
            .par_iter()
            .map(|scenario| self.assess_retrofit(scenario))
            .collect()
    }

    pub fn verify_performance(
        &self,
        request: &MeasurementAndVerification,
    ) -> Result<PerformanceReport, EngineError> {
        self.monitoring.generate_performance_report(
            &request.plan,
            &request.baseline_readings,
            &request.reporting_period,
        )
    }

    pub fn assess_building_lca(&self, lca: &BuildingLca) -> Result<WholeLifeCarbon, EngineError> {
        self.environment.assess_building_lca(lca)
    }
}

fn energy_mix(demand: &DemandResult) -> EnergyMix {
    demand
        .delivered_energy
        .iter()
        .map(|(source, energy)| (source.to_string(), *energy))
        .collect::<IndexMap<_, _>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::building::tests::family_house;
    use crate::core::energy_source::EnergySource;
    use crate::core::environment::assessor::MaterialQuantity;
    use crate::core::finance::portfolio::InvestmentMeasure;
    use crate::errors::ReferenceKind;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn engine() -> AssessmentEngine {
        AssessmentEngine::new(EngineConfig::with_reference_data().unwrap()).unwrap()
    }

    fn insulation_scenario() -> RetrofitScenario {
        let mut baseline = family_house();
        for element in baseline.elements.iter_mut() {
            element.u_value *= 4.;
        }
        let mut scenario = RetrofitScenario::new("insulation", baseline, family_house());
        scenario.investment = Some(12000.);
        scenario.materials = vec![MaterialQuantity::new("EPS_insulation", 300.)];
        scenario
    }

    #[rstest]
    fn should_fail_closed_without_reference_tables() {
        assert!(matches!(
            AssessmentEngine::new(EngineConfig::default()),
            Err(EngineError::MissingConfiguration(_))
        ));
    }

    #[rstest]
    fn should_derive_savings_from_delivered_energy_and_prices(engine: AssessmentEngine) {
        let assessment = engine.assess_retrofit(&insulation_scenario()).unwrap();

        assert!(assessment.annual_energy_savings > 0.);
        assert_relative_eq!(
            assessment.annual_cost_savings,
            assessment.baseline.energy_cost.total - assessment.retrofit.energy_cost.total,
            max_relative = 1e-12
        );
        // only the gas-fired heating changes; electricity use is the same in both states
        assert_relative_eq!(
            assessment.annual_cost_savings,
            assessment.annual_energy_savings * 0.08,
            max_relative = 1e-9
        );
        assert_eq!(assessment.feasibility.investment, 12000.);
        assert_eq!(assessment.feasibility.annual_savings, assessment.annual_cost_savings);
        assert!(assessment.portfolio.is_none());
        assert!(assessment.environment.operational.annual_savings > 0.);
        assert!(assessment.environment.embodied.total > 0.);
        assert!(assessment.exclusions.is_empty());
    }

    #[rstest]
    fn should_appraise_listed_measures(engine: AssessmentEngine) {
        let mut scenario = insulation_scenario();
        scenario.investment = None;
        scenario.measures = vec![InvestmentMeasure {
            name: "wall insulation".into(),
            cost: 9000.,
            annual_energy_savings: 4000.,
            annual_cost_savings: 320.,
            lifetime_years: 30,
        }];
        let assessment = engine.assess_retrofit(&scenario).unwrap();

        assert_eq!(assessment.investment, 9000.);
        assert_eq!(assessment.portfolio.unwrap().measures[0].rank, 1);
    }

    #[rstest]
    fn should_note_carriers_missing_from_emission_factors(engine: AssessmentEngine) {
        let mut scenario = insulation_scenario();
        scenario.retrofit.heating_system.carrier = EnergySource::Geothermal;
        let assessment = engine.assess_retrofit(&scenario).unwrap();

        assert_eq!(assessment.exclusions.len(), 1);
        assert_eq!(assessment.exclusions[0].kind, ReferenceKind::EnergySource);
        assert_eq!(assessment.exclusions[0].name, "geothermal");
    }

    #[rstest]
    fn should_stop_scenario_on_invalid_building(engine: AssessmentEngine) {
        let mut scenario = insulation_scenario();
        scenario.retrofit.heated_floor_area = 0.;
        assert!(matches!(
            engine.assess_retrofit(&scenario),
            Err(EngineError::InvalidInput { field, .. }) if field == "heated_floor_area"
        ));
    }

    #[rstest]
    fn should_assess_scenarios_in_input_order(engine: AssessmentEngine) {
        let mut broken = insulation_scenario();
        broken.name = "broken".into();
        broken.baseline.heated_floor_area = -1.;
        let scenarios = vec![insulation_scenario(), broken];

        let results = engine.assess_scenarios(&scenarios);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &engine.assess_retrofit(&scenarios[0]).unwrap()
        );
        assert!(results[1].is_err());
    }
}
