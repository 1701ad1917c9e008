use crate::compare_floats::guarded_ratio;
use crate::core::building::BuildingType;
use crate::core::energy_source::EnergySource;
use crate::core::environment::benchmarks::{BenchmarkComparison, BenchmarkTable};
use crate::core::environment::emission_factors::EmissionFactorTable;
use crate::core::environment::indicators::{
    sustainability_indicators, CarbonEfficiency, EmbodiedIntensityRating,
    SustainabilityIndicators,
};
use crate::core::environment::lifecycle::{
    environmental_payback, lifecycle_assessment, LifecycleAssessment,
};
use crate::core::environment::materials::{MaterialDatabase, MaterialImpact, MaterialUnit};
use crate::core::finance::feasibility::Payback;
use crate::errors::{merge_exclusions, EngineError, ExclusionNote};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Annual consumption in kWh keyed by energy source tag, e.g. "natural_gas".
pub type EnergyMix = IndexMap<String, f64>;

pub const DEFAULT_PROJECT_LIFESPAN_YEARS: u32 = 30;
const DEFAULT_BUILDING_LIFESPAN_YEARS: u32 = 50;
const DEFAULT_RENOVATION_CYCLES: u32 = 2;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialQuantity {
    /// Key into the material database.
    pub material: String,
    /// In the material's declared unit.
    pub quantity: f64,
}

impl MaterialQuantity {
    pub fn new(material: impl Into<String>, quantity: f64) -> Self {
        Self {
            material: material.into(),
            quantity,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !(self.quantity.is_finite() && self.quantity >= 0.) {
            return Err(EngineError::invalid_input(
                format!("materials[{}].quantity", self.material),
                format!("must not be negative, got {}", self.quantity),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MaterialEmissions {
    pub material: String,
    pub name: String,
    pub quantity: f64,
    pub unit: MaterialUnit,
    pub embodied_emissions: f64, // kg CO2e
    pub embodied_energy: f64,    // MJ
    pub transport_emissions: f64,
    pub emissions_per_area: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EmbodiedEmissions {
    pub material_emissions: f64,
    pub transport_emissions: f64,
    /// Materials plus transport, in kg CO2e.
    pub total: f64,
    pub per_area: f64,
    pub embodied_energy: f64,
    pub breakdown: Vec<MaterialEmissions>,
    pub exclusions: Vec<ExclusionNote>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SourceEmissions {
    pub consumption: f64,         // kWh/yr
    pub co2_equivalent_factor: f64, // kg CO2e/kWh
    pub annual_emissions: f64,    // kg CO2e/yr
    pub primary_energy: f64,
    pub renewable_energy: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OperationalEmissions {
    pub annual: f64,
    pub years: u32,
    pub total: f64,
    pub breakdown: IndexMap<EnergySource, SourceEmissions>,
    pub exclusions: Vec<ExclusionNote>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SourceReduction {
    pub current_consumption: f64,
    pub projected_consumption: f64,
    pub energy_savings: f64,
    pub co2_equivalent_factor: f64,
    pub emissions_savings: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OperationalReduction {
    pub current_annual_emissions: f64,
    pub projected_annual_emissions: f64,
    pub annual_savings: f64,
    /// Zero when there are no current emissions to reduce.
    pub reduction_percentage: f64,
    pub savings_per_area: f64,
    pub breakdown: IndexMap<EnergySource, SourceReduction>,
    pub exclusions: Vec<ExclusionNote>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EndOfLifeEmissions {
    pub demolition: f64,
    pub recycling_credit: f64,
    pub net: f64,
    pub exclusions: Vec<ExclusionNote>,
}

/// Materials installed and energy use before and after a renovation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RenovationProject {
    pub building_type: BuildingType,
    pub heated_floor_area: f64,
    pub current_energy_mix: EnergyMix,
    pub projected_energy_mix: EnergyMix,
    #[serde(default)]
    pub materials: Vec<MaterialQuantity>,
    #[serde(default = "default_project_lifespan")]
    pub lifespan_years: u32,
}

fn default_project_lifespan() -> u32 {
    DEFAULT_PROJECT_LIFESPAN_YEARS
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnvironmentalAssessment {
    pub emission_factor_version: String,
    pub operational: OperationalReduction,
    pub embodied: EmbodiedEmissions,
    pub end_of_life: EndOfLifeEmissions,
    pub environmental_payback: Payback,
    pub lifecycle: LifecycleAssessment,
    pub benchmark: BenchmarkComparison,
    pub sustainability: SustainabilityIndicators,
    pub embodied_intensity_rating: EmbodiedIntensityRating,
    pub carbon_efficiency: CarbonEfficiency,
    pub recommendations: Vec<String>,
    pub exclusions: Vec<ExclusionNote>,
}

/// A whole building over its service life.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingLca {
    pub heated_floor_area: f64,
    #[serde(default)]
    pub materials: Vec<MaterialQuantity>,
    pub annual_energy_consumption: EnergyMix,
    #[serde(default = "default_building_lifespan")]
    pub lifespan_years: u32,
    /// Upper limit on how often a material is replaced during the building's life.
    #[serde(default = "default_renovation_cycles")]
    pub renovation_cycles: u32,
}

fn default_building_lifespan() -> u32 {
    DEFAULT_BUILDING_LIFESPAN_YEARS
}

fn default_renovation_cycles() -> u32 {
    DEFAULT_RENOVATION_CYCLES
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WholeLifeCarbon {
    pub lifespan_years: u32,
    pub embodied: EmbodiedEmissions,
    /// Embodied emissions of materials replaced before the end of the building's life.
    pub replacement_emissions: f64,
    pub operational: OperationalEmissions,
    pub end_of_life: EndOfLifeEmissions,
    pub total: f64,
    pub per_area: f64,
    pub per_area_per_year: f64,
    pub exclusions: Vec<ExclusionNote>,
}

/// Turn a missing-reference error into an exclusion note; other errors still fail.
fn recover_missing_reference<T>(
    result: Result<T, EngineError>,
    exclusions: &mut Vec<ExclusionNote>,
) -> Result<Option<T>, EngineError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) => match ExclusionNote::from_error(&error) {
            Some(note) => {
                warn!(kind = %note.kind, name = %note.name, "skipping item without reference data");
                exclusions.push(note);
                Ok(None)
            }
            None => Err(error),
        },
    }
}

fn validate_floor_area(area: f64) -> Result<(), EngineError> {
    if !(area.is_finite() && area > 0.) {
        return Err(EngineError::invalid_input(
            "heated_floor_area",
            format!("must be greater than zero, got {area}"),
        ));
    }
    Ok(())
}

/// Carbon accounting for renovation materials and energy use, against a fixed set of
/// reference tables.
#[derive(Clone, Debug)]
pub struct EnvironmentalAssessor {
    emission_factors: EmissionFactorTable,
    materials: MaterialDatabase,
    benchmarks: BenchmarkTable,
    transport_emission_factor: f64,
}

impl EnvironmentalAssessor {
    pub fn new(
        emission_factors: EmissionFactorTable,
        materials: MaterialDatabase,
        benchmarks: BenchmarkTable,
        transport_emission_factor: f64,
    ) -> Result<Self, EngineError> {
        emission_factors.validate()?;
        materials.validate()?;
        benchmarks.validate()?;
        if !(transport_emission_factor.is_finite() && transport_emission_factor >= 0.) {
            return Err(EngineError::invalid_input(
                "transport_emission_factor",
                format!("must not be negative, got {transport_emission_factor}"),
            ));
        }

        Ok(Self {
            emission_factors,
            materials,
            benchmarks,
            transport_emission_factor,
        })
    }

    pub fn emission_factors(&self) -> &EmissionFactorTable {
        &self.emission_factors
    }

    pub fn materials(&self) -> &MaterialDatabase {
        &self.materials
    }

    fn resolve_materials<'a>(
        &'a self,
        materials: &'a [MaterialQuantity],
        exclusions: &mut Vec<ExclusionNote>,
    ) -> Result<Vec<(&'a MaterialQuantity, &'a MaterialImpact)>, EngineError> {
        let mut resolved = Vec::with_capacity(materials.len());
        for item in materials {
            item.validate()?;
            if let Some(impact) =
                recover_missing_reference(self.materials.get(&item.material), exclusions)?
            {
                resolved.push((item, impact));
            }
        }
        Ok(resolved)
    }

    pub fn embodied_emissions(
        &self,
        materials: &[MaterialQuantity],
        building_area: f64,
    ) -> Result<EmbodiedEmissions, EngineError> {
        validate_floor_area(building_area)?;
        let mut exclusions = vec![];
        let breakdown = self
            .resolve_materials(materials, &mut exclusions)?
            .into_iter()
            .map(|(item, impact)| {
                let embodied_emissions = impact.embodied_emissions(item.quantity);
                MaterialEmissions {
                    material: item.material.clone(),
                    name: impact.name.clone(),
                    quantity: item.quantity,
                    unit: impact.unit,
                    embodied_emissions,
                    embodied_energy: impact.embodied_energy_for(item.quantity),
                    transport_emissions: impact
                        .transport_emissions(item.quantity, self.transport_emission_factor),
                    emissions_per_area: embodied_emissions / building_area,
                }
            })
            .collect::<Vec<_>>();

        let material_emissions = breakdown.iter().map(|entry| entry.embodied_emissions).sum::<f64>();
        let transport_emissions = breakdown.iter().map(|entry| entry.transport_emissions).sum::<f64>();
        let total = material_emissions + transport_emissions;

        Ok(EmbodiedEmissions {
            material_emissions,
            transport_emissions,
            total,
            per_area: total / building_area,
            embodied_energy: breakdown.iter().map(|entry| entry.embodied_energy).sum(),
            breakdown,
            exclusions,
        })
    }

    pub fn operational_emissions(
        &self,
        energy_mix: &EnergyMix,
        years: u32,
    ) -> Result<OperationalEmissions, EngineError> {
        let mut exclusions = vec![];
        let mut breakdown: IndexMap<EnergySource, SourceEmissions> = IndexMap::new();

        for (tag, consumption) in energy_mix {
            if !(consumption.is_finite() && *consumption >= 0.) {
                return Err(EngineError::invalid_input(
                    format!("energy_mix[{tag}]"),
                    format!("consumption must not be negative, got {consumption}"),
                ));
            }
            let Some((source, factor)) =
                recover_missing_reference(self.emission_factors.lookup(tag), &mut exclusions)?
            else {
                continue;
            };
            let entry = breakdown.entry(source).or_insert(SourceEmissions {
                consumption: 0.,
                co2_equivalent_factor: factor.co2_equivalent(),
                annual_emissions: 0.,
                primary_energy: 0.,
                renewable_energy: 0.,
            });
            entry.consumption += consumption;
            entry.annual_emissions += consumption * factor.co2_equivalent();
            entry.primary_energy += consumption * factor.primary_energy_factor;
            entry.renewable_energy += consumption * factor.renewable_share.fraction();
        }

        let annual = breakdown.values().map(|entry| entry.annual_emissions).sum::<f64>();
        Ok(OperationalEmissions {
            annual,
            years,
            total: annual * years as f64,
            breakdown,
            exclusions,
        })
    }

    /// Change in annual operational emissions between two energy mixes.
    pub fn operational_reduction(
        &self,
        current_mix: &EnergyMix,
        projected_mix: &EnergyMix,
        building_area: f64,
    ) -> Result<OperationalReduction, EngineError> {
        validate_floor_area(building_area)?;
        let current = self.operational_emissions(current_mix, 1)?;
        let projected = self.operational_emissions(projected_mix, 1)?;

        let breakdown = current
            .breakdown
            .keys()
            .chain(projected.breakdown.keys())
            .unique()
            .map(|source| {
                let current_entry = current.breakdown.get(source);
                let projected_entry = projected.breakdown.get(source);
                let consumption = |entry: Option<&SourceEmissions>| entry.map_or(0., |e| e.consumption);
                let emissions = |entry: Option<&SourceEmissions>| entry.map_or(0., |e| e.annual_emissions);
                let co2_equivalent_factor = current_entry
                    .or(projected_entry)
                    .map_or(0., |entry| entry.co2_equivalent_factor);

                (
                    *source,
                    SourceReduction {
                        current_consumption: consumption(current_entry),
                        projected_consumption: consumption(projected_entry),
                        energy_savings: consumption(current_entry) - consumption(projected_entry),
                        co2_equivalent_factor,
                        emissions_savings: emissions(current_entry) - emissions(projected_entry),
                    },
                )
            })
            .collect();

        let annual_savings = current.annual - projected.annual;
        Ok(OperationalReduction {
            current_annual_emissions: current.annual,
            projected_annual_emissions: projected.annual,
            annual_savings,
            reduction_percentage: guarded_ratio(annual_savings, current.annual)
                .map_or(0., |ratio| ratio * 100.),
            savings_per_area: annual_savings / building_area,
            breakdown,
            exclusions: merge_exclusions([&current.exclusions, &projected.exclusions]),
        })
    }

    pub fn end_of_life_emissions(
        &self,
        materials: &[MaterialQuantity],
    ) -> Result<EndOfLifeEmissions, EngineError> {
        let mut exclusions = vec![];
        let resolved = self.resolve_materials(materials, &mut exclusions)?;
        let demolition = resolved
            .iter()
            .map(|(item, impact)| impact.demolition_emissions(item.quantity))
            .sum::<f64>();
        let recycling_credit = resolved
            .iter()
            .map(|(item, impact)| impact.recycling_credit(item.quantity))
            .sum::<f64>();

        Ok(EndOfLifeEmissions {
            demolition,
            recycling_credit,
            net: demolition - recycling_credit,
            exclusions,
        })
    }

    pub fn benchmark_compare(
        &self,
        current_intensity: f64,
        projected_intensity: f64,
        building_type: BuildingType,
    ) -> Result<BenchmarkComparison, EngineError> {
        self.benchmarks
            .compare(current_intensity, projected_intensity, building_type)
    }

    pub fn assess_renovation(
        &self,
        project: &RenovationProject,
    ) -> Result<EnvironmentalAssessment, EngineError> {
        let area = project.heated_floor_area;
        validate_floor_area(area)?;

        let operational = self.operational_reduction(
            &project.current_energy_mix,
            &project.projected_energy_mix,
            area,
        )?;
        let embodied = self.embodied_emissions(&project.materials, area)?;
        let end_of_life = self.end_of_life_emissions(&project.materials)?;
        let annual_savings = operational.annual_savings;
        let payback = environmental_payback(embodied.total, annual_savings);
        let lifecycle = lifecycle_assessment(embodied.total, annual_savings, project.lifespan_years)?;
        let benchmark = self.benchmark_compare(
            operational.current_annual_emissions / area,
            operational.projected_annual_emissions / area,
            project.building_type,
        )?;
        debug!(
            annual_savings,
            embodied = embodied.total,
            rating = %benchmark.projected_rating,
            "renovation assessed"
        );

        Ok(EnvironmentalAssessment {
            emission_factor_version: self.emission_factors.version.clone(),
            recommendations: recommendations(&operational, &embodied, &payback),
            exclusions: merge_exclusions([
                &operational.exclusions,
                &embodied.exclusions,
                &end_of_life.exclusions,
            ]),
            sustainability: sustainability_indicators(annual_savings),
            embodied_intensity_rating: EmbodiedIntensityRating::from_intensity(embodied.per_area),
            carbon_efficiency: CarbonEfficiency::new(annual_savings, embodied.total),
            environmental_payback: payback,
            operational,
            embodied,
            end_of_life,
            lifecycle,
            benchmark,
        })
    }

    /// Embodied, replacement, operational and end-of-life emissions over a building's life.
    pub fn assess_building_lca(&self, lca: &BuildingLca) -> Result<WholeLifeCarbon, EngineError> {
        if lca.lifespan_years == 0 {
            return Err(EngineError::invalid_input(
                "lifespan_years",
                "must be at least one year",
            ));
        }
        let area = lca.heated_floor_area;
        let embodied = self.embodied_emissions(&lca.materials, area)?;
        let operational =
            self.operational_emissions(&lca.annual_energy_consumption, lca.lifespan_years)?;
        let end_of_life = self.end_of_life_emissions(&lca.materials)?;

        let mut unused = vec![];
        let replacement_emissions = self
            .resolve_materials(&lca.materials, &mut unused)?
            .into_iter()
            .map(|(item, impact)| {
                let replacements = lca
                    .lifespan_years
                    .div_ceil(impact.lifespan_years)
                    .saturating_sub(1)
                    .min(lca.renovation_cycles);
                impact.embodied_emissions(item.quantity) * replacements as f64
            })
            .sum::<f64>();

        let total = embodied.total + replacement_emissions + operational.total + end_of_life.net;
        let per_area = total / area;
        Ok(WholeLifeCarbon {
            lifespan_years: lca.lifespan_years,
            replacement_emissions,
            total,
            per_area,
            per_area_per_year: per_area / lca.lifespan_years as f64,
            exclusions: merge_exclusions([
                &embodied.exclusions,
                &operational.exclusions,
                &end_of_life.exclusions,
            ]),
            embodied,
            operational,
            end_of_life,
        })
    }
}

fn recommendations(
    operational: &OperationalReduction,
    embodied: &EmbodiedEmissions,
    payback: &Payback,
) -> Vec<String> {
    let mut recommendations = vec![match payback.years() {
        Some(years) if years < 5. => "Excellent environmental payback; the project is recommended",
        Some(years) if years < 10. => "Good environmental payback",
        Some(years) if years < 20. => "Acceptable environmental payback",
        _ => "Long environmental payback; consider alternative measures",
    }
    .to_string()];
    if embodied.per_area > 200. {
        recommendations
            .push("High embodied emissions; consider materials with lower carbon content".into());
    }
    if operational.annual_savings < operational.current_annual_emissions * 0.3 {
        recommendations.push("Low emission savings; consider additional measures".into());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::benchmarks::PerformanceRating;
    use crate::core::environment::materials::DEFAULT_TRANSPORT_EMISSION_FACTOR;
    use crate::errors::ReferenceKind;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn assessor() -> EnvironmentalAssessor {
        EnvironmentalAssessor::new(
            EmissionFactorTable::slovak_2023().unwrap(),
            MaterialDatabase::embedded().unwrap(),
            BenchmarkTable::default(),
            DEFAULT_TRANSPORT_EMISSION_FACTOR,
        )
        .unwrap()
    }

    fn mix(entries: &[(&str, f64)]) -> EnergyMix {
        entries
            .iter()
            .map(|(tag, consumption)| (tag.to_string(), *consumption))
            .collect()
    }

    #[fixture]
    fn project() -> RenovationProject {
        RenovationProject {
            building_type: BuildingType::FamilyHouse,
            heated_floor_area: 120.,
            current_energy_mix: mix(&[("natural_gas", 18000.), ("electricity_grid", 3000.)]),
            projected_energy_mix: mix(&[("natural_gas", 9000.), ("electricity_grid", 2800.)]),
            materials: vec![
                MaterialQuantity::new("EPS_insulation", 800.),
                MaterialQuantity::new("timber", 2.),
            ],
            lifespan_years: 30,
        }
    }

    #[rstest]
    fn should_net_carbon_storing_materials_against_embodied_emissions(
        assessor: EnvironmentalAssessor,
    ) {
        let embodied = assessor
            .embodied_emissions(
                &[
                    MaterialQuantity::new("EPS_insulation", 800.),
                    MaterialQuantity::new("timber", 2.),
                ],
                120.,
            )
            .unwrap();

        assert_relative_eq!(embodied.breakdown[0].embodied_emissions, 2632., max_relative = 1e-12);
        assert_eq!(embodied.breakdown[1].embodied_emissions, -840.);
        assert_relative_eq!(embodied.material_emissions, 1792., max_relative = 1e-12);
        assert_relative_eq!(
            embodied.transport_emissions,
            800. * 0.8 * 100. * 0.062 + 2. * 0.002 * 100. * 0.062,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            embodied.total,
            embodied.material_emissions + embodied.transport_emissions,
            max_relative = 1e-12
        );
        assert!(embodied.exclusions.is_empty());
    }

    #[rstest]
    fn should_skip_unknown_material_with_note(assessor: EnvironmentalAssessor) {
        let embodied = assessor
            .embodied_emissions(
                &[
                    MaterialQuantity::new("cork", 50.),
                    MaterialQuantity::new("steel", 100.),
                ],
                100.,
            )
            .unwrap();

        assert_eq!(embodied.breakdown.len(), 1);
        assert_eq!(embodied.material_emissions, 275.);
        assert_eq!(embodied.exclusions.len(), 1);
        assert_eq!(embodied.exclusions[0].kind, ReferenceKind::Material);
        assert_eq!(embodied.exclusions[0].name, "cork");
    }

    #[rstest]
    fn should_reject_negative_quantity(assessor: EnvironmentalAssessor) {
        assert!(matches!(
            assessor.embodied_emissions(&[MaterialQuantity::new("steel", -1.)], 100.),
            Err(EngineError::InvalidInput { field, .. }) if field == "materials[steel].quantity"
        ));
    }

    #[rstest]
    fn should_sum_operational_emissions_over_years(assessor: EnvironmentalAssessor) {
        let operational = assessor
            .operational_emissions(&mix(&[("natural_gas", 10000.), ("geothermal", 500.), ("peat", 10.)]), 10)
            .unwrap();

        let gas_factor = 0.202 + 0.0002 * 25. + 0.000001 * 298.;
        assert_relative_eq!(operational.annual, 10000. * gas_factor, max_relative = 1e-12);
        assert_relative_eq!(operational.total, 100000. * gas_factor, max_relative = 1e-12);
        assert_eq!(
            operational
                .exclusions
                .iter()
                .map(|note| note.name.as_str())
                .collect::<Vec<_>>(),
            vec!["geothermal", "peat"]
        );
    }

    #[rstest]
    fn should_merge_aliased_tags_into_one_source(assessor: EnvironmentalAssessor) {
        let operational = assessor
            .operational_emissions(&mix(&[("gas", 1000.), ("natural_gas", 500.)]), 1)
            .unwrap();
        assert_eq!(operational.breakdown.len(), 1);
        assert_eq!(operational.breakdown[&EnergySource::NaturalGas].consumption, 1500.);
    }

    #[rstest]
    fn should_compute_end_of_life_net_of_recycling(assessor: EnvironmentalAssessor) {
        let end_of_life = assessor
            .end_of_life_emissions(&[MaterialQuantity::new("steel", 100.)])
            .unwrap();
        assert_relative_eq!(end_of_life.demolition, 13.75, max_relative = 1e-12);
        assert_relative_eq!(end_of_life.recycling_credit, 24.75, max_relative = 1e-12);
        assert_relative_eq!(end_of_life.net, -11., max_relative = 1e-12);
    }

    #[rstest]
    fn should_report_zero_reduction_without_current_emissions(assessor: EnvironmentalAssessor) {
        let reduction = assessor
            .operational_reduction(&mix(&[]), &mix(&[("solar_pv", 100.)]), 50.)
            .unwrap();
        assert_eq!(reduction.reduction_percentage, 0.);
        assert!(reduction.annual_savings < 0.);
    }

    #[rstest]
    fn should_assess_renovation_project(assessor: EnvironmentalAssessor, project: RenovationProject) {
        let assessment = assessor.assess_renovation(&project).unwrap();

        let operational = &assessment.operational;
        assert_relative_eq!(
            operational.annual_savings,
            operational.breakdown.values().map(|entry| entry.emissions_savings).sum::<f64>(),
            max_relative = 1e-12
        );
        assert!(operational.reduction_percentage > 0. && operational.reduction_percentage < 100.);
        assert_eq!(assessment.lifecycle.yearly.len(), 30);
        // 36.4 kg/m2 before and 20.5 kg/m2 after
        assert_eq!(assessment.benchmark.current_rating, PerformanceRating::Average);
        assert_eq!(assessment.benchmark.projected_rating, PerformanceRating::Good);
        assert_eq!(assessment.emission_factor_version, "SK-2023");
        assert_relative_eq!(
            assessment.environmental_payback.years().unwrap(),
            assessment.embodied.total / operational.annual_savings,
            max_relative = 1e-12
        );
        assert!(assessment.exclusions.is_empty());
    }

    #[rstest]
    fn should_collect_exclusions_once_per_item(
        assessor: EnvironmentalAssessor,
        mut project: RenovationProject,
    ) {
        project.materials.push(MaterialQuantity::new("cork", 10.));
        project.current_energy_mix.insert("geothermal".into(), 1000.);
        project.projected_energy_mix.insert("geothermal".into(), 1000.);

        let assessment = assessor.assess_renovation(&project).unwrap();
        let excluded = assessment
            .exclusions
            .iter()
            .map(|note| note.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(excluded, vec!["geothermal", "cork"]);
    }

    #[rstest]
    fn should_reject_project_without_floor_area(
        assessor: EnvironmentalAssessor,
        mut project: RenovationProject,
    ) {
        project.heated_floor_area = 0.;
        assert!(matches!(
            assessor.assess_renovation(&project),
            Err(EngineError::InvalidInput { field, .. }) if field == "heated_floor_area"
        ));
    }

    #[rstest]
    fn should_count_replacements_up_to_renovation_cycles(assessor: EnvironmentalAssessor) {
        let lca = BuildingLca {
            heated_floor_area: 100.,
            materials: vec![
                MaterialQuantity::new("glass", 100.),
                MaterialQuantity::new("concrete", 1.),
            ],
            annual_energy_consumption: mix(&[("district_heating", 10000.)]),
            lifespan_years: 100,
            renovation_cycles: 2,
        };
        let whole_life = assessor.assess_building_lca(&lca).unwrap();

        // glass lasts 30 years, so it would need three replacements but is capped at two
        assert_relative_eq!(whole_life.replacement_emissions, 170., max_relative = 1e-12);
        assert_eq!(whole_life.operational.years, 100);
        assert_relative_eq!(
            whole_life.total,
            whole_life.embodied.total
                + whole_life.replacement_emissions
                + whole_life.operational.total
                + whole_life.end_of_life.net,
            max_relative = 1e-12
        );
        assert_relative_eq!(whole_life.per_area_per_year, whole_life.total / 100. / 100., max_relative = 1e-12);
    }
}
