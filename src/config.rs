use crate::core::demand::classification::ClassificationTable;
use crate::core::demand::factors::DemandFactors;
use crate::core::envelope::thermal_balance::ClimateData;
use crate::core::environment::benchmarks::BenchmarkTable;
use crate::core::environment::emission_factors::EmissionFactorTable;
use crate::core::environment::materials::{MaterialDatabase, DEFAULT_TRANSPORT_EMISSION_FACTOR};
use crate::core::finance::cash_flow::FinancialParameters;
use crate::core::finance::energy_prices::EnergyPrices;
use crate::core::monitoring::economics::MeasurementPrices;
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

/// Everything the engine needs besides the buildings themselves.
///
/// Reference tables are optional so that a request can supply its own. A table left
/// empty is an error when the engine is built, unless
/// [`EngineConfig::fill_reference_defaults`] has been called first.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub climate: ClimateData,
    pub finance: FinancialParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_factors: Option<DemandFactors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emission_factors: Option<EmissionFactorTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<MaterialDatabase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<BenchmarkTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_prices: Option<EnergyPrices>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_prices: Option<MeasurementPrices>,
    /// kg CO2 per tonne-km of material transport.
    pub transport_emission_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            climate: Default::default(),
            finance: Default::default(),
            demand_factors: None,
            classification: None,
            emission_factors: None,
            materials: None,
            benchmarks: None,
            energy_prices: None,
            measurement_prices: None,
            transport_emission_factor: DEFAULT_TRANSPORT_EMISSION_FACTOR,
        }
    }
}

impl EngineConfig {
    /// Default configuration with every reference table populated.
    pub fn with_reference_data() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.fill_reference_defaults()?;
        Ok(config)
    }

    /// Populate any table not already given with the built-in reference data.
    pub fn fill_reference_defaults(&mut self) -> anyhow::Result<()> {
        self.demand_factors.get_or_insert_with(Default::default);
        self.classification.get_or_insert_with(Default::default);
        self.benchmarks.get_or_insert_with(Default::default);
        self.energy_prices.get_or_insert_with(Default::default);
        self.measurement_prices.get_or_insert_with(Default::default);
        if self.emission_factors.is_none() {
            self.emission_factors = Some(EmissionFactorTable::slovak_2023()?);
        }
        if self.materials.is_none() {
            self.materials = Some(MaterialDatabase::embedded()?);
        }

        Ok(())
    }
}

pub(crate) fn required<T>(table: Option<T>, name: &str) -> Result<T, EngineError> {
    table.ok_or_else(|| EngineError::missing_configuration(format!("{name} table")))
}
