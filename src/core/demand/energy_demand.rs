use crate::core::building::BuildingProfile;
use crate::core::demand::classification::{ClassificationTable, EnergyClassification};
use crate::core::demand::factors::DemandFactors;
use crate::core::demand::hot_water::{hot_water_demand, HotWaterDemand};
use crate::core::energy_source::EnergySource;
use crate::core::envelope::thermal_balance::ThermalBalanceResult;
use crate::errors::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DemandResult {
    pub net_heating_demand: f64, // kWh/yr
    pub hot_water: HotWaterDemand,
    /// Fuel delivered to the heating system for space heating and hot water, in kWh/yr.
    pub heating_energy: f64,
    /// Auxiliary and household electricity, in kWh/yr.
    pub electricity: f64,
    /// Delivered energy by carrier, in kWh/yr.
    pub delivered_energy: IndexMap<EnergySource, f64>,
    pub primary_energy: f64, // kWh/yr
    pub co2_emissions: f64,  // kg/yr
    pub classification: EnergyClassification,
}

impl DemandResult {
    pub fn total_delivered_energy(&self) -> f64 {
        self.delivered_energy.values().sum()
    }
}

/// Turns a thermal balance into delivered and primary energy, and grades the result.
#[derive(Clone, Debug)]
pub struct DemandEngine {
    factors: DemandFactors,
    classification: ClassificationTable,
}

impl DemandEngine {
    pub fn new(
        factors: DemandFactors,
        classification: ClassificationTable,
    ) -> Result<Self, EngineError> {
        factors.validate()?;
        classification.validate()?;
        Ok(Self {
            factors,
            classification,
        })
    }

    pub fn factors(&self) -> &DemandFactors {
        &self.factors
    }

    /// Grade a building by its specific primary energy.
    pub fn classify(
        &self,
        specific_primary_energy: f64,
        co2_intensity: f64,
    ) -> Result<EnergyClassification, EngineError> {
        let energy_class = self.classification.classify(specific_primary_energy)?;

        Ok(EnergyClassification {
            specific_primary_energy,
            energy_class,
            description: energy_class.description().to_string(),
            class_upper_bound: self.classification.upper_bound(energy_class),
            co2_intensity,
        })
    }

    pub fn compute_demand(
        &self,
        profile: &BuildingProfile,
        balance: &ThermalBalanceResult,
    ) -> Result<DemandResult, EngineError> {
        let floor_area = profile.heated_floor_area;
        if !(floor_area.is_finite() && floor_area > 0.) {
            return Err(EngineError::invalid_input(
                "heated_floor_area",
                format!("must be greater than zero, got {floor_area}"),
            ));
        }

        let heating_system = &profile.heating_system;
        let hot_water = hot_water_demand(profile);
        let heating_energy = balance.net_heating_demand / heating_system.efficiency
            + hot_water.energy_demand / heating_system.hot_water_efficiency();
        let electricity =
            profile.specific_electricity_demand * floor_area + balance.ventilation.fan_energy;

        let mut delivered_energy = IndexMap::new();
        *delivered_energy.entry(heating_system.carrier).or_insert(0.) += heating_energy;
        *delivered_energy
            .entry(EnergySource::ElectricityGrid)
            .or_insert(0.) += electricity;

        let primary_energy =
            self.factors
                .primary_energy(heating_system.system_type, heating_energy, electricity)?;
        let co2_emissions =
            self.factors
                .co2_emissions(heating_system.system_type, heating_energy, electricity)?;
        let classification =
            self.classify(primary_energy / floor_area, co2_emissions / floor_area)?;
        debug!(
            primary_energy,
            energy_class = %classification.energy_class,
            "energy demand classified"
        );

        Ok(DemandResult {
            net_heating_demand: balance.net_heating_demand,
            hot_water,
            heating_energy,
            electricity,
            delivered_energy,
            primary_energy,
            co2_emissions,
            classification,
        })
    }
}
