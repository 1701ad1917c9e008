use crate::core::building::HeatingSystemType;
use crate::errors::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Conversion factors for energy delivered by one carrier.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierFactors {
    /// kWh primary per kWh delivered
    pub primary_energy_factor: f64,
    /// kg CO2 per kWh delivered
    pub co2_emission_factor: f64,
}

impl CarrierFactors {
    pub const fn new(primary_energy_factor: f64, co2_emission_factor: f64) -> Self {
        Self {
            primary_energy_factor,
            co2_emission_factor,
        }
    }
}

/// Primary energy and CO2 factors for each heating system and for grid electricity.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DemandFactors {
    pub heating_systems: IndexMap<HeatingSystemType, CarrierFactors>,
    pub electricity: CarrierFactors,
}

impl Default for DemandFactors {
    fn default() -> Self {
        Self {
            heating_systems: IndexMap::from([
                (HeatingSystemType::GasBoiler, CarrierFactors::new(1.1, 0.202)),
                (HeatingSystemType::ElectricHeating, CarrierFactors::new(3.0, 0.486)),
                (HeatingSystemType::HeatPump, CarrierFactors::new(2.5, 0.390)),
                (HeatingSystemType::DistrictHeating, CarrierFactors::new(1.3, 0.280)),
                (HeatingSystemType::SolidFuel, CarrierFactors::new(1.2, 0.354)),
                (HeatingSystemType::SolarThermal, CarrierFactors::new(0.1, 0.020)),
                (HeatingSystemType::Combined, CarrierFactors::new(1.5, 0.300)),
            ]),
            electricity: CarrierFactors::new(3.0, 0.486),
        }
    }
}

impl DemandFactors {
    pub fn validate(&self) -> Result<(), EngineError> {
        let all_factors = self
            .heating_systems
            .iter()
            .map(|(system_type, factors)| (format!("demand_factors.heating_systems.{system_type}"), factors))
            .chain([("demand_factors.electricity".to_string(), &self.electricity)]);
        for (field, factors) in all_factors {
            if !(factors.primary_energy_factor >= 0. && factors.co2_emission_factor >= 0.) {
                return Err(EngineError::invalid_input(field, "factors must not be negative"));
            }
        }
        Ok(())
    }

    pub fn for_heating_system(
        &self,
        system_type: HeatingSystemType,
    ) -> Result<&CarrierFactors, EngineError> {
        self.heating_systems.get(&system_type).ok_or_else(|| {
            EngineError::missing_configuration(format!(
                "demand factors for heating system '{system_type}'"
            ))
        })
    }

    /// Primary energy of a building's delivered heating fuel and electricity, in kWh.
    pub fn primary_energy(
        &self,
        system_type: HeatingSystemType,
        heating_energy: f64,
        electricity: f64,
    ) -> Result<f64, EngineError> {
        let heating = self.for_heating_system(system_type)?;
        Ok(heating_energy * heating.primary_energy_factor
            + electricity * self.electricity.primary_energy_factor)
    }

    /// CO2 emitted for a building's delivered heating fuel and electricity, in kg.
    pub fn co2_emissions(
        &self,
        system_type: HeatingSystemType,
        heating_energy: f64,
        electricity: f64,
    ) -> Result<f64, EngineError> {
        let heating = self.for_heating_system(system_type)?;
        Ok(heating_energy * heating.co2_emission_factor
            + electricity * self.electricity.co2_emission_factor)
    }
}
