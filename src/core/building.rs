use crate::core::energy_source::EnergySource;
use crate::core::envelope::building_element::EnvelopeElement;
use crate::core::envelope::ventilation::VentilationSystem;
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter};

pub const DEFAULT_STOREY_HEIGHT: f64 = 2.7; // m
pub const DEFAULT_SPECIFIC_ELECTRICITY_DEMAND: f64 = 15.; // kWh/m2.yr

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BuildingType {
    FamilyHouse,
    ApartmentBuilding,
    Office,
    School,
    Hospital,
    Retail,
    Industrial,
    Other,
}

impl BuildingType {
    /// Average internal heat gains from occupants, lighting and appliances, in W/m2.
    pub fn specific_internal_gains(&self) -> f64 {
        match self {
            BuildingType::FamilyHouse => 4.0,
            BuildingType::ApartmentBuilding => 3.5,
            BuildingType::Office => 6.0,
            BuildingType::School => 5.0,
            BuildingType::Hospital => 8.0,
            BuildingType::Retail => 10.0,
            BuildingType::Industrial => 12.0,
            BuildingType::Other => 4.0,
        }
    }

    /// Hot water drawn per m2 of heated floor area, in litres per year.
    pub fn specific_hot_water_consumption(&self) -> f64 {
        match self {
            BuildingType::FamilyHouse => 35.,
            BuildingType::ApartmentBuilding => 30.,
            BuildingType::Office => 10.,
            BuildingType::School => 5.,
            BuildingType::Hospital => 50.,
            BuildingType::Retail => 8.,
            BuildingType::Industrial => 15.,
            BuildingType::Other => 35.,
        }
    }
}

impl FromStr for BuildingType {
    type Err = EngineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag.trim().to_ascii_lowercase().as_str() {
            "family_house" | "residential" => Self::FamilyHouse,
            "apartment_building" | "apartment" => Self::ApartmentBuilding,
            "office" => Self::Office,
            "school" => Self::School,
            "hospital" => Self::Hospital,
            "retail" => Self::Retail,
            "industrial" => Self::Industrial,
            "other" => Self::Other,
            _ => {
                return Err(EngineError::invalid_input(
                    "building_type",
                    format!("unknown building type '{tag}'"),
                ))
            }
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HeatingSystemType {
    GasBoiler,
    ElectricHeating,
    HeatPump,
    DistrictHeating,
    SolidFuel,
    SolarThermal,
    Combined,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HeatingSystem {
    pub system_type: HeatingSystemType,
    /// Carrier the system consumes, used for emissions and energy costs.
    pub carrier: EnergySource,
    pub efficiency: f64,
    #[serde(default)]
    pub hot_water_efficiency: Option<f64>,
}

impl HeatingSystem {
    pub fn hot_water_efficiency(&self) -> f64 {
        self.hot_water_efficiency.unwrap_or(self.efficiency)
    }

    fn validate(&self) -> Result<(), EngineError> {
        validate_efficiency("heating_system.efficiency", self.efficiency)?;
        if let Some(efficiency) = self.hot_water_efficiency {
            validate_efficiency("heating_system.hot_water_efficiency", efficiency)?;
        }
        Ok(())
    }
}

fn validate_efficiency(field: &str, efficiency: f64) -> Result<(), EngineError> {
    if !(efficiency > 0. && efficiency <= 1.) {
        return Err(EngineError::invalid_input(
            field,
            format!("efficiency must be in (0, 1], got {efficiency}"),
        ));
    }
    Ok(())
}

/// Compass orientation of the main glazed facade.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    North,
    NorthEast,
    East,
    SouthEast,
    #[default]
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Orientation {
    /// Share of the south-facing annual irradiation received by this orientation.
    pub fn solar_factor(&self) -> f64 {
        match self {
            Orientation::South => 1.0,
            Orientation::SouthEast | Orientation::SouthWest => 0.9,
            Orientation::East | Orientation::West => 0.7,
            Orientation::NorthEast | Orientation::NorthWest => 0.5,
            Orientation::North => 0.3,
        }
    }
}

/// Whole-building description consumed by the envelope and demand models.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub heated_floor_area: f64,
    pub construction_year: u32,
    pub building_type: BuildingType,
    /// Heated volume in m3; derived from floor area and storey height if absent.
    #[serde(default)]
    pub heated_volume: Option<f64>,
    pub elements: Vec<EnvelopeElement>,
    pub heating_system: HeatingSystem,
    #[serde(default)]
    pub ventilation: Option<VentilationSystem>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub occupants: Option<u32>,
    #[serde(default = "default_specific_electricity_demand")]
    pub specific_electricity_demand: f64,
}

fn default_specific_electricity_demand() -> f64 {
    DEFAULT_SPECIFIC_ELECTRICITY_DEMAND
}

impl BuildingProfile {
    pub fn heated_volume(&self) -> f64 {
        self.heated_volume
            .unwrap_or(self.heated_floor_area * DEFAULT_STOREY_HEIGHT)
    }

    pub fn total_envelope_area(&self) -> f64 {
        self.elements.iter().map(|element| element.area).sum()
    }

    pub fn window_area(&self) -> f64 {
        self.elements
            .iter()
            .filter(|element| element.kind.is_glazed())
            .map(|element| element.area)
            .sum()
    }

    /// Check the structural invariants, naming the first violated field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.heated_floor_area.is_finite() && self.heated_floor_area > 0.) {
            return Err(EngineError::invalid_input(
                "heated_floor_area",
                format!("must be greater than zero, got {}", self.heated_floor_area),
            ));
        }
        if let Some(volume) = self.heated_volume {
            if !(volume.is_finite() && volume > 0.) {
                return Err(EngineError::invalid_input(
                    "heated_volume",
                    format!("must be greater than zero, got {volume}"),
                ));
            }
        }
        if !(self.specific_electricity_demand >= 0.) {
            return Err(EngineError::invalid_input(
                "specific_electricity_demand",
                "must not be negative",
            ));
        }
        for element in &self.elements {
            element.validate()?;
        }
        self.heating_system.validate()?;
        if let Some(ventilation) = &self.ventilation {
            ventilation.validate()?;
        }

        Ok(())
    }
}
