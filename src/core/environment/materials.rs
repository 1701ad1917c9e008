use crate::core::units::{Percentage, KILOGRAMS_PER_TONNE};
use crate::errors::{EngineError, ReferenceKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Cursor, Read};
use strum_macros::Display;

/// kg CO2e per tonne-kilometre of road freight.
pub const DEFAULT_TRANSPORT_EMISSION_FACTOR: f64 = 0.062;

const DEMOLITION_SHARE: f64 = 0.05;
const RECYCLING_CREDIT_SHARE: f64 = 0.1;

const DEFAULT_MATERIALS: &str = include_str!("materials.csv");

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum MaterialUnit {
    #[serde(rename = "kg")]
    #[strum(serialize = "kg")]
    Kilogram,
    #[serde(rename = "m2")]
    #[strum(serialize = "m2")]
    SquareMetre,
    #[serde(rename = "m3")]
    #[strum(serialize = "m3")]
    CubicMetre,
    #[serde(rename = "piece")]
    #[strum(serialize = "piece")]
    Piece,
}

/// Environmental profile of a construction material, per declared unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialImpact {
    pub name: String,
    pub unit: MaterialUnit,
    /// kg CO2e per unit, negative for materials that store carbon
    pub embodied_carbon: f64,
    /// MJ per unit
    pub embodied_energy: f64,
    pub recyclability: Percentage,
    pub lifespan_years: u32,
    /// km from producer to site
    pub transport_distance: f64,
}

impl MaterialImpact {
    pub fn embodied_emissions(&self, quantity: f64) -> f64 {
        self.embodied_carbon * quantity
    }

    pub fn embodied_energy_for(&self, quantity: f64) -> f64 {
        self.embodied_energy * quantity
    }

    /// Freight emissions, treating the quantity as kilograms for the tonnage.
    pub fn transport_emissions(&self, quantity: f64, transport_emission_factor: f64) -> f64 {
        quantity * (quantity / KILOGRAMS_PER_TONNE as f64)
            * self.transport_distance
            * transport_emission_factor
    }

    pub fn demolition_emissions(&self, quantity: f64) -> f64 {
        self.embodied_emissions(quantity) * DEMOLITION_SHARE
    }

    pub fn recycling_credit(&self, quantity: f64) -> f64 {
        quantity * self.recyclability.fraction() * self.embodied_carbon * RECYCLING_CREDIT_SHARE
    }

    fn validate(&self, key: &str) -> Result<(), EngineError> {
        if !self.embodied_carbon.is_finite() {
            return Err(EngineError::invalid_input(
                format!("materials[{key}].embodied_carbon"),
                "must be a finite number",
            ));
        }
        for (attribute, value) in [
            ("embodied_energy", self.embodied_energy),
            ("transport_distance", self.transport_distance),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return Err(EngineError::invalid_input(
                    format!("materials[{key}].{attribute}"),
                    format!("must not be negative, got {value}"),
                ));
            }
        }
        if self.lifespan_years == 0 {
            return Err(EngineError::invalid_input(
                format!("materials[{key}].lifespan_years"),
                "must be at least one year",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MaterialRow {
    key: String,
    name: String,
    unit: MaterialUnit,
    embodied_carbon: f64,
    embodied_energy: f64,
    recyclability: Percentage,
    lifespan_years: u32,
    transport_distance: f64,
}

impl From<MaterialRow> for (String, MaterialImpact) {
    fn from(row: MaterialRow) -> Self {
        (
            row.key,
            MaterialImpact {
                name: row.name,
                unit: row.unit,
                embodied_carbon: row.embodied_carbon,
                embodied_energy: row.embodied_energy,
                recyclability: row.recyclability,
                lifespan_years: row.lifespan_years,
                transport_distance: row.transport_distance,
            },
        )
    }
}

/// Materials keyed by their database key, e.g. "mineral_wool".
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MaterialDatabase(IndexMap<String, MaterialImpact>);

impl MaterialDatabase {
    pub fn new(materials: IndexMap<String, MaterialImpact>) -> Result<Self, EngineError> {
        let database = Self(materials);
        database.validate()?;
        Ok(database)
    }

    pub fn from_csv(csv: impl Read) -> anyhow::Result<Self> {
        let materials = csv::Reader::from_reader(csv)
            .deserialize::<MaterialRow>()
            .map(|row| row.map(Into::into))
            .collect::<Result<_, _>>()?;

        Ok(Self::new(materials)?)
    }

    /// Generic values for common insulation and structural materials.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_csv(BufReader::new(Cursor::new(DEFAULT_MATERIALS)))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.0.is_empty() {
            return Err(EngineError::missing_configuration(
                "material database has no entries",
            ));
        }
        for (key, material) in &self.0 {
            material.validate(key)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&MaterialImpact, EngineError> {
        self.0
            .get(key)
            .ok_or_else(|| EngineError::missing_reference(ReferenceKind::Material, key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
