use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Energy-performance bands, from most to least efficient.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum EnergyClass {
    A1,
    A2,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl EnergyClass {
    pub fn description(&self) -> &'static str {
        match self {
            EnergyClass::A1 => "Extremely efficient",
            EnergyClass::A2 => "Very efficient",
            EnergyClass::B => "Efficient",
            EnergyClass::C => "Moderately efficient",
            EnergyClass::D => "Less efficient",
            EnergyClass::E => "Inefficient",
            EnergyClass::F => "Very inefficient",
            EnergyClass::G => "Extremely inefficient",
        }
    }
}

const BOUNDED_CLASSES: usize = 7;

/// Upper bounds (inclusive, kWh/m2.yr of primary energy) of classes A1 to F; anything
/// above the last bound is class G.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ClassificationTable {
    upper_bounds: [f64; BOUNDED_CLASSES],
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self {
            upper_bounds: [30., 50., 75., 100., 150., 200., 250.],
        }
    }
}

impl TryFrom<Vec<f64>> for ClassificationTable {
    type Error = EngineError;

    fn try_from(bounds: Vec<f64>) -> Result<Self, Self::Error> {
        let upper_bounds: [f64; BOUNDED_CLASSES] = bounds.try_into().map_err(|bounds: Vec<f64>| {
            EngineError::invalid_input(
                "classification",
                format!(
                    "expected {BOUNDED_CLASSES} upper bounds (A1 to F), got {}",
                    bounds.len()
                ),
            )
        })?;
        let table = Self { upper_bounds };
        table.validate()?;
        Ok(table)
    }
}

impl From<ClassificationTable> for Vec<f64> {
    fn from(table: ClassificationTable) -> Self {
        table.upper_bounds.to_vec()
    }
}

impl ClassificationTable {
    /// Bounds must be positive, finite and strictly increasing so that every value
    /// falls into exactly one band.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.upper_bounds.iter().all(|bound| bound.is_finite() && *bound > 0.) {
            return Err(EngineError::invalid_input(
                "classification",
                "upper bounds must be positive finite numbers",
            ));
        }
        if !self.upper_bounds.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(EngineError::invalid_input(
                "classification",
                "upper bounds must be strictly increasing",
            ));
        }
        Ok(())
    }

    /// Upper bound of a class, or `None` for the open-ended last class.
    pub fn upper_bound(&self, class: EnergyClass) -> Option<f64> {
        self.upper_bounds.get(class as usize).copied()
    }

    pub fn classify(&self, specific_primary_energy: f64) -> Result<EnergyClass, EngineError> {
        if specific_primary_energy.is_nan() || specific_primary_energy < 0. {
            return Err(EngineError::invalid_input(
                "specific_primary_energy",
                format!("must be a non-negative number, got {specific_primary_energy}"),
            ));
        }

        Ok(EnergyClass::iter()
            .zip(self.upper_bounds)
            .find(|(_, bound)| specific_primary_energy <= *bound)
            .map(|(class, _)| class)
            .unwrap_or(EnergyClass::G))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnergyClassification {
    pub specific_primary_energy: f64, // kWh/m2.yr
    pub energy_class: EnergyClass,
    pub description: String,
    pub class_upper_bound: Option<f64>,
    pub co2_intensity: f64, // kg CO2/m2.yr
}
