use crate::compare_floats::guarded_ratio;
use crate::core::building::BuildingType;
use crate::errors::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BenchmarkCategory {
    Residential,
    Office,
    School,
}

impl From<BuildingType> for BenchmarkCategory {
    fn from(building_type: BuildingType) -> Self {
        match building_type {
            BuildingType::Office | BuildingType::Retail => Self::Office,
            BuildingType::School => Self::School,
            BuildingType::FamilyHouse
            | BuildingType::ApartmentBuilding
            | BuildingType::Hospital
            | BuildingType::Industrial
            | BuildingType::Other => Self::Residential,
        }
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PerformanceRating {
    Excellent,
    Good,
    Average,
    Poor,
    NonCompliant,
}

/// Upper bounds of each rating, in kg CO2e/m2 per year.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkThresholds {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub poor: f64,
}

impl BenchmarkThresholds {
    pub const fn new(excellent: f64, good: f64, average: f64, poor: f64) -> Self {
        Self {
            excellent,
            good,
            average,
            poor,
        }
    }

    fn validate(&self, category: BenchmarkCategory) -> Result<(), EngineError> {
        let bounds = [self.excellent, self.good, self.average, self.poor];
        if bounds.iter().any(|bound| !(bound.is_finite() && *bound > 0.))
            || bounds.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Err(EngineError::invalid_input(
                format!("benchmarks.{category}"),
                format!("thresholds must be positive and strictly increasing, got {bounds:?}"),
            ));
        }
        Ok(())
    }

    pub fn rate(&self, intensity: f64) -> PerformanceRating {
        if intensity <= self.excellent {
            PerformanceRating::Excellent
        } else if intensity <= self.good {
            PerformanceRating::Good
        } else if intensity <= self.average {
            PerformanceRating::Average
        } else if intensity <= self.poor {
            PerformanceRating::Poor
        } else {
            PerformanceRating::NonCompliant
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BenchmarkTable(IndexMap<BenchmarkCategory, BenchmarkThresholds>);

impl Default for BenchmarkTable {
    fn default() -> Self {
        Self(IndexMap::from([
            (
                BenchmarkCategory::Residential,
                BenchmarkThresholds::new(15., 25., 45., 65.),
            ),
            (
                BenchmarkCategory::Office,
                BenchmarkThresholds::new(20., 35., 55., 80.),
            ),
            (
                BenchmarkCategory::School,
                BenchmarkThresholds::new(18., 30., 50., 75.),
            ),
        ]))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BenchmarkComparison {
    pub category: BenchmarkCategory,
    pub thresholds: BenchmarkThresholds,
    /// kg CO2e/m2 per year
    pub current_intensity: f64,
    pub projected_intensity: f64,
    pub current_rating: PerformanceRating,
    pub projected_rating: PerformanceRating,
    pub improvement: f64,
    /// Undefined when the current intensity is zero.
    pub improvement_percentage: Option<f64>,
}

impl BenchmarkTable {
    pub fn new(thresholds: IndexMap<BenchmarkCategory, BenchmarkThresholds>) -> Result<Self, EngineError> {
        let table = Self(thresholds);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (category, thresholds) in &self.0 {
            thresholds.validate(*category)?;
        }
        Ok(())
    }

    pub fn thresholds(&self, category: BenchmarkCategory) -> Result<&BenchmarkThresholds, EngineError> {
        self.0.get(&category).ok_or_else(|| {
            EngineError::missing_configuration(format!("benchmark thresholds for '{category}'"))
        })
    }

    pub fn compare(
        &self,
        current_intensity: f64,
        projected_intensity: f64,
        building_type: BuildingType,
    ) -> Result<BenchmarkComparison, EngineError> {
        let category = BenchmarkCategory::from(building_type);
        let thresholds = self.thresholds(category)?;
        let improvement = current_intensity - projected_intensity;

        Ok(BenchmarkComparison {
            category,
            thresholds: thresholds.clone(),
            current_intensity,
            projected_intensity,
            current_rating: thresholds.rate(current_intensity),
            projected_rating: thresholds.rate(projected_intensity),
            improvement,
            improvement_percentage: guarded_ratio(improvement, current_intensity)
                .map(|ratio| ratio * 100.),
        })
    }
}
