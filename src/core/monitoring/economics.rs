use crate::compare_floats::guarded_ratio;
use crate::core::monitoring::measurement::MeasurementType;
use crate::errors::{EngineError, ExclusionNote, ReferenceKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Unit price of saved energy per measurement type, in currency per kWh.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MeasurementPrices(IndexMap<MeasurementType, f64>);

impl Default for MeasurementPrices {
    fn default() -> Self {
        Self(IndexMap::from([
            (MeasurementType::Electricity, 0.15),
            (MeasurementType::Gas, 0.08),
            (MeasurementType::Heating, 0.10),
            (MeasurementType::HotWater, 0.12),
            (MeasurementType::Cooling, 0.18),
            (MeasurementType::TotalEnergy, 0.10),
        ]))
    }
}

impl MeasurementPrices {
    pub fn new(prices: IndexMap<MeasurementType, f64>) -> Result<Self, EngineError> {
        let prices = Self(prices);
        prices.validate()?;
        Ok(prices)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (measurement_type, price) in &self.0 {
            if !(price.is_finite() && *price >= 0.) {
                return Err(EngineError::invalid_input(
                    format!("measurement_prices[{measurement_type}]"),
                    format!("must not be negative, got {price}"),
                ));
            }
        }
        Ok(())
    }

    pub fn price(&self, measurement_type: MeasurementType) -> Result<f64, EngineError> {
        self.0.get(&measurement_type).copied().ok_or_else(|| {
            EngineError::missing_reference(ReferenceKind::MeasurementPrice, measurement_type.to_string())
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CostSavings {
    pub energy_savings: f64,
    pub unit_price: f64,
    pub cost_savings: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EconomicPerformance {
    pub total_cost_savings: f64,
    pub by_type: IndexMap<MeasurementType, CostSavings>,
    /// Money saved per kWh saved; undefined when no energy was saved overall.
    pub average_unit_value: Option<f64>,
    pub exclusions: Vec<ExclusionNote>,
}

/// Price measured savings. Types without a price are left out with a note.
pub fn economic_performance(
    savings: impl IntoIterator<Item = (MeasurementType, f64)>,
    prices: &MeasurementPrices,
) -> EconomicPerformance {
    let mut by_type = IndexMap::new();
    let mut exclusions = vec![];
    for (measurement_type, energy_savings) in savings {
        match prices.price(measurement_type) {
            Ok(unit_price) => {
                by_type.insert(
                    measurement_type,
                    CostSavings {
                        energy_savings,
                        unit_price,
                        cost_savings: energy_savings * unit_price,
                    },
                );
            }
            Err(error) => {
                warn!(%measurement_type, "no unit price for measured savings");
                exclusions.extend(ExclusionNote::from_error(&error));
            }
        }
    }

    let total_cost_savings = by_type.values().map(|entry| entry.cost_savings).sum::<f64>();
    let total_energy_savings = by_type.values().map(|entry| entry.energy_savings).sum::<f64>();
    EconomicPerformance {
        total_cost_savings,
        average_unit_value: guarded_ratio(total_cost_savings, total_energy_savings),
        by_type,
        exclusions,
    }
}
