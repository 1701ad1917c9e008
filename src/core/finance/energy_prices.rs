use crate::core::energy_source::EnergySource;
use crate::errors::{EngineError, ExclusionNote, ReferenceKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Price of delivered energy per carrier, in currency per kWh.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnergyPrices(IndexMap<EnergySource, f64>);

impl Default for EnergyPrices {
    fn default() -> Self {
        Self(IndexMap::from([
            (EnergySource::ElectricityGrid, 0.15),
            (EnergySource::NaturalGas, 0.08),
            (EnergySource::HeatingOil, 0.10),
            (EnergySource::Biomass, 0.06),
            (EnergySource::DistrictHeating, 0.10),
            (EnergySource::SolarPv, 0.),
            (EnergySource::HeatPump, 0.15),
            (EnergySource::Geothermal, 0.10),
        ]))
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EnergyCost {
    pub total: f64,
    pub by_carrier: IndexMap<EnergySource, f64>,
    pub exclusions: Vec<ExclusionNote>,
}

impl EnergyPrices {
    pub fn new(prices: IndexMap<EnergySource, f64>) -> Result<Self, EngineError> {
        let prices = Self(prices);
        prices.validate()?;
        Ok(prices)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (source, price) in &self.0 {
            if !(price.is_finite() && *price >= 0.) {
                return Err(EngineError::invalid_input(
                    format!("energy_prices[{source}]"),
                    format!("must not be negative, got {price}"),
                ));
            }
        }
        Ok(())
    }

    pub fn price(&self, source: EnergySource) -> Result<f64, EngineError> {
        self.0
            .get(&source)
            .copied()
            .ok_or_else(|| EngineError::missing_reference(ReferenceKind::EnergyPrice, source.to_string()))
    }

    /// Yearly running cost of delivered energy. Carriers without a price are left out.
    pub fn annual_cost(&self, delivered_energy: &IndexMap<EnergySource, f64>) -> EnergyCost {
        let mut by_carrier = IndexMap::new();
        let mut exclusions = vec![];
        for (source, energy) in delivered_energy {
            match self.price(*source) {
                Ok(price) => {
                    by_carrier.insert(*source, energy * price);
                }
                Err(error) => {
                    warn!(%source, "no price for delivered energy");
                    exclusions.extend(ExclusionNote::from_error(&error));
                }
            }
        }

        EnergyCost {
            total: by_carrier.values().sum(),
            by_carrier,
            exclusions,
        }
    }
}
