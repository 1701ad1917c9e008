use crate::core::energy_source::EnergySource;
use crate::core::units::Percentage;
use crate::errors::{EngineError, ReferenceKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Cursor, Read};

/// Global warming potentials over 100 years, relative to CO2.
pub const METHANE_GWP_100: f64 = 25.;
pub const NITROUS_OXIDE_GWP_100: f64 = 298.;

pub const SLOVAK_2023_VERSION: &str = "SK-2023";
const SLOVAK_2023_FACTORS: &str = include_str!("emission_factors_sk_2023.csv");

/// Emissions per kWh of delivered energy for one carrier.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmissionFactor {
    /// kg CO2/kWh
    pub co2_factor: f64,
    /// kg CH4/kWh
    pub ch4_factor: f64,
    /// kg N2O/kWh
    pub n2o_factor: f64,
    pub primary_energy_factor: f64,
    pub renewable_share: Percentage,
}

impl EmissionFactor {
    /// kg CO2e/kWh
    pub fn co2_equivalent(&self) -> f64 {
        self.co2_factor + self.ch4_factor * METHANE_GWP_100 + self.n2o_factor * NITROUS_OXIDE_GWP_100
    }

    fn validate(&self, source: EnergySource) -> Result<(), EngineError> {
        for (attribute, value) in [
            ("co2_factor", self.co2_factor),
            ("ch4_factor", self.ch4_factor),
            ("n2o_factor", self.n2o_factor),
            ("primary_energy_factor", self.primary_energy_factor),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return Err(EngineError::invalid_input(
                    format!("emission_factors.factors[{source}].{attribute}"),
                    format!("must not be negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct EmissionFactorRow {
    energy_source: EnergySource,
    co2_factor: f64,
    ch4_factor: f64,
    n2o_factor: f64,
    primary_energy_factor: f64,
    renewable_share: Percentage,
}

/// A versioned set of emission factors, keyed by energy carrier.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmissionFactorTable {
    /// Version or region label, e.g. "SK-2023".
    pub version: String,
    pub factors: IndexMap<EnergySource, EmissionFactor>,
}

impl EmissionFactorTable {
    pub fn from_csv(version: impl Into<String>, csv: impl Read) -> anyhow::Result<Self> {
        let factors = csv::Reader::from_reader(csv)
            .deserialize::<EmissionFactorRow>()
            .map(|row| {
                row.map(|row| {
                    (
                        row.energy_source,
                        EmissionFactor {
                            co2_factor: row.co2_factor,
                            ch4_factor: row.ch4_factor,
                            n2o_factor: row.n2o_factor,
                            primary_energy_factor: row.primary_energy_factor,
                            renewable_share: row.renewable_share,
                        },
                    )
                })
            })
            .collect::<Result<_, _>>()?;
        let table = Self {
            version: version.into(),
            factors,
        };
        table.validate()?;

        Ok(table)
    }

    /// Slovak national factors for 2023. Geothermal heat is not covered.
    pub fn slovak_2023() -> anyhow::Result<Self> {
        Self::from_csv(
            SLOVAK_2023_VERSION,
            BufReader::new(Cursor::new(SLOVAK_2023_FACTORS)),
        )
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.factors.is_empty() {
            return Err(EngineError::missing_configuration(format!(
                "emission factor table '{}' has no entries",
                self.version
            )));
        }
        for (source, factor) in &self.factors {
            factor.validate(*source)?;
        }
        Ok(())
    }

    pub fn factor(&self, source: EnergySource) -> Result<&EmissionFactor, EngineError> {
        self.factors
            .get(&source)
            .ok_or_else(|| EngineError::missing_reference(ReferenceKind::EnergySource, source.to_string()))
    }

    /// Resolve a free-text energy source tag against the table.
    pub fn lookup(&self, tag: &str) -> Result<(EnergySource, &EmissionFactor), EngineError> {
        let source = tag.parse::<EnergySource>()?;
        Ok((source, self.factor(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn table() -> EmissionFactorTable {
        EmissionFactorTable::slovak_2023().unwrap()
    }

    #[rstest]
    fn should_load_embedded_factors(table: EmissionFactorTable) {
        assert_eq!(table.version, "SK-2023");
        assert_eq!(table.factors.len(), 7);
        let grid = table.factor(EnergySource::ElectricityGrid).unwrap();
        assert_eq!(grid.primary_energy_factor, 2.3);
        assert_eq!(grid.renewable_share.percent(), 23.5);
    }

    #[rstest]
    fn should_weight_methane_and_nitrous_oxide_by_gwp(table: EmissionFactorTable) {
        let gas = table.factor(EnergySource::NaturalGas).unwrap();
        assert_relative_eq!(
            gas.co2_equivalent(),
            0.202 + 0.0002 * 25. + 0.000001 * 298.,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_report_geothermal_as_missing_reference(table: EmissionFactorTable) {
        assert_eq!(
            table.lookup("geothermal").unwrap_err(),
            EngineError::missing_reference(ReferenceKind::EnergySource, "geothermal")
        );
        assert!(matches!(
            table.lookup("coal"),
            Err(EngineError::MissingReferenceData { name, .. }) if name == "coal"
        ));
    }

    #[rstest]
    fn should_reject_negative_factor() {
        let csv = "energy_source,co2_factor,ch4_factor,n2o_factor,primary_energy_factor,renewable_share\n\
                   biomass,-0.1,0,0,1.2,100\n";
        assert!(EmissionFactorTable::from_csv("test", csv.as_bytes()).is_err());
    }

    #[rstest]
    fn should_reject_renewable_share_above_one_hundred_percent() {
        let csv = "energy_source,co2_factor,ch4_factor,n2o_factor,primary_energy_factor,renewable_share\n\
                   biomass,0.018,0,0,1.2,120\n";
        assert!(EmissionFactorTable::from_csv("test", csv.as_bytes()).is_err());
    }
}
