use crate::errors::{EngineError, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter};

/// Energy carriers that can be delivered to (or generated at) a building.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnergySource {
    ElectricityGrid,
    NaturalGas,
    HeatingOil,
    Biomass,
    DistrictHeating,
    SolarPv,
    HeatPump,
    Geothermal,
}

impl FromStr for EnergySource {
    type Err = EngineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag.trim().to_ascii_lowercase().as_str() {
            "electricity_grid" | "electricity" => Self::ElectricityGrid,
            "natural_gas" | "gas" => Self::NaturalGas,
            "heating_oil" => Self::HeatingOil,
            "biomass" => Self::Biomass,
            "district_heating" => Self::DistrictHeating,
            "solar_pv" => Self::SolarPv,
            "heat_pump" => Self::HeatPump,
            "geothermal" => Self::Geothermal,
            _ => return Err(EngineError::missing_reference(ReferenceKind::EnergySource, tag)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use strum::IntoEnumIterator;

    #[rstest]
    fn should_parse_every_displayed_tag_back() {
        for source in EnergySource::iter() {
            assert_eq!(source.to_string().parse::<EnergySource>().unwrap(), source);
        }
    }

    #[rstest]
    #[case("electricity", EnergySource::ElectricityGrid)]
    #[case(" Natural_Gas ", EnergySource::NaturalGas)]
    fn should_accept_aliases_and_loose_case(#[case] tag: &str, #[case] expected: EnergySource) {
        assert_eq!(tag.parse::<EnergySource>().unwrap(), expected);
    }

    #[rstest]
    fn should_reject_unknown_tag_with_reference_error() {
        assert_eq!(
            "peat".parse::<EnergySource>(),
            Err(EngineError::MissingReferenceData {
                kind: ReferenceKind::EnergySource,
                name: "peat".into()
            })
        );
    }

    #[rstest]
    fn should_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&EnergySource::DistrictHeating).unwrap(),
            "\"district_heating\""
        );
    }
}
