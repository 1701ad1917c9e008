use crate::core::building::BuildingProfile;
use crate::core::material_properties::WATER;
use crate::core::units::DAYS_PER_YEAR;
use serde::{Deserialize, Serialize};

pub const LITRES_PER_OCCUPANT_PER_DAY: f64 = 40.;
pub const COLD_WATER_TEMPERATURE: f64 = 10.; // deg C
pub const HOT_WATER_TEMPERATURE: f64 = 45.; // deg C

const LITRES_PER_M3: f64 = 1000.;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HotWaterDemand {
    pub daily_consumption: f64,  // litres
    pub annual_consumption: f64, // litres
    pub temperature_rise: f64,   // K
    pub energy_demand: f64,      // kWh/yr
    pub specific_energy_demand: f64, // kWh/m2.yr
}

/// Domestic hot water need of a building, from its occupancy where known and
/// from its floor area otherwise.
pub fn hot_water_demand(profile: &BuildingProfile) -> HotWaterDemand {
    let annual_consumption = match profile.occupants {
        Some(occupants) if occupants > 0 => {
            occupants as f64 * LITRES_PER_OCCUPANT_PER_DAY * DAYS_PER_YEAR as f64
        }
        _ => profile.heated_floor_area * profile.building_type.specific_hot_water_consumption(),
    };
    let temperature_rise = HOT_WATER_TEMPERATURE - COLD_WATER_TEMPERATURE;
    let energy_demand = WATER.energy_to_heat_kwh(annual_consumption / LITRES_PER_M3, temperature_rise);

    HotWaterDemand {
        daily_consumption: annual_consumption / DAYS_PER_YEAR as f64,
        annual_consumption,
        temperature_rise,
        energy_demand,
        specific_energy_demand: energy_demand / profile.heated_floor_area,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::building::tests::family_house;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_use_floor_area_without_occupancy() {
        let demand = hot_water_demand(&family_house());

        // 120 m2 x 35 l/m2
        assert_eq!(demand.annual_consumption, 4200.);
        assert_eq!(demand.temperature_rise, 35.);
        assert_relative_eq!(demand.energy_demand, 170.9283333, max_relative = 1e-8);
    }

    #[rstest]
    fn should_use_occupancy_when_known() {
        let mut profile = family_house();
        profile.occupants = Some(4);
        let demand = hot_water_demand(&profile);

        assert_eq!(demand.daily_consumption, 160.);
        assert_eq!(demand.annual_consumption, 58400.);
        assert_relative_eq!(demand.energy_demand, 2376.7177778, max_relative = 1e-8);
    }
}
