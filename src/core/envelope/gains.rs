use crate::core::building::BuildingProfile;
use crate::core::units::WATTS_PER_KILOWATT;

/// Occupied hours per day assumed for internal gains.
pub const OCCUPIED_HOURS_PER_DAY: f64 = 16.;
/// Days per heating season over which internal gains are counted.
pub const GAIN_DAYS_PER_SEASON: f64 = 250.;
/// Total solar energy transmittance of typical glazing.
pub const GLAZING_SOLAR_TRANSMITTANCE: f64 = 0.7;

/// Annual internal gains from occupants, lighting and appliances, in kWh.
pub fn annual_internal_gains(profile: &BuildingProfile) -> f64 {
    profile.building_type.specific_internal_gains() * profile.heated_floor_area
        * OCCUPIED_HOURS_PER_DAY
        * GAIN_DAYS_PER_SEASON
        / WATTS_PER_KILOWATT as f64
}

/// Annual solar gains through the glazing, in kWh.
///
/// Arguments:
/// * `profile` - building, whose orientation applies to all of its glazing
/// * `annual_solar_irradiation` - on a south-facing vertical surface, in kWh/m2
pub fn annual_solar_gains(profile: &BuildingProfile, annual_solar_irradiation: f64) -> f64 {
    profile.window_area()
        * annual_solar_irradiation
        * profile.orientation.solar_factor()
        * GLAZING_SOLAR_TRANSMITTANCE
}
