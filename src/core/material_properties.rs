use crate::core::units::{JOULES_PER_KILOWATT_HOUR, SECONDS_PER_HOUR};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Physical properties of the fluids that carry heat out of (air) or into (water) a building.

#[derive(Clone, Copy, Debug)]
pub struct FluidProperties {
    density: f64,                // kg/m3
    specific_heat_capacity: f64, // J/(kg.K)
}

impl FluidProperties {
    pub fn new(density: f64, specific_heat_capacity: f64) -> Self {
        Self {
            density,
            specific_heat_capacity,
        }
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn specific_heat_capacity(&self) -> f64 {
        self.specific_heat_capacity
    }

    /// Volumetric heat capacity in J/(m3.K)
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.density * self.specific_heat_capacity
    }

    /// Heat-loss coefficient (W/K) of a volume flow of this fluid.
    ///
    /// Arguments:
    /// * `flow_rate` - volume flow, in m3/h
    pub fn heat_loss_coefficient_for_flow(&self, flow_rate: f64) -> f64 {
        flow_rate * self.volumetric_heat_capacity() / SECONDS_PER_HOUR as f64
    }

    /// Energy (kWh) needed to raise a volume of this fluid by a temperature difference.
    ///
    /// Arguments:
    /// * `volume` - in m3
    /// * `temperature_rise` - in K
    pub fn energy_to_heat_kwh(&self, volume: f64, temperature_rise: f64) -> f64 {
        volume * self.volumetric_heat_capacity() * temperature_rise
            / JOULES_PER_KILOWATT_HOUR as f64
    }
}

pub static AIR: LazyLock<FluidProperties> = LazyLock::new(|| FluidProperties::new(1.2, 1000.0));
pub static WATER: LazyLock<FluidProperties> =
    LazyLock::new(|| FluidProperties::new(1000.0, 4186.0));

/// Hygrothermal properties of a building material as used in a construction layer.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct LayerProperties {
    pub conductivity: f64,  // W/(m.K)
    pub density: f64,       // kg/m3
    pub specific_heat: f64, // J/(kg.K)
    /// Water vapour diffusion resistance factor (mu), dimensionless.
    pub vapour_resistance_factor: f64,
}

impl LayerProperties {
    pub const fn new(
        conductivity: f64,
        density: f64,
        specific_heat: f64,
        vapour_resistance_factor: f64,
    ) -> Self {
        Self {
            conductivity,
            density,
            specific_heat,
            vapour_resistance_factor,
        }
    }

    /// Heat stored per m3 and K, in J/(m3.K).
    pub fn volumetric_heat_capacity(&self) -> f64 {
        self.density * self.specific_heat
    }
}

/// Design values for common wall, roof and floor materials.
pub static LAYER_MATERIALS: LazyLock<IndexMap<&'static str, LayerProperties>> =
    LazyLock::new(|| {
        IndexMap::from([
            ("brick_solid", LayerProperties::new(0.8, 1800., 850., 8.)),
            ("brick_hollow", LayerProperties::new(0.45, 1200., 850., 8.)),
            ("concrete_block", LayerProperties::new(1.0, 1600., 850., 12.)),
            ("aac_block", LayerProperties::new(0.15, 500., 850., 5.)),
            ("EPS_insulation", LayerProperties::new(0.035, 15., 1270., 40.)),
            ("XPS_insulation", LayerProperties::new(0.032, 35., 1270., 100.)),
            ("mineral_wool", LayerProperties::new(0.040, 100., 850., 1.)),
            ("PUR_foam", LayerProperties::new(0.025, 40., 1400., 50.)),
            ("cement_plaster", LayerProperties::new(0.8, 1900., 850., 15.)),
            ("lime_plaster", LayerProperties::new(0.7, 1600., 850., 8.)),
            ("gypsum_plaster", LayerProperties::new(0.4, 1200., 850., 4.)),
            ("concrete", LayerProperties::new(1.6, 2400., 850., 80.)),
            ("reinforced_concrete", LayerProperties::new(2.3, 2500., 850., 80.)),
            ("timber", LayerProperties::new(0.15, 500., 1600., 50.)),
            ("vapour_barrier", LayerProperties::new(0.25, 1300., 1400., 100_000.)),
            ("windproof_membrane", LayerProperties::new(0.25, 400., 1400., 2.)),
        ])
    });

// Magnus coefficients over water
const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12; // Celsius
const MAGNUS_P0: f64 = 611.2; // Pa

/// Saturation pressure of water vapour (Pa) at an air temperature in Celsius.
pub fn saturation_vapour_pressure(temperature: f64) -> f64 {
    MAGNUS_P0 * (MAGNUS_A * temperature / (MAGNUS_B + temperature)).exp()
}

/// Dew point (Celsius) of air at `temperature` and `relative_humidity` (%).
///
/// Returns `None` for a relative humidity outside (0, 100].
pub fn dew_point(temperature: f64, relative_humidity: f64) -> Option<f64> {
    if !(relative_humidity > 0. && relative_humidity <= 100.) {
        return None;
    }
    let gamma = (relative_humidity / 100.).ln() + MAGNUS_A * temperature / (MAGNUS_B + temperature);
    Some(MAGNUS_B * gamma / (MAGNUS_A - gamma))
}
