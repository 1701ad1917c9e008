// Ventilation and infiltration heat losses on an annual basis.

use crate::core::material_properties::AIR;
use crate::core::units::{HOURS_PER_YEAR, WATTS_PER_KILOWATT};
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

/// Air-change rate (1/h) assumed for natural ventilation without measurements.
pub const DEFAULT_DESIGN_AIR_CHANGE_RATE: f64 = 0.5;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VentilationSystem {
    /// Overrides the climate's design air-change rate for this building, in 1/h.
    #[serde(default)]
    pub natural_air_change_rate: Option<f64>,
    #[serde(default)]
    pub mechanical: Option<MechanicalVentilation>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MechanicalVentilation {
    pub air_flow_rate: f64, // m3/h
    /// Fraction of extract heat recovered, in [0, 1].
    #[serde(default)]
    pub heat_recovery_efficiency: f64,
    /// Fan power per unit of flow, in W/(m3/h).
    pub specific_fan_power: f64,
}

impl MechanicalVentilation {
    /// Flow rate left after heat recovery, as seen by the heating system (m3/h).
    pub fn effective_flow_rate(&self) -> f64 {
        self.air_flow_rate * (1. - self.heat_recovery_efficiency)
    }

    /// Annual fan electricity assuming continuous operation, in kWh.
    pub fn annual_fan_energy(&self) -> f64 {
        self.specific_fan_power * self.air_flow_rate / WATTS_PER_KILOWATT as f64
            * HOURS_PER_YEAR as f64
    }
}

impl VentilationSystem {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(rate) = self.natural_air_change_rate {
            if !(rate.is_finite() && rate >= 0.) {
                return Err(EngineError::invalid_input(
                    "ventilation.natural_air_change_rate",
                    format!("must not be negative, got {rate}"),
                ));
            }
        }
        if let Some(mechanical) = &self.mechanical {
            if !(mechanical.air_flow_rate.is_finite() && mechanical.air_flow_rate >= 0.) {
                return Err(EngineError::invalid_input(
                    "ventilation.mechanical.air_flow_rate",
                    "must not be negative",
                ));
            }
            if !(0. ..=1.).contains(&mechanical.heat_recovery_efficiency) {
                return Err(EngineError::invalid_input(
                    "ventilation.mechanical.heat_recovery_efficiency",
                    format!(
                        "must be in [0, 1], got {}",
                        mechanical.heat_recovery_efficiency
                    ),
                ));
            }
            if !(mechanical.specific_fan_power.is_finite() && mechanical.specific_fan_power >= 0.)
            {
                return Err(EngineError::invalid_input(
                    "ventilation.mechanical.specific_fan_power",
                    "must not be negative",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AirChangeSource {
    Design,
    BlowerDoorTest,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VentilationLoss {
    pub air_change_rate: f64, // 1/h
    pub air_change_source: AirChangeSource,
    pub infiltration_flow_rate: f64,       // m3/h
    pub mechanical_effective_flow_rate: f64, // m3/h
    pub heat_loss_coefficient: f64,        // W/K
    pub fan_energy: f64,                   // kWh/yr
}

/// Ventilation heat-loss coefficient of a building.
///
/// Arguments:
/// * `volume` - heated volume, in m3
/// * `design_air_change_rate` - climate default for natural ventilation, in 1/h
/// * `system` - ventilation system, if described
/// * `measured_air_change_rate` - infiltration derived from a blower-door test, in 1/h,
///   which replaces any design assumption
pub fn ventilation_heat_loss(
    volume: f64,
    design_air_change_rate: f64,
    system: Option<&VentilationSystem>,
    measured_air_change_rate: Option<f64>,
) -> VentilationLoss {
    let (air_change_rate, air_change_source) = match measured_air_change_rate {
        Some(rate) => (rate, AirChangeSource::BlowerDoorTest),
        None => (
            system
                .and_then(|system| system.natural_air_change_rate)
                .unwrap_or(design_air_change_rate),
            AirChangeSource::Design,
        ),
    };
    let infiltration_flow_rate = air_change_rate * volume;

    let mechanical = system.and_then(|system| system.mechanical.as_ref());
    let mechanical_effective_flow_rate = mechanical
        .map(MechanicalVentilation::effective_flow_rate)
        .unwrap_or_default();
    let fan_energy = mechanical
        .map(MechanicalVentilation::annual_fan_energy)
        .unwrap_or_default();

    VentilationLoss {
        air_change_rate,
        air_change_source,
        infiltration_flow_rate,
        mechanical_effective_flow_rate,
        heat_loss_coefficient: AIR
            .heat_loss_coefficient_for_flow(infiltration_flow_rate + mechanical_effective_flow_rate),
        fan_energy,
    }
}
