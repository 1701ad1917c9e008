use crate::compare_floats::guarded_ratio;
use crate::errors::EngineError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum_macros::Display;

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThermalBridge {
    Linear {
        #[serde(alias = "psi")]
        linear_thermal_transmittance: f64, // W/(m.K)
        length: f64, // m
    },
    Point {
        #[serde(alias = "chi")]
        heat_transfer_coefficient: f64, // W/K
    },
}

pub fn heat_transfer_coefficient_for_thermal_bridge(thermal_bridge: &ThermalBridge) -> f64 {
    match *thermal_bridge {
        ThermalBridge::Linear {
            linear_thermal_transmittance: t,
            length: l,
        } => t * l,
        ThermalBridge::Point {
            heat_transfer_coefficient: h,
        } => h,
    }
}

impl ThermalBridge {
    pub(crate) fn validate(&self, field: &str) -> Result<(), EngineError> {
        let (name, value) = match *self {
            ThermalBridge::Linear {
                linear_thermal_transmittance,
                length,
            } => {
                if !(length.is_finite() && length >= 0.) {
                    return Err(EngineError::invalid_input(
                        format!("{field}.length"),
                        format!("must not be negative, got {length}"),
                    ));
                }
                ("linear_thermal_transmittance", linear_thermal_transmittance)
            }
            ThermalBridge::Point {
                heat_transfer_coefficient,
            } => ("heat_transfer_coefficient", heat_transfer_coefficient),
        };
        if !value.is_finite() {
            return Err(EngineError::invalid_input(
                format!("{field}.{name}"),
                "must be a finite number",
            ));
        }
        Ok(())
    }
}

/// Severity of a thermal bridge by its loss per m2 of the area it sits in (W/m2K).
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BridgeSeverity {
    Minimal,
    Moderate,
    Significant,
    Critical,
}

impl BridgeSeverity {
    pub fn from_specific_loss(specific_loss: f64) -> Self {
        match specific_loss {
            x if x < 0.02 => Self::Minimal,
            x if x < 0.05 => Self::Moderate,
            x if x < 0.10 => Self::Significant,
            _ => Self::Critical,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ThermalBridgeReport {
    /// Host element, or `None` for bridges found by diagnostic survey.
    pub element: Option<String>,
    pub name: String,
    pub heat_transfer_coefficient: f64, // W/K
    pub specific_loss: f64,             // W/m2K
    pub severity: BridgeSeverity,
}

impl ThermalBridgeReport {
    /// Report a bridge against the area it is normalised by. A zero reference area is
    /// reported as critical, as the loss cannot be spread over anything.
    pub(crate) fn new(
        element: Option<&str>,
        name: &str,
        bridge: &ThermalBridge,
        reference_area: f64,
    ) -> Self {
        let heat_transfer_coefficient = heat_transfer_coefficient_for_thermal_bridge(bridge);
        let specific_loss =
            guarded_ratio(heat_transfer_coefficient.abs(), reference_area).unwrap_or(f64::INFINITY);

        Self {
            element: element.map(str::to_string),
            name: name.to_string(),
            heat_transfer_coefficient,
            specific_loss,
            severity: BridgeSeverity::from_specific_loss(specific_loss),
        }
    }
}

/// Rank bridge reports by descending absolute loss.
pub fn rank_thermal_bridges(reports: Vec<ThermalBridgeReport>) -> Vec<ThermalBridgeReport> {
    reports
        .into_iter()
        .sorted_by(|a, b| {
            b.heat_transfer_coefficient
                .abs()
                .partial_cmp(&a.heat_transfer_coefficient.abs())
                .unwrap_or(Ordering::Equal)
        })
        .collect()
}
