use crate::compare_floats::guarded_ratio;
use crate::core::envelope::thermal_bridge::ThermalBridge;
use crate::core::material_properties::dew_point;
use crate::errors::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Converts an air-change rate at 50 Pa into a natural infiltration rate.
pub const N50_TO_INFILTRATION_FACTOR: f64 = 0.05;

const PASSIVE_HOUSE_N50_LIMIT: f64 = 0.6;
const LOW_ENERGY_N50_LIMIT: f64 = 1.5;

/// Internal surface temperatures (Celsius) expected in a heated room.
const NORMAL_SURFACE_TEMPERATURES: (f64, f64) = (18., 22.);
/// Margin above the normal range before a warm patch counts as a hot spot, in K.
const HOT_SPOT_MARGIN: f64 = 5.;
const COLD_SPOT_HIGH_SEVERITY_BELOW: f64 = 10.;
const HOT_SPOT_HIGH_SEVERITY_ABOVE: f64 = 30.;
const GRADIENT_LIMIT: f64 = 10.;
const GRADIENT_HIGH_SEVERITY_ABOVE: f64 = 20.;

// Moisture limits, in %
const SURFACE_MOISTURE_LIMIT: f64 = 80.;
const SURFACE_MOISTURE_CRITICAL: f64 = 95.;
const MATERIAL_MOISTURE_LIMIT: f64 = 20.;
const MATERIAL_MOISTURE_CRITICAL: f64 = 30.;
// Distance of the surface temperature above its dew point, in K
const DEW_POINT_MARGIN: f64 = 3.;
const DEW_POINT_MARGIN_CRITICAL: f64 = 1.;

/// Measurements taken on site that refine the design assumptions of the envelope model.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvelopeDiagnostics {
    #[serde(default)]
    pub blower_door: Option<BlowerDoorTest>,
    /// Bridges found by thermographic survey, in addition to those declared per element.
    #[serde(default)]
    pub measured_thermal_bridges: IndexMap<String, ThermalBridge>,
    #[serde(default)]
    pub thermal_images: Vec<ThermalImage>,
    #[serde(default)]
    pub moisture_readings: Vec<MoistureReading>,
}

impl EnvelopeDiagnostics {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(test) = &self.blower_door {
            test.validate()?;
        }
        for (name, bridge) in &self.measured_thermal_bridges {
            bridge.validate(&format!("diagnostics.measured_thermal_bridges.{name}"))?;
        }
        for image in &self.thermal_images {
            image.validate()?;
        }
        Ok(())
    }

    /// Anomalies across all thermal images, in survey order.
    pub fn thermal_anomalies(&self) -> Vec<ThermalAnomaly> {
        self.thermal_images
            .iter()
            .flat_map(ThermalImage::anomalies)
            .collect()
    }

    pub fn moisture_assessment(&self) -> Option<MoistureAssessment> {
        (!self.moisture_readings.is_empty())
            .then(|| MoistureAssessment::from_readings(&self.moisture_readings))
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// Surface temperatures of one thermographic image of the internal face of the envelope.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalImage {
    pub location: String,
    pub min_temperature: f64, // Celsius
    pub max_temperature: f64, // Celsius
}

impl ThermalImage {
    fn validate(&self) -> Result<(), EngineError> {
        if !(self.min_temperature <= self.max_temperature) {
            return Err(EngineError::invalid_input(
                format!("diagnostics.thermal_images[{}].min_temperature", self.location),
                format!(
                    "{} is above the maximum temperature {}",
                    self.min_temperature, self.max_temperature
                ),
            ));
        }
        Ok(())
    }

    pub fn temperature_range(&self) -> f64 {
        self.max_temperature - self.min_temperature
    }

    pub fn anomalies(&self) -> Vec<ThermalAnomaly> {
        let (normal_min, normal_max) = NORMAL_SURFACE_TEMPERATURES;
        let anomaly = |kind, value, high: bool| ThermalAnomaly {
            location: self.location.clone(),
            kind,
            value,
            severity: if high { Severity::High } else { Severity::Medium },
        };

        let mut anomalies = vec![];
        if self.min_temperature < normal_min {
            anomalies.push(anomaly(
                AnomalyKind::ColdSpot,
                self.min_temperature,
                self.min_temperature < COLD_SPOT_HIGH_SEVERITY_BELOW,
            ));
        }
        if self.max_temperature > normal_max + HOT_SPOT_MARGIN {
            anomalies.push(anomaly(
                AnomalyKind::HotSpot,
                self.max_temperature,
                self.max_temperature > HOT_SPOT_HIGH_SEVERITY_ABOVE,
            ));
        }
        let range = self.temperature_range();
        if range > GRADIENT_LIMIT {
            anomalies.push(anomaly(
                AnomalyKind::HighGradient,
                range,
                range > GRADIENT_HIGH_SEVERITY_ABOVE,
            ));
        }
        anomalies
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnomalyKind {
    /// Likely thermal bridge or missing insulation.
    ColdSpot,
    /// Likely heat leak or overheating.
    HotSpot,
    /// Uneven insulation across the image.
    HighGradient,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ThermalAnomaly {
    pub location: String,
    pub kind: AnomalyKind,
    /// Temperature in Celsius, or the temperature range in K for a gradient.
    pub value: f64,
    pub severity: Severity,
}

/// A spot moisture measurement. Any subset of the quantities may be recorded.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MoistureReading {
    pub location: String,
    #[serde(default)]
    pub surface_moisture: Option<f64>, // %
    #[serde(default)]
    pub material_moisture: Option<f64>, // % by mass
    #[serde(default)]
    pub relative_humidity: Option<f64>, // %
    #[serde(default)]
    pub temperature: Option<f64>, // Celsius
}

impl MoistureReading {
    pub fn dew_point(&self) -> Option<f64> {
        dew_point(self.temperature?, self.relative_humidity?)
    }

    fn problem(&self) -> Option<MoistureProblem> {
        let mut issues = vec![];
        let mut critical = false;

        if let Some(surface) = self.surface_moisture.filter(|m| *m > SURFACE_MOISTURE_LIMIT) {
            issues.push(MoistureIssue::HighSurfaceMoisture);
            critical |= surface > SURFACE_MOISTURE_CRITICAL;
        }
        if let Some(material) = self.material_moisture.filter(|m| *m > MATERIAL_MOISTURE_LIMIT) {
            issues.push(MoistureIssue::HighMaterialMoisture);
            critical |= material > MATERIAL_MOISTURE_CRITICAL;
        }
        let dew_point = self.dew_point();
        if let (Some(temperature), Some(dew_point)) = (self.temperature, dew_point) {
            let margin = temperature - dew_point;
            if margin < DEW_POINT_MARGIN {
                issues.push(MoistureIssue::CondensationRisk);
                critical |= margin < DEW_POINT_MARGIN_CRITICAL;
            }
        }

        (!issues.is_empty()).then(|| MoistureProblem {
            location: self.location.clone(),
            issues,
            dew_point,
            severity: if critical { Severity::Critical } else { Severity::Medium },
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MoistureIssue {
    HighSurfaceMoisture,
    HighMaterialMoisture,
    CondensationRisk,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MoistureProblem {
    pub location: String,
    pub issues: Vec<MoistureIssue>,
    pub dew_point: Option<f64>,
    pub severity: Severity,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MoistureRisk {
    Negligible,
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MoistureAssessment {
    pub problems: Vec<MoistureProblem>,
    pub critical_locations: usize,
    pub risk: MoistureRisk,
}

impl MoistureAssessment {
    pub fn from_readings(readings: &[MoistureReading]) -> Self {
        let problems = readings
            .iter()
            .filter_map(MoistureReading::problem)
            .collect::<Vec<_>>();
        let critical_locations = problems
            .iter()
            .filter(|problem| problem.severity == Severity::Critical)
            .count();
        let risk = match (problems.len(), critical_locations) {
            (0, _) => MoistureRisk::Negligible,
            (_, 0) => MoistureRisk::Low,
            (_, 1..=2) => MoistureRisk::Medium,
            _ => MoistureRisk::High,
        };

        Self {
            problems,
            critical_locations,
            risk,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlowerDoorTest {
    /// Measured leakage flow at 50 Pa pressure difference, in m3/h.
    pub air_leakage_rate_50pa: f64,
}

impl BlowerDoorTest {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.air_leakage_rate_50pa.is_finite() && self.air_leakage_rate_50pa >= 0.) {
            return Err(EngineError::invalid_input(
                "diagnostics.blower_door.air_leakage_rate_50pa",
                format!("must not be negative, got {}", self.air_leakage_rate_50pa),
            ));
        }
        Ok(())
    }

    /// Air changes per hour at 50 Pa.
    pub fn n50(&self, volume: f64) -> Option<f64> {
        guarded_ratio(self.air_leakage_rate_50pa, volume)
    }

    /// Air permeability at 50 Pa, in m3/(h.m2) of envelope area.
    pub fn q50(&self, envelope_area: f64) -> Option<f64> {
        guarded_ratio(self.air_leakage_rate_50pa, envelope_area)
    }

    /// Equivalent natural infiltration under normal conditions, in 1/h.
    pub fn infiltration_air_change_rate(&self, volume: f64) -> Option<f64> {
        self.n50(volume).map(|n50| n50 * N50_TO_INFILTRATION_FACTOR)
    }

    pub fn assess(&self, volume: f64, envelope_area: f64) -> Option<AirtightnessAssessment> {
        let n50 = self.n50(volume)?;

        Some(AirtightnessAssessment {
            n50,
            q50: self.q50(envelope_area),
            infiltration_air_change_rate: n50 * N50_TO_INFILTRATION_FACTOR,
            rating: AirtightnessRating::from_n50(n50),
            passive_house_compliant: n50 <= PASSIVE_HOUSE_N50_LIMIT,
            low_energy_compliant: n50 <= LOW_ENERGY_N50_LIMIT,
        })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub enum AirtightnessRating {
    #[serde(rename = "A+")]
    #[strum(serialize = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    E,
}

impl AirtightnessRating {
    pub fn from_n50(n50: f64) -> Self {
        match n50 {
            x if x <= 1.0 => Self::APlus,
            x if x <= 1.5 => Self::A,
            x if x <= 3.0 => Self::B,
            x if x <= 5.0 => Self::C,
            x if x <= 7.0 => Self::D,
            _ => Self::E,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AirtightnessAssessment {
    pub n50: f64,
    pub q50: Option<f64>,
    pub infiltration_air_change_rate: f64,
    pub rating: AirtightnessRating,
    pub passive_house_compliant: bool,
    pub low_energy_compliant: bool,
}
