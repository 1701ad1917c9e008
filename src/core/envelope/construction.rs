use crate::core::envelope::building_element::ElementKind;
use crate::core::material_properties::{
    saturation_vapour_pressure, LayerProperties, LAYER_MATERIALS,
};
use crate::core::units::{SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::errors::{EngineError, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use strum_macros::Display;
use tracing::warn;

/// Internal surface resistance, in m2.K/W.
pub const INTERNAL_SURFACE_RESISTANCE: f64 = 0.13;
/// External surface resistance, in m2.K/W. Floors on the ground have none.
pub const EXTERNAL_SURFACE_RESISTANCE: f64 = 0.04;

/// Share of the peak irradiance absorbed at the outer surface and passed inwards.
const SOLAR_ABSORPTION_FACTOR: f64 = 0.04;
/// Surface heat-transfer coefficient turning a heat flux into a room temperature rise, in W/(m2.K).
const INTERNAL_SURFACE_COEFFICIENT: f64 = 10.;
/// Estimated overheating hours per day for each K above the summer set point.
const OVERHEATING_HOURS_PER_KELVIN: f64 = 8.;

/// Design temperatures and humidities for the winter condensation check and the
/// summer overheating check.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DesignConditions {
    pub winter_external_temperature: f64, // Celsius
    pub winter_internal_temperature: f64, // Celsius
    pub winter_external_relative_humidity: f64, // %
    pub winter_internal_relative_humidity: f64, // %
    pub summer_external_temperature: f64, // Celsius
    pub summer_internal_temperature: f64, // Celsius
    /// Daily swing of the external air temperature in summer, in K.
    pub summer_daily_swing: f64,
    /// Peak solar irradiance on the outer surface of opaque elements, in W/m2.
    pub summer_peak_irradiance: f64,
}

impl Default for DesignConditions {
    fn default() -> Self {
        Self {
            winter_external_temperature: -12.,
            winter_internal_temperature: 20.,
            winter_external_relative_humidity: 85.,
            winter_internal_relative_humidity: 50.,
            summer_external_temperature: 32.,
            summer_internal_temperature: 26.,
            summer_daily_swing: 10.,
            summer_peak_irradiance: 0.,
        }
    }
}

impl DesignConditions {
    pub fn validate(&self) -> Result<(), EngineError> {
        for (field, humidity) in [
            (
                "climate.design_conditions.winter_external_relative_humidity",
                self.winter_external_relative_humidity,
            ),
            (
                "climate.design_conditions.winter_internal_relative_humidity",
                self.winter_internal_relative_humidity,
            ),
        ] {
            if !(humidity > 0. && humidity <= 100.) {
                return Err(EngineError::invalid_input(
                    field,
                    format!("must be in (0, 100], got {humidity}"),
                ));
            }
        }
        if self.winter_internal_temperature <= self.winter_external_temperature {
            return Err(EngineError::invalid_input(
                "climate.design_conditions.winter_internal_temperature",
                "must be above the winter external temperature",
            ));
        }
        for (field, value) in [
            ("climate.design_conditions.summer_daily_swing", self.summer_daily_swing),
            ("climate.design_conditions.summer_peak_irradiance", self.summer_peak_irradiance),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return Err(EngineError::invalid_input(
                    field,
                    format!("must not be negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// One homogeneous layer of a construction.
///
/// Properties not given explicitly are taken from the built-in material table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConstructionLayer {
    pub material: String,
    pub thickness: f64, // m
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_heat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapour_resistance_factor: Option<f64>,
}

impl ConstructionLayer {
    pub fn new(material: &str, thickness: f64) -> Self {
        Self {
            material: material.to_string(),
            thickness,
            conductivity: None,
            density: None,
            specific_heat: None,
            vapour_resistance_factor: None,
        }
    }

    fn validate(&self, field: &str) -> Result<(), EngineError> {
        if !(self.thickness.is_finite() && self.thickness > 0.) {
            return Err(EngineError::invalid_input(
                format!("{field}.thickness"),
                format!("must be greater than zero, got {}", self.thickness),
            ));
        }
        for (attribute, value) in [
            ("conductivity", self.conductivity),
            ("density", self.density),
            ("specific_heat", self.specific_heat),
            ("vapour_resistance_factor", self.vapour_resistance_factor),
        ] {
            if let Some(value) = value {
                if !(value.is_finite() && value > 0.) {
                    return Err(EngineError::invalid_input(
                        format!("{field}.{attribute}"),
                        format!("must be greater than zero, got {value}"),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn properties(&self) -> Result<LayerProperties, EngineError> {
        let reference = LAYER_MATERIALS.get(self.material.as_str());
        let from_table = |pick: fn(&LayerProperties) -> f64| reference.map(pick);

        match (
            self.conductivity.or(from_table(|p| p.conductivity)),
            self.density.or(from_table(|p| p.density)),
            self.specific_heat.or(from_table(|p| p.specific_heat)),
        ) {
            (Some(conductivity), Some(density), Some(specific_heat)) => Ok(LayerProperties::new(
                conductivity,
                density,
                specific_heat,
                self.vapour_resistance_factor
                    .or(from_table(|p| p.vapour_resistance_factor))
                    .unwrap_or(1.),
            )),
            _ => Err(EngineError::missing_reference(
                ReferenceKind::ConstructionMaterial,
                &self.material,
            )),
        }
    }
}

/// A layered build-up of an envelope element, listed from the inside outwards.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Construction {
    pub layers: Vec<ConstructionLayer>,
}

/// A construction with the properties of every layer looked up.
struct ResolvedLayer<'a> {
    layer: &'a ConstructionLayer,
    properties: LayerProperties,
}

impl ResolvedLayer<'_> {
    fn thermal_resistance(&self) -> f64 {
        self.layer.thickness / self.properties.conductivity
    }

    /// Equivalent air-layer thickness for vapour diffusion (sd), in m.
    fn vapour_diffusion_thickness(&self) -> f64 {
        self.layer.thickness * self.properties.vapour_resistance_factor
    }

    fn mass(&self) -> f64 {
        self.layer.thickness * self.properties.density
    }
}

fn surface_resistances(kind: ElementKind) -> (f64, f64) {
    match kind {
        ElementKind::Floor => (INTERNAL_SURFACE_RESISTANCE, 0.),
        _ => (INTERNAL_SURFACE_RESISTANCE, EXTERNAL_SURFACE_RESISTANCE),
    }
}

impl Construction {
    pub fn new(layers: Vec<ConstructionLayer>) -> Self {
        Self { layers }
    }

    pub fn validate(&self, field: &str) -> Result<(), EngineError> {
        if self.layers.is_empty() {
            return Err(EngineError::invalid_input(
                format!("{field}.layers"),
                "a construction needs at least one layer",
            ));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            layer.validate(&format!("{field}.layers[{index}]"))?;
        }
        Ok(())
    }

    fn resolve(&self) -> Result<Vec<ResolvedLayer<'_>>, EngineError> {
        self.layers
            .iter()
            .map(|layer| {
                Ok(ResolvedLayer {
                    layer,
                    properties: layer.properties()?,
                })
            })
            .collect()
    }

    pub fn total_thickness(&self) -> f64 {
        self.layers.iter().map(|layer| layer.thickness).sum()
    }

    /// Total resistance from internal to external air, Rsi + sum(d / lambda) + Rse, in m2.K/W.
    pub fn thermal_resistance(&self, kind: ElementKind) -> Result<f64, EngineError> {
        let (internal, external) = surface_resistances(kind);
        let layers = self
            .resolve()?
            .iter()
            .map(ResolvedLayer::thermal_resistance)
            .sum::<f64>();
        Ok(internal + layers + external)
    }

    pub fn u_value(&self, kind: ElementKind) -> Result<f64, EngineError> {
        Ok(1. / self.thermal_resistance(kind)?)
    }

    /// Heat stored per m2 of construction and K, in J/(m2.K).
    pub fn areal_heat_capacity(&self) -> Result<f64, EngineError> {
        Ok(self
            .resolve()?
            .iter()
            .map(|resolved| {
                resolved.layer.thickness * resolved.properties.volumetric_heat_capacity()
            })
            .sum())
    }

    /// Steady-state (Glaser) check for interstitial and surface condensation under the
    /// winter design conditions.
    ///
    /// Temperatures fall linearly with thermal resistance and vapour pressures with
    /// diffusion thickness. Condensation is flagged wherever the vapour pressure at a
    /// boundary exceeds the saturation pressure at its temperature.
    pub fn condensation_risk(
        &self,
        kind: ElementKind,
        conditions: &DesignConditions,
    ) -> Result<CondensationAssessment, EngineError> {
        let layers = self.resolve()?;
        let (internal_resistance, external_resistance) = surface_resistances(kind);
        let total_resistance = internal_resistance
            + layers.iter().map(ResolvedLayer::thermal_resistance).sum::<f64>()
            + external_resistance;
        let total_diffusion_thickness = layers
            .iter()
            .map(ResolvedLayer::vapour_diffusion_thickness)
            .sum::<f64>();

        let internal = conditions.winter_internal_temperature;
        let external = conditions.winter_external_temperature;
        let temperature_drop = internal - external;
        let internal_vapour_pressure = conditions.winter_internal_relative_humidity / 100.
            * saturation_vapour_pressure(internal);
        let external_vapour_pressure = conditions.winter_external_relative_humidity / 100.
            * saturation_vapour_pressure(external);
        let vapour_pressure_drop = internal_vapour_pressure - external_vapour_pressure;

        let boundary = |position: String, depth: f64, resistance: f64, diffusion_thickness: f64| {
            let temperature = internal - temperature_drop * resistance / total_resistance;
            let vapour_pressure = if total_diffusion_thickness > 0. {
                internal_vapour_pressure
                    - vapour_pressure_drop * diffusion_thickness / total_diffusion_thickness
            } else {
                internal_vapour_pressure
            };
            BoundaryCondition {
                position,
                depth,
                temperature,
                vapour_pressure,
                saturation_pressure: saturation_vapour_pressure(temperature),
            }
        };

        let mut boundaries = vec![boundary(
            "internal surface".to_string(),
            0.,
            internal_resistance,
            0.,
        )];
        let (mut depth, mut resistance, mut diffusion_thickness) = (0., internal_resistance, 0.);
        for resolved in &layers {
            depth += resolved.layer.thickness;
            resistance += resolved.thermal_resistance();
            diffusion_thickness += resolved.vapour_diffusion_thickness();
            boundaries.push(boundary(
                resolved.layer.material.clone(),
                depth,
                resistance,
                diffusion_thickness,
            ));
        }

        let condensing_positions = boundaries
            .iter()
            .filter(|boundary| boundary.condenses())
            .map(|boundary| boundary.position.clone())
            .collect::<Vec<_>>();

        Ok(CondensationAssessment {
            condensation_risk: !condensing_positions.is_empty(),
            condensing_positions,
            boundaries,
        })
    }

    /// Dynamic response of the construction to the daily temperature cycle.
    pub fn thermal_inertia(&self) -> Result<ThermalInertia, EngineError> {
        let layers = self.resolve()?;
        let thickness = self.total_thickness();
        let mass = layers.iter().map(ResolvedLayer::mass).sum::<f64>();
        let areal_heat_capacity = layers
            .iter()
            .map(|resolved| resolved.mass() * resolved.properties.specific_heat)
            .sum::<f64>();

        let layer_resistance = layers.iter().map(ResolvedLayer::thermal_resistance).sum::<f64>();
        let effective_conductivity = thickness / layer_resistance;
        let volumetric_heat_capacity = areal_heat_capacity / thickness;
        if !(mass > 0. && volumetric_heat_capacity > 0.) {
            return Err(EngineError::invalid_input(
                "construction.layers",
                "layers have no thermal mass",
            ));
        }
        let thermal_diffusivity = effective_conductivity / volumetric_heat_capacity;

        let time_constant = thickness.powi(2) / (PI.powi(2) * thermal_diffusivity); // s
        let day = SECONDS_PER_DAY as f64;
        let relative_frequency = 2. * PI * time_constant / day;
        let phase_shift = relative_frequency.atan() * day / (2. * PI);
        let time_constant_hours = time_constant / SECONDS_PER_HOUR as f64;

        Ok(ThermalInertia {
            areal_heat_capacity,
            thermal_diffusivity,
            time_constant_hours,
            amplitude_ratio: 1. / (1. + relative_frequency.powi(2)).sqrt(),
            phase_shift_hours: phase_shift / SECONDS_PER_HOUR as f64,
            inertia_class: InertiaClass::from_time_constant(time_constant_hours),
        })
    }

    /// Simplified peak-day check for overheating behind this construction.
    ///
    /// Arguments:
    /// * `area` - element area in m2, used for the cooling load
    pub fn summer_comfort(
        &self,
        kind: ElementKind,
        area: f64,
        conditions: &DesignConditions,
    ) -> Result<SummerComfort, EngineError> {
        let inertia = self.thermal_inertia()?;
        let u_value = self.u_value(kind)?;

        let internal_swing = conditions.summer_daily_swing * inertia.amplitude_ratio;
        let conduction_heat_flux = u_value
            * (conditions.summer_external_temperature - conditions.summer_internal_temperature);
        let solar_heat_flux = conditions.summer_peak_irradiance * SOLAR_ABSORPTION_FACTOR;
        let total_heat_flux = conduction_heat_flux + solar_heat_flux;

        let peak_internal_temperature = conditions.summer_internal_temperature
            + internal_swing
            + total_heat_flux / INTERNAL_SURFACE_COEFFICIENT;
        let overheating_hours = ((peak_internal_temperature
            - conditions.summer_internal_temperature)
            * OVERHEATING_HOURS_PER_KELVIN)
            .clamp(0., 24.);

        Ok(SummerComfort {
            peak_internal_temperature,
            internal_temperature_swing: internal_swing,
            conduction_heat_flux,
            solar_heat_flux,
            total_heat_flux,
            comfort: SummerComfortCategory::from_peak_temperature(peak_internal_temperature),
            daily_overheating_hours: overheating_hours,
            cooling_load: total_heat_flux.max(0.) * area,
        })
    }

    /// Full hygrothermal report of the construction of one element.
    pub fn analyse(
        &self,
        element: &str,
        kind: ElementKind,
        area: f64,
        conditions: &DesignConditions,
    ) -> Result<ConstructionAnalysis, EngineError> {
        let thermal_resistance = self.thermal_resistance(kind)?;
        let condensation = self.condensation_risk(kind, conditions)?;
        if condensation.condensation_risk {
            warn!(
                element,
                positions = ?condensation.condensing_positions,
                "construction is at risk of condensation"
            );
        }

        Ok(ConstructionAnalysis {
            element: element.to_string(),
            thermal_resistance,
            u_value: 1. / thermal_resistance,
            areal_heat_capacity: self.areal_heat_capacity()?,
            condensation,
            inertia: self.thermal_inertia()?,
            summer_comfort: self.summer_comfort(kind, area, conditions)?,
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BoundaryCondition {
    /// "internal surface", or the material on the warm side of the boundary.
    pub position: String,
    pub depth: f64,               // m from the internal surface
    pub temperature: f64,         // Celsius
    pub vapour_pressure: f64,     // Pa
    pub saturation_pressure: f64, // Pa
}

impl BoundaryCondition {
    pub fn condenses(&self) -> bool {
        self.vapour_pressure > self.saturation_pressure
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CondensationAssessment {
    pub condensation_risk: bool,
    pub condensing_positions: Vec<String>,
    pub boundaries: Vec<BoundaryCondition>,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InertiaClass {
    Light,
    Medium,
    Heavy,
    VeryHeavy,
}

impl InertiaClass {
    pub fn from_time_constant(hours: f64) -> Self {
        match hours {
            h if h < 6. => Self::Light,
            h if h < 24. => Self::Medium,
            h if h < 72. => Self::Heavy,
            _ => Self::VeryHeavy,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ThermalInertia {
    pub areal_heat_capacity: f64, // J/(m2.K)
    pub thermal_diffusivity: f64, // m2/s
    pub time_constant_hours: f64,
    /// Damping of the external daily temperature swing, in (0, 1].
    pub amplitude_ratio: f64,
    pub phase_shift_hours: f64,
    pub inertia_class: InertiaClass,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SummerComfortCategory {
    Comfortable,
    SlightDiscomfort,
    SignificantDiscomfort,
    Unacceptable,
}

impl SummerComfortCategory {
    pub fn from_peak_temperature(temperature: f64) -> Self {
        match temperature {
            t if t > 32. => Self::Unacceptable,
            t if t > 30. => Self::SignificantDiscomfort,
            t if t > 28. => Self::SlightDiscomfort,
            _ => Self::Comfortable,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SummerComfort {
    pub peak_internal_temperature: f64, // Celsius
    pub internal_temperature_swing: f64, // K
    // heat fluxes in W/m2
    pub conduction_heat_flux: f64,
    pub solar_heat_flux: f64,
    pub total_heat_flux: f64,
    pub comfort: SummerComfortCategory,
    pub daily_overheating_hours: f64,
    pub cooling_load: f64, // W
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ConstructionAnalysis {
    pub element: String,
    pub thermal_resistance: f64, // m2.K/W
    pub u_value: f64,
    pub areal_heat_capacity: f64,
    pub condensation: CondensationAssessment,
    pub inertia: ThermalInertia,
    pub summer_comfort: SummerComfort,
}
