use crate::compare_floats::clamp_non_negative;
use crate::core::building::BuildingProfile;
use crate::core::envelope::building_element::ElementLossReport;
use crate::core::envelope::construction::{ConstructionAnalysis, DesignConditions};
use crate::core::envelope::diagnostics::{
    AirtightnessAssessment, EnvelopeDiagnostics, MoistureAssessment, ThermalAnomaly,
};
use crate::core::envelope::gains::{annual_internal_gains, annual_solar_gains};
use crate::core::envelope::thermal_bridge::{
    heat_transfer_coefficient_for_thermal_bridge, rank_thermal_bridges, ThermalBridgeReport,
};
use crate::core::envelope::ventilation::{
    ventilation_heat_loss, VentilationLoss, DEFAULT_DESIGN_AIR_CHANGE_RATE,
};
use crate::core::units::annual_kwh_from_coefficient;
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_HEATING_DEGREE_DAYS: f64 = 3500.;
pub const DEFAULT_SOLAR_IRRADIATION: f64 = 1000.;
pub const DEFAULT_GAIN_UTILISATION_FACTOR: f64 = 0.7;

/// Climate and usage assumptions for a site.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ClimateData {
    pub heating_degree_days: f64, // K.day
    /// Annual irradiation on a south-facing vertical surface, in kWh/m2.
    pub solar_irradiation: f64,
    pub design_air_change_rate: f64, // 1/h
    /// Share of the internal and solar gains that offsets heating losses.
    pub gain_utilisation_factor: f64,
    /// Conditions for the condensation and summer checks of layered constructions.
    pub design_conditions: DesignConditions,
}

impl Default for ClimateData {
    fn default() -> Self {
        Self {
            heating_degree_days: DEFAULT_HEATING_DEGREE_DAYS,
            solar_irradiation: DEFAULT_SOLAR_IRRADIATION,
            design_air_change_rate: DEFAULT_DESIGN_AIR_CHANGE_RATE,
            gain_utilisation_factor: DEFAULT_GAIN_UTILISATION_FACTOR,
            design_conditions: DesignConditions::default(),
        }
    }
}

impl ClimateData {
    pub fn validate(&self) -> Result<(), EngineError> {
        for (field, value) in [
            ("climate.heating_degree_days", self.heating_degree_days),
            ("climate.solar_irradiation", self.solar_irradiation),
            ("climate.design_air_change_rate", self.design_air_change_rate),
        ] {
            if !(value.is_finite() && value >= 0.) {
                return Err(EngineError::invalid_input(
                    field,
                    format!("must not be negative, got {value}"),
                ));
            }
        }
        if !(0. ..=1.).contains(&self.gain_utilisation_factor) {
            return Err(EngineError::invalid_input(
                "climate.gain_utilisation_factor",
                format!("must be in [0, 1], got {}", self.gain_utilisation_factor),
            ));
        }
        self.design_conditions.validate()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ThermalBalanceResult {
    pub elements: Vec<ElementLossReport>,
    /// Hygrothermal checks of the elements given as layered constructions.
    pub constructions: Vec<ConstructionAnalysis>,
    /// All thermal bridges, largest loss first.
    pub thermal_bridges: Vec<ThermalBridgeReport>,
    pub airtightness: Option<AirtightnessAssessment>,
    pub thermal_anomalies: Vec<ThermalAnomaly>,
    pub moisture: Option<MoistureAssessment>,
    pub ventilation: VentilationLoss,
    pub transmission_heat_loss_coefficient: f64, // W/K
    pub ventilation_heat_loss_coefficient: f64,  // W/K
    pub total_heat_loss_coefficient: f64,        // W/K
    // Annual figures below are in kWh
    pub transmission_losses: f64,
    pub ventilation_losses: f64,
    pub total_losses: f64,
    pub internal_gains: f64,
    pub solar_gains: f64,
    pub total_gains: f64,
    pub gain_utilisation_factor: f64,
    pub utilised_gains: f64,
    pub net_heating_demand: f64,
    pub specific_heating_demand: f64, // kWh/m2
}

/// Steady-state envelope model over a heating season.
#[derive(Clone, Debug)]
pub struct EnvelopeModel {
    climate: ClimateData,
}

impl EnvelopeModel {
    pub fn new(climate: ClimateData) -> Result<Self, EngineError> {
        climate.validate()?;
        Ok(Self { climate })
    }

    pub fn climate(&self) -> &ClimateData {
        &self.climate
    }

    /// Aggregate losses and gains of a building into its annual net heating demand.
    ///
    /// Diagnostic measurements, where supplied, replace the design infiltration with the
    /// blower-door result and add surveyed thermal bridges to the transmission loss.
    pub fn compute_thermal_balance(
        &self,
        profile: &BuildingProfile,
        diagnostics: Option<&EnvelopeDiagnostics>,
    ) -> Result<ThermalBalanceResult, EngineError> {
        profile.validate()?;
        if let Some(diagnostics) = diagnostics {
            diagnostics.validate()?;
        }

        let volume = profile.heated_volume();
        let envelope_area = profile.total_envelope_area();

        let elements = profile
            .elements
            .iter()
            .map(ElementLossReport::from)
            .collect::<Vec<_>>();

        let constructions = profile
            .elements
            .iter()
            .filter_map(|element| {
                element.construction.as_ref().map(|construction| {
                    construction.analyse(
                        &element.name,
                        element.kind,
                        element.area,
                        &self.climate.design_conditions,
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut bridges = profile
            .elements
            .iter()
            .flat_map(|element| {
                element.thermal_bridges.iter().map(|(name, bridge)| {
                    ThermalBridgeReport::new(Some(element.name.as_str()), name, bridge, element.area)
                })
            })
            .collect::<Vec<_>>();

        let mut transmission_heat_loss_coefficient = elements
            .iter()
            .map(|element| element.heat_loss_coefficient)
            .sum::<f64>();

        let blower_door = diagnostics.and_then(|diagnostics| diagnostics.blower_door.as_ref());
        if let Some(diagnostics) = diagnostics {
            for (name, bridge) in &diagnostics.measured_thermal_bridges {
                transmission_heat_loss_coefficient +=
                    heat_transfer_coefficient_for_thermal_bridge(bridge);
                bridges.push(ThermalBridgeReport::new(None, name, bridge, envelope_area));
            }
        }

        let airtightness = blower_door.and_then(|test| test.assess(volume, envelope_area));
        let thermal_anomalies = diagnostics
            .map(EnvelopeDiagnostics::thermal_anomalies)
            .unwrap_or_default();
        let moisture = diagnostics.and_then(EnvelopeDiagnostics::moisture_assessment);
        let ventilation = ventilation_heat_loss(
            volume,
            self.climate.design_air_change_rate,
            profile.ventilation.as_ref(),
            airtightness
                .as_ref()
                .map(|assessment| assessment.infiltration_air_change_rate),
        );
        let ventilation_heat_loss_coefficient = ventilation.heat_loss_coefficient;

        let hdd = self.climate.heating_degree_days;
        let transmission_losses = annual_kwh_from_coefficient(transmission_heat_loss_coefficient, hdd);
        let ventilation_losses = annual_kwh_from_coefficient(ventilation_heat_loss_coefficient, hdd);
        let total_losses = transmission_losses + ventilation_losses;

        let internal_gains = annual_internal_gains(profile);
        let solar_gains = annual_solar_gains(profile, self.climate.solar_irradiation);
        let total_gains = internal_gains + solar_gains;
        let utilised_gains = total_gains * self.climate.gain_utilisation_factor;

        let net_heating_demand = clamp_non_negative(total_losses - utilised_gains);
        debug!(
            building = profile.name.as_deref().unwrap_or_default(),
            total_losses, utilised_gains, net_heating_demand, "thermal balance computed"
        );

        Ok(ThermalBalanceResult {
            elements,
            constructions,
            thermal_bridges: rank_thermal_bridges(bridges),
            airtightness,
            thermal_anomalies,
            moisture,
            ventilation,
            transmission_heat_loss_coefficient,
            ventilation_heat_loss_coefficient,
            total_heat_loss_coefficient: transmission_heat_loss_coefficient
                + ventilation_heat_loss_coefficient,
            transmission_losses,
            ventilation_losses,
            total_losses,
            internal_gains,
            solar_gains,
            total_gains,
            gain_utilisation_factor: self.climate.gain_utilisation_factor,
            utilised_gains,
            net_heating_demand,
            specific_heating_demand: net_heating_demand / profile.heated_floor_area,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::building::tests::family_house;
    use crate::core::envelope::building_element::{ElementKind, EnvelopeElement};
    use crate::core::envelope::construction::tests::insulated_brick_wall;
    use crate::core::envelope::construction::{Construction, ConstructionLayer};
    use crate::core::envelope::diagnostics::{
        AnomalyKind, BlowerDoorTest, MoistureReading, MoistureRisk, ThermalImage,
    };
    use crate::core::envelope::thermal_bridge::{BridgeSeverity, ThermalBridge};
    use crate::core::envelope::ventilation::{AirChangeSource, VentilationSystem};
    use approx::assert_relative_eq;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn model() -> EnvelopeModel {
        EnvelopeModel::new(ClimateData {
            heating_degree_days: 2800.,
            ..Default::default()
        })
        .unwrap()
    }

    /// Envelope with only transmission losses and no gains.
    fn bare_envelope() -> BuildingProfile {
        let mut profile = family_house();
        profile.ventilation = Some(VentilationSystem {
            natural_air_change_rate: Some(0.),
            mechanical: None,
        });
        profile
    }

    #[rstest]
    fn should_sum_element_heat_losses(model: EnvelopeModel) {
        let result = model.compute_thermal_balance(&bare_envelope(), None).unwrap();

        assert_eq!(result.elements[0].heat_loss_coefficient, 37.5);
        assert_relative_eq!(result.elements[1].heat_loss_coefficient, 27.5, max_relative = 1e-12);
        assert_relative_eq!(result.transmission_heat_loss_coefficient, 65., max_relative = 1e-12);
        assert_relative_eq!(result.transmission_losses, 4368., max_relative = 1e-12);
        assert_eq!(result.ventilation_losses, 0.);
    }

    #[rstest]
    fn should_conserve_losses_and_gains(model: EnvelopeModel) {
        let result = model.compute_thermal_balance(&family_house(), None).unwrap();

        assert_eq!(
            result.total_losses,
            result.transmission_losses + result.ventilation_losses
        );
        assert_eq!(result.total_gains, result.internal_gains + result.solar_gains);
        assert_eq!(
            result.net_heating_demand,
            (result.total_losses - result.utilised_gains).max(0.)
        );
    }

    #[rstest]
    fn should_apply_design_air_change_without_diagnostics(model: EnvelopeModel) {
        let result = model.compute_thermal_balance(&family_house(), None).unwrap();

        assert_eq!(result.ventilation.air_change_source, AirChangeSource::Design);
        // 0.5 1/h over 324 m3
        assert_relative_eq!(result.ventilation_heat_loss_coefficient, 54., max_relative = 1e-12);
        assert!(result.airtightness.is_none());
    }

    #[rstest]
    fn should_let_blower_door_test_override_design_air_change(model: EnvelopeModel) {
        let diagnostics = EnvelopeDiagnostics {
            blower_door: Some(BlowerDoorTest {
                air_leakage_rate_50pa: 1620.,
            }),
            ..Default::default()
        };
        let result = model
            .compute_thermal_balance(&family_house(), Some(&diagnostics))
            .unwrap();

        assert_eq!(
            result.ventilation.air_change_source,
            AirChangeSource::BlowerDoorTest
        );
        // n50 = 5, infiltration 0.25 1/h over 324 m3
        assert_relative_eq!(result.ventilation_heat_loss_coefficient, 27., max_relative = 1e-12);
        assert!(result.airtightness.is_some());
    }

    #[rstest]
    fn should_add_and_rank_element_and_measured_bridges(model: EnvelopeModel) {
        let mut profile = bare_envelope();
        profile.elements[0] = EnvelopeElement::new("External wall", ElementKind::Wall, 150., 0.25)
            .with_thermal_bridge(
                "Window reveals",
                ThermalBridge::Linear {
                    linear_thermal_transmittance: 0.1,
                    length: 60.,
                },
            );
        let diagnostics = EnvelopeDiagnostics {
            measured_thermal_bridges: IndexMap::from([(
                "Balcony".to_string(),
                ThermalBridge::Point {
                    heat_transfer_coefficient: 20.,
                },
            )]),
            ..Default::default()
        };

        let result = model
            .compute_thermal_balance(&profile, Some(&diagnostics))
            .unwrap();

        assert_relative_eq!(result.transmission_heat_loss_coefficient, 91., max_relative = 1e-12);
        assert_eq!(result.thermal_bridges[0].name, "Balcony");
        assert_eq!(result.thermal_bridges[0].severity, BridgeSeverity::Critical);
        assert_eq!(result.thermal_bridges[1].name, "Window reveals");
        assert_eq!(result.thermal_bridges[1].severity, BridgeSeverity::Moderate);
    }

    #[rstest]
    fn should_clamp_net_demand_at_zero_when_gains_dominate(model: EnvelopeModel) {
        let mut profile = bare_envelope();
        profile.elements.push(EnvelopeElement::new(
            "Conservatory",
            ElementKind::Window,
            200.,
            0.1,
        ));
        let result = model.compute_thermal_balance(&profile, None).unwrap();

        assert!(result.utilised_gains > result.total_losses);
        assert_eq!(result.net_heating_demand, 0.);
    }

    #[rstest]
    fn should_fail_on_invalid_element(model: EnvelopeModel) {
        let mut profile = family_house();
        profile.elements[1].u_value = 0.;
        assert!(matches!(
            model.compute_thermal_balance(&profile, None),
            Err(EngineError::InvalidInput { field, .. }) if field == "elements[Windows].u_value"
        ));
    }

    #[rstest]
    fn should_reject_utilisation_factor_above_one() {
        assert!(EnvelopeModel::new(ClimateData {
            gain_utilisation_factor: 1.5,
            ..Default::default()
        })
        .is_err());
    }

    #[rstest]
    fn should_analyse_layered_elements_only(
        model: EnvelopeModel,
        insulated_brick_wall: Construction,
    ) {
        let mut profile = bare_envelope();
        profile.elements[0] = EnvelopeElement::from_construction(
            "External wall",
            ElementKind::Wall,
            150.,
            insulated_brick_wall,
        )
        .unwrap();
        let result = model.compute_thermal_balance(&profile, None).unwrap();

        assert_eq!(result.constructions.len(), 1);
        let wall = &result.constructions[0];
        assert_eq!(wall.element, "External wall");
        assert!(!wall.condensation.condensation_risk);
        assert_relative_eq!(
            result.elements[0].heat_loss_coefficient,
            150. * wall.u_value,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_report_condensation_under_humid_indoor_conditions() {
        let mut climate = ClimateData::default();
        climate.design_conditions.winter_internal_relative_humidity = 65.;
        let model = EnvelopeModel::new(climate).unwrap();
        let mut profile = bare_envelope();
        profile.elements[0] = EnvelopeElement::from_construction(
            "External wall",
            ElementKind::Wall,
            150.,
            Construction::new(vec![
                ConstructionLayer::new("gypsum_plaster", 0.015),
                ConstructionLayer::new("mineral_wool", 0.1),
                ConstructionLayer::new("brick_solid", 0.25),
            ]),
        )
        .unwrap();

        let result = model.compute_thermal_balance(&profile, None).unwrap();
        assert!(result.constructions[0].condensation.condensation_risk);
    }

    #[rstest]
    fn should_carry_survey_findings_into_balance(model: EnvelopeModel) {
        let diagnostics = EnvelopeDiagnostics {
            thermal_images: vec![ThermalImage {
                location: "Lintel".to_string(),
                min_temperature: 12.,
                max_temperature: 20.,
            }],
            moisture_readings: vec![MoistureReading {
                location: "Cellar".to_string(),
                surface_moisture: None,
                material_moisture: Some(25.),
                relative_humidity: None,
                temperature: None,
            }],
            ..Default::default()
        };
        let result = model
            .compute_thermal_balance(&family_house(), Some(&diagnostics))
            .unwrap();

        assert_eq!(result.thermal_anomalies.len(), 1);
        assert_eq!(result.thermal_anomalies[0].kind, AnomalyKind::ColdSpot);
        assert_eq!(result.moisture.unwrap().risk, MoistureRisk::Low);
        assert!(result.constructions.is_empty());
    }
}
