use crate::core::envelope::construction::Construction;
use crate::core::envelope::thermal_bridge::{
    heat_transfer_coefficient_for_thermal_bridge, ThermalBridge,
};
use crate::errors::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ElementKind {
    Wall,
    Roof,
    Floor,
    Window,
    Door,
}

impl ElementKind {
    /// Whether the element admits solar radiation.
    pub fn is_glazed(&self) -> bool {
        matches!(self, ElementKind::Window)
    }
}

/// A wall, roof, floor, window or door segment of the thermal envelope.
///
/// The U-value is either given directly or derived from a layered construction.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "ElementInput")]
pub struct EnvelopeElement {
    pub name: String,
    pub kind: ElementKind,
    pub area: f64,    // m2
    pub u_value: f64, // W/(m2.K)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub construction: Option<Construction>,
    pub thermal_bridges: IndexMap<String, ThermalBridge>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementInput {
    name: String,
    kind: ElementKind,
    area: f64,
    #[serde(default)]
    u_value: Option<f64>,
    #[serde(default)]
    construction: Option<Construction>,
    #[serde(default)]
    thermal_bridges: IndexMap<String, ThermalBridge>,
}

impl TryFrom<ElementInput> for EnvelopeElement {
    type Error = EngineError;

    fn try_from(input: ElementInput) -> Result<Self, Self::Error> {
        let field = format!("elements[{}]", input.name);
        let u_value = match (input.u_value, &input.construction) {
            (u_value, Some(construction)) => {
                construction.validate(&format!("{field}.construction"))?;
                let derived = construction.u_value(input.kind)?;
                if let Some(given) = u_value {
                    if !is_close!(given, derived, rel_tol = 1e-9, abs_tol = 1e-12) {
                        return Err(EngineError::invalid_input(
                            format!("{field}.u_value"),
                            format!(
                                "{given} conflicts with {derived} derived from the construction"
                            ),
                        ));
                    }
                }
                derived
            }
            (Some(u_value), None) => u_value,
            (None, None) => {
                return Err(EngineError::invalid_input(
                    format!("{field}.u_value"),
                    "either a U-value or a construction is required",
                ))
            }
        };

        Ok(Self {
            name: input.name,
            kind: input.kind,
            area: input.area,
            u_value,
            construction: input.construction,
            thermal_bridges: input.thermal_bridges,
        })
    }
}

impl EnvelopeElement {
    pub fn new(name: &str, kind: ElementKind, area: f64, u_value: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            area,
            u_value,
            construction: None,
            thermal_bridges: Default::default(),
        }
    }

    /// Element whose U-value is derived from its layers.
    pub fn from_construction(
        name: &str,
        kind: ElementKind,
        area: f64,
        construction: Construction,
    ) -> Result<Self, EngineError> {
        construction.validate(&format!("elements[{name}].construction"))?;
        Ok(Self {
            u_value: construction.u_value(kind)?,
            construction: Some(construction),
            ..Self::new(name, kind, area, 0.)
        })
    }

    pub fn with_thermal_bridge(mut self, name: &str, bridge: ThermalBridge) -> Self {
        self.thermal_bridges.insert(name.to_string(), bridge);
        self
    }

    fn field(&self, attribute: &str) -> String {
        format!("elements[{}].{attribute}", self.name)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.area.is_finite() && self.area > 0.) {
            return Err(EngineError::invalid_input(
                self.field("area"),
                format!("must be greater than zero, got {}", self.area),
            ));
        }
        if !(self.u_value.is_finite() && self.u_value > 0.) {
            return Err(EngineError::invalid_input(
                self.field("u_value"),
                format!("must be greater than zero, got {}", self.u_value),
            ));
        }
        if let Some(construction) = &self.construction {
            construction.validate(&self.field("construction"))?;
        }
        for (name, bridge) in &self.thermal_bridges {
            bridge.validate(&self.field(&format!("thermal_bridges.{name}")))?;
        }

        Ok(())
    }

    /// Plain fabric loss through the element area, in W/K.
    pub fn fabric_heat_loss(&self) -> f64 {
        self.area * self.u_value
    }

    /// Loss through the thermal bridges attached to this element, in W/K.
    pub fn thermal_bridge_heat_loss(&self) -> f64 {
        self.thermal_bridges
            .values()
            .map(heat_transfer_coefficient_for_thermal_bridge)
            .sum()
    }

    pub fn heat_loss_coefficient(&self) -> f64 {
        self.fabric_heat_loss() + self.thermal_bridge_heat_loss()
    }

    /// U-value with the element's thermal bridges spread over its area.
    pub fn corrected_u_value(&self) -> f64 {
        self.u_value + self.thermal_bridge_heat_loss() / self.area
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ElementLossReport {
    pub name: String,
    pub kind: ElementKind,
    pub area: f64,
    pub u_value: f64,
    pub corrected_u_value: f64,
    pub heat_loss_coefficient: f64, // W/K
}

impl From<&EnvelopeElement> for ElementLossReport {
    fn from(element: &EnvelopeElement) -> Self {
        Self {
            name: element.name.clone(),
            kind: element.kind,
            area: element.area,
            u_value: element.u_value,
            corrected_u_value: element.corrected_u_value(),
            heat_loss_coefficient: element.heat_loss_coefficient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::construction::tests::insulated_brick_wall;
    use crate::core::envelope::construction::ConstructionLayer;
    use crate::errors::ReferenceKind;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn wall() -> EnvelopeElement {
        EnvelopeElement::new("North wall", ElementKind::Wall, 150., 0.25)
    }

    #[rstest]
    fn should_calculate_fabric_heat_loss(wall: EnvelopeElement) {
        assert_eq!(wall.fabric_heat_loss(), 37.5);
        assert_relative_eq!(
            EnvelopeElement::new("Glazing", ElementKind::Window, 25., 1.1).fabric_heat_loss(),
            27.5,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn should_add_thermal_bridges_to_element_loss(wall: EnvelopeElement) {
        let wall = wall
            .with_thermal_bridge(
                "Lintels",
                ThermalBridge::Linear {
                    linear_thermal_transmittance: 0.3,
                    length: 10.,
                },
            )
            .with_thermal_bridge(
                "Fixings",
                ThermalBridge::Point {
                    heat_transfer_coefficient: 1.5,
                },
            );

        assert_relative_eq!(wall.thermal_bridge_heat_loss(), 4.5, max_relative = 1e-12);
        assert_relative_eq!(wall.heat_loss_coefficient(), 42., max_relative = 1e-12);
        assert_relative_eq!(wall.corrected_u_value(), 0.28, max_relative = 1e-12);
    }

    #[rstest]
    #[case(0., 0.25, "elements[North wall].area")]
    #[case(-5., 0.25, "elements[North wall].area")]
    #[case(150., 0., "elements[North wall].u_value")]
    #[case(150., -0.3, "elements[North wall].u_value")]
    fn should_reject_non_positive_area_or_u_value(
        mut wall: EnvelopeElement,
        #[case] area: f64,
        #[case] u_value: f64,
        #[case] expected_field: &str,
    ) {
        wall.area = area;
        wall.u_value = u_value;
        assert!(matches!(
            wall.validate(),
            Err(EngineError::InvalidInput { field, .. }) if field == expected_field
        ));
    }

    #[rstest]
    fn should_report_element_loss(wall: EnvelopeElement) {
        let report = ElementLossReport::from(&wall);
        assert_eq!(report.heat_loss_coefficient, 37.5);
        assert_eq!(report.corrected_u_value, 0.25);
    }

    #[rstest]
    fn should_derive_u_value_from_construction(insulated_brick_wall: Construction) {
        let wall = EnvelopeElement::from_construction(
            "Street facade",
            ElementKind::Wall,
            100.,
            insulated_brick_wall,
        )
        .unwrap();

        assert_relative_eq!(wall.u_value, 0.1975789, max_relative = 1e-6);
        assert_relative_eq!(wall.fabric_heat_loss(), 19.75789, max_relative = 1e-6);
        assert!(wall.validate().is_ok());
    }

    #[rstest]
    fn should_read_layered_element_from_json() {
        let wall: EnvelopeElement = serde_json::from_value(serde_json::json!({
            "name": "Gable",
            "kind": "wall",
            "area": 40.0,
            "construction": {"layers": [
                {"material": "lime_plaster", "thickness": 0.02},
                {"material": "brick_solid", "thickness": 0.3},
                {"material": "lime_plaster", "thickness": 0.02}
            ]}
        }))
        .unwrap();
        assert_relative_eq!(wall.u_value, 1.6607355, max_relative = 1e-6);

        let round_trip: EnvelopeElement =
            serde_json::from_value(serde_json::to_value(&wall).unwrap()).unwrap();
        assert_eq!(round_trip, wall);
    }

    #[rstest]
    fn should_reject_u_value_contradicting_construction(insulated_brick_wall: Construction) {
        let input = ElementInput {
            name: "Facade".to_string(),
            kind: ElementKind::Wall,
            area: 100.,
            u_value: Some(0.35),
            construction: Some(insulated_brick_wall),
            thermal_bridges: IndexMap::new(),
        };
        assert!(matches!(
            EnvelopeElement::try_from(input),
            Err(EngineError::InvalidInput { field, .. }) if field == "elements[Facade].u_value"
        ));
    }

    #[rstest]
    fn should_need_u_value_or_construction() {
        let result = serde_json::from_value::<EnvelopeElement>(serde_json::json!({
            "name": "Roof", "kind": "roof", "area": 80.0
        }));
        assert!(result.is_err());
    }

    #[rstest]
    fn should_fail_on_unknown_layer_material() {
        let construction = Construction::new(vec![ConstructionLayer::new("straw_bale", 0.4)]);
        assert_eq!(
            EnvelopeElement::from_construction("Wall", ElementKind::Wall, 50., construction),
            Err(EngineError::MissingReferenceData {
                kind: ReferenceKind::ConstructionMaterial,
                name: "straw_bale".to_string(),
            })
        );
    }
}
