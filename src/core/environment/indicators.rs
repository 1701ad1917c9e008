use crate::compare_floats::guarded_ratio;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// kg CO2 absorbed by one tree in a year.
const TREE_ANNUAL_SEQUESTRATION: f64 = 21.77;
/// kg CO2 emitted by an average passenger car in a year.
const CAR_ANNUAL_EMISSIONS: f64 = 4600.;
/// kg CO2 per km driven.
const CAR_EMISSIONS_PER_KM: f64 = 0.12;

/// Everyday equivalents of an annual emissions saving in kg CO2e.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SustainabilityIndicators {
    pub annual_savings: f64,
    pub trees_planted: f64,
    pub cars_removed: f64,
    pub driving_km_avoided: f64,
}

pub fn sustainability_indicators(annual_savings: f64) -> SustainabilityIndicators {
    SustainabilityIndicators {
        annual_savings,
        trees_planted: annual_savings / TREE_ANNUAL_SEQUESTRATION,
        cars_removed: annual_savings / CAR_ANNUAL_EMISSIONS,
        driving_km_avoided: annual_savings / CAR_EMISSIONS_PER_KM,
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmbodiedIntensityRating {
    Low,
    Average,
    High,
}

impl EmbodiedIntensityRating {
    /// Rate embodied carbon per m2 of floor area.
    pub fn from_intensity(embodied_per_area: f64) -> Self {
        if embodied_per_area < 100. {
            Self::Low
        } else if embodied_per_area < 200. {
            Self::Average
        } else {
            Self::High
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CarbonEfficiencyRating {
    Excellent,
    VeryGood,
    Good,
    Average,
    Low,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CarbonEfficiency {
    /// Annual operational savings per unit of embodied carbon invested.
    Rated {
        ratio: f64,
        rating: CarbonEfficiencyRating,
    },
    /// No embodied carbon to compare against.
    Undefined,
}

impl CarbonEfficiency {
    pub fn new(annual_savings: f64, embodied: f64) -> Self {
        let Some(ratio) = guarded_ratio(annual_savings, embodied) else {
            return Self::Undefined;
        };
        let rating = match ratio {
            r if r >= 0.5 => CarbonEfficiencyRating::Excellent,
            r if r >= 0.3 => CarbonEfficiencyRating::VeryGood,
            r if r >= 0.2 => CarbonEfficiencyRating::Good,
            r if r >= 0.1 => CarbonEfficiencyRating::Average,
            _ => CarbonEfficiencyRating::Low,
        };
        Self::Rated { ratio, rating }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_convert_savings_into_equivalents() {
        let indicators = sustainability_indicators(4600.);
        assert_relative_eq!(indicators.trees_planted, 4600. / 21.77, max_relative = 1e-12);
        assert_eq!(indicators.cars_removed, 1.);
        assert_relative_eq!(indicators.driving_km_avoided, 38333.333333, max_relative = 1e-9);
    }

    #[rstest]
    #[case(50., EmbodiedIntensityRating::Low)]
    #[case(100., EmbodiedIntensityRating::Average)]
    #[case(250., EmbodiedIntensityRating::High)]
    fn should_rate_embodied_intensity(#[case] intensity: f64, #[case] expected: EmbodiedIntensityRating) {
        assert_eq!(EmbodiedIntensityRating::from_intensity(intensity), expected);
    }

    #[rstest]
    #[case(600., CarbonEfficiencyRating::Excellent)]
    #[case(300., CarbonEfficiencyRating::VeryGood)]
    #[case(250., CarbonEfficiencyRating::Good)]
    #[case(100., CarbonEfficiencyRating::Average)]
    #[case(20., CarbonEfficiencyRating::Low)]
    fn should_rate_carbon_efficiency(#[case] savings: f64, #[case] expected: CarbonEfficiencyRating) {
        assert!(matches!(
            CarbonEfficiency::new(savings, 1000.),
            CarbonEfficiency::Rated { rating, .. } if rating == expected
        ));
    }

    #[rstest]
    fn should_leave_efficiency_undefined_without_embodied_carbon() {
        assert_eq!(CarbonEfficiency::new(500., 0.), CarbonEfficiency::Undefined);
    }
}
