use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub const JOULES_PER_KILOWATT_HOUR: u32 = 3_600_000;
pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const KILOGRAMS_PER_TONNE: u32 = 1_000;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const SECONDS_PER_DAY: u32 = 86_400;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const HOURS_PER_YEAR: u32 = 8_760;

/// Annual energy (kWh) lost through a heat-loss coefficient over a heating season.
///
/// Arguments:
/// * `heat_loss_coefficient` - in W/K
/// * `heating_degree_days` - in K.day
pub fn annual_kwh_from_coefficient(heat_loss_coefficient: f64, heating_degree_days: f64) -> f64 {
    heat_loss_coefficient * heating_degree_days * HOURS_PER_DAY as f64 / WATTS_PER_KILOWATT as f64
}

pub(crate) fn joules_to_kwh(joules: f64) -> f64 {
    joules / JOULES_PER_KILOWATT_HOUR as f64
}

/// A share expressed in percent, constrained to [0, 100].
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, PartialOrd, Serialize, Validate)]
#[serde(try_from = "f64", into = "f64")]
#[repr(transparent)]
pub struct Percentage(
    #[validate(minimum = 0.)]
    #[validate(maximum = 100.)]
    f64,
);

impl Percentage {
    pub fn new(percent: f64) -> Result<Self, PercentageError> {
        if !(0. ..=100.).contains(&percent) {
            return Err(PercentageError::OutOfRange(percent));
        }

        Ok(Self(percent))
    }

    pub fn percent(&self) -> f64 {
        self.0
    }

    pub fn fraction(&self) -> f64 {
        self.0 / 100.
    }
}

impl TryFrom<f64> for Percentage {
    type Error = PercentageError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for f64 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for Percentage {
    type Err = PercentageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let percent = trimmed
            .parse::<f64>()
            .map_err(|_| PercentageError::Unparseable(s.to_string()))?;
        Self::new(percent)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PercentageError {
    #[error("Percentage must be between 0 and 100 inclusive, got {0}")]
    OutOfRange(f64),
    #[error("Could not read '{0}' as a percentage")]
    Unparseable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_convert_coefficient_to_annual_energy() {
        // 65 W/K over 2800 K.day
        assert_relative_eq!(annual_kwh_from_coefficient(65., 2800.), 4368., max_relative = 1e-12);
    }

    #[rstest]
    fn should_convert_joules_to_kwh() {
        assert_eq!(joules_to_kwh(7_200_000.), 2.);
    }

    mod percentage {
        use super::*;
        use pretty_assertions::assert_eq;

        #[rstest]
        fn test_percentage_fraction() {
            assert_eq!(Percentage::new(75.).unwrap().fraction(), 0.75);
        }

        #[rstest]
        #[case(-0.1)]
        #[case(100.5)]
        fn test_percentage_out_of_range(#[case] value: f64) {
            assert_eq!(
                Percentage::new(value),
                Err(PercentageError::OutOfRange(value))
            );
        }

        #[rstest]
        fn test_percentage_from_str() {
            assert_eq!("23.5%".parse::<Percentage>().unwrap().percent(), 23.5);
            assert_eq!("90".parse::<Percentage>().unwrap().percent(), 90.);
            assert!("ninety".parse::<Percentage>().is_err());
        }

        #[rstest]
        fn test_percentage_deserialization_rejects_out_of_range() {
            assert!(serde_json::from_str::<Percentage>("120.0").is_err());
            assert_eq!(
                serde_json::from_str::<Percentage>("80.0").unwrap(),
                Percentage(80.)
            );
        }

        #[rstest]
        fn test_percentage_validates() {
            assert!(Percentage(40.).validate().is_ok());
        }
    }
}
