use crate::core::units::SECONDS_PER_DAY;
use crate::errors::EngineError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter};

const HEATING_BASE_TEMPERATURE: f64 = 15.; // deg C
const COOLING_BASE_TEMPERATURE: f64 = 24.; // deg C

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeasurementType {
    Electricity,
    #[serde(alias = "natural_gas")]
    Gas,
    Heating,
    HotWater,
    Cooling,
    TotalEnergy,
}

impl MeasurementType {
    /// Whether consumption of this type follows heating or cooling degree days.
    pub fn weather_dependence(&self) -> Option<DegreeDayBasis> {
        match self {
            MeasurementType::Heating | MeasurementType::Gas => Some(DegreeDayBasis::Heating),
            MeasurementType::Cooling => Some(DegreeDayBasis::Cooling),
            MeasurementType::Electricity
            | MeasurementType::HotWater
            | MeasurementType::TotalEnergy => None,
        }
    }
}

impl FromStr for MeasurementType {
    type Err = EngineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag.trim().to_ascii_lowercase().as_str() {
            "electricity" => Self::Electricity,
            "gas" | "natural_gas" => Self::Gas,
            "heating" => Self::Heating,
            "hot_water" => Self::HotWater,
            "cooling" => Self::Cooling,
            "total_energy" => Self::TotalEnergy,
            _ => {
                return Err(EngineError::invalid_input(
                    "measurement_type",
                    format!("unknown measurement type '{tag}'"),
                ))
            }
        })
    }
}

fn default_unit() -> String {
    "kWh".into()
}

/// A single metered value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnergyReading {
    pub timestamp: NaiveDateTime,
    pub measurement_type: MeasurementType,
    pub value: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl EnergyReading {
    pub fn new(timestamp: NaiveDateTime, measurement_type: MeasurementType, value: f64) -> Self {
        Self {
            timestamp,
            measurement_type,
            value,
            unit: default_unit(),
            meter_id: None,
            location: None,
        }
    }

    pub(crate) fn validate(&self, field: &str) -> Result<(), EngineError> {
        if !(self.value.is_finite() && self.value >= 0.) {
            return Err(EngineError::invalid_input(
                format!("{field}.value"),
                format!("must not be negative, got {}", self.value),
            ));
        }
        Ok(())
    }
}

/// A half-open time window `[start, end)`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeasurementWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MeasurementWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub(crate) fn validate(&self, field: &str) -> Result<(), EngineError> {
        if self.start >= self.end {
            return Err(EngineError::invalid_input(
                field,
                format!("start {} must be before end {}", self.start, self.end),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    pub fn overlaps(&self, other: &MeasurementWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Elapsed time in (fractional) days.
    pub fn duration_days(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / SECONDS_PER_DAY as f64
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DegreeDayBasis {
    Heating,
    Cooling,
}

/// Mean outdoor temperature on one day.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub average_temperature: f64,
}

pub fn degree_days(weather: &[DailyWeather], basis: DegreeDayBasis) -> f64 {
    weather
        .iter()
        .map(|day| match basis {
            DegreeDayBasis::Heating => HEATING_BASE_TEMPERATURE - day.average_temperature,
            DegreeDayBasis::Cooling => day.average_temperature - COOLING_BASE_TEMPERATURE,
        })
        .filter(|excess| *excess > 0.)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[rstest]
    fn should_accept_natural_gas_as_alias_for_gas() {
        assert_eq!(
            serde_json::from_str::<MeasurementType>("\"natural_gas\"").unwrap(),
            MeasurementType::Gas
        );
        assert_eq!("natural_gas".parse::<MeasurementType>().unwrap(), MeasurementType::Gas);
        assert!("steam".parse::<MeasurementType>().is_err());
    }

    #[rstest]
    fn should_treat_window_as_half_open() {
        let window = MeasurementWindow::new(at(2023, 1, 1), at(2024, 1, 1));

        assert!(window.contains(at(2023, 1, 1)));
        assert!(window.contains(at(2023, 12, 31)));
        assert!(!window.contains(at(2024, 1, 1)));
        assert_eq!(window.duration_days(), 365.);
    }

    #[rstest]
    fn should_not_count_touching_windows_as_overlapping() {
        let first = MeasurementWindow::new(at(2023, 1, 1), at(2024, 1, 1));
        let second = MeasurementWindow::new(at(2024, 1, 1), at(2025, 1, 1));
        let third = MeasurementWindow::new(at(2023, 6, 1), at(2024, 6, 1));

        assert!(!first.overlaps(&second));
        assert!(first.overlaps(&third));
        assert!(third.overlaps(&second));
    }

    #[rstest]
    fn should_reject_inverted_window() {
        let window = MeasurementWindow::new(at(2024, 1, 1), at(2023, 1, 1));
        assert!(matches!(
            window.validate("baseline"),
            Err(EngineError::InvalidInput { field, .. }) if field == "baseline"
        ));
    }

    #[rstest]
    fn should_sum_degree_days_above_and_below_base() {
        let weather = [5., 14., 20., 27.]
            .iter()
            .enumerate()
            .map(|(day, temperature)| DailyWeather {
                date: NaiveDate::from_ymd_opt(2023, 1, day as u32 + 1).unwrap(),
                average_temperature: *temperature,
            })
            .collect::<Vec<_>>();

        assert_eq!(degree_days(&weather, DegreeDayBasis::Heating), 11.);
        assert_eq!(degree_days(&weather, DegreeDayBasis::Cooling), 3.);
    }

    #[rstest]
    fn should_reject_negative_reading() {
        let reading = EnergyReading::new(at(2023, 3, 1), MeasurementType::Electricity, -5.);
        assert!(reading.validate("readings[0]").is_err());
    }
}
