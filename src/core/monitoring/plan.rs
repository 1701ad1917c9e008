use crate::core::monitoring::measurement::{
    DailyWeather, EnergyReading, MeasurementType, MeasurementWindow,
};
use crate::core::units::Percentage;
use crate::errors::EngineError;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// IPMVP measurement and verification options.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum MvOption {
    /// Retrofit isolation with key parameter measurement.
    A,
    /// Retrofit isolation with all parameter measurement.
    B,
    /// Whole facility.
    C,
    /// Calibrated simulation.
    D,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeasurementFrequency {
    Hourly,
    Daily,
    Monthly,
}

impl MvOption {
    /// Required measurement accuracy, as a +/- percentage.
    pub fn default_accuracy(&self) -> f64 {
        match self {
            MvOption::A => 20.,
            MvOption::B | MvOption::D => 10.,
            MvOption::C => 5.,
        }
    }

    pub fn measurement_frequency(&self) -> MeasurementFrequency {
        match self {
            MvOption::A | MvOption::D => MeasurementFrequency::Monthly,
            MvOption::B => MeasurementFrequency::Daily,
            MvOption::C => MeasurementFrequency::Hourly,
        }
    }
}

/// The agreed basis for verifying the savings of a retrofit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MvPlan {
    pub option: MvOption,
    pub baseline: MeasurementWindow,
    pub measurement_types: Vec<MeasurementType>,
    /// Expected savings per measurement type over the reporting period, in kWh.
    pub savings_targets: IndexMap<MeasurementType, f64>,
    /// Overrides the accuracy implied by the option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_requirement: Option<Percentage>,
    #[serde(default)]
    pub baseline_weather: Vec<DailyWeather>,
}

impl MvPlan {
    pub fn new(
        option: MvOption,
        baseline: MeasurementWindow,
        savings_targets: IndexMap<MeasurementType, f64>,
    ) -> Self {
        Self {
            option,
            baseline,
            measurement_types: savings_targets.keys().copied().collect(),
            savings_targets,
            accuracy_requirement: None,
            baseline_weather: vec![],
        }
    }

    pub fn accuracy_requirement(&self) -> f64 {
        self.accuracy_requirement
            .map_or(self.option.default_accuracy(), |accuracy| accuracy.percent())
    }

    /// Missing targets count as zero, which leaves the achievement rate undefined.
    pub fn target_for(&self, measurement_type: MeasurementType) -> f64 {
        self.savings_targets
            .get(&measurement_type)
            .copied()
            .unwrap_or(0.)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.baseline.validate("mv_plan.baseline")?;
        if self.measurement_types.is_empty() {
            return Err(EngineError::invalid_input(
                "mv_plan.measurement_types",
                "at least one measurement type is required",
            ));
        }
        for (measurement_type, target) in &self.savings_targets {
            if !target.is_finite() {
                return Err(EngineError::invalid_input(
                    format!("mv_plan.savings_targets[{measurement_type}]"),
                    "must be a finite number",
                ));
            }
        }
        Ok(())
    }
}

/// Post-retrofit readings over a reporting window `[start, end)`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportingPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub readings: Vec<EnergyReading>,
    #[serde(default)]
    pub weather: Vec<DailyWeather>,
}

impl ReportingPeriod {
    pub fn new(window: MeasurementWindow, readings: Vec<EnergyReading>) -> Self {
        Self {
            start: window.start,
            end: window.end,
            readings,
            weather: vec![],
        }
    }

    pub fn window(&self) -> MeasurementWindow {
        MeasurementWindow::new(self.start, self.end)
    }

    pub(crate) fn validate(&self, plan: &MvPlan) -> Result<(), EngineError> {
        let window = self.window();
        window.validate("reporting_period")?;
        if window.overlaps(&plan.baseline) {
            return Err(EngineError::invalid_input(
                "reporting_period",
                "must not overlap the baseline window",
            ));
        }
        Ok(())
    }
}
