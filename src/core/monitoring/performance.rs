use crate::compare_floats::guarded_ratio;
use crate::core::monitoring::economics::{
    economic_performance, EconomicPerformance, MeasurementPrices,
};
use crate::core::monitoring::measurement::{
    degree_days, DegreeDayBasis, EnergyReading, MeasurementType, MeasurementWindow,
};
use crate::core::monitoring::plan::{MvOption, MvPlan, ReportingPeriod};
use crate::core::monitoring::trends::{analyze_trends, TrendAnalysis};
use crate::errors::EngineError;
use crate::statistics::mean;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, instrument};

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PerformanceStatus {
    /// At least 110% of the target.
    Exceeded,
    /// 90% up to 110%.
    Achieved,
    /// 50% up to 90%.
    Underperforming,
    /// Below 50%.
    Failed,
    /// No savings target to measure against.
    Undefined,
    /// No readings of this type in the baseline or the reporting window.
    InsufficientData,
}

impl PerformanceStatus {
    pub fn from_achievement_rate(rate: f64) -> Self {
        if rate >= 110. {
            Self::Exceeded
        } else if rate >= 90. {
            Self::Achieved
        } else if rate >= 50. {
            Self::Underperforming
        } else {
            Self::Failed
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AchievementRate {
    /// Actual savings as a percentage of the target.
    Rate { percent: f64 },
    Undefined { reason: String },
}

impl AchievementRate {
    pub fn percent(&self) -> Option<f64> {
        match self {
            AchievementRate::Rate { percent } => Some(*percent),
            AchievementRate::Undefined { .. } => None,
        }
    }
}

/// How the baseline was brought onto the same footing as the reporting period.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Normalisation {
    DegreeDays { basis: DegreeDayBasis, factor: f64 },
    PeriodLength { factor: f64 },
}

impl Normalisation {
    pub fn factor(&self) -> f64 {
        match self {
            Normalisation::DegreeDays { factor, .. } | Normalisation::PeriodLength { factor } => {
                *factor
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub baseline_readings: usize,
    pub reporting_readings: usize,
    pub baseline_consumption: f64,
    pub normalised_baseline: f64,
    pub reporting_consumption: f64,
    pub raw_savings: f64,
    pub normalised_savings: f64,
    /// Normalised savings as a share of the baseline; undefined without baseline use.
    pub savings_percentage: Option<f64>,
    pub normalisation: Normalisation,
}

impl SavingsSummary {
    fn has_data(&self) -> bool {
        self.baseline_readings > 0 && self.reporting_readings > 0
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PerformanceAssessment {
    pub measurement_type: MeasurementType,
    pub target_savings: f64,
    /// Normalised savings, zero when there is insufficient data.
    pub actual_savings: f64,
    pub achievement_rate: AchievementRate,
    pub status: PerformanceStatus,
    pub savings: SavingsSummary,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OverallPerformance {
    /// Mean of the defined achievement rates.
    pub average_achievement_rate: Option<f64>,
    pub total_energy_savings: f64,
    pub total_baseline_consumption: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub mv_option: MvOption,
    pub accuracy_requirement: f64,
    pub baseline: MeasurementWindow,
    pub reporting: MeasurementWindow,
    pub reporting_days: f64,
    pub assessments: IndexMap<MeasurementType, PerformanceAssessment>,
    pub overall: OverallPerformance,
    pub economics: EconomicPerformance,
    pub trends: TrendAnalysis,
    /// Readings that fell outside both windows.
    pub ignored_readings: usize,
    pub recommendations: Vec<String>,
}

#[derive(Default)]
struct WindowTotals {
    readings: usize,
    consumption: f64,
}

/// Measurement and verification of retrofit savings against a plan.
#[derive(Clone, Debug, Default)]
pub struct PerformanceEngine {
    prices: MeasurementPrices,
}

impl PerformanceEngine {
    pub fn new(prices: MeasurementPrices) -> Result<Self, EngineError> {
        prices.validate()?;
        Ok(Self { prices })
    }

    #[instrument(skip_all)]
    pub fn generate_performance_report(
        &self,
        plan: &MvPlan,
        baseline_readings: &[EnergyReading],
        reporting_period: &ReportingPeriod,
    ) -> Result<PerformanceReport, EngineError> {
        plan.validate()?;
        reporting_period.validate(plan)?;
        let reporting_window = reporting_period.window();
        for (index, reading) in baseline_readings.iter().enumerate() {
            reading.validate(&format!("baseline_readings[{index}]"))?;
        }
        for (index, reading) in reporting_period.readings.iter().enumerate() {
            reading.validate(&format!("reporting_period.readings[{index}]"))?;
        }

        let mut baseline_totals: IndexMap<MeasurementType, WindowTotals> = IndexMap::new();
        let mut reporting_totals: IndexMap<MeasurementType, WindowTotals> = IndexMap::new();
        let mut ignored_readings = 0;
        for reading in baseline_readings.iter().chain(&reporting_period.readings) {
            let totals = if plan.baseline.contains(reading.timestamp) {
                &mut baseline_totals
            } else if reporting_window.contains(reading.timestamp) {
                &mut reporting_totals
            } else {
                ignored_readings += 1;
                continue;
            };
            let entry = totals.entry(reading.measurement_type).or_default();
            entry.readings += 1;
            entry.consumption += reading.value;
        }
        if ignored_readings > 0 {
            debug!(ignored_readings, "readings outside the baseline and reporting windows");
        }

        let assessments = plan
            .measurement_types
            .iter()
            .map(|measurement_type| {
                let savings = self.savings_summary(
                    *measurement_type,
                    plan,
                    reporting_period,
                    baseline_totals.get(measurement_type),
                    reporting_totals.get(measurement_type),
                );
                (*measurement_type, assess(*measurement_type, plan, savings))
            })
            .collect::<IndexMap<_, _>>();

        let measured = || {
            assessments
                .values()
                .filter(|assessment| assessment.status != PerformanceStatus::InsufficientData)
        };
        let defined_rates = assessments
            .values()
            .filter_map(|assessment| assessment.achievement_rate.percent())
            .collect::<Vec<_>>();
        let overall = OverallPerformance {
            average_achievement_rate: mean(&defined_rates),
            total_energy_savings: measured().map(|assessment| assessment.actual_savings).sum(),
            total_baseline_consumption: measured()
                .map(|assessment| assessment.savings.baseline_consumption)
                .sum(),
        };
        let economics = economic_performance(
            measured().map(|assessment| (assessment.measurement_type, assessment.actual_savings)),
            &self.prices,
        );

        Ok(PerformanceReport {
            mv_option: plan.option,
            accuracy_requirement: plan.accuracy_requirement(),
            baseline: plan.baseline,
            reporting: reporting_window,
            reporting_days: reporting_window.duration_days(),
            recommendations: recommendations(&assessments),
            trends: analyze_trends(&reporting_period.readings, &reporting_window),
            assessments,
            overall,
            economics,
            ignored_readings,
        })
    }

    fn savings_summary(
        &self,
        measurement_type: MeasurementType,
        plan: &MvPlan,
        reporting_period: &ReportingPeriod,
        baseline: Option<&WindowTotals>,
        reporting: Option<&WindowTotals>,
    ) -> SavingsSummary {
        let empty = WindowTotals::default();
        let baseline = baseline.unwrap_or(&empty);
        let reporting = reporting.unwrap_or(&empty);

        let normalisation = measurement_type
            .weather_dependence()
            .and_then(|basis| {
                let factor = guarded_ratio(
                    degree_days(&reporting_period.weather, basis),
                    degree_days(&plan.baseline_weather, basis),
                )?;
                (factor > 0.).then_some(Normalisation::DegreeDays { basis, factor })
            })
            .unwrap_or_else(|| Normalisation::PeriodLength {
                factor: guarded_ratio(
                    reporting_period.window().duration_days(),
                    plan.baseline.duration_days(),
                )
                .unwrap_or(1.),
            });

        let normalised_baseline = baseline.consumption * normalisation.factor();
        let normalised_savings = normalised_baseline - reporting.consumption;
        SavingsSummary {
            baseline_readings: baseline.readings,
            reporting_readings: reporting.readings,
            baseline_consumption: baseline.consumption,
            normalised_baseline,
            reporting_consumption: reporting.consumption,
            raw_savings: baseline.consumption - reporting.consumption,
            normalised_savings,
            savings_percentage: guarded_ratio(normalised_savings, baseline.consumption)
                .map(|ratio| ratio * 100.),
            normalisation,
        }
    }
}

fn assess(
    measurement_type: MeasurementType,
    plan: &MvPlan,
    savings: SavingsSummary,
) -> PerformanceAssessment {
    let target_savings = plan.target_for(measurement_type);
    if !savings.has_data() {
        return PerformanceAssessment {
            measurement_type,
            target_savings,
            actual_savings: 0.,
            achievement_rate: AchievementRate::Undefined {
                reason: "no readings in the baseline or reporting window".into(),
            },
            status: PerformanceStatus::InsufficientData,
            savings,
        };
    }

    let actual_savings = savings.normalised_savings;
    let (achievement_rate, status) = match guarded_ratio(actual_savings, target_savings) {
        Some(ratio) if target_savings > 0. => {
            let percent = ratio * 100.;
            (
                AchievementRate::Rate { percent },
                PerformanceStatus::from_achievement_rate(percent),
            )
        }
        _ => (
            AchievementRate::Undefined {
                reason: format!("savings target is {target_savings}"),
            },
            PerformanceStatus::Undefined,
        ),
    };

    PerformanceAssessment {
        measurement_type,
        target_savings,
        actual_savings,
        achievement_rate,
        status,
        savings,
    }
}

fn recommendations(assessments: &IndexMap<MeasurementType, PerformanceAssessment>) -> Vec<String> {
    assessments
        .values()
        .filter_map(|assessment| {
            let measurement_type = assessment.measurement_type;
            let rate = assessment.achievement_rate.percent().unwrap_or_default();
            match assessment.status {
                PerformanceStatus::Failed => Some(format!(
                    "{measurement_type}: savings reach only {rate:.1}% of the target; review the measures urgently"
                )),
                PerformanceStatus::Underperforming => Some(format!(
                    "{measurement_type}: savings at {rate:.1}% of the target; check and tune the installed systems"
                )),
                PerformanceStatus::Exceeded => Some(format!(
                    "{measurement_type}: savings at {rate:.1}% of the target; consider repeating the approach elsewhere"
                )),
                PerformanceStatus::InsufficientData => Some(format!(
                    "{measurement_type}: no metered data in one of the windows; check metering"
                )),
                PerformanceStatus::Achieved | PerformanceStatus::Undefined => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monitoring::measurement::DailyWeather;
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn year_window(year: i32) -> MeasurementWindow {
        MeasurementWindow::new(at(year, 1, 1), at(year + 1, 1, 1))
    }

    /// Spread an annual total evenly over twelve monthly readings.
    fn monthly_readings(year: i32, measurement_type: MeasurementType, annual: f64) -> Vec<EnergyReading> {
        (1..=12)
            .map(|month| EnergyReading::new(at(year, month, 15), measurement_type, annual / 12.))
            .collect()
    }

    #[fixture]
    fn plan() -> MvPlan {
        MvPlan::new(
            MvOption::C,
            year_window(2022),
            IndexMap::from([(MeasurementType::Electricity, 1500.)]),
        )
    }

    #[fixture]
    fn engine() -> PerformanceEngine {
        PerformanceEngine::default()
    }

    #[rstest]
    fn should_report_achieved_savings(engine: PerformanceEngine, plan: MvPlan) {
        // 2022 and 2023 both have 365 days
        let period = ReportingPeriod::new(
            year_window(2023),
            monthly_readings(2023, MeasurementType::Electricity, 2800.),
        );
        let report = engine
            .generate_performance_report(
                &plan,
                &monthly_readings(2022, MeasurementType::Electricity, 4200.),
                &period,
            )
            .unwrap();

        let assessment = &report.assessments[&MeasurementType::Electricity];
        assert_relative_eq!(assessment.actual_savings, 1400., max_relative = 1e-9);
        assert_relative_eq!(
            assessment.achievement_rate.percent().unwrap(),
            93.333333,
            max_relative = 1e-6
        );
        assert_eq!(assessment.status, PerformanceStatus::Achieved);
        assert_relative_eq!(report.overall.total_energy_savings, 1400., max_relative = 1e-9);
        assert_relative_eq!(report.economics.total_cost_savings, 210., max_relative = 1e-9);
        assert_eq!(report.accuracy_requirement, 5.);
        assert_eq!(report.trends.months_analysed, 12);
    }

    #[rstest]
    fn should_normalise_baseline_to_reporting_length(engine: PerformanceEngine, plan: MvPlan) {
        let half_year = MeasurementWindow::new(at(2023, 1, 1), at(2023, 7, 2));
        let period = ReportingPeriod::new(
            half_year,
            vec![EnergyReading::new(at(2023, 3, 1), MeasurementType::Electricity, 1500.)],
        );
        let report = engine
            .generate_performance_report(
                &plan,
                &[EnergyReading::new(at(2022, 5, 1), MeasurementType::Electricity, 4380.)],
                &period,
            )
            .unwrap();

        let savings = &report.assessments[&MeasurementType::Electricity].savings;
        assert_eq!(
            savings.normalisation,
            Normalisation::PeriodLength { factor: 182. / 365. }
        );
        assert_relative_eq!(savings.normalised_baseline, 2184., max_relative = 1e-9);
        assert_relative_eq!(savings.normalised_savings, 684., max_relative = 1e-9);
        assert_eq!(savings.raw_savings, 2880.);
    }

    #[rstest]
    fn should_normalise_heating_by_degree_days(engine: PerformanceEngine) {
        let mut plan = MvPlan::new(
            MvOption::B,
            year_window(2022),
            IndexMap::from([(MeasurementType::Heating, 2000.)]),
        );
        let day = |year, temperature| DailyWeather {
            date: NaiveDate::from_ymd_opt(year, 1, 10).unwrap(),
            average_temperature: temperature,
        };
        plan.baseline_weather = vec![day(2022, -5.)];
        let mut period = ReportingPeriod::new(
            year_window(2023),
            vec![EnergyReading::new(at(2023, 1, 10), MeasurementType::Heating, 6000.)],
        );
        period.weather = vec![day(2023, 5.)];

        let report = engine
            .generate_performance_report(
                &plan,
                &[EnergyReading::new(at(2022, 1, 10), MeasurementType::Heating, 10000.)],
                &period,
            )
            .unwrap();

        let assessment = &report.assessments[&MeasurementType::Heating];
        // the reporting winter was half as cold: 10 against 20 degree days
        assert_eq!(
            assessment.savings.normalisation,
            Normalisation::DegreeDays {
                basis: DegreeDayBasis::Heating,
                factor: 0.5
            }
        );
        assert_eq!(assessment.actual_savings, -1000.);
        assert_eq!(assessment.status, PerformanceStatus::Failed);
    }

    #[rstest]
    fn should_flag_insufficient_data_for_unmetered_type(engine: PerformanceEngine, mut plan: MvPlan) {
        plan.measurement_types.push(MeasurementType::Gas);
        plan.savings_targets.insert(MeasurementType::Gas, 3000.);
        let period = ReportingPeriod::new(
            year_window(2023),
            monthly_readings(2023, MeasurementType::Electricity, 2800.),
        );
        let report = engine
            .generate_performance_report(
                &plan,
                &monthly_readings(2022, MeasurementType::Electricity, 4200.),
                &period,
            )
            .unwrap();

        let gas = &report.assessments[&MeasurementType::Gas];
        assert_eq!(gas.status, PerformanceStatus::InsufficientData);
        assert_eq!(gas.actual_savings, 0.);
        assert_eq!(gas.achievement_rate.percent(), None);
        assert_relative_eq!(
            report.overall.average_achievement_rate.unwrap(),
            93.333333,
            max_relative = 1e-6
        );
        assert!(!report.economics.by_type.contains_key(&MeasurementType::Gas));
    }

    #[rstest]
    fn should_leave_rate_undefined_for_zero_target(engine: PerformanceEngine) {
        let plan = MvPlan::new(
            MvOption::A,
            year_window(2022),
            IndexMap::from([(MeasurementType::Cooling, 0.)]),
        );
        let period = ReportingPeriod::new(
            year_window(2023),
            vec![EnergyReading::new(at(2023, 7, 1), MeasurementType::Cooling, 300.)],
        );
        let report = engine
            .generate_performance_report(
                &plan,
                &[EnergyReading::new(at(2022, 7, 1), MeasurementType::Cooling, 400.)],
                &period,
            )
            .unwrap();

        let cooling = &report.assessments[&MeasurementType::Cooling];
        assert_eq!(cooling.status, PerformanceStatus::Undefined);
        assert!(matches!(cooling.achievement_rate, AchievementRate::Undefined { .. }));
        assert_eq!(report.overall.average_achievement_rate, None);
    }

    #[rstest]
    fn should_ignore_readings_outside_both_windows(engine: PerformanceEngine, plan: MvPlan) {
        let mut baseline = monthly_readings(2022, MeasurementType::Electricity, 4200.);
        baseline.push(EnergyReading::new(at(2021, 6, 1), MeasurementType::Electricity, 9999.));
        let period = ReportingPeriod::new(
            year_window(2023),
            monthly_readings(2023, MeasurementType::Electricity, 2800.),
        );
        let report = engine
            .generate_performance_report(&plan, &baseline, &period)
            .unwrap();

        assert_eq!(report.ignored_readings, 1);
        assert_relative_eq!(
            report.assessments[&MeasurementType::Electricity]
                .savings
                .baseline_consumption,
            4200.,
            max_relative = 1e-9
        );
    }

    #[rstest]
    #[case(120., PerformanceStatus::Exceeded)]
    #[case(110., PerformanceStatus::Exceeded)]
    #[case(95., PerformanceStatus::Achieved)]
    #[case(60., PerformanceStatus::Underperforming)]
    #[case(49.9, PerformanceStatus::Failed)]
    fn should_bucket_achievement_rates(#[case] rate: f64, #[case] expected: PerformanceStatus) {
        assert_eq!(PerformanceStatus::from_achievement_rate(rate), expected);
    }

    #[rstest]
    fn should_reject_negative_reading(engine: PerformanceEngine, plan: MvPlan) {
        let period = ReportingPeriod::new(
            year_window(2023),
            vec![EnergyReading::new(at(2023, 2, 1), MeasurementType::Electricity, -1.)],
        );
        assert!(matches!(
            engine.generate_performance_report(&plan, &[], &period),
            Err(EngineError::InvalidInput { field, .. }) if field == "reporting_period.readings[0].value"
        ));
    }
}
