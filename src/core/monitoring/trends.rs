use crate::compare_floats::is_effectively_zero;
use crate::core::monitoring::measurement::{EnergyReading, MeasurementType, MeasurementWindow};
use crate::statistics::{linear_trend_slope, mean, percentile};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

const MINIMUM_MONTHS_FOR_TREND: usize = 3;

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ConsumptionTrend {
    /// Change in monthly consumption per month, from a least-squares fit.
    pub slope: f64,
    pub direction: TrendDirection,
    pub average_monthly_consumption: f64,
    pub median_monthly_consumption: f64,
    pub monthly_values: Vec<f64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TrendAnalysis {
    /// Totals per calendar month ("YYYY-MM"), in chronological order.
    pub monthly_totals: IndexMap<String, IndexMap<MeasurementType, f64>>,
    /// Only types with at least three months of data.
    pub trends: IndexMap<MeasurementType, ConsumptionTrend>,
    pub months_analysed: usize,
}

fn consumption_trend(monthly_values: Vec<f64>) -> Option<ConsumptionTrend> {
    if monthly_values.len() < MINIMUM_MONTHS_FOR_TREND {
        return None;
    }
    let slope = linear_trend_slope(&monthly_values).ok()?;
    let direction = if is_effectively_zero(slope) {
        TrendDirection::Stable
    } else if slope > 0. {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Some(ConsumptionTrend {
        slope,
        direction,
        average_monthly_consumption: mean(&monthly_values)?,
        median_monthly_consumption: percentile(&monthly_values, 50),
        monthly_values,
    })
}

/// Group readings inside `window` by month and fit a linear trend per measurement type.
pub fn analyze_trends(readings: &[EnergyReading], window: &MeasurementWindow) -> TrendAnalysis {
    let mut monthly_totals: IndexMap<String, IndexMap<MeasurementType, f64>> = IndexMap::new();
    for reading in readings
        .iter()
        .filter(|reading| window.contains(reading.timestamp))
        .sorted_by_key(|reading| reading.timestamp)
    {
        *monthly_totals
            .entry(reading.timestamp.format("%Y-%m").to_string())
            .or_default()
            .entry(reading.measurement_type)
            .or_insert(0.) += reading.value;
    }

    let trends = monthly_totals
        .values()
        .flat_map(|totals| totals.keys().copied())
        .unique()
        .sorted()
        .filter_map(|measurement_type| {
            let monthly_values = monthly_totals
                .values()
                .filter_map(|totals| totals.get(&measurement_type).copied())
                .collect::<Vec<_>>();
            consumption_trend(monthly_values).map(|trend| (measurement_type, trend))
        })
        .collect();

    TrendAnalysis {
        months_analysed: monthly_totals.len(),
        monthly_totals,
        trends,
    }
}
