// Statistics over metered consumption series, used by the M&V trend analysis.
use anyhow::anyhow;
use polyfit_rs::polyfit_rs::polyfit;
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Arithmetic mean, or `None` for an empty series.
pub fn mean(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }

    Some(numbers.mean())
}

/// Percentile of a consumption series, interpolating between neighbouring values.
pub fn percentile(numbers: &[f64], percentile: usize) -> f64 {
    let mut data = Data::new(numbers.to_vec());

    data.percentile(percentile)
}

/// Least-squares slope of a series against its index (0, 1, 2, ...).
///
/// Fewer than two points do not define a slope.
pub fn linear_trend_slope(series: &[f64]) -> anyhow::Result<f64> {
    if series.len() < 2 {
        return Err(anyhow!(
            "At least two points are needed for a trend, got {}",
            series.len()
        ));
    }
    let x_values = (0..series.len()).map(|i| i as f64).collect::<Vec<_>>();
    let coefficients = polyfit(&x_values, series, 1).map_err(|e| anyhow!(e))?;

    coefficients
        .get(1)
        .copied()
        .ok_or_else(|| anyhow!("Linear fit returned no slope coefficient"))
}
