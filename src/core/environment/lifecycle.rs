use crate::compare_floats::clamp_non_negative;
use crate::core::finance::feasibility::{simple_payback, Payback};
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

/// Years of operational savings needed to offset the embodied emissions of a renovation.
///
/// Embodied emissions at or below zero are offset immediately.
pub fn environmental_payback(embodied: f64, annual_savings: f64) -> Payback {
    simple_payback(clamp_non_negative(embodied), annual_savings)
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LifecycleYear {
    pub year: u32,
    /// kg CO2e still to be offset at the end of the year; negative once in net benefit.
    pub cumulative_impact: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LifecycleAssessment {
    pub embodied: f64,
    pub annual_operational_savings: f64,
    pub horizon_years: u32,
    pub total_operational_savings: f64,
    pub yearly: Vec<LifecycleYear>,
    /// First year the cumulative impact reaches zero, or the horizon if it never does.
    pub carbon_payback_year: u32,
    pub payback_reached: bool,
    pub net_lifecycle_impact: f64,
}

pub fn lifecycle_assessment(
    embodied: f64,
    annual_operational_savings: f64,
    horizon_years: u32,
) -> Result<LifecycleAssessment, EngineError> {
    if horizon_years == 0 {
        return Err(EngineError::invalid_input(
            "lifespan_years",
            "must be at least one year",
        ));
    }
    if !(embodied.is_finite() && annual_operational_savings.is_finite()) {
        return Err(EngineError::invalid_input(
            "annual_operational_savings",
            "embodied emissions and savings must be finite numbers",
        ));
    }

    let yearly = (1..=horizon_years)
        .scan(embodied, |cumulative_impact, year| {
            *cumulative_impact -= annual_operational_savings;
            Some(LifecycleYear {
                year,
                cumulative_impact: *cumulative_impact,
            })
        })
        .collect::<Vec<_>>();
    let payback = yearly.iter().find(|entry| entry.cumulative_impact <= 0.);
    let total_operational_savings = annual_operational_savings * horizon_years as f64;

    Ok(LifecycleAssessment {
        embodied,
        annual_operational_savings,
        horizon_years,
        total_operational_savings,
        carbon_payback_year: payback.map_or(horizon_years, |entry| entry.year),
        payback_reached: payback.is_some(),
        net_lifecycle_impact: embodied - total_operational_savings,
        yearly,
    })
}
