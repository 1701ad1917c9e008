use crate::errors::EngineError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISCOUNT_RATE: f64 = 0.05;
pub const DEFAULT_HORIZON_YEARS: u32 = 20;

/// Parameters of a discounted cash-flow analysis. Rates are fractions (0.05 = 5%).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FinancialParameters {
    pub discount_rate: f64,
    pub horizon_years: u32,
    /// Yearly growth of the value of the savings, from the second year on.
    pub energy_price_escalation: f64,
    /// Yearly maintenance cost as a share of the investment.
    pub maintenance_rate: f64,
}

impl Default for FinancialParameters {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            horizon_years: DEFAULT_HORIZON_YEARS,
            energy_price_escalation: 0.,
            maintenance_rate: 0.,
        }
    }
}

impl FinancialParameters {
    pub fn new(discount_rate: f64, horizon_years: u32) -> Self {
        Self {
            discount_rate,
            horizon_years,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.discount_rate.is_finite() && self.discount_rate > -1.) {
            return Err(EngineError::invalid_input(
                "discount_rate",
                format!("must be greater than -100%, got {}", self.discount_rate),
            ));
        }
        if self.horizon_years == 0 {
            return Err(EngineError::invalid_input(
                "horizon_years",
                "must be at least one year",
            ));
        }
        if !(self.energy_price_escalation.is_finite() && self.energy_price_escalation > -1.) {
            return Err(EngineError::invalid_input(
                "energy_price_escalation",
                format!("must be greater than -100%, got {}", self.energy_price_escalation),
            ));
        }
        if !(self.maintenance_rate.is_finite() && self.maintenance_rate >= 0.) {
            return Err(EngineError::invalid_input(
                "maintenance_rate",
                format!("must not be negative, got {}", self.maintenance_rate),
            ));
        }
        Ok(())
    }

    /// Net money saved in a year (1-based), before discounting.
    pub(crate) fn net_cash_flow(&self, investment: f64, annual_savings: f64, year: u32) -> f64 {
        annual_savings * (1. + self.energy_price_escalation).powi(year as i32 - 1)
            - investment * self.maintenance_rate
    }
}

pub(crate) fn validate_investment(investment: f64) -> Result<(), EngineError> {
    if !(investment.is_finite() && investment >= 0.) {
        return Err(EngineError::invalid_input(
            "investment",
            format!("must not be negative, got {investment}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_annual_savings(annual_savings: f64) -> Result<(), EngineError> {
    if !annual_savings.is_finite() {
        return Err(EngineError::invalid_input(
            "annual_savings",
            "must be a finite number",
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CashFlowProjection {
    pub year: u32,
    pub nominal_saving: f64,
    pub maintenance_cost: f64,
    pub net_cash_flow: f64,
    pub discounted_saving: f64,
    pub cumulative_undiscounted: f64,
    pub cumulative_npv: f64,
}

/// Year-by-year cash flows for years 1 to the horizon, with the investment made in year 0.
pub fn project_cash_flows(
    investment: f64,
    annual_savings: f64,
    parameters: &FinancialParameters,
) -> Vec<CashFlowProjection> {
    let maintenance_cost = investment * parameters.maintenance_rate;
    let mut cumulative_undiscounted = -investment;
    let mut cumulative_npv = -investment;

    (1..=parameters.horizon_years)
        .map(|year| {
            let net_cash_flow = parameters.net_cash_flow(investment, annual_savings, year);
            let discounted_saving =
                net_cash_flow / (1. + parameters.discount_rate).powi(year as i32);
            cumulative_undiscounted += net_cash_flow;
            cumulative_npv += discounted_saving;

            CashFlowProjection {
                year,
                nominal_saving: net_cash_flow + maintenance_cost,
                maintenance_cost,
                net_cash_flow,
                discounted_saving,
                cumulative_undiscounted,
                cumulative_npv,
            }
        })
        .collect()
}

/// Net present value of the investment at an arbitrary discount rate.
pub fn npv_at_rate(
    investment: f64,
    annual_savings: f64,
    parameters: &FinancialParameters,
    rate: f64,
) -> f64 {
    (1..=parameters.horizon_years).fold(-investment, |npv, year| {
        npv + parameters.net_cash_flow(investment, annual_savings, year)
            / (1. + rate).powi(year as i32)
    })
}
