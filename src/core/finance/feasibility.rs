use crate::compare_floats::{guarded_ratio, is_effectively_zero};
use crate::core::finance::cash_flow::{
    npv_at_rate, project_cash_flows, validate_annual_savings, validate_investment,
    CashFlowProjection, FinancialParameters,
};
use crate::core::solvers::bracketed_root;
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const IRR_LOWER_BOUND: f64 = -0.99;
const IRR_UPPER_BOUND: f64 = 10.0;
const IRR_SCAN_STEPS: usize = 1000;
const IRR_TOLERANCE: f64 = 1e-10;
const IRR_MAX_ITERATIONS: usize = 100;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Payback {
    Years { years: f64 },
    /// The savings never repay the investment.
    Infinite,
}

impl Payback {
    pub fn years(&self) -> Option<f64> {
        match self {
            Payback::Years { years } => Some(*years),
            Payback::Infinite => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InternalRateOfReturn {
    Rate { rate: f64 },
    Undefined { reason: String },
}

impl InternalRateOfReturn {
    pub fn rate(&self) -> Option<f64> {
        match self {
            InternalRateOfReturn::Rate { rate } => Some(*rate),
            InternalRateOfReturn::Undefined { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BreakEven {
    Year { year: u32 },
    BeyondHorizon,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FeasibilityResult {
    pub investment: f64,
    pub annual_savings: f64,
    pub discount_rate: f64,
    pub horizon_years: u32,
    pub simple_payback: Payback,
    /// Payback on discounted cash flows, interpolated within the year it is reached.
    pub discounted_payback: Payback,
    pub npv: f64,
    pub irr: InternalRateOfReturn,
    /// Present value of the savings per unit invested; undefined without investment.
    pub profitability_index: Option<f64>,
    pub break_even: BreakEven,
    pub cash_flows: Vec<CashFlowProjection>,
}

pub fn simple_payback(investment: f64, annual_savings: f64) -> Payback {
    if annual_savings <= 0. {
        return Payback::Infinite;
    }
    Payback::Years {
        years: investment / annual_savings,
    }
}

/// Discount rate at which the investment's NPV is zero, searched between -99% and +1000%.
pub fn internal_rate_of_return(
    investment: f64,
    annual_savings: f64,
    parameters: &FinancialParameters,
) -> InternalRateOfReturn {
    let result = bracketed_root(
        |rate| npv_at_rate(investment, annual_savings, parameters, rate),
        IRR_LOWER_BOUND,
        IRR_UPPER_BOUND,
        IRR_SCAN_STEPS,
        IRR_TOLERANCE,
        IRR_MAX_ITERATIONS,
    );

    match result {
        Ok(rate) => InternalRateOfReturn::Rate { rate },
        Err(error) => {
            debug!(%error, "internal rate of return is undefined");
            InternalRateOfReturn::Undefined {
                reason: error.to_string(),
            }
        }
    }
}

fn discounted_payback(investment: f64, cash_flows: &[CashFlowProjection]) -> Payback {
    if is_effectively_zero(investment) {
        return Payback::Years { years: 0. };
    }
    let mut previous_npv = -investment;
    for flow in cash_flows {
        if flow.cumulative_npv >= 0. {
            let fraction = guarded_ratio(-previous_npv, flow.discounted_saving).unwrap_or(1.);
            return Payback::Years {
                years: (flow.year - 1) as f64 + fraction,
            };
        }
        previous_npv = flow.cumulative_npv;
    }
    Payback::Infinite
}

fn break_even(investment: f64, cash_flows: &[CashFlowProjection]) -> BreakEven {
    if investment <= 0. {
        return BreakEven::Year { year: 0 };
    }
    cash_flows
        .iter()
        .find(|flow| flow.cumulative_npv >= 0.)
        .map_or(BreakEven::BeyondHorizon, |flow| BreakEven::Year { year: flow.year })
}

/// Full discounted cash-flow appraisal of an investment returning `annual_savings` a year.
pub fn analyze_feasibility_with(
    investment: f64,
    annual_savings: f64,
    parameters: &FinancialParameters,
) -> Result<FeasibilityResult, EngineError> {
    validate_investment(investment)?;
    validate_annual_savings(annual_savings)?;
    parameters.validate()?;

    let cash_flows = project_cash_flows(investment, annual_savings, parameters);
    let npv = cash_flows
        .last()
        .map_or(-investment, |flow| flow.cumulative_npv);
    let present_value_of_savings = npv + investment;

    Ok(FeasibilityResult {
        investment,
        annual_savings,
        discount_rate: parameters.discount_rate,
        horizon_years: parameters.horizon_years,
        simple_payback: simple_payback(investment, annual_savings),
        discounted_payback: discounted_payback(investment, &cash_flows),
        npv,
        irr: internal_rate_of_return(investment, annual_savings, parameters),
        profitability_index: guarded_ratio(present_value_of_savings, investment),
        break_even: break_even(investment, &cash_flows),
        cash_flows,
    })
}

/// Appraisal with constant savings, no price escalation and no maintenance.
pub fn analyze_feasibility(
    investment: f64,
    annual_savings: f64,
    horizon_years: u32,
    discount_rate: f64,
) -> Result<FeasibilityResult, EngineError> {
    analyze_feasibility_with(
        investment,
        annual_savings,
        &FinancialParameters::new(discount_rate, horizon_years),
    )
}
