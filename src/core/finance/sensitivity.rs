use crate::core::finance::cash_flow::{
    npv_at_rate, validate_annual_savings, validate_investment, FinancialParameters,
};
use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

const DISCOUNT_RATE_SHIFTS: [f64; 4] = [-0.02, -0.01, 0.01, 0.02];
const SCALE_FACTORS: [f64; 4] = [0.8, 0.9, 1.1, 1.2];

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensitivityParameter {
    DiscountRate,
    AnnualSavings,
    Investment,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SensitivityCase {
    pub parameter: SensitivityParameter,
    /// Variation applied, e.g. "+1pp" or "-20%".
    pub variation: String,
    /// Value of the varied parameter.
    pub value: f64,
    pub npv: f64,
    pub change: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SensitivityAnalysis {
    pub base_npv: f64,
    pub cases: Vec<SensitivityCase>,
}

impl SensitivityAnalysis {
    pub fn cases_for(&self, parameter: SensitivityParameter) -> impl Iterator<Item = &SensitivityCase> {
        self.cases
            .iter()
            .filter(move |case| case.parameter == parameter)
    }
}

/// How NPV responds to the discount rate, the savings and the investment cost moving
/// away from their base values.
pub fn sensitivity_analysis(
    investment: f64,
    annual_savings: f64,
    parameters: &FinancialParameters,
) -> Result<SensitivityAnalysis, EngineError> {
    validate_investment(investment)?;
    validate_annual_savings(annual_savings)?;
    parameters.validate()?;

    let base_rate = parameters.discount_rate;
    let base_npv = npv_at_rate(investment, annual_savings, parameters, base_rate);
    let case = |parameter, variation: String, value, npv: f64| SensitivityCase {
        parameter,
        variation,
        value,
        npv,
        change: npv - base_npv,
    };

    let rate_cases = DISCOUNT_RATE_SHIFTS
        .iter()
        .map(|shift| (shift, base_rate + shift))
        .filter(|(_, rate)| *rate > -1.)
        .map(|(shift, rate)| {
            case(
                SensitivityParameter::DiscountRate,
                format!("{:+.0}pp", shift * 100.),
                rate,
                npv_at_rate(investment, annual_savings, parameters, rate),
            )
        });
    let savings_cases = SCALE_FACTORS.iter().map(|factor| {
        let savings = annual_savings * factor;
        case(
            SensitivityParameter::AnnualSavings,
            format!("{:+.0}%", (factor - 1.) * 100.),
            savings,
            npv_at_rate(investment, savings, parameters, base_rate),
        )
    });
    let investment_cases = SCALE_FACTORS.iter().map(|factor| {
        let scaled_investment = investment * factor;
        case(
            SensitivityParameter::Investment,
            format!("{:+.0}%", (factor - 1.) * 100.),
            scaled_investment,
            npv_at_rate(scaled_investment, annual_savings, parameters, base_rate),
        )
    });

    Ok(SensitivityAnalysis {
        base_npv,
        cases: rate_cases
            .chain(savings_cases)
            .chain(investment_cases)
            .collect(),
    })
}
