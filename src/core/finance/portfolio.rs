use crate::core::finance::cash_flow::FinancialParameters;
use crate::core::finance::feasibility::{analyze_feasibility_with, FeasibilityResult, Payback};
use crate::errors::EngineError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single retrofit action, such as wall insulation or a boiler replacement.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InvestmentMeasure {
    pub name: String,
    pub cost: f64,
    /// kWh/yr
    pub annual_energy_savings: f64,
    /// Money saved per year at current prices.
    pub annual_cost_savings: f64,
    pub lifetime_years: u32,
}

impl InvestmentMeasure {
    pub fn validate(&self) -> Result<(), EngineError> {
        let field = |attribute: &str| format!("measures[{}].{attribute}", self.name);
        if !(self.cost.is_finite() && self.cost >= 0.) {
            return Err(EngineError::invalid_input(
                field("cost"),
                format!("must not be negative, got {}", self.cost),
            ));
        }
        if self.lifetime_years == 0 {
            return Err(EngineError::invalid_input(
                field("lifetime_years"),
                "must be at least one year",
            ));
        }
        if !(self.annual_energy_savings.is_finite() && self.annual_cost_savings.is_finite()) {
            return Err(EngineError::invalid_input(
                field("annual_cost_savings"),
                "savings must be finite numbers",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MeasureAssessment {
    pub name: String,
    pub rank: usize,
    pub cost: f64,
    pub annual_energy_savings: f64,
    pub annual_cost_savings: f64,
    /// Appraised over the measure's own lifetime.
    pub feasibility: FeasibilityResult,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PortfolioAnalysis {
    pub total_cost: f64,
    pub total_annual_energy_savings: f64,
    pub total_annual_cost_savings: f64,
    /// The whole package appraised over the configured horizon.
    pub combined: FeasibilityResult,
    /// Measures ordered from the quickest payback to the slowest.
    pub measures: Vec<MeasureAssessment>,
}

fn compare_paybacks(a: &Payback, b: &Payback) -> Ordering {
    match (a.years(), b.years()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn analyze_portfolio(
    measures: &[InvestmentMeasure],
    parameters: &FinancialParameters,
) -> Result<PortfolioAnalysis, EngineError> {
    let mut assessments = measures
        .iter()
        .map(|measure| {
            measure.validate()?;
            let feasibility = analyze_feasibility_with(
                measure.cost,
                measure.annual_cost_savings,
                &FinancialParameters {
                    horizon_years: measure.lifetime_years,
                    ..parameters.clone()
                },
            )?;
            Ok(MeasureAssessment {
                name: measure.name.clone(),
                rank: 0,
                cost: measure.cost,
                annual_energy_savings: measure.annual_energy_savings,
                annual_cost_savings: measure.annual_cost_savings,
                feasibility,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?
        .into_iter()
        .sorted_by(|a, b| {
            compare_paybacks(&a.feasibility.simple_payback, &b.feasibility.simple_payback)
        })
        .collect::<Vec<_>>();
    for (index, assessment) in assessments.iter_mut().enumerate() {
        assessment.rank = index + 1;
    }

    let total_cost = measures.iter().map(|measure| measure.cost).sum::<f64>();
    let total_annual_cost_savings = measures
        .iter()
        .map(|measure| measure.annual_cost_savings)
        .sum::<f64>();

    Ok(PortfolioAnalysis {
        total_cost,
        total_annual_energy_savings: measures
            .iter()
            .map(|measure| measure.annual_energy_savings)
            .sum(),
        total_annual_cost_savings,
        combined: analyze_feasibility_with(total_cost, total_annual_cost_savings, parameters)?,
        measures: assessments,
    })
}
