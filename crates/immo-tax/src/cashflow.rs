//! After-Tax Cash-Flow Projection
//!
//! Year-by-year rent, costs and income tax on the rental result, followed by
//! the after-tax proceeds of a sale at the end of the horizon.

use immo_core::{ensure_non_negative, ensure_percent, ensure_range, percent_of, TaxError, TaxResult};
use serde::{Deserialize, Serialize};

use crate::tables::RateTables;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRules {
    /// Share of the sale proceeds kept after taxes and selling costs
    pub sale_proceeds_retention: f64,
}

impl Default for CashflowRules {
    fn default() -> Self {
        Self {
            sale_proceeds_retention: 0.9,
        }
    }
}

fn default_tax_rate() -> f64 {
    42.0
}

fn default_rent_growth() -> f64 {
    2.5
}

fn default_years() -> u32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowInput {
    pub monthly_rent: f64,
    #[serde(default)]
    pub monthly_operating_costs: f64,
    /// Interest and repayment per month
    #[serde(default)]
    pub monthly_financing_costs: f64,
    #[serde(default)]
    pub annual_depreciation: f64,
    #[serde(default = "default_tax_rate")]
    pub tax_rate_percent: f64,
    #[serde(default = "default_rent_growth")]
    pub rent_growth_percent: f64,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default)]
    pub expected_sale_proceeds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowYear {
    pub year: u32,
    pub rent_income: f64,
    pub operating_costs: f64,
    pub financing_costs: f64,
    pub net_income: f64,
    /// Net income minus depreciation; negative values are a tax loss
    pub taxable_result: f64,
    pub tax: f64,
    pub cashflow_after_tax: f64,
    pub cumulative_cashflow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowProjection {
    pub years: Vec<CashflowYear>,
    pub cumulative_cashflow: f64,
    pub sale_cashflow: f64,
    pub total_cashflow: f64,
    pub average_annual_cashflow: f64,
    pub roi_percent: f64,
}

impl CashflowRules {
    pub fn validate(&self) -> TaxResult<()> {
        let retention = self.sale_proceeds_retention;
        if !retention.is_finite() || !(0.0..=1.0).contains(&retention) {
            return Err(TaxError::InvalidConfiguration(format!(
                "sale proceeds retention must be within 0..=1, got {retention}"
            )));
        }
        Ok(())
    }
}

/// Project cash flows with the built-in rules.
pub fn compute_cashflow_projection(input: &CashflowInput) -> TaxResult<CashflowProjection> {
    compute_cashflow_projection_with(&RateTables::standard().cashflow, input)
}

pub fn compute_cashflow_projection_with(
    rules: &CashflowRules,
    input: &CashflowInput,
) -> TaxResult<CashflowProjection> {
    ensure_non_negative("monthly_rent", input.monthly_rent)?;
    ensure_non_negative("monthly_operating_costs", input.monthly_operating_costs)?;
    ensure_non_negative("monthly_financing_costs", input.monthly_financing_costs)?;
    ensure_non_negative("annual_depreciation", input.annual_depreciation)?;
    let tax_rate = ensure_percent("tax_rate_percent", input.tax_rate_percent)?;
    let growth = ensure_range("rent_growth_percent", input.rent_growth_percent, -99.99, 100.0)?;
    let sale_proceeds = ensure_non_negative("expected_sale_proceeds", input.expected_sale_proceeds)?;
    if !(1..=100).contains(&input.years) {
        return Err(TaxError::invalid("years", "must be between 1 and 100"));
    }

    let operating_costs = input.monthly_operating_costs * 12.0;
    let financing_costs = input.monthly_financing_costs * 12.0;

    let mut monthly_rent = input.monthly_rent;
    let mut cumulative_cashflow = 0.0;
    let mut years = Vec::with_capacity(input.years as usize);
    for year in 1..=input.years {
        if year > 1 {
            monthly_rent *= 1.0 + growth / 100.0;
        }
        let rent_income = monthly_rent * 12.0;
        let net_income = rent_income - operating_costs - financing_costs;
        let taxable_result = net_income - input.annual_depreciation;
        let tax = (taxable_result * tax_rate / 100.0).max(0.0);
        let cashflow_after_tax = net_income - tax;
        cumulative_cashflow += cashflow_after_tax;

        years.push(CashflowYear {
            year,
            rent_income,
            operating_costs,
            financing_costs,
            net_income,
            taxable_result,
            tax,
            cashflow_after_tax,
            cumulative_cashflow,
        });
    }

    let sale_cashflow = sale_proceeds * rules.sale_proceeds_retention;
    let total_cashflow = cumulative_cashflow + sale_cashflow;

    tracing::debug!(
        "Cash flow over {} years: cumulative {:.2}, with sale {:.2}",
        input.years,
        cumulative_cashflow,
        total_cashflow
    );

    Ok(CashflowProjection {
        years,
        cumulative_cashflow,
        sale_cashflow,
        total_cashflow,
        average_annual_cashflow: cumulative_cashflow / input.years as f64,
        roi_percent: percent_of(total_cashflow, sale_proceeds),
    })
}
