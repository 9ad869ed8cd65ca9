//! Rental Yield (Mietrendite)
//!
//! Gross and net yield on the total investment, plus a multi-year projection
//! with rent growth and value growth.

use immo_core::{
    ensure_finite, ensure_non_negative, ensure_percent, ensure_positive, percent_of, safe_ratio,
    TaxError, TaxResult, YieldRating,
};
use serde::{Deserialize, Serialize};

/// Longest projection accepted
pub const MAX_PROJECTION_YEARS: u32 = 100;

fn default_projection_years() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldInput {
    pub purchase_price: f64,
    /// Ancillary purchase costs
    pub purchase_costs: f64,
    /// Cold rent per year at full occupancy
    pub annual_rent: f64,
    /// Non-allocable operating costs per year
    #[serde(default)]
    pub operating_costs: f64,
    #[serde(default)]
    pub vacancy_rate_percent: f64,
    /// Maintenance reserve per year
    #[serde(default)]
    pub maintenance_reserve: f64,
    #[serde(default)]
    pub rent_growth_rate_percent: f64,
    #[serde(default)]
    pub value_growth_rate_percent: f64,
    #[serde(default = "default_projection_years")]
    pub projection_years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub annual_rent: f64,
    pub effective_rent: f64,
    pub net_cashflow: f64,
    pub cumulative_cashflow: f64,
    pub property_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldResult {
    pub total_investment: f64,
    pub gross_yield_percent: f64,
    /// First-year rent after vacancy
    pub effective_rent: f64,
    /// First-year rent after vacancy, operating costs and maintenance
    pub net_income: f64,
    pub net_yield_percent: f64,
    pub cumulative_cashflow: f64,
    pub terminal_value: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub annualized_return_percent: f64,
    pub rating: YieldRating,
    pub projection: Vec<ProjectionYear>,
}

fn ensure_growth(field: &'static str, value: f64) -> TaxResult<f64> {
    ensure_finite(field, value)?;
    if value <= -100.0 {
        return Err(TaxError::invalid(field, format!("must be above -100, got {value}")));
    }
    Ok(value)
}

impl YieldInput {
    pub fn validate(&self) -> TaxResult<()> {
        ensure_positive("purchase_price", self.purchase_price)?;
        ensure_non_negative("purchase_costs", self.purchase_costs)?;
        ensure_positive("annual_rent", self.annual_rent)?;
        ensure_non_negative("operating_costs", self.operating_costs)?;
        ensure_percent("vacancy_rate_percent", self.vacancy_rate_percent)?;
        ensure_non_negative("maintenance_reserve", self.maintenance_reserve)?;
        ensure_growth("rent_growth_rate_percent", self.rent_growth_rate_percent)?;
        ensure_growth("value_growth_rate_percent", self.value_growth_rate_percent)?;
        if self.projection_years > MAX_PROJECTION_YEARS {
            return Err(TaxError::invalid(
                "projection_years",
                format!("must not exceed {MAX_PROJECTION_YEARS}"),
            ));
        }
        Ok(())
    }

    pub fn total_investment(&self) -> f64 {
        self.purchase_price + self.purchase_costs
    }

    fn net_cashflow(&self, annual_rent: f64) -> (f64, f64) {
        let effective_rent = annual_rent * (1.0 - self.vacancy_rate_percent / 100.0);
        let net = effective_rent - self.operating_costs - self.maintenance_reserve;
        (effective_rent, net)
    }
}

pub fn compute_yield(input: &YieldInput) -> TaxResult<YieldResult> {
    input.validate()?;

    let total_investment = input.total_investment();
    let (effective_rent, net_income) = input.net_cashflow(input.annual_rent);
    let gross_yield_percent = percent_of(input.annual_rent, total_investment);
    let net_yield_percent = percent_of(net_income, total_investment);

    let rent_growth = 1.0 + input.rent_growth_rate_percent / 100.0;
    let value_growth = 1.0 + input.value_growth_rate_percent / 100.0;

    let mut projection = Vec::with_capacity(input.projection_years as usize);
    let mut annual_rent = input.annual_rent;
    let mut property_value = input.purchase_price;
    let mut cumulative_cashflow = 0.0;
    for year in 1..=input.projection_years {
        if year > 1 {
            annual_rent *= rent_growth;
        }
        property_value *= value_growth;
        let (effective_rent, net_cashflow) = input.net_cashflow(annual_rent);
        cumulative_cashflow += net_cashflow;
        projection.push(ProjectionYear {
            year,
            annual_rent,
            effective_rent,
            net_cashflow,
            cumulative_cashflow,
            property_value,
        });
    }

    let terminal_value = property_value;
    let total_return = cumulative_cashflow + terminal_value - total_investment;
    let annualized_return_percent = if input.projection_years == 0 {
        0.0
    } else {
        let growth = (1.0 + safe_ratio(total_return, total_investment)).max(0.0);
        (growth.powf(1.0 / input.projection_years as f64) - 1.0) * 100.0
    };
    let rating = YieldRating::from_net_yield(net_yield_percent);

    tracing::debug!(
        "Yield: gross {:.2}%, net {:.2}% ({:?}), {} years -> total return {:.2}",
        gross_yield_percent,
        net_yield_percent,
        rating,
        input.projection_years,
        total_return
    );

    Ok(YieldResult {
        total_investment,
        gross_yield_percent,
        effective_rent,
        net_income,
        net_yield_percent,
        cumulative_cashflow,
        terminal_value,
        total_return,
        total_return_percent: percent_of(total_return, total_investment),
        annualized_return_percent,
        rating,
        projection,
    })
}
