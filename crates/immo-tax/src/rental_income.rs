//! Rental Income Surplus (Vermietung und Verpachtung)

use immo_core::{ensure_non_negative, ensure_positive, TaxResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalIncomeInput {
    pub annual_rent: f64,
    /// Allocated ancillary charges received from tenants
    #[serde(default)]
    pub ancillary_income: f64,
    #[serde(default)]
    pub depreciation: f64,
    /// Mortgage interest (not repayment)
    #[serde(default)]
    pub interest: f64,
    #[serde(default)]
    pub management_costs: f64,
    #[serde(default)]
    pub maintenance: f64,
    #[serde(default)]
    pub insurance: f64,
    #[serde(default)]
    pub other_costs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalIncomeResult {
    pub gross_income: f64,
    pub deductible_costs: f64,
    /// Negative when the costs exceed the income
    pub taxable_surplus: f64,
    pub monthly_surplus: f64,
    pub is_loss: bool,
}

pub fn compute_rental_income(input: &RentalIncomeInput) -> TaxResult<RentalIncomeResult> {
    let rent = ensure_positive("annual_rent", input.annual_rent)?;
    let ancillary = ensure_non_negative("ancillary_income", input.ancillary_income)?;
    let costs = [
        ("depreciation", input.depreciation),
        ("interest", input.interest),
        ("management_costs", input.management_costs),
        ("maintenance", input.maintenance),
        ("insurance", input.insurance),
        ("other_costs", input.other_costs),
    ];
    let mut deductible_costs = 0.0;
    for (field, value) in costs {
        deductible_costs += ensure_non_negative(field, value)?;
    }

    let gross_income = rent + ancillary;
    let taxable_surplus = gross_income - deductible_costs;

    tracing::debug!(
        "Rental income: gross {:.2}, deductible {:.2}, surplus {:.2}",
        gross_income,
        deductible_costs,
        taxable_surplus
    );

    Ok(RentalIncomeResult {
        gross_income,
        deductible_costs,
        taxable_surplus,
        monthly_surplus: taxable_surplus / 12.0,
        is_loss: taxable_surplus < 0.0,
    })
}
