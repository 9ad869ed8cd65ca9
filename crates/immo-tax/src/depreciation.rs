//! Depreciation (AfA)
//!
//! Linear building depreciation by usage category and construction era,
//! plus one-time special allowances.

use immo_core::{ensure_positive, TaxError, TaxResult, UsageCategory};
use serde::{Deserialize, Serialize};

use crate::tables::RateTables;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationInput {
    /// Depreciable acquisition cost of the building
    pub acquisition_cost: f64,
    pub construction_year: i32,
    pub acquisition_year: i32,
    pub usage_category: UsageCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialAllowanceKind {
    /// Listed building allowance
    Heritage,
    /// New rental housing built from 2023 on
    NewRentalHousing,
    /// Digitalization bonus for commercial property acquired from 2024 on
    Digitalization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAllowance {
    pub kind: SpecialAllowanceKind,
    pub rate_percent: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationResult {
    pub annual_rate_percent: f64,
    pub annual_amount: f64,
    pub monthly_amount: f64,
    /// Sum of all one-time special allowances
    pub special_allowance: f64,
    pub special_allowances: Vec<SpecialAllowance>,
    pub useful_life_years: u32,
    /// Regular depreciation plus special allowances in the first year
    pub first_year_total: f64,
}

/// Base rate for one usage category / era. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationRule {
    pub usage: UsageCategory,
    /// Only buildings constructed strictly before this year
    #[serde(default)]
    pub built_before: Option<i32>,
    pub annual_rate_percent: f64,
    pub useful_life_years: u32,
}

/// One-time allowance granted on top of the base rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRule {
    pub kind: SpecialAllowanceKind,
    pub usage: UsageCategory,
    #[serde(default)]
    pub min_construction_year: Option<i32>,
    #[serde(default)]
    pub min_acquisition_year: Option<i32>,
    pub rate_percent: f64,
    /// Ceiling on the allowance amount
    #[serde(default)]
    pub cap: Option<f64>,
}

impl BonusRule {
    fn applies_to(&self, input: &DepreciationInput) -> bool {
        self.usage == input.usage_category
            && self
                .min_construction_year
                .map_or(true, |y| input.construction_year >= y)
            && self
                .min_acquisition_year
                .map_or(true, |y| input.acquisition_year >= y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepreciationTables {
    pub rules: Vec<DepreciationRule>,
    pub bonuses: Vec<BonusRule>,
}

impl Default for DepreciationTables {
    fn default() -> Self {
        let rule = |usage, built_before, annual_rate_percent, useful_life_years| DepreciationRule {
            usage,
            built_before,
            annual_rate_percent,
            useful_life_years,
        };

        Self {
            rules: vec![
                rule(UsageCategory::Residential, Some(1925), 2.5, 40),
                rule(UsageCategory::Residential, None, 2.0, 50),
                rule(UsageCategory::Commercial, None, 3.0, 33),
                rule(UsageCategory::Heritage, None, 2.5, 40),
                rule(UsageCategory::Mixed, None, 2.5, 40),
            ],
            bonuses: vec![
                BonusRule {
                    kind: SpecialAllowanceKind::Heritage,
                    usage: UsageCategory::Heritage,
                    min_construction_year: None,
                    min_acquisition_year: None,
                    rate_percent: 9.0,
                    cap: None,
                },
                BonusRule {
                    kind: SpecialAllowanceKind::NewRentalHousing,
                    usage: UsageCategory::Residential,
                    min_construction_year: Some(2023),
                    min_acquisition_year: None,
                    rate_percent: 5.0,
                    cap: None,
                },
                BonusRule {
                    kind: SpecialAllowanceKind::Digitalization,
                    usage: UsageCategory::Commercial,
                    min_construction_year: None,
                    min_acquisition_year: Some(2024),
                    rate_percent: 2.0,
                    cap: Some(50_000.0),
                },
            ],
        }
    }
}

impl DepreciationTables {
    pub fn rule_for(&self, usage: UsageCategory, construction_year: i32) -> Option<&DepreciationRule> {
        self.rules
            .iter()
            .find(|r| r.usage == usage && r.built_before.map_or(true, |b| construction_year < b))
    }

    pub fn validate(&self) -> TaxResult<()> {
        for rule in &self.rules {
            if !rule.annual_rate_percent.is_finite()
                || rule.annual_rate_percent <= 0.0
                || rule.useful_life_years == 0
            {
                return Err(TaxError::InvalidConfiguration(format!(
                    "depreciation rule for {} is invalid",
                    rule.usage
                )));
            }
        }
        for bonus in &self.bonuses {
            if !bonus.rate_percent.is_finite() || bonus.rate_percent < 0.0 {
                return Err(TaxError::InvalidConfiguration(format!(
                    "special allowance {:?} has invalid rate",
                    bonus.kind
                )));
            }
        }
        Ok(())
    }
}

/// Compute depreciation with the built-in tables.
pub fn compute_depreciation(input: &DepreciationInput) -> TaxResult<DepreciationResult> {
    compute_depreciation_with(&RateTables::standard().depreciation, input)
}

pub fn compute_depreciation_with(
    tables: &DepreciationTables,
    input: &DepreciationInput,
) -> TaxResult<DepreciationResult> {
    let cost = ensure_positive("acquisition_cost", input.acquisition_cost)?;
    if input.construction_year <= 0 {
        return Err(TaxError::invalid("construction_year", "must be a calendar year"));
    }
    if input.acquisition_year <= 0 {
        return Err(TaxError::invalid("acquisition_year", "must be a calendar year"));
    }

    let rule = tables
        .rule_for(input.usage_category, input.construction_year)
        .ok_or_else(|| TaxError::unknown("usage category", input.usage_category.code()))?;

    let annual_amount = cost * rule.annual_rate_percent / 100.0;

    let special_allowances: Vec<SpecialAllowance> = tables
        .bonuses
        .iter()
        .filter(|b| b.applies_to(input))
        .map(|b| {
            let raw = cost * b.rate_percent / 100.0;
            SpecialAllowance {
                kind: b.kind,
                rate_percent: b.rate_percent,
                amount: b.cap.map_or(raw, |cap| raw.min(cap)),
            }
        })
        .collect();
    let special_allowance: f64 = special_allowances.iter().map(|s| s.amount).sum();

    tracing::debug!(
        "AfA {} ({}): {}% -> {:.2}/year, specials {:.2}",
        input.usage_category,
        input.construction_year,
        rule.annual_rate_percent,
        annual_amount,
        special_allowance
    );

    Ok(DepreciationResult {
        annual_rate_percent: rule.annual_rate_percent,
        annual_amount,
        monthly_amount: annual_amount / 12.0,
        special_allowance,
        special_allowances,
        useful_life_years: rule.useful_life_years,
        first_year_total: annual_amount + special_allowance,
    })
}
