//! Capital Gains on Real Estate (Spekulationssteuer)
//!
//! Gains on a private sale are taxed at the seller's personal income-tax rate
//! plus church tax and solidarity surcharge, unless the property was held for
//! the statutory holding period.

use chrono::{Days, NaiveDate};
use immo_core::{
    ensure_non_negative, ensure_percent, ensure_positive, percent_of, TaxError, TaxResult,
};
use serde::{Deserialize, Serialize};

use crate::tables::RateTables;

/// Statutory constants of the speculation tax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsRules {
    /// Holding period after which gains are tax-free
    pub tax_free_after_years: u32,
    /// Solidarity surcharge on the income tax
    pub solidarity_surcharge_percent: f64,
    /// Days per year used to convert the holding period
    pub days_per_year: f64,
}

impl CapitalGainsRules {
    /// Share of a taxable gain taken by income tax, church tax and solidarity surcharge
    pub fn combined_rate_percent(
        &self,
        personal_tax_rate_percent: f64,
        church_tax_rate_percent: f64,
    ) -> f64 {
        personal_tax_rate_percent
            * (1.0 + (church_tax_rate_percent + self.solidarity_surcharge_percent) / 100.0)
    }
}

impl Default for CapitalGainsRules {
    fn default() -> Self {
        Self {
            tax_free_after_years: 10,
            solidarity_surcharge_percent: 5.5,
            days_per_year: 365.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsInput {
    pub purchase_price: f64,
    pub sale_price: f64,
    pub purchase_date: NaiveDate,
    pub sale_date: NaiveDate,
    /// Deductible costs (Werbungskosten, ancillary purchase and sale costs)
    #[serde(default)]
    pub deductible_costs: f64,
    pub personal_tax_rate_percent: f64,
    #[serde(default)]
    pub church_tax_rate_percent: f64,
}

/// Components of the tax on a gain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeculationTax {
    pub income_tax: f64,
    pub church_tax: f64,
    pub solidarity_surcharge: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsResult {
    pub holding_period_years: f64,
    /// Completed years of the holding period
    pub holding_whole_years: u32,
    /// Completed months beyond the whole years
    pub holding_extra_months: u32,
    /// First sale date on which a gain is tax-free
    pub tax_free_from: NaiveDate,
    pub taxable_gain: f64,
    pub is_taxable: bool,
    pub income_tax: f64,
    pub church_tax: f64,
    pub solidarity_surcharge: f64,
    pub tax_amount: f64,
    pub net_gain: f64,
    pub effective_tax_rate_percent: f64,
}

/// Tax on `taxable_gain` for a holding period of `holding_period_years`.
///
/// Zero once the holding period reaches the tax-free threshold, and zero for
/// any gain that is not positive.
pub fn speculation_tax(
    rules: &CapitalGainsRules,
    taxable_gain: f64,
    holding_period_years: f64,
    personal_tax_rate_percent: f64,
    church_tax_rate_percent: f64,
) -> SpeculationTax {
    if holding_period_years >= rules.tax_free_after_years as f64 || taxable_gain <= 0.0 {
        return SpeculationTax::default();
    }

    let income_tax = taxable_gain * personal_tax_rate_percent / 100.0;
    let church_tax = income_tax * church_tax_rate_percent / 100.0;
    let solidarity_surcharge = income_tax * rules.solidarity_surcharge_percent / 100.0;

    SpeculationTax {
        income_tax,
        church_tax,
        solidarity_surcharge,
        total: income_tax + church_tax + solidarity_surcharge,
    }
}

impl CapitalGainsInput {
    /// Validate prices, rates and the date order.
    pub fn validate(&self) -> TaxResult<()> {
        ensure_positive("purchase_price", self.purchase_price)?;
        ensure_positive("sale_price", self.sale_price)?;
        ensure_non_negative("deductible_costs", self.deductible_costs)?;
        ensure_percent("personal_tax_rate_percent", self.personal_tax_rate_percent)?;
        ensure_percent("church_tax_rate_percent", self.church_tax_rate_percent)?;
        if self.sale_date < self.purchase_date {
            return Err(TaxError::invalid(
                "sale_date",
                format!(
                    "sale date {} is before purchase date {}",
                    self.sale_date, self.purchase_date
                ),
            ));
        }
        Ok(())
    }

    pub fn holding_period_years(&self, rules: &CapitalGainsRules) -> f64 {
        (self.sale_date - self.purchase_date).num_days() as f64 / rules.days_per_year
    }

    /// First sale date whose holding period reaches the tax-free threshold.
    pub fn tax_free_from(&self, rules: &CapitalGainsRules) -> NaiveDate {
        let days = (rules.tax_free_after_years as f64 * rules.days_per_year).ceil() as u64;
        self.purchase_date
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Sale price minus purchase price minus deductible costs
    pub fn taxable_gain(&self) -> f64 {
        self.sale_price - self.purchase_price - self.deductible_costs
    }
}

/// Compute the speculation tax with the built-in rules.
pub fn compute_capital_gains(input: &CapitalGainsInput) -> TaxResult<CapitalGainsResult> {
    compute_capital_gains_with(&RateTables::standard().capital_gains, input)
}

pub fn compute_capital_gains_with(
    rules: &CapitalGainsRules,
    input: &CapitalGainsInput,
) -> TaxResult<CapitalGainsResult> {
    input.validate()?;

    let holding_period_years = input.holding_period_years(rules);
    let taxable_gain = input.taxable_gain();
    let is_taxable = holding_period_years < rules.tax_free_after_years as f64 && taxable_gain > 0.0;

    let tax = speculation_tax(
        rules,
        taxable_gain,
        holding_period_years,
        input.personal_tax_rate_percent,
        input.church_tax_rate_percent,
    );

    let holding_whole_years = holding_period_years.floor() as u32;
    let holding_extra_months = (holding_period_years.fract() * 12.0).floor() as u32;
    let tax_free_from = input.tax_free_from(rules);

    tracing::debug!(
        "Speculation tax: held {:.2}y, gain {:.2}, taxable {}, tax {:.2}",
        holding_period_years,
        taxable_gain,
        is_taxable,
        tax.total
    );

    Ok(CapitalGainsResult {
        holding_period_years,
        holding_whole_years,
        holding_extra_months,
        tax_free_from,
        taxable_gain,
        is_taxable,
        income_tax: tax.income_tax,
        church_tax: tax.church_tax,
        solidarity_surcharge: tax.solidarity_surcharge,
        tax_amount: tax.total,
        net_gain: taxable_gain - tax.total,
        effective_tax_rate_percent: if taxable_gain > 0.0 {
            percent_of(tax.total, taxable_gain)
        } else {
            0.0
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(purchase: f64, sale: f64, bought: NaiveDate, sold: NaiveDate) -> CapitalGainsInput {
        CapitalGainsInput {
            purchase_price: purchase,
            sale_price: sale,
            purchase_date: bought,
            sale_date: sold,
            deductible_costs: 0.0,
            personal_tax_rate_percent: 42.0,
            church_tax_rate_percent: 8.0,
        }
    }

    #[test]
    fn test_short_holding_is_taxed() {
        let input = sale(300_000.0, 450_000.0, date(2021, 1, 1), date(2024, 1, 1));
        let result = compute_capital_gains(&input).unwrap();

        assert!((result.holding_period_years - 1095.0 / 365.25).abs() < 1e-12);
        assert_eq!(result.holding_whole_years, 2);
        assert!(result.is_taxable);
        assert!((result.taxable_gain - 150_000.0).abs() < 1e-9);
        assert!((result.income_tax - 63_000.0).abs() < 1e-6);
        assert!((result.church_tax - 5_040.0).abs() < 1e-6);
        assert!((result.solidarity_surcharge - 3_465.0).abs() < 1e-6);
        assert!((result.tax_amount - 71_505.0).abs() < 1e-6);
        assert!((result.net_gain - 78_495.0).abs() < 1e-6);
        assert!((result.effective_tax_rate_percent - 47.67).abs() < 1e-9);
        // 3653 days, one more than the ten calendar years to 2031-01-01
        assert_eq!(result.tax_free_from, date(2031, 1, 2));
    }

    #[test]
    fn test_ten_years_is_tax_free() {
        let input = sale(300_000.0, 900_000.0, date(2010, 1, 1), date(2020, 1, 2));
        let result = compute_capital_gains(&input).unwrap();
        assert!(result.holding_period_years >= 10.0);
        assert!(!result.is_taxable);
        assert_eq!(result.tax_amount, 0.0);
        assert!((result.net_gain - 600_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_tax_free_from_matches_holding_rule() {
        for bought in [date(2000, 6, 15), date(2003, 3, 1), date(2019, 12, 31)] {
            let same_day = sale(200_000.0, 500_000.0, bought, bought);
            let tax_free_from = compute_capital_gains(&same_day).unwrap().tax_free_from;

            let on_date = sale(200_000.0, 500_000.0, bought, tax_free_from);
            let result = compute_capital_gains(&on_date).unwrap();
            assert!(!result.is_taxable, "bought {bought}");
            assert_eq!(result.tax_amount, 0.0);

            let day_before = tax_free_from.pred_opt().unwrap();
            let before = sale(200_000.0, 500_000.0, bought, day_before);
            let result = compute_capital_gains(&before).unwrap();
            assert!(result.is_taxable, "bought {bought}");
            assert!(result.tax_amount > 0.0);
        }
    }

    #[test]
    fn test_losses_are_never_taxed() {
        let mut input = sale(300_000.0, 280_000.0, date(2022, 1, 1), date(2023, 6, 1));
        input.deductible_costs = 5_000.0;
        let result = compute_capital_gains(&input).unwrap();
        assert!(!result.is_taxable);
        assert_eq!(result.tax_amount, 0.0);
        assert_eq!(result.effective_tax_rate_percent, 0.0);
        assert!((result.net_gain + 25_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_deductible_costs_reduce_gain() {
        let mut input = sale(200_000.0, 250_000.0, date(2022, 1, 1), date(2023, 1, 1));
        input.deductible_costs = 10_000.0;
        let result = compute_capital_gains(&input).unwrap();
        assert!((result.taxable_gain - 40_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        let inverted = sale(1.0, 2.0, date(2024, 1, 1), date(2023, 1, 1));
        assert!(matches!(
            compute_capital_gains(&inverted),
            Err(TaxError::InvalidInput { field: "sale_date", .. })
        ));

        let no_price = sale(0.0, 2.0, date(2020, 1, 1), date(2023, 1, 1));
        assert!(compute_capital_gains(&no_price).is_err());

        let mut bad_rate = sale(1.0, 2.0, date(2020, 1, 1), date(2023, 1, 1));
        bad_rate.personal_tax_rate_percent = 120.0;
        assert!(compute_capital_gains(&bad_rate).is_err());
    }

    #[test]
    fn test_same_day_sale() {
        let input = sale(100_000.0, 110_000.0, date(2024, 5, 1), date(2024, 5, 1));
        let result = compute_capital_gains(&input).unwrap();
        assert_eq!(result.holding_period_years, 0.0);
        assert!(result.is_taxable);
    }
}
