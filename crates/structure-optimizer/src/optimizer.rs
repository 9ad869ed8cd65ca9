//! Structure Optimizer
//!
//! Applies every eligible structure's tax factor to the base speculation tax
//! and ranks the structures by net profit.

use immo_core::{
    ensure_finite, ensure_non_negative, percent_of, ComplexityTier, TaxError, TaxResult,
};
use immo_tax::{speculation_tax, CapitalGainsInput, CapitalGainsRules, RateTables};
use serde::{Deserialize, Serialize};

use crate::catalogue::{estimated_setup_cost, StructureCatalogue, StructureFamily};

const TAX_FREE_NOTE: &str = "Optimal for a tax-free sale, can be done right away";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCandidate {
    pub name: String,
    pub family: StructureFamily,
    pub tax_factor: f64,
    pub minimum_profit_threshold: f64,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
    pub complexity: ComplexityTier,
    pub implementation_time: String,
    pub estimated_setup_cost: f64,
    pub recommendation_note: String,
    pub tax: f64,
    pub net_profit: f64,
    pub effective_tax_rate_percent: f64,
    pub is_recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureReport {
    pub gross_profit: f64,
    pub base_tax: f64,
    /// Ranked best first; empty when there is no gain
    pub candidates: Vec<StructureCandidate>,
    pub max_net_profit: f64,
    /// Best minus worst net profit
    pub total_savings: f64,
    pub summary: String,
}

impl StructureReport {
    pub fn recommended(&self) -> Option<&StructureCandidate> {
        self.candidates.iter().find(|c| c.is_recommended)
    }
}

/// Ranks the catalogue for one sale.
#[derive(Debug, Clone)]
pub struct StructureOptimizer {
    catalogue: StructureCatalogue,
    rules: CapitalGainsRules,
}

impl Default for StructureOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureOptimizer {
    /// Optimizer over the built-in catalogue and speculation tax rules
    pub fn new() -> Self {
        Self {
            catalogue: StructureCatalogue::default(),
            rules: RateTables::standard().capital_gains.clone(),
        }
    }

    pub fn with_catalogue(catalogue: StructureCatalogue, rules: CapitalGainsRules) -> TaxResult<Self> {
        catalogue.validate()?;
        Ok(Self { catalogue, rules })
    }

    pub fn catalogue(&self) -> &StructureCatalogue {
        &self.catalogue
    }

    /// Rank structures for a sale, deriving gross profit and base tax from it.
    ///
    /// Rates whose combined speculation tax would exceed the gain are rejected,
    /// so no candidate ends up with a negative net profit.
    pub fn optimize(&self, input: &CapitalGainsInput) -> TaxResult<StructureReport> {
        input.validate()?;
        let combined = self
            .rules
            .combined_rate_percent(input.personal_tax_rate_percent, input.church_tax_rate_percent);
        if combined > 100.0 {
            return Err(TaxError::invalid(
                "personal_tax_rate_percent",
                format!("combined speculation tax rate of {combined:.2}% exceeds 100%"),
            ));
        }

        let gross_profit = input.taxable_gain();
        let holding_period_years = input.holding_period_years(&self.rules);
        let base_tax = speculation_tax(
            &self.rules,
            gross_profit,
            holding_period_years,
            input.personal_tax_rate_percent,
            input.church_tax_rate_percent,
        )
        .total;
        let tax_free = holding_period_years >= self.rules.tax_free_after_years as f64;

        Ok(self.rank(gross_profit, base_tax, tax_free))
    }

    /// Rank structures for a caller-supplied gross profit and base tax.
    pub fn optimize_with_base_tax(&self, gross_profit: f64, base_tax: f64) -> TaxResult<StructureReport> {
        let gross_profit = ensure_finite("gross_profit", gross_profit)?;
        let base_tax = ensure_non_negative("base_tax", base_tax)?;
        if gross_profit > 0.0 && base_tax > gross_profit {
            return Err(TaxError::invalid(
                "base_tax",
                format!("base tax {base_tax:.2} exceeds the gross profit {gross_profit:.2}"),
            ));
        }
        Ok(self.rank(gross_profit, base_tax, false))
    }

    fn rank(&self, gross_profit: f64, base_tax: f64, tax_free: bool) -> StructureReport {
        if gross_profit <= 0.0 {
            tracing::debug!("No gain ({:.2}), no structures to rank", gross_profit);
            return StructureReport {
                gross_profit,
                base_tax,
                candidates: Vec::new(),
                max_net_profit: 0.0,
                total_savings: 0.0,
                summary: "No taxable gain, no structuring benefit.".to_string(),
            };
        }

        let mut candidates: Vec<StructureCandidate> = self
            .catalogue
            .structures
            .iter()
            .filter(|s| gross_profit >= s.minimum_profit_threshold)
            .map(|s| {
                let tax = base_tax * s.tax_factor;
                StructureCandidate {
                    name: s.name.clone(),
                    family: s.family,
                    tax_factor: s.tax_factor,
                    minimum_profit_threshold: s.minimum_profit_threshold,
                    advantages: s.advantages.clone(),
                    disadvantages: s.disadvantages.clone(),
                    complexity: s.complexity,
                    implementation_time: s.complexity.implementation_time().to_string(),
                    estimated_setup_cost: estimated_setup_cost(s.complexity, gross_profit),
                    recommendation_note: if tax_free {
                        TAX_FREE_NOTE.to_string()
                    } else {
                        s.family.note().to_string()
                    },
                    tax,
                    net_profit: gross_profit - tax,
                    effective_tax_rate_percent: percent_of(tax, gross_profit),
                    is_recommended: false,
                }
            })
            .collect();

        // Stable, so ties keep catalogue order
        candidates.sort_by(|a, b| b.net_profit.total_cmp(&a.net_profit));
        if let Some(best) = candidates.first_mut() {
            best.is_recommended = true;
        }

        let max_net_profit = candidates.first().map_or(0.0, |c| c.net_profit);
        let total_savings = match (candidates.first(), candidates.last()) {
            (Some(best), Some(worst)) if candidates.len() > 1 => best.net_profit - worst.net_profit,
            _ => 0.0,
        };
        let summary = summarize(&candidates, total_savings, tax_free);

        tracing::debug!(
            "Ranked {} structures for gain {:.2}, base tax {:.2}",
            candidates.len(),
            gross_profit,
            base_tax
        );

        StructureReport {
            gross_profit,
            base_tax,
            candidates,
            max_net_profit,
            total_savings,
            summary,
        }
    }
}

fn summarize(candidates: &[StructureCandidate], total_savings: f64, tax_free: bool) -> String {
    let Some(best) = candidates.first() else {
        return "No structure is available for this gain.".to_string();
    };

    let mut summary = format!(
        "Recommended: {} with the highest net profit of {:.0} EUR.",
        best.name, best.net_profit
    );
    if total_savings > 0.0 {
        summary.push_str(&format!(
            " Saves {total_savings:.0} EUR over the least favourable option."
        ));
    }
    if tax_free {
        summary.push_str(" The ten-year holding period is met, so the sale is already tax-free.");
    }
    summary
}

/// Rank the built-in catalogue for a sale.
pub fn optimize_structures(input: &CapitalGainsInput) -> TaxResult<StructureReport> {
    StructureOptimizer::new().optimize(input)
}

/// Rank the built-in catalogue for a known gross profit and base tax.
pub fn optimize_with_base_tax(gross_profit: f64, base_tax: f64) -> TaxResult<StructureReport> {
    StructureOptimizer::new().optimize_with_base_tax(gross_profit, base_tax)
}
