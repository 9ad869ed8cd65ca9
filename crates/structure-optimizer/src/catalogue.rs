//! Structure Catalogue
//!
//! Legal ownership structures a sale can be routed through, each with a
//! factor on the base speculation tax and a minimum gain below which the
//! structure is not worth setting up.

use immo_core::{ComplexityTier, TaxError, TaxResult};
use serde::{Deserialize, Serialize};

/// Broad family of a structure, used for the recommendation note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureFamily {
    DirectSale,
    Partnership,
    FamilyPool,
    ShareDeal,
    CrossBorder,
    Foundation,
}

impl StructureFamily {
    pub fn note(&self) -> &'static str {
        match self {
            StructureFamily::DirectSale => "Worth it after individual review",
            StructureFamily::Partnership => "Strong option since the 2025 BFH ruling",
            StructureFamily::FamilyPool => "Good fit for families, quick to set up",
            StructureFamily::ShareDeal => "Very good for larger gains, medium-term setup",
            StructureFamily::CrossBorder => {
                "For international investors, professional advice required"
            }
            StructureFamily::Foundation => "For very large estates, long-term family planning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDefinition {
    pub name: String,
    pub family: StructureFamily,
    /// Multiplier on the base speculation tax
    pub tax_factor: f64,
    /// Smallest gross profit for which the structure is offered
    pub minimum_profit_threshold: f64,
    pub complexity: ComplexityTier,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureCatalogue {
    pub structures: Vec<StructureDefinition>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn structure(
    name: &str,
    family: StructureFamily,
    tax_factor: f64,
    minimum_profit_threshold: f64,
    complexity: ComplexityTier,
    advantages: &[&str],
    disadvantages: &[&str],
) -> StructureDefinition {
    StructureDefinition {
        name: name.to_string(),
        family,
        tax_factor,
        minimum_profit_threshold,
        complexity,
        advantages: strings(advantages),
        disadvantages: strings(disadvantages),
    }
}

impl Default for StructureCatalogue {
    fn default() -> Self {
        use ComplexityTier::*;
        use StructureFamily::*;

        Self {
            structures: vec![
                structure(
                    "Privatverkauf",
                    DirectSale,
                    1.0,
                    0.0,
                    Low,
                    &[
                        "Tax-free after 10 years",
                        "Simplest execution",
                        "No setup costs",
                        "Immediately possible",
                    ],
                    &[
                        "Speculation tax below 10 years",
                        "No optimisation levers",
                        "Full tax burden",
                    ],
                ),
                structure(
                    "VV GmbH & Co. KG",
                    Partnership,
                    0.85,
                    0.0,
                    Medium,
                    &[
                        "No trade tax for asset-managing partnerships",
                        "Limited liability",
                        "Flexible change of partners",
                        "Tax transparency",
                    ],
                    &[
                        "More complex structure",
                        "Setup costs of 5,000-15,000 EUR",
                        "Ongoing administration",
                        "Partnership agreement required",
                    ],
                ),
                structure(
                    "Familienpool (GbR)",
                    FamilyPool,
                    0.75,
                    50_000.0,
                    Medium,
                    &[
                        "Income spread across the family",
                        "Breaks the progression",
                        "Transparent taxation",
                        "Simple administration",
                    ],
                    &[
                        "Several partners needed",
                        "Partnership agreement required",
                        "Unanimous decisions",
                    ],
                ),
                structure(
                    "Share Deal (GmbH)",
                    ShareDeal,
                    0.60,
                    100_000.0,
                    High,
                    &[
                        "Gains largely tax-exempt at corporate level",
                        "No real-estate transfer tax",
                        "Planning certainty",
                        "Professional structure",
                    ],
                    &[
                        "At least 5% shareholding",
                        "GmbH incorporation required",
                        "Complex structure",
                        "High administration costs",
                    ],
                ),
                structure(
                    "Cross-Border Holding (Luxemburg)",
                    CrossBorder,
                    0.45,
                    500_000.0,
                    VeryHigh,
                    &[
                        "EU parent-subsidiary directive",
                        "International tax optimisation",
                        "Low net wealth tax",
                        "Recognised EU-wide",
                    ],
                    &[
                        "Advisory costs of 50,000-100,000 EUR",
                        "Complex structure",
                        "Substance requirements",
                        "Compliance effort",
                    ],
                ),
                structure(
                    "Cross-Border Struktur (Niederlande)",
                    CrossBorder,
                    0.50,
                    500_000.0,
                    VeryHigh,
                    &[
                        "Double taxation treaty",
                        "EU compliant",
                        "Tax transparency",
                        "Low corporate tax",
                    ],
                    &[
                        "International structure",
                        "Compliance effort",
                        "Advice-intensive",
                        "Currency risk",
                    ],
                ),
                structure(
                    "Familienstiftung",
                    Foundation,
                    0.35,
                    1_000_000.0,
                    VeryHigh,
                    &[
                        "Spans generations",
                        "Asset protection",
                        "Inheritance tax planning",
                        "Long-term planning",
                    ],
                    &[
                        "Setup costs of 100,000-300,000 EUR",
                        "Complex administration",
                        "Binding effect",
                        "Long-term commitment",
                    ],
                ),
                structure(
                    "Stiftung & Co. KG",
                    Foundation,
                    0.40,
                    1_000_000.0,
                    VeryHigh,
                    &[
                        "Flexible profit allocation",
                        "Limited liability",
                        "Tax optimisation",
                        "Professional administration",
                    ],
                    &[
                        "Very complex",
                        "Costs of 150,000 EUR and more",
                        "Administrative effort",
                        "Regulatory requirements",
                    ],
                ),
            ],
        }
    }
}

impl StructureCatalogue {
    pub fn from_json_str(json: &str) -> TaxResult<Self> {
        let catalogue: StructureCatalogue = serde_json::from_str(json)
            .map_err(|e| TaxError::InvalidConfiguration(e.to_string()))?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn validate(&self) -> TaxResult<()> {
        if self.structures.is_empty() {
            return Err(TaxError::InvalidConfiguration(
                "structure catalogue is empty".to_string(),
            ));
        }
        for s in &self.structures {
            if s.name.trim().is_empty() {
                return Err(TaxError::InvalidConfiguration(
                    "structure without a name".to_string(),
                ));
            }
            if !s.tax_factor.is_finite() || !(0.0..=1.0).contains(&s.tax_factor) {
                return Err(TaxError::InvalidConfiguration(format!(
                    "{}: tax factor must be within 0..=1, got {}",
                    s.name, s.tax_factor
                )));
            }
            if !s.minimum_profit_threshold.is_finite() || s.minimum_profit_threshold < 0.0 {
                return Err(TaxError::InvalidConfiguration(format!(
                    "{}: minimum profit threshold must be non-negative",
                    s.name
                )));
            }
        }
        Ok(())
    }
}

/// Setup cost floor per complexity tier
pub fn base_setup_cost(tier: ComplexityTier) -> f64 {
    match tier {
        ComplexityTier::Low => 1_000.0,
        ComplexityTier::Medium => 10_000.0,
        ComplexityTier::High => 30_000.0,
        ComplexityTier::VeryHigh => 100_000.0,
    }
}

/// Estimated setup cost: the tier floor, or a share of the gain for large gains
pub fn estimated_setup_cost(tier: ComplexityTier, gross_profit: f64) -> f64 {
    let share = if gross_profit > 1_000_000.0 { 0.02 } else { 0.01 };
    base_setup_cost(tier).max(gross_profit * share)
}
