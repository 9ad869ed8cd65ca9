//! Property Tax (Grundsteuer)
//!
//! Two assessment models are supported side by side:
//!
//! - **Assessment ratio**: a flat share of the market value is assessed and
//!   a base rate per property type applies; the jurisdiction is a location
//!   class with its own multiplier.
//! - **Unit rates**: land and living area are valued with per-state unit
//!   rates; a per-mille base rate and the municipal Hebesatz apply.
//!
//! The input's [`Valuation`] variant selects the model.

use std::collections::HashMap;

use immo_core::{
    ensure_non_negative, ensure_positive, percent_of, PropertyType, TaxError, TaxResult,
};
use serde::{Deserialize, Serialize};

use crate::tables::{JurisdictionKind, JurisdictionPolicy, RateTables};

/// How the property is valued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Valuation {
    /// Market value, assessed with the flat assessment ratio
    MarketValue { market_value: f64 },
    /// Plot and living area in m², valued with state unit rates
    Areas { land_area: f64, living_area: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyTaxModel {
    AssessmentRatio,
    UnitRate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTaxInput {
    pub valuation: Valuation,
    /// Location class (`urban`, `suburban`, `rural`) for the ratio model,
    /// federal-state code (`by`, `nw`, …) for the unit-rate model
    pub jurisdiction: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub building_year: Option<i32>,
    #[serde(default)]
    pub exemptions: f64,
    #[serde(default)]
    pub improvements: f64,
    /// Overrides the table multiplier. Raw factor for the ratio model,
    /// Hebesatz in percent for the unit-rate model.
    #[serde(default)]
    pub local_multiplier: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTaxResult {
    pub model: PropertyTaxModel,
    /// Jurisdiction code the rates were taken from
    pub jurisdiction: String,
    pub jurisdiction_fallback: bool,
    pub assessed_value: f64,
    pub taxable_value: f64,
    /// Base rate (Steuermesszahl) applied to the taxable value
    pub base_rate: f64,
    /// Taxable value times base rate (Steuermessbetrag)
    pub base_tax: f64,
    /// Factor applied to the base tax (Hebesatz / 100 for the unit-rate model)
    pub multiplier: f64,
    pub final_tax: f64,
    pub monthly_tax: f64,
    pub effective_rate_percent: f64,
}

/// Tables for the market-value model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRatioModel {
    /// Share of the market value that is assessed
    pub assessment_ratio: f64,
    /// Base rate per property type
    pub base_rates: HashMap<PropertyType, f64>,
    /// Multiplier per location class
    pub location_multipliers: HashMap<String, f64>,
}

impl Default for AssessmentRatioModel {
    fn default() -> Self {
        Self {
            assessment_ratio: 0.7,
            base_rates: HashMap::from([
                (PropertyType::Residential, 0.0035),
                (PropertyType::Commercial, 0.0045),
                (PropertyType::Industrial, 0.0055),
                (PropertyType::Agricultural, 0.0020),
            ]),
            location_multipliers: HashMap::from([
                ("urban".to_string(), 1.2),
                ("suburban".to_string(), 1.0),
                ("rural".to_string(), 0.8),
            ]),
        }
    }
}

/// Unit rates of one federal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUnitRates {
    /// Land value per m² of plot
    pub land_rate: f64,
    /// Building value per m² of living area
    pub building_rate: f64,
    /// Per-mille base rate (Steuermesszahl)
    pub base_rate: f64,
    /// Average municipal Hebesatz in percent
    pub hebesatz_percent: f64,
}

/// Age adjustment for the building value. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeFactorRule {
    /// Applies to buildings built strictly before this year
    #[serde(default)]
    pub built_before: Option<i32>,
    /// Applies to buildings built strictly after this year
    #[serde(default)]
    pub built_after: Option<i32>,
    pub factor: f64,
}

impl AgeFactorRule {
    fn matches(&self, year: i32) -> bool {
        self.built_before.map_or(true, |b| year < b) && self.built_after.map_or(true, |a| year > a)
    }
}

/// Tables for the area-based model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRateModel {
    pub states: HashMap<String, StateUnitRates>,
    pub type_factors: HashMap<PropertyType, f64>,
    pub age_factors: Vec<AgeFactorRule>,
}

impl UnitRateModel {
    pub fn age_factor(&self, building_year: Option<i32>) -> f64 {
        building_year
            .and_then(|year| self.age_factors.iter().find(|r| r.matches(year)))
            .map(|r| r.factor)
            .unwrap_or(1.0)
    }
}

impl Default for UnitRateModel {
    fn default() -> Self {
        // (code, land €/m², building €/m², Hebesatz %)
        let states = [
            ("bw", 330.0, 2300.0, 380.0),
            ("by", 420.0, 2400.0, 535.0),
            ("be", 900.0, 2600.0, 810.0),
            ("bb", 120.0, 1900.0, 350.0),
            ("hb", 250.0, 2000.0, 635.0),
            ("hh", 800.0, 2600.0, 540.0),
            ("he", 300.0, 2200.0, 460.0),
            ("mv", 90.0, 1800.0, 340.0),
            ("ni", 130.0, 2000.0, 480.0),
            ("nw", 220.0, 2100.0, 440.0),
            ("rp", 150.0, 2000.0, 390.0),
            ("sl", 110.0, 1900.0, 480.0),
            ("sn", 100.0, 1800.0, 420.0),
            ("st", 60.0, 1700.0, 350.0),
            ("sh", 180.0, 2100.0, 380.0),
            ("th", 70.0, 1700.0, 450.0),
        ];

        Self {
            states: states
                .into_iter()
                .map(|(code, land_rate, building_rate, hebesatz_percent)| {
                    let base_rate = if code == "sl" { 0.00034 } else { 0.00031 };
                    (
                        code.to_string(),
                        StateUnitRates {
                            land_rate,
                            building_rate,
                            base_rate,
                            hebesatz_percent,
                        },
                    )
                })
                .collect(),
            type_factors: HashMap::from([
                (PropertyType::Residential, 1.0),
                (PropertyType::Commercial, 1.2),
                (PropertyType::Industrial, 1.3),
                (PropertyType::Agricultural, 0.6),
            ]),
            age_factors: vec![
                AgeFactorRule {
                    built_before: Some(1950),
                    built_after: None,
                    factor: 0.8,
                },
                AgeFactorRule {
                    built_before: Some(1980),
                    built_after: None,
                    factor: 0.9,
                },
                AgeFactorRule {
                    built_before: None,
                    built_after: Some(2010),
                    factor: 1.1,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyTaxTables {
    pub ratio: AssessmentRatioModel,
    pub unit_rate: UnitRateModel,
}

impl PropertyTaxTables {
    pub fn validate(&self) -> TaxResult<()> {
        let ratio = self.ratio.assessment_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(TaxError::InvalidConfiguration(format!(
                "assessment ratio must be positive, got {ratio}"
            )));
        }
        let all_rates = self
            .ratio
            .base_rates
            .values()
            .chain(self.ratio.location_multipliers.values())
            .chain(self.unit_rate.type_factors.values())
            .chain(self.unit_rate.age_factors.iter().map(|r| &r.factor));
        for rate in all_rates {
            if !rate.is_finite() || *rate < 0.0 {
                return Err(TaxError::InvalidConfiguration(format!(
                    "property tax rate {rate} is invalid"
                )));
            }
        }
        for (code, state) in &self.unit_rate.states {
            let values = [
                state.land_rate,
                state.building_rate,
                state.base_rate,
                state.hebesatz_percent,
            ];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(TaxError::InvalidConfiguration(format!(
                    "unit rates for `{code}` are invalid"
                )));
            }
        }
        Ok(())
    }
}

/// Compute the property tax with the built-in tables.
pub fn compute_property_tax(input: &PropertyTaxInput) -> TaxResult<PropertyTaxResult> {
    let tables = RateTables::standard();
    compute_property_tax_with(&tables.property_tax, &tables.jurisdiction_policy, input)
}

pub fn compute_property_tax_with(
    tables: &PropertyTaxTables,
    policy: &JurisdictionPolicy,
    input: &PropertyTaxInput,
) -> TaxResult<PropertyTaxResult> {
    let exemptions = ensure_non_negative("exemptions", input.exemptions)?;
    let improvements = ensure_non_negative("improvements", input.improvements)?;
    if let Some(multiplier) = input.local_multiplier {
        ensure_positive("local_multiplier", multiplier)?;
    }

    match input.valuation {
        Valuation::MarketValue { market_value } => {
            let market_value = ensure_positive("market_value", market_value)?;
            let model = &tables.ratio;
            let base_rate = *model
                .base_rates
                .get(&input.property_type)
                .ok_or_else(|| TaxError::unknown("property type", input.property_type.code()))?;
            let location = policy.resolve(
                &model.location_multipliers,
                &input.jurisdiction,
                JurisdictionKind::LocationClass,
            )?;
            let multiplier = input.local_multiplier.unwrap_or(*location.entry);

            let assessed_value = market_value * model.assessment_ratio;
            Ok(finish(
                PropertyTaxModel::AssessmentRatio,
                location.code,
                location.fallback,
                assessed_value,
                improvements,
                exemptions,
                base_rate,
                multiplier,
                market_value,
            ))
        }
        Valuation::Areas {
            land_area,
            living_area,
        } => {
            let land_area = ensure_positive("land_area", land_area)?;
            let living_area = ensure_positive("living_area", living_area)?;
            if let Some(year) = input.building_year {
                if year <= 0 {
                    return Err(TaxError::invalid("building_year", "must be a calendar year"));
                }
            }
            let model = &tables.unit_rate;
            let type_factor = *model
                .type_factors
                .get(&input.property_type)
                .ok_or_else(|| TaxError::unknown("property type", input.property_type.code()))?;
            let state = policy.resolve(
                &model.states,
                &input.jurisdiction,
                JurisdictionKind::FederalState,
            )?;
            let rates = state.entry;
            let hebesatz = input.local_multiplier.unwrap_or(rates.hebesatz_percent);

            let age_factor = model.age_factor(input.building_year);
            let assessed_value = land_area * rates.land_rate
                + living_area * rates.building_rate * age_factor * type_factor;
            Ok(finish(
                PropertyTaxModel::UnitRate,
                state.code,
                state.fallback,
                assessed_value,
                improvements,
                exemptions,
                rates.base_rate,
                hebesatz / 100.0,
                assessed_value,
            ))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn finish(
    model: PropertyTaxModel,
    jurisdiction: String,
    jurisdiction_fallback: bool,
    assessed_value: f64,
    improvements: f64,
    exemptions: f64,
    base_rate: f64,
    multiplier: f64,
    rate_basis: f64,
) -> PropertyTaxResult {
    let taxable_value = (assessed_value + improvements - exemptions).max(0.0);
    let base_tax = taxable_value * base_rate;
    let final_tax = base_tax * multiplier;

    tracing::debug!(
        "Property tax ({:?}, {}): assessed {:.2}, base {:.2}, final {:.2}",
        model,
        jurisdiction,
        assessed_value,
        base_tax,
        final_tax
    );

    PropertyTaxResult {
        model,
        jurisdiction,
        jurisdiction_fallback,
        assessed_value,
        taxable_value,
        base_rate,
        base_tax,
        multiplier,
        final_tax,
        monthly_tax: final_tax / 12.0,
        effective_rate_percent: percent_of(final_tax, rate_basis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market_input(value: f64, jurisdiction: &str) -> PropertyTaxInput {
        PropertyTaxInput {
            valuation: Valuation::MarketValue {
                market_value: value,
            },
            jurisdiction: jurisdiction.to_string(),
            property_type: PropertyType::Residential,
            building_year: None,
            exemptions: 0.0,
            improvements: 0.0,
            local_multiplier: None,
        }
    }

    #[test]
    fn test_ratio_model_urban_residential() {
        let result = compute_property_tax(&market_input(500_000.0, "urban")).unwrap();

        assert_eq!(result.model, PropertyTaxModel::AssessmentRatio);
        assert!((result.assessed_value - 350_000.0).abs() < 1e-6);
        assert!((result.taxable_value - 350_000.0).abs() < 1e-6);
        assert!((result.base_tax - 1_225.0).abs() < 1e-6);
        assert!((result.final_tax - 1_470.0).abs() < 1e-6);
        assert!((result.monthly_tax - 122.5).abs() < 1e-6);
        assert!((result.effective_rate_percent - 0.294).abs() < 1e-9);
    }

    #[test]
    fn test_exemptions_and_improvements() {
        let mut input = market_input(100_000.0, "suburban");
        input.improvements = 10_000.0;
        input.exemptions = 5_000.0;
        let result = compute_property_tax(&input).unwrap();
        assert!((result.taxable_value - 75_000.0).abs() < 1e-6);

        input.exemptions = 1_000_000.0;
        let result = compute_property_tax(&input).unwrap();
        assert_eq!(result.taxable_value, 0.0);
        assert_eq!(result.final_tax, 0.0);
    }

    #[test]
    fn test_local_multiplier_override() {
        let mut input = market_input(500_000.0, "rural");
        input.local_multiplier = Some(2.0);
        let result = compute_property_tax(&input).unwrap();
        assert!((result.final_tax - 2_450.0).abs() < 1e-6);
    }

    #[test]
    fn test_unit_rate_model() {
        let input = PropertyTaxInput {
            valuation: Valuation::Areas {
                land_area: 500.0,
                living_area: 120.0,
            },
            jurisdiction: "NW".to_string(),
            property_type: PropertyType::Residential,
            building_year: Some(1975),
            exemptions: 0.0,
            improvements: 0.0,
            local_multiplier: None,
        };
        let result = compute_property_tax(&input).unwrap();

        // 500 * 220 + 120 * 2100 * 0.9
        let assessed = 110_000.0 + 226_800.0;
        assert_eq!(result.model, PropertyTaxModel::UnitRate);
        assert_eq!(result.jurisdiction, "nw");
        assert!((result.assessed_value - assessed).abs() < 1e-6);
        assert!((result.base_tax - assessed * 0.00031).abs() < 1e-9);
        assert!((result.final_tax - assessed * 0.00031 * 4.4).abs() < 1e-9);
        assert!((result.monthly_tax * 12.0 - result.final_tax).abs() < 1e-9);
    }

    #[test]
    fn test_age_factors() {
        let model = UnitRateModel::default();
        assert_eq!(model.age_factor(Some(1900)), 0.8);
        assert_eq!(model.age_factor(Some(1950)), 0.9);
        assert_eq!(model.age_factor(Some(1980)), 1.0);
        assert_eq!(model.age_factor(Some(2010)), 1.0);
        assert_eq!(model.age_factor(Some(2015)), 1.1);
        assert_eq!(model.age_factor(None), 1.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            compute_property_tax(&market_input(0.0, "urban")),
            Err(TaxError::InvalidInput { field: "market_value", .. })
        ));
        assert!(matches!(
            compute_property_tax(&market_input(100_000.0, "downtown")),
            Err(TaxError::UnknownCategory { .. })
        ));

        let mut input = market_input(100_000.0, "urban");
        input.exemptions = -1.0;
        assert!(compute_property_tax(&input).is_err());
    }

    #[test]
    fn test_fallback_is_flagged() {
        let tables = PropertyTaxTables::default();
        let policy = JurisdictionPolicy::Fallback {
            federal_state: "nw".to_string(),
            location_class: "suburban".to_string(),
        };
        let result =
            compute_property_tax_with(&tables, &policy, &market_input(100_000.0, "moon")).unwrap();
        assert!(result.jurisdiction_fallback);
        assert_eq!(result.jurisdiction, "suburban");
        assert!((result.multiplier - 1.0).abs() < 1e-12);
    }
}
