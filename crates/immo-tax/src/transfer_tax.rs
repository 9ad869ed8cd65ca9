//! Inheritance and Gift Tax (Erbschaft- / Schenkungsteuer)
//!
//! Both taxes share one engine: an allowance (Freibetrag) looked up by
//! relationship, a tax class looked up by relationship, and a progressive
//! band schedule per tax class. Allowances and classes are kept in separate
//! tables per transfer mode because they differ between the two.

use std::collections::HashMap;

use immo_core::{
    ensure_non_negative, ensure_positive, ensure_range, percent_of, Relationship, TaxClass,
    TaxError, TaxResult, TransferMode,
};
use serde::{Deserialize, Serialize};

use crate::brackets::{BandSchedule, BandSlice};
use crate::tables::RateTables;

/// Retained life-use right (Nießbrauch) of the donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usufruct {
    /// Yearly value of the retained use
    pub annual_value: f64,
    /// Age of the donor at the time of the gift
    pub grantor_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTaxInput {
    /// Value of the transferred property
    pub gross_value: f64,
    pub relationship: Relationship,
    #[serde(default)]
    pub other_assets: f64,
    /// Earlier gifts from the same donor inside the look-back window (gift only)
    #[serde(default)]
    pub prior_gifts_within_window: f64,
    /// Property is the owner-occupied family home and the use conditions hold
    #[serde(default)]
    pub owner_occupied_residence: bool,
    /// Share of the property transferred, in percent (gift only)
    #[serde(default)]
    pub transferred_share_percent: Option<f64>,
    /// Usufruct retained by the donor (gift only)
    #[serde(default)]
    pub usufruct: Option<Usufruct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferTaxResult {
    pub mode: TransferMode,
    pub relationship: Relationship,
    /// Property value after share scaling and usufruct deduction
    pub transferred_value: f64,
    pub usufruct_capital_value: f64,
    pub residence_exemption_applied: bool,
    pub total_estate_value: f64,
    pub allowance: f64,
    pub taxable_amount: f64,
    pub tax_amount: f64,
    pub effective_rate_percent: f64,
    pub net_amount: f64,
    pub tax_class: TaxClass,
    pub bracket_breakdown: Vec<BandSlice>,
}

/// Capitalisation of a retained usufruct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsufructRules {
    /// Age the remaining life expectancy is measured against
    pub life_expectancy_age: u32,
    /// Minimum number of years capitalised
    pub minimum_years: u32,
    pub capitalisation_factor: f64,
}

impl Default for UsufructRules {
    fn default() -> Self {
        Self {
            life_expectancy_age: 85,
            minimum_years: 1,
            capitalisation_factor: 0.7,
        }
    }
}

impl UsufructRules {
    pub fn capital_value(&self, usufruct: &Usufruct) -> f64 {
        let years = self
            .life_expectancy_age
            .saturating_sub(usufruct.grantor_age)
            .max(self.minimum_years);
        usufruct.annual_value * years as f64 * self.capitalisation_factor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferTaxTables {
    pub allowances: HashMap<TransferMode, HashMap<Relationship, f64>>,
    pub tax_classes: HashMap<TransferMode, HashMap<Relationship, TaxClass>>,
    pub schedules: HashMap<TaxClass, BandSchedule>,
    /// Relationships for which the family-home exemption applies, per mode
    pub residence_exemption: HashMap<TransferMode, Vec<Relationship>>,
    pub usufruct: UsufructRules,
}

const BAND_BOUNDARIES: [f64; 6] = [
    75_000.0,
    300_000.0,
    600_000.0,
    6_000_000.0,
    13_000_000.0,
    26_000_000.0,
];

impl Default for TransferTaxTables {
    fn default() -> Self {
        use Relationship::*;

        let inheritance_allowances = HashMap::from([
            (Spouse, 500_000.0),
            (Child, 400_000.0),
            (Grandchild, 200_000.0),
            (GreatGrandchild, 100_000.0),
            (Parent, 100_000.0),
            (Sibling, 20_000.0),
            (NieceNephew, 20_000.0),
            (Other, 20_000.0),
            (Unrelated, 20_000.0),
        ]);
        let mut gift_allowances = inheritance_allowances.clone();
        gift_allowances.insert(Parent, 20_000.0);

        let classes = HashMap::from([
            (Spouse, TaxClass::I),
            (Child, TaxClass::I),
            (Grandchild, TaxClass::I),
            (GreatGrandchild, TaxClass::I),
            (Parent, TaxClass::II),
            (Sibling, TaxClass::II),
            (NieceNephew, TaxClass::II),
            (Other, TaxClass::III),
            (Unrelated, TaxClass::III),
        ]);

        let schedule = |rates: &[f64]| {
            BandSchedule::from_boundaries(&BAND_BOUNDARIES, rates)
                .unwrap_or_else(|e| panic!("built-in transfer tax schedule: {e}"))
        };

        Self {
            allowances: HashMap::from([
                (TransferMode::Inheritance, inheritance_allowances),
                (TransferMode::Gift, gift_allowances),
            ]),
            tax_classes: HashMap::from([
                (TransferMode::Inheritance, classes.clone()),
                (TransferMode::Gift, classes),
            ]),
            schedules: HashMap::from([
                (TaxClass::I, schedule(&[7.0, 11.0, 15.0, 19.0, 23.0, 27.0, 30.0])),
                (TaxClass::II, schedule(&[15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 43.0])),
                (TaxClass::III, schedule(&[30.0, 30.0, 30.0, 30.0, 50.0, 50.0, 50.0])),
            ]),
            residence_exemption: HashMap::from([
                (TransferMode::Inheritance, vec![Spouse, Child]),
                (TransferMode::Gift, vec![Spouse]),
            ]),
            usufruct: UsufructRules::default(),
        }
    }
}

impl TransferTaxTables {
    pub fn allowance(&self, mode: TransferMode, relationship: Relationship) -> TaxResult<f64> {
        self.allowances
            .get(&mode)
            .and_then(|t| t.get(&relationship))
            .copied()
            .ok_or_else(|| TaxError::unknown("relationship", relationship.code()))
    }

    pub fn tax_class(&self, mode: TransferMode, relationship: Relationship) -> TaxResult<TaxClass> {
        self.tax_classes
            .get(&mode)
            .and_then(|t| t.get(&relationship))
            .copied()
            .ok_or_else(|| TaxError::unknown("relationship", relationship.code()))
    }

    pub fn schedule(&self, class: TaxClass) -> TaxResult<&BandSchedule> {
        self.schedules
            .get(&class)
            .ok_or_else(|| TaxError::unknown("tax class", class.to_string()))
    }

    pub fn validate(&self) -> TaxResult<()> {
        for schedule in self.schedules.values() {
            schedule.validate()?;
        }
        for (mode, classes) in &self.tax_classes {
            for class in classes.values() {
                if !self.schedules.contains_key(class) {
                    return Err(TaxError::InvalidConfiguration(format!(
                        "{mode} maps to tax class {class} which has no schedule"
                    )));
                }
            }
        }
        for table in self.allowances.values() {
            if table.values().any(|a| !a.is_finite() || *a < 0.0) {
                return Err(TaxError::InvalidConfiguration(
                    "allowances must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Compute inheritance or gift tax with the built-in tables.
pub fn compute_transfer_tax(
    input: &TransferTaxInput,
    mode: TransferMode,
) -> TaxResult<TransferTaxResult> {
    compute_transfer_tax_with(&RateTables::standard().transfer_tax, input, mode)
}

pub fn compute_transfer_tax_with(
    tables: &TransferTaxTables,
    input: &TransferTaxInput,
    mode: TransferMode,
) -> TaxResult<TransferTaxResult> {
    let gross_value = ensure_positive("gross_value", input.gross_value)?;
    let other_assets = ensure_non_negative("other_assets", input.other_assets)?;
    let prior_gifts =
        ensure_non_negative("prior_gifts_within_window", input.prior_gifts_within_window)?;

    if mode == TransferMode::Inheritance {
        if prior_gifts > 0.0 {
            return Err(TaxError::invalid("prior_gifts_within_window", "applies to gifts only"));
        }
        if input.transferred_share_percent.is_some() {
            return Err(TaxError::invalid("transferred_share_percent", "applies to gifts only"));
        }
        if input.usufruct.is_some() {
            return Err(TaxError::invalid("usufruct", "applies to gifts only"));
        }
    }

    let mut transferred_value = gross_value;
    if let Some(share) = input.transferred_share_percent {
        let share = ensure_range("transferred_share_percent", share, f64::MIN_POSITIVE, 100.0)?;
        transferred_value *= share / 100.0;
    }

    let mut usufruct_capital_value = 0.0;
    if let Some(usufruct) = &input.usufruct {
        ensure_non_negative("usufruct.annual_value", usufruct.annual_value)?;
        usufruct_capital_value = tables.usufruct.capital_value(usufruct);
        transferred_value = (transferred_value - usufruct_capital_value).max(0.0);
    }

    let allowance = tables.allowance(mode, input.relationship)?;
    let tax_class = tables.tax_class(mode, input.relationship)?;
    let schedule = tables.schedule(tax_class)?;

    let residence_exemption_applied = input.owner_occupied_residence
        && tables
            .residence_exemption
            .get(&mode)
            .is_some_and(|r| r.contains(&input.relationship));
    if input.owner_occupied_residence && !residence_exemption_applied {
        tracing::debug!(
            "Family-home exemption not available for {} ({})",
            input.relationship,
            mode
        );
    }

    let property_part = if residence_exemption_applied {
        0.0
    } else {
        transferred_value
    };
    let total_estate_value = property_part
        + other_assets
        + match mode {
            TransferMode::Gift => prior_gifts,
            TransferMode::Inheritance => 0.0,
        };

    let taxable_amount = (total_estate_value - allowance).max(0.0);
    let bracket_breakdown = schedule.breakdown(taxable_amount);
    let tax_amount: f64 = bracket_breakdown.iter().map(|s| s.tax).sum();

    tracing::debug!(
        "{} tax for {} (class {}): total {:.2}, allowance {:.2}, tax {:.2}",
        mode,
        input.relationship,
        tax_class,
        total_estate_value,
        allowance,
        tax_amount
    );

    Ok(TransferTaxResult {
        mode,
        relationship: input.relationship,
        transferred_value,
        usufruct_capital_value,
        residence_exemption_applied,
        total_estate_value,
        allowance,
        taxable_amount,
        tax_amount,
        effective_rate_percent: percent_of(tax_amount, total_estate_value),
        net_amount: total_estate_value - tax_amount,
        tax_class,
        bracket_breakdown,
    })
}
