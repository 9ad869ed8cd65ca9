//! Ancillary Purchase Costs (Kaufnebenkosten)

use std::collections::HashMap;

use immo_core::{ensure_non_negative, ensure_percent, ensure_positive, percent_of, TaxError, TaxResult};
use serde::{Deserialize, Serialize};

use crate::brackets::BandSchedule;
use crate::tables::{JurisdictionKind, JurisdictionPolicy, RateTables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCostInput {
    pub price: f64,
    /// Federal-state code, e.g. `by`
    pub jurisdiction: String,
    #[serde(default)]
    pub broker_rate_percent: f64,
    /// Replaces the banded notary fee when set
    #[serde(default)]
    pub notary_fee_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseCostResult {
    pub jurisdiction: String,
    pub jurisdiction_fallback: bool,
    pub transfer_tax_rate_percent: f64,
    pub transfer_tax: f64,
    pub notary_fee: f64,
    pub registry_fee: f64,
    pub broker_fee: f64,
    pub total_ancillary: f64,
    pub total_investment: f64,
    /// Ancillary costs as a share of the price
    pub ancillary_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCostTables {
    /// Real-estate transfer tax (Grunderwerbsteuer) per federal state, in percent
    pub transfer_tax_rates: HashMap<String, f64>,
    pub notary_schedule: BandSchedule,
    pub notary_minimum_fee: f64,
    pub registry_fee_percent: f64,
}

impl Default for PurchaseCostTables {
    fn default() -> Self {
        let transfer_tax_rates = [
            ("bw", 5.0),
            ("by", 3.5),
            ("be", 6.0),
            ("bb", 6.5),
            ("hb", 5.0),
            ("hh", 4.5),
            ("he", 6.0),
            ("mv", 6.0),
            ("ni", 5.0),
            ("nw", 6.5),
            ("rp", 5.0),
            ("sl", 6.5),
            ("sn", 3.5),
            ("st", 5.0),
            ("sh", 6.5),
            ("th", 6.5),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        let notary_schedule = BandSchedule::from_boundaries(
            &[25_000.0, 50_000.0, 250_000.0, 500_000.0],
            &[2.0, 1.8, 1.5, 1.2, 1.0],
        )
        .unwrap_or_else(|e| panic!("built-in notary schedule: {e}"));

        Self {
            transfer_tax_rates,
            notary_schedule,
            notary_minimum_fee: 150.0,
            registry_fee_percent: 0.5,
        }
    }
}

impl PurchaseCostTables {
    /// Banded notary fee on `price`, never below the minimum fee
    pub fn notary_fee(&self, price: f64) -> f64 {
        self.notary_schedule.apply(price).max(self.notary_minimum_fee)
    }

    pub fn validate(&self) -> TaxResult<()> {
        self.notary_schedule.validate()?;
        for (code, rate) in &self.transfer_tax_rates {
            if !rate.is_finite() || *rate < 0.0 || *rate > 100.0 {
                return Err(TaxError::InvalidConfiguration(format!(
                    "transfer tax rate for `{code}` is invalid: {rate}"
                )));
            }
        }
        if !self.notary_minimum_fee.is_finite() || self.notary_minimum_fee < 0.0 {
            return Err(TaxError::InvalidConfiguration(
                "notary minimum fee must be non-negative".to_string(),
            ));
        }
        if !self.registry_fee_percent.is_finite() || self.registry_fee_percent < 0.0 {
            return Err(TaxError::InvalidConfiguration(
                "registry fee must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compute ancillary purchase costs with the built-in tables.
pub fn compute_purchase_costs(input: &PurchaseCostInput) -> TaxResult<PurchaseCostResult> {
    let tables = RateTables::standard();
    compute_purchase_costs_with(&tables.purchase_costs, &tables.jurisdiction_policy, input)
}

pub fn compute_purchase_costs_with(
    tables: &PurchaseCostTables,
    policy: &JurisdictionPolicy,
    input: &PurchaseCostInput,
) -> TaxResult<PurchaseCostResult> {
    let price = ensure_positive("price", input.price)?;
    let broker_rate = ensure_percent("broker_rate_percent", input.broker_rate_percent)?;
    if let Some(fee) = input.notary_fee_override {
        ensure_non_negative("notary_fee_override", fee)?;
    }

    let state = policy.resolve(
        &tables.transfer_tax_rates,
        &input.jurisdiction,
        JurisdictionKind::FederalState,
    )?;
    let transfer_tax_rate_percent = *state.entry;

    let transfer_tax = price * transfer_tax_rate_percent / 100.0;
    let notary_fee = input
        .notary_fee_override
        .unwrap_or_else(|| tables.notary_fee(price));
    let registry_fee = price * tables.registry_fee_percent / 100.0;
    let broker_fee = price * broker_rate / 100.0;
    let total_ancillary = transfer_tax + notary_fee + registry_fee + broker_fee;

    tracing::debug!(
        "Purchase costs in {}: price {:.2}, ancillary {:.2}",
        state.code,
        price,
        total_ancillary
    );

    Ok(PurchaseCostResult {
        jurisdiction: state.code,
        jurisdiction_fallback: state.fallback,
        transfer_tax_rate_percent,
        transfer_tax,
        notary_fee,
        registry_fee,
        broker_fee,
        total_ancillary,
        total_investment: price + total_ancillary,
        ancillary_percent: percent_of(total_ancillary, price),
    })
}
