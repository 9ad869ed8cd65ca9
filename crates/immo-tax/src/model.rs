//! Tax Domain Model
//!
//! One handle over every calculator, bound to a set of rate tables.

use std::sync::Arc;

use immo_core::{TaxResult, TransferMode};

use crate::capital_gains::{compute_capital_gains_with, CapitalGainsInput, CapitalGainsResult};
use crate::cashflow::{compute_cashflow_projection_with, CashflowInput, CashflowProjection};
use crate::depreciation::{compute_depreciation_with, DepreciationInput, DepreciationResult};
use crate::property_tax::{compute_property_tax_with, PropertyTaxInput, PropertyTaxResult};
use crate::purchase_costs::{compute_purchase_costs_with, PurchaseCostInput, PurchaseCostResult};
use crate::rental_income::{compute_rental_income, RentalIncomeInput, RentalIncomeResult};
use crate::rental_yield::{compute_yield, YieldInput, YieldResult};
use crate::tables::RateTables;
use crate::transfer_tax::{compute_transfer_tax_with, TransferTaxInput, TransferTaxResult};

/// Calculators bound to a shared, read-only set of rate tables.
///
/// Cloning is cheap; clones share the tables.
#[derive(Debug, Clone)]
pub struct TaxDomainModel {
    tables: Arc<RateTables>,
}

impl Default for TaxDomainModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TaxDomainModel {
    /// Model over the built-in tables
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RateTables::standard().clone()),
        }
    }

    /// Model over caller-supplied tables, validated first
    pub fn with_tables(tables: RateTables) -> TaxResult<Self> {
        tables.validate()?;
        Ok(Self {
            tables: Arc::new(tables),
        })
    }

    pub fn tables(&self) -> &RateTables {
        &self.tables
    }

    pub fn property_tax(&self, input: &PropertyTaxInput) -> TaxResult<PropertyTaxResult> {
        compute_property_tax_with(
            &self.tables.property_tax,
            &self.tables.jurisdiction_policy,
            input,
        )
    }

    pub fn depreciation(&self, input: &DepreciationInput) -> TaxResult<DepreciationResult> {
        compute_depreciation_with(&self.tables.depreciation, input)
    }

    pub fn capital_gains(&self, input: &CapitalGainsInput) -> TaxResult<CapitalGainsResult> {
        compute_capital_gains_with(&self.tables.capital_gains, input)
    }

    pub fn transfer_tax(
        &self,
        input: &TransferTaxInput,
        mode: TransferMode,
    ) -> TaxResult<TransferTaxResult> {
        compute_transfer_tax_with(&self.tables.transfer_tax, input, mode)
    }

    pub fn purchase_costs(&self, input: &PurchaseCostInput) -> TaxResult<PurchaseCostResult> {
        compute_purchase_costs_with(
            &self.tables.purchase_costs,
            &self.tables.jurisdiction_policy,
            input,
        )
    }

    pub fn rental_yield(&self, input: &YieldInput) -> TaxResult<YieldResult> {
        compute_yield(input)
    }

    pub fn cashflow_projection(&self, input: &CashflowInput) -> TaxResult<CashflowProjection> {
        compute_cashflow_projection_with(&self.tables.cashflow, input)
    }

    pub fn rental_income(&self, input: &RentalIncomeInput) -> TaxResult<RentalIncomeResult> {
        compute_rental_income(input)
    }
}
