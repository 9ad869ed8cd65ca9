//! Real-Estate Tax Domain Model
//!
//! Stateless calculators for German real-estate taxes. Every calculation is a
//! pure function of its input record and a set of read-only rate tables.
//! The free functions use the built-in tables; [`TaxDomainModel`] carries a
//! caller-supplied set.

pub mod brackets;
pub mod capital_gains;
pub mod cashflow;
pub mod depreciation;
pub mod model;
pub mod property_tax;
pub mod purchase_costs;
pub mod rental_income;
pub mod rental_yield;
pub mod tables;
pub mod transfer_tax;

#[cfg(test)]
mod tests;

pub use brackets::{BandSchedule, BandSlice, TaxBand};
pub use capital_gains::{
    compute_capital_gains, speculation_tax, CapitalGainsInput, CapitalGainsResult,
    CapitalGainsRules, SpeculationTax,
};
pub use cashflow::{
    compute_cashflow_projection, CashflowInput, CashflowProjection, CashflowRules, CashflowYear,
};
pub use depreciation::{
    compute_depreciation, DepreciationInput, DepreciationResult, DepreciationTables,
    SpecialAllowance, SpecialAllowanceKind,
};
pub use immo_core::{
    ComplexityTier, PropertyType, Relationship, TaxClass, TaxError, TaxResult, TransferMode,
    UsageCategory, YieldRating,
};
pub use model::TaxDomainModel;
pub use property_tax::{
    compute_property_tax, PropertyTaxInput, PropertyTaxModel, PropertyTaxResult,
    PropertyTaxTables, Valuation,
};
pub use purchase_costs::{
    compute_purchase_costs, PurchaseCostInput, PurchaseCostResult, PurchaseCostTables,
};
pub use rental_income::{compute_rental_income, RentalIncomeInput, RentalIncomeResult};
pub use rental_yield::{compute_yield, ProjectionYear, YieldInput, YieldResult};
pub use tables::{JurisdictionKind, JurisdictionPolicy, RateTables};
pub use transfer_tax::{
    compute_transfer_tax, TransferTaxInput, TransferTaxResult, TransferTaxTables, Usufruct,
};
