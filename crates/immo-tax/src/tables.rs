//! Rate Tables
//!
//! All rates, allowances and jurisdiction data the calculators read. The
//! built-in set is initialised once per process; deployments can load a
//! replacement from JSON.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use immo_core::{TaxError, TaxResult};
use serde::{Deserialize, Serialize};

use crate::capital_gains::CapitalGainsRules;
use crate::cashflow::CashflowRules;
use crate::depreciation::DepreciationTables;
use crate::property_tax::PropertyTaxTables;
use crate::purchase_costs::PurchaseCostTables;
use crate::transfer_tax::TransferTaxTables;

/// Code namespace a jurisdiction string is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JurisdictionKind {
    /// Federal-state codes (`by`, `nw`, ...) of the unit-rate model and purchase costs
    FederalState,
    /// Location classes (`urban`, `suburban`, `rural`) of the assessment-ratio model
    LocationClass,
}

impl JurisdictionKind {
    pub fn label(self) -> &'static str {
        match self {
            JurisdictionKind::FederalState => "federal state",
            JurisdictionKind::LocationClass => "location class",
        }
    }
}

/// What to do with a jurisdiction code that has no table entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum JurisdictionPolicy {
    /// Fail with `UnknownCategory`
    #[default]
    Reject,
    /// Use the baseline of the matching namespace and log a warning
    Fallback {
        federal_state: String,
        location_class: String,
    },
}

/// A jurisdiction entry looked up under a [`JurisdictionPolicy`].
#[derive(Debug)]
pub struct Resolved<'a, T> {
    /// Code of the entry actually used
    pub code: String,
    pub entry: &'a T,
    /// Whether the baseline stood in for an unknown code
    pub fallback: bool,
}

impl JurisdictionPolicy {
    /// Baseline code for `kind`, if the policy falls back at all
    pub fn baseline(&self, kind: JurisdictionKind) -> Option<&str> {
        match self {
            JurisdictionPolicy::Reject => None,
            JurisdictionPolicy::Fallback {
                federal_state,
                location_class,
            } => Some(match kind {
                JurisdictionKind::FederalState => federal_state.as_str(),
                JurisdictionKind::LocationClass => location_class.as_str(),
            }),
        }
    }

    pub fn resolve<'a, T>(
        &self,
        table: &'a HashMap<String, T>,
        code: &str,
        kind: JurisdictionKind,
    ) -> TaxResult<Resolved<'a, T>> {
        let normalized = normalize_code(code);
        if let Some(entry) = table.get(&normalized) {
            return Ok(Resolved {
                code: normalized,
                entry,
                fallback: false,
            });
        }

        let Some(baseline) = self.baseline(kind) else {
            return Err(TaxError::unknown(kind.label(), code));
        };
        if normalized.is_empty() {
            return Err(TaxError::invalid("jurisdiction", "must not be empty"));
        }
        let baseline = normalize_code(baseline);
        let entry = table.get(&baseline).ok_or_else(|| {
            TaxError::InvalidConfiguration(format!(
                "fallback {} `{baseline}` is not in the table",
                kind.label()
            ))
        })?;
        tracing::warn!(
            "Unknown {} code `{}`, falling back to baseline `{}`",
            kind.label(),
            code,
            baseline
        );
        Ok(Resolved {
            code: baseline,
            entry,
            fallback: true,
        })
    }
}

fn ensure_baseline<T>(
    policy: &JurisdictionPolicy,
    kind: JurisdictionKind,
    table_name: &str,
    table: &HashMap<String, T>,
) -> TaxResult<()> {
    if let Some(baseline) = policy.baseline(kind) {
        let baseline = normalize_code(baseline);
        if !table.contains_key(&baseline) {
            return Err(TaxError::InvalidConfiguration(format!(
                "fallback {} `{baseline}` is not in {table_name}",
                kind.label()
            )));
        }
    }
    Ok(())
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// The complete set of tables one calculation run reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTables {
    pub jurisdiction_policy: JurisdictionPolicy,
    pub property_tax: PropertyTaxTables,
    pub depreciation: DepreciationTables,
    pub capital_gains: CapitalGainsRules,
    pub transfer_tax: TransferTaxTables,
    pub purchase_costs: PurchaseCostTables,
    pub cashflow: CashflowRules,
}

static STANDARD: OnceLock<RateTables> = OnceLock::new();

impl RateTables {
    /// Built-in tables, shared for the life of the process
    pub fn standard() -> &'static RateTables {
        STANDARD.get_or_init(RateTables::default)
    }

    pub fn from_json_str(json: &str) -> TaxResult<Self> {
        let tables: RateTables = serde_json::from_str(json)
            .map_err(|e| TaxError::InvalidConfiguration(e.to_string()))?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TaxResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TaxError::InvalidConfiguration(format!("cannot read {}: {e}", path.display()))
        })?;
        let tables = Self::from_json_str(&json)?;
        tracing::info!("Loaded rate tables from {}", path.display());
        Ok(tables)
    }

    pub fn validate(&self) -> TaxResult<()> {
        let policy = &self.jurisdiction_policy;
        ensure_baseline(
            policy,
            JurisdictionKind::FederalState,
            "the transfer tax rates",
            &self.purchase_costs.transfer_tax_rates,
        )?;
        ensure_baseline(
            policy,
            JurisdictionKind::FederalState,
            "the unit-rate states",
            &self.property_tax.unit_rate.states,
        )?;
        ensure_baseline(
            policy,
            JurisdictionKind::LocationClass,
            "the location multipliers",
            &self.property_tax.ratio.location_multipliers,
        )?;
        self.property_tax.validate()?;
        self.depreciation.validate()?;
        self.transfer_tax.validate()?;
        self.purchase_costs.validate()?;
        self.cashflow.validate()?;
        Ok(())
    }
}
