//! Structure Optimizer
//!
//! Compares ways of holding and selling a property (private sale,
//! partnerships, share deals, cross-border holdings, foundations) by the net
//! profit left after speculation tax.

pub mod catalogue;
pub mod optimizer;

pub use catalogue::{
    base_setup_cost, estimated_setup_cost, StructureCatalogue, StructureDefinition,
    StructureFamily,
};
pub use optimizer::{
    optimize_structures, optimize_with_base_tax, StructureCandidate, StructureOptimizer,
    StructureReport,
};
