//! Fixed evaluation scenarios for the price-paid text-to-SQL pipeline and the
//! predicates they are built from.

pub mod columns;
pub mod registry;
pub mod rows;
pub mod sql;

pub use registry::default_scenarios;
