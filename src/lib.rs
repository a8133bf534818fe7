//! Filter expression model for VCF INFO and sample filters.
//!
//! Filters are `(field, operator, value)` triples over the fields of a
//! `FieldCatalog`.  They are encoded into URL-safe strings, expanded into
//! evaluable expressions or Lucene clauses, and applied to variant features.

pub mod cmd;
pub mod common;
pub mod config;
pub mod err;
pub mod expr;
pub mod feature;
pub mod filter;
pub mod interpreter;
