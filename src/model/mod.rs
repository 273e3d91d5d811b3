//! Data model exchanged with the CFG codec.
//!
//! - [`configuration`] – A single atomic configuration (species, positions, cell, properties)
//!   and its invariant-checking builder.
//! - [`mapping`] – The injected label ↔ type-ID translation used on the wire.
//! - [`stress`] – Physical stress in Voigt order and its `PlusStress` wire convention.

pub mod configuration;
pub mod mapping;
pub mod stress;
