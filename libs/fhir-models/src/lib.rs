//! FHIR data models for document storage
//!
//! This crate provides strongly-typed Rust structures for the FHIR values
//! that are persisted through the BSON codec in `fhirmongo-format`.
//!
//! # Module Organization
//!
//! - `common`: Version-agnostic models that work across FHIR R4, R4B, and R5
//!
//! # Design Philosophy
//!
//! - **Closed choice types**: an [`ExtensionValue`] holds exactly one concrete value
//! - **Precision-aware**: [`FhirDecimal`] and [`FhirDateTime`] know the interval
//!   implied by how precisely they were written
//! - **Exact round-trip**: decimals keep their original text next to the float
//!
//! # Example
//!
//! ```rust
//! use fhirmongo_models::common::FhirDecimal;
//!
//! let value = FhirDecimal::parse("10").unwrap();
//! assert_eq!(value.precision(), 0);
//! assert_eq!(value.range(), (9.5, 10.5));
//! ```

pub mod common;

// Re-export commonly used types
pub use common::*;
