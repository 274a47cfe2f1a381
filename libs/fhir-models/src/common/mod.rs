//! Version-agnostic FHIR models
//!
//! Types that work across FHIR R4, R4B, and R5

pub mod complex;
pub mod datetime;
pub mod decimal;
pub mod error;
pub mod extension;

// Re-export commonly used types
pub use complex::*;
pub use datetime::*;
pub use decimal::*;
pub use error::{Error, Result};
pub use extension::*;
