//! Precision-aware FHIR decimal
//!
//! A FHIR decimal carries its precision in how it was written: `10` and `10.0`
//! are the same number but not the same observation. [`FhirDecimal`] keeps the
//! original text for exact round-trips and derives the implied uncertainty
//! interval from the number of fractional digits.

use super::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decimal value together with the text it was parsed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FhirDecimal {
    value: f64,
    text: String,
    precision: u32,
}

impl FhirDecimal {
    /// Parse a decimal literal, keeping its text verbatim
    ///
    /// Scientific notation is rejected: its precision cannot be read off the
    /// fractional digits.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.contains(['e', 'E']) {
            return Err(Error::UnsupportedNumericFormat(text.to_string()));
        }

        let digits = fractional_digits(trimmed)
            .ok_or_else(|| Error::MalformedDecimal(text.to_string()))?;
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| Error::MalformedDecimal(text.to_string()))?;

        // rust_decimal covers 28 fractional digits and magnitudes below ~7.9e28;
        // past that the counted digits are authoritative.
        let precision = match Decimal::from_str_exact(trimmed) {
            Ok(exact) => exact.scale(),
            Err(_) => digits,
        };

        Ok(Self {
            value,
            text: trimmed.to_string(),
            precision,
        })
    }

    /// Build a decimal from a float, using its shortest textual form
    ///
    /// Used for values that were stored as bare numbers.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::MalformedDecimal(value.to_string()));
        }
        Self::parse(&value.to_string())
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The original literal
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of digits after the decimal separator
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Half the width of the uncertainty interval: `0.5 * 10^-precision`
    pub fn half_width(&self) -> f64 {
        0.5 * 10f64.powi(-(self.precision as i32))
    }

    /// Lower bound of the implied interval
    pub fn from(&self) -> f64 {
        self.value - self.half_width()
    }

    /// Upper bound of the implied interval
    pub fn to(&self) -> f64 {
        self.value + self.half_width()
    }

    /// `(from, to)` bounds of the implied interval
    pub fn range(&self) -> (f64, f64) {
        (self.from(), self.to())
    }
}

/// Number of fractional digits in `[+-]digits[.digits]`, or `None` when the
/// text is not a plain decimal literal
fn fractional_digits(text: &str) -> Option<u32> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) if !frac.is_empty() => (int, frac),
        Some(_) => return None,
        None => (unsigned, ""),
    };
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(int) || !is_digits(frac) {
        return None;
    }
    u32::try_from(frac.len()).ok()
}

impl FromStr for FhirDecimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FhirDecimal {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FhirDecimal> for String {
    fn from(value: FhirDecimal) -> Self {
        value.text
    }
}

impl fmt::Display for FhirDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
