//! Error types for FHIR models

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed decimal: {0:?}")]
    MalformedDecimal(String),

    #[error("Unsupported numeric format (scientific notation): {0:?}")]
    UnsupportedNumericFormat(String),

    #[error("Malformed dateTime: {0:?}")]
    MalformedDateTime(String),

    #[error("dateTime out of range: {0}")]
    DateTimeOutOfRange(String),
}

pub type Result<T> = std::result::Result<T, Error>;
