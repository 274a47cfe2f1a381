//! FHIR ↔ BSON document codec.
//!
//! Converts typed extension values into the nested document shape stored in
//! MongoDB and back. The document convention is part of the on-disk contract:
//! - Each extension value lives under a field named after its URL's last segment.
//! - A top-level `@context` map records `{ "@id": url, "@type": tag }` per field.
//! - Decimals and dateTimes are stored with `__from`/`__to` bounds so range
//!   queries can match them approximately, next to their exact text
//!   (`__strNum`, `__strDate`).
//! - Reference sub-attributes are flattened into `reference__*` sibling keys.

mod complex;
mod datetime;
mod decimal;
mod extension;
mod fields;

use thiserror::Error;

pub use complex::{
    decode_codeable_concept, decode_quantity, decode_range, decode_reference,
    encode_codeable_concept, encode_quantity, encode_range, encode_reference,
};
pub use datetime::{decode_datetime, encode_datetime};
pub use decimal::{decode_decimal, encode_decimal};
pub use extension::{
    codec_for, decode_extension, decode_extension_field, decode_extensions, decode_value,
    encode_extension, encode_extensions, encode_value, ValueCodec,
};

/// Document keys shared with the storage layer and its queries.
pub mod keys {
    pub const CONTEXT: &str = "@context";
    pub const CONTEXT_ID: &str = "@id";
    pub const CONTEXT_TYPE: &str = "@type";

    pub const NUM: &str = "__num";
    pub const STR_NUM: &str = "__strNum";
    pub const FROM: &str = "__from";
    pub const TO: &str = "__to";
    pub const STR_DATE: &str = "__strDate";

    pub const REFERENCE: &str = "reference";
    pub const REFERENCE_ID: &str = "reference__id";
    pub const REFERENCE_TYPE: &str = "reference__type";
    pub const REFERENCE_EXTERNAL: &str = "reference__external";
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("malformed decimal: {0:?}")]
    MalformedDecimal(String),
    #[error("unsupported numeric format: {0:?}")]
    UnsupportedNumericFormat(String),
    #[error("malformed dateTime: {0:?}")]
    MalformedDateTime(String),
    #[error("unknown value type {0:?}")]
    UnknownValueType(String),
    #[error("no @context entry for field {0:?}")]
    MissingContextEntry(String),
    #[error("no value set for extension {0:?}")]
    NoValueSet(String),
    #[error("more than one value set: {0:?}")]
    MultipleValuesSet(Vec<String>),
    #[error("duplicate @context key {0:?}")]
    DuplicateContextKey(String),
    #[error("extension url {0:?} does not yield a field name")]
    InvalidExtensionUrl(String),
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

pub type Result<T> = std::result::Result<T, FormatError>;

impl From<fhirmongo_models::Error> for FormatError {
    fn from(err: fhirmongo_models::Error) -> Self {
        use fhirmongo_models::Error;
        match err {
            Error::MalformedDecimal(s) => FormatError::MalformedDecimal(s),
            Error::UnsupportedNumericFormat(s) => FormatError::UnsupportedNumericFormat(s),
            Error::MalformedDateTime(s) | Error::DateTimeOutOfRange(s) => {
                FormatError::MalformedDateTime(s)
            }
        }
    }
}
