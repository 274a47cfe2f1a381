//! Typed field access on BSON documents

use crate::{FormatError, Result};
use bson::{Bson, Document};

pub(crate) fn expect_document<'a>(value: &'a Bson, what: &str) -> Result<&'a Document> {
    value
        .as_document()
        .ok_or_else(|| FormatError::MalformedDocument(format!("{what} must be a document")))
}

pub(crate) fn optional_str<'a>(doc: &'a Document, key: &str) -> Result<Option<&'a str>> {
    match doc.get(key) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s)),
        Some(_) => Err(FormatError::MalformedDocument(format!(
            "field {key:?} must be a string"
        ))),
    }
}

pub(crate) fn required_str<'a>(doc: &'a Document, key: &str) -> Result<&'a str> {
    optional_str(doc, key)?
        .ok_or_else(|| FormatError::MalformedDocument(format!("missing field {key:?}")))
}

pub(crate) fn optional_bool(doc: &Document, key: &str) -> Result<Option<bool>> {
    match doc.get(key) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::Boolean(b)) => Ok(Some(*b)),
        Some(_) => Err(FormatError::MalformedDocument(format!(
            "field {key:?} must be a boolean"
        ))),
    }
}

/// Any BSON numeric as f64
pub(crate) fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(f) => Some(*f),
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        _ => None,
    }
}

pub(crate) fn optional_number(doc: &Document, key: &str) -> Result<Option<f64>> {
    match doc.get(key) {
        None | Some(Bson::Null) => Ok(None),
        Some(value) => as_number(value).map(Some).ok_or_else(|| {
            FormatError::MalformedDocument(format!("field {key:?} must be numeric"))
        }),
    }
}
