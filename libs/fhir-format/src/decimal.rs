//! Approximate-range encoding for decimals
//!
//! `10` is stored as `{__num: 10.0, __strNum: "10", __from: 9.5, __to: 10.5}`.
//! Queries match on `__from`/`__to`; decoding trusts only `__strNum`.

use crate::fields::{as_number, optional_number, optional_str};
use crate::keys::{FROM, NUM, STR_NUM, TO};
use crate::{FormatError, Result};
use bson::{doc, Bson, Document};
use fhirmongo_models::FhirDecimal;

pub fn encode_decimal(value: &FhirDecimal) -> Document {
    let (from, to) = value.range();
    doc! {
        NUM: value.value(),
        STR_NUM: value.as_str(),
        FROM: from,
        TO: to,
    }
}

/// Decode an approximate decimal
///
/// Bare numbers written before the range encoding existed are accepted and
/// read with the precision of their shortest textual form.
pub fn decode_decimal(value: &Bson) -> Result<FhirDecimal> {
    match value {
        Bson::Document(doc) => decode_decimal_document(doc),
        Bson::Int32(i) => Ok(FhirDecimal::parse(&i.to_string())?),
        Bson::Int64(i) => Ok(FhirDecimal::parse(&i.to_string())?),
        Bson::Double(f) => Ok(FhirDecimal::from_f64(*f)?),
        _ => Err(FormatError::MalformedDocument(
            "decimal must be a document or a number".to_string(),
        )),
    }
}

fn decode_decimal_document(doc: &Document) -> Result<FhirDecimal> {
    let text = optional_str(doc, STR_NUM)?.ok_or_else(|| {
        FormatError::MalformedDocument(format!("decimal is missing {STR_NUM:?}"))
    })?;
    let decimal = FhirDecimal::parse(text)?;

    if let Some(num) = optional_number(doc, NUM)? {
        if (num - decimal.value()).abs() > decimal.half_width() {
            return Err(FormatError::MalformedDocument(format!(
                "{NUM:?} {num} disagrees with {STR_NUM:?} {text:?}"
            )));
        }
    }

    let from = doc.get(FROM).and_then(as_number);
    let to = doc.get(TO).and_then(as_number);
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(FormatError::MalformedDocument(format!(
                "decimal range is inverted: {from} > {to}"
            )));
        }
    }

    Ok(decimal)
}
