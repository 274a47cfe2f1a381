//! Approximate-range encoding for dateTimes

use crate::fields::optional_str;
use crate::keys::{FROM, STR_DATE, TO};
use crate::{FormatError, Result};
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use fhirmongo_models::{FhirDateTime, Precision};

pub fn encode_datetime(value: &FhirDateTime) -> Result<Document> {
    let (from, to) = value.range()?;
    Ok(doc! {
        FROM: bson::DateTime::from_chrono(from),
        TO: bson::DateTime::from_chrono(to),
        STR_DATE: value.to_fhir_string(),
    })
}

/// Decode an approximate dateTime
///
/// The instant comes from `__from`, the precision from which fields
/// `__strDate` carries. A bare BSON datetime is read as a timestamp.
pub fn decode_datetime(value: &Bson) -> Result<FhirDateTime> {
    match value {
        Bson::Document(doc) => decode_datetime_document(doc),
        Bson::DateTime(dt) => Ok(FhirDateTime::new(dt.to_chrono(), Precision::Timestamp)),
        Bson::String(s) => Ok(FhirDateTime::parse(s)?),
        _ => Err(FormatError::MalformedDocument(
            "dateTime must be a document or a datetime".to_string(),
        )),
    }
}

fn decode_datetime_document(doc: &Document) -> Result<FhirDateTime> {
    let text = optional_str(doc, STR_DATE)?.ok_or_else(|| {
        FormatError::MalformedDocument(format!("dateTime is missing {STR_DATE:?}"))
    })?;
    let parsed = FhirDateTime::parse(text)?;

    let time: DateTime<Utc> = match doc.get(FROM) {
        Some(Bson::DateTime(from)) => from.to_chrono(),
        None | Some(Bson::Null) => parsed.time,
        Some(_) => {
            return Err(FormatError::MalformedDocument(format!(
                "field {FROM:?} must be a datetime"
            )))
        }
    };

    Ok(FhirDateTime::new(time, parsed.precision))
}
