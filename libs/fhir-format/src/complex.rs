//! Composite encoders: Reference, CodeableConcept, Quantity, Range

use crate::decimal::{decode_decimal, encode_decimal};
use crate::fields::{expect_document, optional_bool, optional_str, required_str};
use crate::keys::{REFERENCE, REFERENCE_EXTERNAL, REFERENCE_ID, REFERENCE_TYPE};
use crate::{FormatError, Result};
use bson::{doc, Bson, Document};
use fhirmongo_models::{CodeableConcept, Coding, Quantity, Range, Reference};

/// Flatten a reference into `reference` / `reference__*` sibling keys
///
/// Empty sub-attributes are omitted.
pub fn encode_reference(value: &Reference) -> Document {
    let mut doc = doc! { REFERENCE: value.reference.as_str() };
    if !value.referenced_id.is_empty() {
        doc.insert(REFERENCE_ID, value.referenced_id.as_str());
    }
    if !value.reference_type.is_empty() {
        doc.insert(REFERENCE_TYPE, value.reference_type.as_str());
    }
    if let Some(external) = value.external {
        doc.insert(REFERENCE_EXTERNAL, external);
    }
    doc
}

pub fn decode_reference(value: &Bson) -> Result<Reference> {
    let doc = expect_document(value, "Reference")?;
    Ok(Reference {
        reference: required_str(doc, REFERENCE)?.to_string(),
        referenced_id: optional_str(doc, REFERENCE_ID)?.unwrap_or_default().to_string(),
        reference_type: optional_str(doc, REFERENCE_TYPE)?.unwrap_or_default().to_string(),
        external: optional_bool(doc, REFERENCE_EXTERNAL)?,
    })
}

pub fn encode_codeable_concept(value: &CodeableConcept) -> Document {
    let mut doc = Document::new();
    if !value.coding.is_empty() {
        let coding: Vec<Bson> = value
            .coding
            .iter()
            .map(|c| Bson::Document(doc! { "system": c.system.as_str(), "code": c.code.as_str() }))
            .collect();
        doc.insert("coding", coding);
    }
    if !value.text.is_empty() {
        doc.insert("text", value.text.as_str());
    }
    doc
}

pub fn decode_codeable_concept(value: &Bson) -> Result<CodeableConcept> {
    let doc = expect_document(value, "CodeableConcept")?;

    let coding = match doc.get("coding") {
        None | Some(Bson::Null) => Vec::new(),
        Some(Bson::Array(items)) => items
            .iter()
            .map(|item| -> Result<Coding> {
                let coding = expect_document(item, "Coding")?;
                Ok(Coding {
                    system: optional_str(coding, "system")?.unwrap_or_default().to_string(),
                    code: optional_str(coding, "code")?.unwrap_or_default().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(FormatError::MalformedDocument(
                "CodeableConcept.coding must be an array".to_string(),
            ))
        }
    };

    Ok(CodeableConcept {
        coding,
        text: optional_str(doc, "text")?.unwrap_or_default().to_string(),
    })
}

pub fn encode_quantity(value: &Quantity) -> Document {
    let mut doc = doc! { "value": encode_decimal(&value.value) };
    if !value.unit.is_empty() {
        doc.insert("unit", value.unit.as_str());
    }
    doc
}

pub fn decode_quantity(value: &Bson) -> Result<Quantity> {
    let doc = expect_document(value, "Quantity")?;
    let decimal = doc
        .get("value")
        .ok_or_else(|| FormatError::MalformedDocument("Quantity is missing value".to_string()))?;
    Ok(Quantity {
        value: decode_decimal(decimal)?,
        unit: optional_str(doc, "unit")?.unwrap_or_default().to_string(),
    })
}

pub fn encode_range(value: &Range) -> Document {
    let mut doc = Document::new();
    if let Some(low) = &value.low {
        doc.insert("low", encode_quantity(low));
    }
    if let Some(high) = &value.high {
        doc.insert("high", encode_quantity(high));
    }
    doc
}

pub fn decode_range(value: &Bson) -> Result<Range> {
    let doc = expect_document(value, "Range")?;
    let bound = |key: &str| -> Result<Option<Quantity>> {
        match doc.get(key) {
            None | Some(Bson::Null) => Ok(None),
            Some(q) => decode_quantity(q).map(Some),
        }
    };
    Ok(Range {
        low: bound("low")?,
        high: bound("high")?,
    })
}
