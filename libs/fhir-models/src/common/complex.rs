//! FHIR complex datatypes used as extension values

use super::decimal::FhirDecimal;
use serde::{Deserialize, Serialize};

/// A reference to a code defined by a terminology system
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
        }
    }
}

/// A concept expressed as an ordered set of codings plus free text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

/// A reference from one resource to another
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Literal reference, e.g. `Practitioner/123`
    pub reference: String,

    /// Logical id of the target
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub referenced_id: String,

    /// Resource type of the target
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub reference_type: String,

    /// Whether the target lives outside this server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
}

/// A measured amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: FhirDecimal,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

impl Quantity {
    pub fn new(value: FhirDecimal, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// A set of ordered quantities; either bound may be absent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Quantity>,
}
