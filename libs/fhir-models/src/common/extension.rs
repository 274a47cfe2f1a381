//! FHIR Extension model
//!
//! An extension is a URL plus a single polymorphic value (`value[x]`).
//! Exactly one concrete type is populated per instance; the enum makes any
//! other state unrepresentable.

use super::complex::{CodeableConcept, Quantity, Range, Reference};
use super::datetime::FhirDateTime;
use super::decimal::FhirDecimal;
use serde::{Deserialize, Serialize};

/// The `value[x]` of an extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtensionValue {
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueInteger")]
    Integer(i32),
    #[serde(rename = "valueBoolean")]
    Boolean(bool),
    #[serde(rename = "valueDecimal")]
    Decimal(FhirDecimal),
    #[serde(rename = "valueCodeableConcept")]
    CodeableConcept(CodeableConcept),
    #[serde(rename = "valueReference")]
    Reference(Reference),
    #[serde(rename = "valueDateTime")]
    DateTime(FhirDateTime),
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
    #[serde(rename = "valueRange")]
    Range(Range),
}

impl ExtensionValue {
    /// FHIR datatype name of the populated variant
    pub fn type_name(&self) -> &'static str {
        match self {
            ExtensionValue::String(_) => "string",
            ExtensionValue::Integer(_) => "integer",
            ExtensionValue::Boolean(_) => "boolean",
            ExtensionValue::Decimal(_) => "decimal",
            ExtensionValue::CodeableConcept(_) => "CodeableConcept",
            ExtensionValue::Reference(_) => "Reference",
            ExtensionValue::DateTime(_) => "dateTime",
            ExtensionValue::Quantity(_) => "Quantity",
            ExtensionValue::Range(_) => "Range",
        }
    }
}

/// A named extension value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub url: String,

    #[serde(flatten)]
    pub value: ExtensionValue,
}

impl Extension {
    pub fn new(url: impl Into<String>, value: ExtensionValue) -> Self {
        Self {
            url: url.into(),
            value,
        }
    }

    /// Field name the value is stored under: the last segment of the URL
    ///
    /// `http://example.org/fhir/extensions/foo` → `foo`; a fragment wins over
    /// the path (`http://example.org/sd#bar` → `bar`). Returns `None` when the
    /// URL yields no usable name.
    pub fn field_name(&self) -> Option<&str> {
        let url = self.url.trim();
        let name = match url.rsplit_once('#') {
            Some((_, fragment)) => fragment,
            None => url.trim_end_matches('/').rsplit('/').next().unwrap_or_default(),
        };
        if name.is_empty() || name.starts_with('@') || name.contains(['.', '$']) {
            None
        } else {
            Some(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_name_is_last_url_segment() {
        let ext = Extension::new(
            "http://example.org/fhir/extensions/foo",
            ExtensionValue::String("bar".into()),
        );
        assert_eq!(ext.field_name(), Some("foo"));

        let ext = Extension::new("http://example.org/fhir/extensions/foo/", ExtensionValue::Boolean(true));
        assert_eq!(ext.field_name(), Some("foo"));

        let ext = Extension::new("http://example.org/sd#birthPlace", ExtensionValue::Boolean(true));
        assert_eq!(ext.field_name(), Some("birthPlace"));
    }

    #[test]
    fn field_name_rejects_unusable_keys() {
        for url in ["", "http://example.org/sd#", "http://example.org/a.b", "urn:x/$op"] {
            let ext = Extension::new(url, ExtensionValue::Integer(1));
            assert_eq!(ext.field_name(), None, "{url}");
        }
    }

    #[test]
    fn type_names_match_fhir_datatypes() {
        assert_eq!(ExtensionValue::Integer(1).type_name(), "integer");
        assert_eq!(
            ExtensionValue::CodeableConcept(CodeableConcept::default()).type_name(),
            "CodeableConcept"
        );
        assert_eq!(ExtensionValue::Range(Range::default()).type_name(), "Range");
    }

    #[test]
    fn json_uses_value_x_naming() {
        let ext = Extension::new("http://example.org/fhir/extensions/foo", ExtensionValue::Integer(50));
        let value = serde_json::to_value(&ext).unwrap();
        assert_eq!(
            value,
            json!({"url": "http://example.org/fhir/extensions/foo", "valueInteger": 50})
        );
        let back: Extension = serde_json::from_value(value).unwrap();
        assert_eq!(back, ext);
    }
}
