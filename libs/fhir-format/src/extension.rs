//! Extension codec: `@context` bookkeeping and type-tag dispatch
//!
//! An extension `{url: ".../foo", value}` is stored as
//!
//! ```text
//! {
//!   "@context": { "foo": { "@id": url, "@type": tag } },
//!   "foo": <encoded value>
//! }
//! ```

use crate::complex::{
    decode_codeable_concept, decode_quantity, decode_range, decode_reference,
    encode_codeable_concept, encode_quantity, encode_range, encode_reference,
};
use crate::datetime::{decode_datetime, encode_datetime};
use crate::decimal::{decode_decimal, encode_decimal};
use crate::fields::{expect_document, required_str};
use crate::keys::{CONTEXT, CONTEXT_ID, CONTEXT_TYPE};
use crate::{FormatError, Result};
use bson::{doc, Bson, Document};
use fhirmongo_models::{Extension, ExtensionValue};

/// Encoder/decoder pair for one `@type` tag
pub struct ValueCodec {
    pub type_tag: &'static str,
    /// Returns `None` when the value is not of this codec's variant.
    encode: fn(&ExtensionValue) -> Option<Result<Bson>>,
    decode: fn(&Bson) -> Result<ExtensionValue>,
}

impl ValueCodec {
    pub fn encode(&self, value: &ExtensionValue) -> Option<Result<Bson>> {
        (self.encode)(value)
    }

    pub fn decode(&self, value: &Bson) -> Result<ExtensionValue> {
        (self.decode)(value)
    }
}

static VALUE_CODECS: &[ValueCodec] = &[
    ValueCodec {
        type_tag: "string",
        encode: |v| match v {
            ExtensionValue::String(s) => Some(Ok(Bson::String(s.clone()))),
            _ => None,
        },
        decode: decode_string,
    },
    ValueCodec {
        type_tag: "integer",
        encode: |v| match v {
            ExtensionValue::Integer(i) => Some(Ok(Bson::Int32(*i))),
            _ => None,
        },
        decode: decode_integer,
    },
    ValueCodec {
        type_tag: "boolean",
        encode: |v| match v {
            ExtensionValue::Boolean(b) => Some(Ok(Bson::Boolean(*b))),
            _ => None,
        },
        decode: decode_boolean,
    },
    ValueCodec {
        type_tag: "decimal",
        encode: |v| match v {
            ExtensionValue::Decimal(d) => Some(Ok(Bson::Document(encode_decimal(d)))),
            _ => None,
        },
        decode: |b| decode_decimal(b).map(ExtensionValue::Decimal),
    },
    ValueCodec {
        type_tag: "CodeableConcept",
        encode: |v| match v {
            ExtensionValue::CodeableConcept(cc) => {
                Some(Ok(Bson::Document(encode_codeable_concept(cc))))
            }
            _ => None,
        },
        decode: |b| decode_codeable_concept(b).map(ExtensionValue::CodeableConcept),
    },
    ValueCodec {
        type_tag: "Reference",
        encode: |v| match v {
            ExtensionValue::Reference(r) => Some(Ok(Bson::Document(encode_reference(r)))),
            _ => None,
        },
        decode: |b| decode_reference(b).map(ExtensionValue::Reference),
    },
    ValueCodec {
        type_tag: "dateTime",
        encode: |v| match v {
            ExtensionValue::DateTime(dt) => Some(encode_datetime(dt).map(Bson::Document)),
            _ => None,
        },
        decode: |b| decode_datetime(b).map(ExtensionValue::DateTime),
    },
    ValueCodec {
        type_tag: "Quantity",
        encode: |v| match v {
            ExtensionValue::Quantity(q) => Some(Ok(Bson::Document(encode_quantity(q)))),
            _ => None,
        },
        decode: |b| decode_quantity(b).map(ExtensionValue::Quantity),
    },
    ValueCodec {
        type_tag: "Range",
        encode: |v| match v {
            ExtensionValue::Range(r) => Some(Ok(Bson::Document(encode_range(r)))),
            _ => None,
        },
        decode: |b| decode_range(b).map(ExtensionValue::Range),
    },
];

pub fn codec_for(type_tag: &str) -> Option<&'static ValueCodec> {
    VALUE_CODECS.iter().find(|c| c.type_tag == type_tag)
}

fn decode_string(value: &Bson) -> Result<ExtensionValue> {
    match value {
        Bson::String(s) => Ok(ExtensionValue::String(s.clone())),
        _ => Err(FormatError::MalformedDocument("string value expected".to_string())),
    }
}

fn decode_integer(value: &Bson) -> Result<ExtensionValue> {
    let out_of_range = || FormatError::MalformedDocument(format!("integer out of range: {value}"));
    match value {
        Bson::Int32(i) => Ok(ExtensionValue::Integer(*i)),
        Bson::Int64(i) => i32::try_from(*i)
            .map(ExtensionValue::Integer)
            .map_err(|_| out_of_range()),
        Bson::Double(f) if f.fract() == 0.0 => {
            if *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX) {
                Ok(ExtensionValue::Integer(*f as i32))
            } else {
                Err(out_of_range())
            }
        }
        _ => Err(FormatError::MalformedDocument("integer value expected".to_string())),
    }
}

fn decode_boolean(value: &Bson) -> Result<ExtensionValue> {
    match value {
        Bson::Boolean(b) => Ok(ExtensionValue::Boolean(*b)),
        _ => Err(FormatError::MalformedDocument("boolean value expected".to_string())),
    }
}

/// Encode a value, returning its `@type` tag alongside the encoded BSON
pub fn encode_value(value: &ExtensionValue) -> Result<(&'static str, Bson)> {
    for codec in VALUE_CODECS {
        if let Some(encoded) = codec.encode(value) {
            return encoded.map(|bson| (codec.type_tag, bson));
        }
    }
    Err(FormatError::UnknownValueType(value.type_name().to_string()))
}

/// Decode a value stored under the given `@type` tag
pub fn decode_value(value: &Bson, type_tag: &str) -> Result<ExtensionValue> {
    let codec =
        codec_for(type_tag).ok_or_else(|| FormatError::UnknownValueType(type_tag.to_string()))?;
    codec.decode(value)
}

/// Encode a single extension into its own document
pub fn encode_extension(extension: &Extension) -> Result<Document> {
    encode_extensions(std::slice::from_ref(extension))
}

/// Encode several extensions into one document sharing a single `@context`
///
/// Two extensions deriving the same field name is an error: the second would
/// silently overwrite the first.
pub fn encode_extensions(extensions: &[Extension]) -> Result<Document> {
    let mut context = Document::new();
    let mut fields = Document::new();

    for extension in extensions {
        let field = extension
            .field_name()
            .ok_or_else(|| FormatError::InvalidExtensionUrl(extension.url.clone()))?;
        if context.contains_key(field) {
            return Err(FormatError::DuplicateContextKey(field.to_string()));
        }

        let (type_tag, encoded) = encode_value(&extension.value)?;
        context.insert(
            field,
            doc! { CONTEXT_ID: extension.url.as_str(), CONTEXT_TYPE: type_tag },
        );
        fields.insert(field, encoded);
    }

    let mut doc = doc! { CONTEXT: context };
    doc.extend(fields);
    Ok(doc)
}

/// Decode a document holding exactly one extension
pub fn decode_extension(doc: &Document) -> Result<Extension> {
    let value_fields: Vec<&String> = doc.keys().filter(|k| k.as_str() != CONTEXT).collect();
    match value_fields.as_slice() {
        [field] => decode_extension_field(doc, field),
        [] => {
            let name = doc
                .get_document(CONTEXT)
                .ok()
                .and_then(|context| context.keys().next().cloned())
                .unwrap_or_default();
            Err(FormatError::NoValueSet(name))
        }
        many => Err(FormatError::MultipleValuesSet(
            many.iter().map(|k| k.to_string()).collect(),
        )),
    }
}

/// Decode the extension stored under `field`
pub fn decode_extension_field(doc: &Document, field: &str) -> Result<Extension> {
    let context = match doc.get(CONTEXT) {
        Some(context) => expect_document(context, CONTEXT)?,
        None => return Err(FormatError::MissingContextEntry(field.to_string())),
    };
    let entry = context
        .get(field)
        .ok_or_else(|| FormatError::MissingContextEntry(field.to_string()))?;
    let entry = expect_document(entry, "@context entry")?;
    let url = required_str(entry, CONTEXT_ID)?;
    let type_tag = required_str(entry, CONTEXT_TYPE)?;

    let value = match doc.get(field) {
        None | Some(Bson::Null) => return Err(FormatError::NoValueSet(field.to_string())),
        Some(value) => value,
    };

    Ok(Extension::new(url, decode_value(value, type_tag)?))
}

/// Decode every extension in a document, in `@context` order
///
/// Every value field needs a context entry and every context entry needs a
/// value.
pub fn decode_extensions(doc: &Document) -> Result<Vec<Extension>> {
    if let Some(field) = doc.keys().find(|k| k.as_str() != CONTEXT) {
        if !doc.contains_key(CONTEXT) {
            return Err(FormatError::MissingContextEntry(field.clone()));
        }
    }
    let Some(context) = doc.get(CONTEXT) else {
        return Ok(Vec::new());
    };
    let context = expect_document(context, CONTEXT)?;

    if let Some(orphan) = doc
        .keys()
        .find(|k| k.as_str() != CONTEXT && !context.contains_key(k.as_str()))
    {
        return Err(FormatError::MissingContextEntry(orphan.clone()));
    }

    context
        .keys()
        .map(|field| decode_extension_field(doc, field))
        .collect()
}
