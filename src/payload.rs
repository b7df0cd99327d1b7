//! Payload normalization.
//!
//! Request bodies come in two shapes: a typed [`Schema`] struct, or a raw JSON map.
//! [`normalize`] turns either into a `serde_json::Map` ready to be sent. It is a
//! pure function, and normalizing a raw map returns it unchanged, so feeding an
//! already-normalized map back in is a no-op.
//!
//! Schemas declare their wire names twice: once as serde `rename` attributes, which
//! drive serialization, and once as a [`FieldMapping`] table, which documents the
//! mapping and lets callers and tests look wire names up without reflection.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// A JSON object, the normalized form of every payload.
pub type JsonMap = Map<String, Value>;

/// One row of a schema's field-name mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// The Rust field name.
    pub name: &'static str,
    /// The JSON key used on the wire.
    pub wire: &'static str,
}

impl FieldMapping {
    /// Creates a mapping row.
    pub const fn new(name: &'static str, wire: &'static str) -> Self {
        Self { name, wire }
    }
}

/// A typed request/response body with a documented wire-name table.
///
/// `FIELDS` must list every serialized field in declaration order, with the same
/// names as the serde `rename` attributes. Values such as dates are rendered by
/// their serde implementations (`chrono::NaiveDate` becomes `"YYYY-MM-DD"`).
pub trait Schema: Serialize {
    /// Internal field name to wire name.
    const FIELDS: &'static [FieldMapping];

    /// Looks up the wire name of a field.
    fn wire_name(field: &str) -> Option<&'static str> {
        Self::FIELDS
            .iter()
            .find(|mapping| mapping.name == field)
            .map(|mapping| mapping.wire)
    }

    /// Serializes this value into a JSON object.
    fn to_payload(&self) -> Result<JsonMap> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::SerializationFailed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(Error::SerializationFailed(e.to_string())),
        }
    }
}

/// Object-safe view of a [`Schema`], so payloads can borrow any schema type.
pub trait StructuredPayload {
    /// The schema's mapping table.
    fn fields(&self) -> &'static [FieldMapping];

    /// Serializes the value into a JSON object.
    fn to_json_map(&self) -> Result<JsonMap>;
}

impl<T: Schema> StructuredPayload for T {
    fn fields(&self) -> &'static [FieldMapping] {
        T::FIELDS
    }

    fn to_json_map(&self) -> Result<JsonMap> {
        self.to_payload()
    }
}

/// A request body before normalization.
///
/// Build one with `From`: `&Booking` gives a structured payload, a
/// `serde_json::Map` gives a raw one.
pub enum Payload<'a> {
    /// A typed schema value; serialized through its wire-name mapping.
    Structured(&'a (dyn StructuredPayload + Sync)),
    /// An already JSON-compatible map; sent as-is.
    Raw(JsonMap),
}

impl std::fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Structured(schema) => f
                .debug_tuple("Structured")
                .field(&schema.fields().iter().map(|m| m.wire).collect::<Vec<_>>())
                .finish(),
            Payload::Raw(map) => f.debug_tuple("Raw").field(map).finish(),
        }
    }
}

impl<'a, T: Schema + Sync> From<&'a T> for Payload<'a> {
    fn from(schema: &'a T) -> Self {
        Payload::Structured(schema)
    }
}

impl From<JsonMap> for Payload<'_> {
    fn from(map: JsonMap) -> Self {
        Payload::Raw(map)
    }
}

impl TryFrom<Value> for Payload<'_> {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Payload::Raw(map)),
            other => Err(Error::SerializationFailed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Converts an optional payload into the JSON body to send.
///
/// `None` stays `None`: no payload means no body, not an empty object.
pub fn normalize(payload: Option<&Payload<'_>>) -> Result<Option<JsonMap>> {
    match payload {
        None => Ok(None),
        Some(Payload::Structured(schema)) => schema.to_json_map().map(Some),
        Some(Payload::Raw(map)) => Ok(Some(map.clone())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
