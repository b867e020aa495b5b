//! Decoded extended-JSON values.
//!
//! A closed tree over everything MongoDB's extended JSON can spell. Document
//! key order is kept exactly as written (duplicates included), because the
//! generated code lists fields in that order.
pub mod ext;

use std::fmt;

use bson::oid::ObjectId;
use bson::{Binary, Decimal128, Regex, Timestamp};
use ordered_float::OrderedFloat;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{GenError, Result};

/// Ordered name/value pairs of a document.
pub type Pairs = Vec<(String, Value)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(OrderedFloat<f64>),
    String(String),
    Array(Vec<Value>),
    Document(Pairs),
    ObjectId(ObjectId),
    Regex(Regex),
    DateTime(bson::DateTime),
    Decimal128(Decimal128),
    /// Also `$uuid`, as subtype 4.
    Binary(Binary),
    Timestamp(Timestamp),
    Symbol(String),
    JavaScript(String),
    JavaScriptWithScope { code: String, scope: Pairs },
    DbPointer { namespace: String, id: ObjectId },
    MinKey,
    MaxKey,
    Undefined,
}

impl Value {
    /// Parse extended JSON (relaxed or canonical) text.
    pub fn from_ext_json(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }

    /// Compact canonical extended JSON.
    pub fn to_ext_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_ext_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_i64(i: i64) -> Self {
        match i32::try_from(i) {
            Ok(small) => Value::Int32(small),
            Err(_) => Value::Int64(i),
        }
    }

    pub fn as_document(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Document(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of any numeric kind; doubles are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            Value::Double(d) if d.0.is_finite() => Some(d.0 as i64),
            _ => None,
        }
    }

    /// First value stored under `key`, if this is a document.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_document().and_then(|pairs| lookup(pairs, key))
    }

    /// BSON type alias, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int",
            Value::Int64(_) => "long",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) => "object",
            Value::ObjectId(_) => "objectId",
            Value::Regex(_) => "regex",
            Value::DateTime(_) => "date",
            Value::Decimal128(_) => "decimal",
            Value::Binary(_) => "binData",
            Value::Timestamp(_) => "timestamp",
            Value::Symbol(_) => "symbol",
            Value::JavaScript(_) => "javascript",
            Value::JavaScriptWithScope { .. } => "javascriptWithScope",
            Value::DbPointer { .. } => "dbPointer",
            Value::MinKey => "minKey",
            Value::MaxKey => "maxKey",
            Value::Undefined => "undefined",
        }
    }

    /// Parse text that must hold a single JSON object.
    pub(crate) fn document_from_ext_json(src: &str) -> Result<Pairs> {
        match Self::from_ext_json(src)? {
            Value::Document(pairs) => Ok(pairs),
            other => Err(GenError::Parse(format!(
                "expected a JSON object, got {}",
                other.kind()
            ))),
        }
    }

    /// Parse text that must hold a single JSON array.
    pub(crate) fn array_from_ext_json(src: &str) -> Result<Vec<Value>> {
        match Self::from_ext_json(src)? {
            Value::Array(items) => Ok(items),
            other => Err(GenError::Parse(format!(
                "expected a JSON array, got {}",
                other.kind()
            ))),
        }
    }
}

pub fn lookup<'a>(pairs: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

pub fn is_operator_pairs(pairs: &[(String, Value)]) -> bool {
    !pairs.is_empty() && pairs.iter().all(|(k, _)| k.starts_with('$'))
}

// ————————————————————————————————————————————————————————————————————————————
// DECODING
// ————————————————————————————————————————————————————————————————————————————

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an extended JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from_i64(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => Value::from_i64(i),
            // beyond i64: nothing but a double can hold it
            Err(_) => Value::Double(OrderedFloat(v as f64)),
        })
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(OrderedFloat(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut pairs = Pairs::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            pairs.push((key, value));
        }
        ext::decode_document(pairs).map_err(de::Error::custom)
    }
}
