//! Extended-JSON surrogate documents (`{"$oid": ...}`, `{"$date": ...}`, ...)
//! in both directions. The `bson` crate owns the surrogate grammar; this
//! module only decides which objects are surrogates and maps the result.
use bson::Bson;
use bson::oid::ObjectId;
use ordered_float::OrderedFloat;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;

use super::{Pairs, Value};

/// Any of these keys makes an object a surrogate. `$regex` with `$options`
/// and a lone `$type` are left out: inside a filter they are query operators.
const SURROGATE_KEYS: &[&str] = &[
    "$oid",
    "$symbol",
    "$numberInt",
    "$numberLong",
    "$numberDouble",
    "$numberDecimal",
    "$binary",
    "$uuid",
    "$code",
    "$timestamp",
    "$regularExpression",
    "$dbPointer",
    "$date",
    "$minKey",
    "$maxKey",
    "$undefined",
];

// ------------------------------- Decode ---------------------------------- //

/// Turn a freshly parsed object into either a surrogate value or a plain
/// document. Plain documents keep their pairs untouched, duplicates included.
pub(super) fn decode_document(pairs: Pairs) -> Result<Value, String> {
    if !pairs
        .iter()
        .any(|(key, _)| SURROGATE_KEYS.contains(&key.as_str()))
    {
        return Ok(Value::Document(pairs));
    }
    let document = Value::Document(pairs);
    let object = serde_json::to_value(&document).map_err(|e| e.to_string())?;
    match Bson::try_from(object) {
        Ok(Bson::Document(_)) => Ok(document),
        Ok(decoded) => from_bson(decoded),
        Err(e) => Err(format!("invalid extended JSON: {e}")),
    }
}

fn from_bson(bson: Bson) -> Result<Value, String> {
    Ok(match bson {
        Bson::Double(d) => Value::Double(OrderedFloat(d)),
        Bson::String(s) => Value::String(s),
        Bson::Array(items) => {
            Value::Array(items.into_iter().map(from_bson).collect::<Result<_, _>>()?)
        }
        Bson::Document(doc) => Value::Document(pairs_from_bson(doc)?),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null => Value::Null,
        Bson::RegularExpression(re) => Value::Regex(re),
        Bson::JavaScriptCode(code) => Value::JavaScript(code),
        Bson::JavaScriptCodeWithScope(with_scope) => Value::JavaScriptWithScope {
            code: with_scope.code,
            scope: pairs_from_bson(with_scope.scope)?,
        },
        Bson::Int32(i) => Value::Int32(i),
        Bson::Int64(i) => Value::Int64(i),
        Bson::Timestamp(ts) => Value::Timestamp(ts),
        Bson::Binary(bin) => Value::Binary(bin),
        Bson::ObjectId(oid) => Value::ObjectId(oid),
        Bson::DateTime(dt) => Value::DateTime(dt),
        Bson::Symbol(s) => Value::Symbol(s),
        Bson::Decimal128(d) => Value::Decimal128(d),
        Bson::Undefined => Value::Undefined,
        Bson::MaxKey => Value::MaxKey,
        Bson::MinKey => Value::MinKey,
        pointer @ Bson::DbPointer(_) => db_pointer(&pointer.into_canonical_extjson())?,
    })
}

fn pairs_from_bson(doc: bson::Document) -> Result<Pairs, String> {
    doc.into_iter()
        .map(|(key, value)| from_bson(value).map(|value| (key, value)))
        .collect()
}

/// `bson::DbPointer` keeps its parts private; read them back from the
/// canonical form.
fn db_pointer(json: &serde_json::Value) -> Result<Value, String> {
    let namespace = json
        .pointer("/$dbPointer/$ref")
        .and_then(serde_json::Value::as_str);
    let id = json
        .pointer("/$dbPointer/$id/$oid")
        .and_then(serde_json::Value::as_str)
        .and_then(|hex| ObjectId::parse_str(hex).ok());
    match (namespace, id) {
        (Some(namespace), Some(id)) => Ok(Value::DbPointer {
            namespace: namespace.to_string(),
            id,
        }),
        _ => Err(format!("malformed $dbPointer {json}")),
    }
}

// ------------------------------- Encode ---------------------------------- //

/// `{"k": v, ...}` straight from ordered pairs, duplicates included.
struct PairsMap<'a>(&'a [(String, Value)]);

impl Serialize for PairsMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Canonical extended JSON, except that plain JSON numbers are used wherever
/// they decode back to the same kind.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bson = match self {
            Value::Null => return serializer.serialize_unit(),
            Value::Bool(b) => return serializer.serialize_bool(*b),
            Value::Int32(i) => return serializer.serialize_i32(*i),
            // a plain number this small would come back as Int32
            Value::Int64(i) if i32::try_from(*i).is_ok() => Bson::Int64(*i),
            Value::Int64(i) => return serializer.serialize_i64(*i),
            Value::Double(d) if d.0.is_finite() => return serializer.serialize_f64(d.0),
            Value::Double(d) => Bson::Double(d.0),
            Value::String(s) => return serializer.serialize_str(s),
            Value::Array(items) => return serializer.collect_seq(items),
            Value::Document(pairs) => return PairsMap(pairs).serialize(serializer),
            Value::JavaScriptWithScope { code, scope } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("$code", code)?;
                map.serialize_entry("$scope", &PairsMap(scope))?;
                return map.end();
            }
            Value::DbPointer { namespace, id } => {
                return json!({"$dbPointer": {"$ref": namespace, "$id": {"$oid": id.to_hex()}}})
                    .serialize(serializer);
            }
            Value::ObjectId(oid) => Bson::ObjectId(*oid),
            Value::Regex(re) => Bson::RegularExpression(re.clone()),
            Value::DateTime(dt) => Bson::DateTime(*dt),
            Value::Decimal128(d) => Bson::Decimal128(*d),
            Value::Binary(bin) => Bson::Binary(bin.clone()),
            Value::Timestamp(ts) => Bson::Timestamp(*ts),
            Value::Symbol(s) => Bson::Symbol(s.clone()),
            Value::JavaScript(code) => Bson::JavaScriptCode(code.clone()),
            Value::MinKey => Bson::MinKey,
            Value::MaxKey => Bson::MaxKey,
            Value::Undefined => Bson::Undefined,
        };
        bson.into_canonical_extjson().serialize(serializer)
    }
}
