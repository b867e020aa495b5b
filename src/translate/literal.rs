//! Go source literals for decoded values.
use std::fmt::Write as _;

use bson::oid::ObjectId;

use super::Translator;
use crate::value::Value;

impl Translator<'_> {
    /// Plain literal text for `value`; never translates operators.
    pub(crate) fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int32(i) => i.to_string(),
            Value::Int64(i) => i.to_string(),
            Value::Double(d) => go_float(d.0),
            Value::String(s) => quote(s),
            Value::Array(items) => format!("{}{{{}}}", self.bson("A"), self.literals(items)),
            Value::Document(pairs) => self.document(pairs),
            Value::ObjectId(oid) => self.object_id(oid),
            // The regex's own flags have no place in a plain string.
            Value::Regex(re) => quote(re.pattern.as_str()),
            Value::DateTime(dt) => format!("{}({})", self.bson("DateTime"), dt.timestamp_millis()),
            Value::Decimal128(d) => format!(
                "func() {} {{ d, _ := {}({}); return d }}()",
                self.bson("Decimal128"),
                self.bson("ParseDecimal128"),
                quote(&d.to_string()),
            ),
            Value::Binary(bin) => {
                let data = bin
                    .bytes
                    .iter()
                    .map(|b| format!("0x{b:02x}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{}{{Subtype: 0x{:02x}, Data: []byte{{{data}}}}}",
                    self.bson("Binary"),
                    u8::from(bin.subtype),
                )
            }
            Value::Timestamp(ts) => format!(
                "{}{{T: {}, I: {}}}",
                self.bson("Timestamp"),
                ts.time,
                ts.increment
            ),
            Value::Symbol(s) => format!("{}({})", self.bson("Symbol"), quote(s)),
            Value::JavaScript(code) => format!("{}({})", self.bson("JavaScript"), quote(code)),
            Value::JavaScriptWithScope { code, scope } => format!(
                "{}{{Code: {}({}), Scope: {}}}",
                self.bson("CodeWithScope"),
                self.bson("JavaScript"),
                quote(code),
                self.document(scope),
            ),
            Value::DbPointer { namespace, id } => format!(
                "{}{{DB: {}, Pointer: {}}}",
                self.bson("DBPointer"),
                quote(namespace),
                self.object_id(id),
            ),
            Value::MinKey => format!("{}{{}}", self.bson("MinKey")),
            Value::MaxKey => format!("{}{{}}", self.bson("MaxKey")),
            Value::Undefined => format!("{}{{}}", self.bson("Undefined")),
        }
    }

    fn document(&self, pairs: &[(String, Value)]) -> String {
        let entries = pairs
            .iter()
            .map(|(k, v)| format!("{{{}, {}}}", quote(k), self.literal(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}{{{entries}}}", self.bson("D"))
    }

    fn object_id(&self, oid: &ObjectId) -> String {
        format!(
            "func() {} {{ id, _ := {}({}); return id }}()",
            self.bson("ObjectID"),
            self.bson("ObjectIDFromHex"),
            quote(&oid.to_hex()),
        )
    }

    /// Comma-joined literals, for variadic argument lists.
    pub(crate) fn literals(&self, items: &[Value]) -> String {
        items
            .iter()
            .map(|v| self.literal(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `bson.D{{"key", <text>}}` with already-rendered value text.
    pub(crate) fn raw_pair(&self, key: &str, text: &str) -> String {
        format!("{}{{{{{}, {text}}}}}", self.bson("D"), quote(key))
    }
}

/// A float literal that stays a float in Go: `1.0`, never `1`.
fn go_float(f: f64) -> String {
    if f.is_nan() {
        "math.NaN()".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { 1 } else { -1 };
        format!("math.Inf({sign})")
    } else {
        format!("{f:?}")
    }
}

/// Double-quoted Go string literal, escaped the way Go's `%q` verb does.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0B}' => out.push_str("\\v"),
            c if is_printable(c) => out.push(c),
            c if (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) < 0x10000 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    // format characters that render as nothing
    !matches!(
        c,
        '\u{AD}' | '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}

#[cfg(test)]
mod tests {
    use ordered_float::OrderedFloat;

    use super::*;
    use crate::config::Options;

    fn lit(src: &str) -> String {
        let options = Options::default();
        Translator::new(&options).literal(&Value::from_ext_json(src).unwrap())
    }

    #[test]
    fn quoting_matches_go() {
        assert_eq!(quote("Alice"), r#""Alice""#);
        assert_eq!(quote("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(quote("line\nnext\ttab"), r#""line\nnext\ttab""#);
        assert_eq!(quote("\u{1b}[0m"), r#""\x1b[0m""#);
        assert_eq!(quote("\u{a0}"), r#""\u00a0""#);
        assert_eq!(quote("héllo 世界"), "\"héllo 世界\"");
        assert_eq!(quote("$$ROOT"), r#""$$ROOT""#);
    }

    #[test]
    fn scalars() {
        assert_eq!(lit("null"), "nil");
        assert_eq!(lit("true"), "true");
        assert_eq!(lit("30"), "30");
        assert_eq!(lit("3000000000"), "3000000000");
        assert_eq!(lit("2.5"), "2.5");
        assert_eq!(lit("1.0"), "1.0");
        assert_eq!(lit(r#"{"$numberDouble": "-Infinity"}"#), "math.Inf(-1)");
        assert_eq!(lit(r#"{"$numberDouble": "NaN"}"#), "math.NaN()");
    }

    #[test]
    fn containers_keep_order() {
        assert_eq!(lit("[]"), "bson.A{}");
        assert_eq!(lit("{}"), "bson.D{}");
        assert_eq!(lit(r#"[1, "a", [true]]"#), r#"bson.A{1, "a", bson.A{true}}"#);
        assert_eq!(
            lit(r#"{"b": 1, "a": {"$toUpper": "$name"}}"#),
            r#"bson.D{{"b", 1}, {"a", bson.D{{"$toUpper", "$name"}}}}"#
        );
    }

    #[test]
    fn special_values() {
        assert_eq!(
            lit(r#"{"$oid": "507f1f77bcf86cd799439011"}"#),
            r#"func() bson.ObjectID { id, _ := bson.ObjectIDFromHex("507f1f77bcf86cd799439011"); return id }()"#
        );
        assert_eq!(lit(r#"{"$regularExpression": {"pattern": "^a", "options": "i"}}"#), r#""^a""#);
        assert_eq!(lit(r#"{"$date": {"$numberLong": "1000"}}"#), "bson.DateTime(1000)");
        assert_eq!(
            lit(r#"{"$numberDecimal": "1.50"}"#),
            r#"func() bson.Decimal128 { d, _ := bson.ParseDecimal128("1.50"); return d }()"#
        );
        assert_eq!(
            lit(r#"{"$binary": {"base64": "AQI=", "subType": "00"}}"#),
            "bson.Binary{Subtype: 0x00, Data: []byte{0x01, 0x02}}"
        );
        assert_eq!(lit(r#"{"$timestamp": {"t": 5, "i": 1}}"#), "bson.Timestamp{T: 5, I: 1}");
        assert_eq!(lit(r#"{"$minKey": 1}"#), "bson.MinKey{}");
        assert_eq!(
            lit(r#"{"$code": "f(x)", "$scope": {"x": 1}}"#),
            r#"bson.CodeWithScope{Code: bson.JavaScript("f(x)"), Scope: bson.D{{"x", 1}}}"#
        );
        assert_eq!(
            lit(r#"{"$dbPointer": {"$ref": "db.c", "$id": {"$oid": "507f1f77bcf86cd799439011"}}}"#),
            r#"bson.DBPointer{DB: "db.c", Pointer: func() bson.ObjectID { id, _ := bson.ObjectIDFromHex("507f1f77bcf86cd799439011"); return id }()}"#
        );
        assert_eq!(
            lit(r#"{"$uuid": "00112233-4455-6677-8899-aabbccddeeff"}"#),
            "bson.Binary{Subtype: 0x04, Data: []byte{0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff}}"
        );
    }

    #[test]
    fn decimals_come_through_with_their_shortest_digits() {
        assert_eq!(
            crate::generate(r#"{"a": -247134803.64816442}"#).unwrap(),
            r#"gmqb.Eq("a", -247134803.64816442)"#
        );
        assert_eq!(lit("0.1"), "0.1");
        assert_eq!(lit("1e300"), "1e300");
    }

    #[test]
    fn bson_package_is_configurable() {
        let options = Options { bson_package: "mbson".into(), ..Options::default() };
        let t = Translator::new(&options);
        assert_eq!(
            t.literal(&Value::Array(vec![Value::Double(OrderedFloat(0.5))])),
            "mbson.A{0.5}"
        );
        assert_eq!(t.raw_pair("$x", "1"), r#"mbson.D{{"$x", 1}}"#);
    }
}
