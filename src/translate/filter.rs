//! Predicate documents to filter builder calls.
use log::{debug, trace};

use super::Translator;
use super::literal::quote;
use super::ops::{FILTER_OPS, FilterOp, FilterShape};
use crate::error::{GenError, Result};
use crate::value::{Value, is_operator_pairs, lookup};

impl Translator<'_> {
    /// A whole predicate document. Several top-level fragments are wrapped in
    /// an implicit `And`; an empty document yields an empty fragment.
    pub(crate) fn filter_document(&self, pairs: &[(String, Value)]) -> Result<String> {
        let mut parts = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            parts.extend(self.filter_element(key, value)?);
        }
        Ok(match parts.len() {
            0 => String::new(),
            1 => parts.remove(0),
            _ => self.multiline_call("And", &parts),
        })
    }

    /// A predicate nested as an argument, where an empty fragment would leave
    /// the call without its argument.
    pub(crate) fn nested_filter(&self, pairs: &[(String, Value)]) -> Result<String> {
        let code = self.filter_document(pairs)?;
        Ok(if code.is_empty() { self.call("NewFilter", "") } else { code })
    }

    fn filter_element(&self, key: &str, value: &Value) -> Result<Vec<String>> {
        let single = match key {
            "$and" => self.logical("And", key, value)?,
            "$or" => self.logical("Or", key, value)?,
            "$nor" => self.logical("Nor", key, value)?,
            "$expr" => self.call("Expr", &self.expression_value(value)),
            "$where" => match value {
                Value::String(js) | Value::JavaScript(js) => self.call("Where", &quote(js)),
                other => {
                    return Err(GenError::translation(format!(
                        "expected string for $where, got {}",
                        other.kind()
                    )));
                }
            },
            "$jsonSchema" => self.call("JsonSchema", &self.literal(value)),
            _ => match value {
                Value::Document(ops) if is_operator_pairs(ops) => {
                    return self.field_operators(key, ops);
                }
                _ => self.call("Eq", &format!("{}, {}", quote(key), self.literal(value))),
            },
        };
        Ok(vec![single])
    }

    fn logical(&self, builder: &str, op: &str, value: &Value) -> Result<String> {
        let Value::Array(items) = value else {
            return Err(GenError::translation(format!(
                "expected array for logical operator {op}, got {}",
                value.kind()
            )));
        };
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let Value::Document(pairs) = item else {
                return Err(GenError::translation(format!(
                    "expected document in logical operator array, got {}",
                    item.kind()
                )));
            };
            parts.push(self.nested_filter(pairs)?);
        }
        Ok(self.multiline_call(builder, &parts))
    }

    /// Every operator on one field becomes its own top-level fragment. A
    /// sibling `$options` is folded into `$regex`.
    fn field_operators(&self, field: &str, ops: &[(String, Value)]) -> Result<Vec<String>> {
        let has_regex = ops.iter().any(|(op, _)| op == "$regex");
        let options = match lookup(ops, "$options") {
            None => None,
            Some(Value::String(o)) => Some(o.as_str()),
            Some(other) => {
                return Err(GenError::translation(format!(
                    "expected string for $options on field {field:?}, got {}",
                    other.kind()
                )));
            }
        };
        let mut parts = Vec::with_capacity(ops.len());
        for (op, value) in ops {
            if op == "$options" && has_regex {
                continue;
            }
            parts.push(self.field_operator(field, op, value, options)?);
        }
        Ok(parts)
    }

    fn field_operator(
        &self,
        field: &str,
        op: &str,
        value: &Value,
        regex_options: Option<&str>,
    ) -> Result<String> {
        let Some(&FilterOp { builder, shape }) = FILTER_OPS.get(op) else {
            return self.unknown_field_operator(field, op, value);
        };
        trace!("field {field:?} operator {op} → {builder}");
        let name = quote(field);
        let args = match shape {
            FilterShape::Scalar => format!("{name}, {}", self.literal(value)),
            FilterShape::List => {
                let Value::Array(items) = value else {
                    return Err(GenError::translation(format!(
                        "expected array for {op} on field {field:?}, got {}",
                        value.kind()
                    )));
                };
                if items.is_empty() {
                    name
                } else {
                    format!("{name}, {}", self.literals(items))
                }
            }
            // `Mod` takes int64s; doubles truncate toward zero as the server does
            FilterShape::Mod => match value.as_array() {
                Some([divisor, remainder]) => match (divisor.as_i64(), remainder.as_i64()) {
                    (Some(divisor), Some(remainder)) => format!("{name}, {divisor}, {remainder}"),
                    _ => {
                        return Err(GenError::translation(format!(
                            "invalid $mod value for field {field:?}: expected numbers"
                        )));
                    }
                },
                _ => {
                    return Err(GenError::translation(format!(
                        "invalid $mod value for field {field:?}: expected [divisor, remainder]"
                    )));
                }
            },
            FilterShape::Regex => {
                let (pattern, inline) = match value {
                    Value::String(p) => (p.as_str(), ""),
                    Value::Regex(re) => (re.pattern.as_str(), re.options.as_str()),
                    other => {
                        return Err(GenError::translation(format!(
                            "expected string or regex for $regex on field {field:?}, got {}",
                            other.kind()
                        )));
                    }
                };
                let flags = regex_options.unwrap_or(inline);
                format!("{name}, {}, {}", quote(pattern), quote(flags))
            }
            FilterShape::ElemMatch => {
                let Value::Document(pairs) = value else {
                    return Err(GenError::translation(format!(
                        "expected document for $elemMatch on field {field:?}, got {}",
                        value.kind()
                    )));
                };
                // `{$elemMatch: {$gte: 80}}` matches array elements themselves;
                // there is no field to dispatch against.
                let body = if is_operator_pairs(pairs) {
                    self.call("Raw", &self.literal(value))
                } else {
                    self.nested_filter(pairs)?
                };
                format!("{name}, {body}")
            }
        };
        Ok(self.call(builder, &args))
    }

    fn unknown_field_operator(&self, field: &str, op: &str, value: &Value) -> Result<String> {
        if !self.options.raw_filter_fallback {
            return Err(GenError::unsupported(op));
        }
        debug!("unsupported operator {op} on field {field:?}, emitting raw condition");
        let condition = self.raw_pair(op, &self.literal(value));
        Ok(self.call("Raw", &self.raw_pair(field, &condition)))
    }

    /// `Name(\n a,\n b,\n)`, or `Name()` with nothing to pass.
    pub(crate) fn multiline_call(&self, name: &str, parts: &[String]) -> String {
        if parts.is_empty() {
            return self.call(name, "");
        }
        self.call(name, &format!("\n{},\n", parts.join(",\n")))
    }
}
