//! Aggregation pipelines to a `NewPipeline()` method chain.
use log::{debug, trace};

use super::Translator;
use super::literal::quote;
use crate::error::{GenError, Result};
use crate::value::Value;

impl Translator<'_> {
    /// `NewPipeline().` followed by one stage method per line.
    pub(crate) fn pipeline(&self, stages: &[Value]) -> Result<String> {
        let head = self.call("NewPipeline", "");
        if stages.is_empty() {
            return Ok(head);
        }
        let mut parts = Vec::with_capacity(stages.len());
        for stage in stages {
            let Value::Document(pairs) = stage else {
                return Err(GenError::translation(format!(
                    "expected document as pipeline stage, got {}",
                    stage.kind()
                )));
            };
            parts.push(match pairs.as_slice() {
                [] => return Err(GenError::translation("empty pipeline stage")),
                [(op, value)] => self.stage(op, value)?,
                _ => {
                    return Err(GenError::translation(format!(
                        "pipeline stage must have exactly one top-level operator, got {}",
                        pairs.len()
                    )));
                }
            });
        }
        Ok(format!("{head}.\n{}", parts.join(".\n")))
    }

    fn stage(&self, op: &str, value: &Value) -> Result<String> {
        trace!("stage {op}");
        let code = match op {
            "$match" => {
                let Value::Document(pairs) = value else {
                    return Err(GenError::translation(format!(
                        "expected document for $match, got {}",
                        value.kind()
                    )));
                };
                format!("Match({})", self.nested_filter(pairs)?)
            }
            "$addFields" => self.add_fields("AddFields", op, value)?,
            "$set" => self.add_fields("SetFields", op, value)?,
            "$project" => format!("Project({})", self.entry_list(op, value)?),
            "$sort" => format!("Sort({})", self.entry_list(op, value)?),
            "$group" => self.group(value)?,
            "$limit" => format!("Limit({})", self.count_arg(op, value)?),
            "$skip" => format!("Skip({})", self.count_arg(op, value)?),
            "$count" => match value {
                Value::String(name) => format!("Count({})", quote(name)),
                _ => self.raw_stage(op, value),
            },
            "$unwind" => match value {
                Value::String(path) => format!("Unwind({})", quote(path)),
                _ => self.raw_stage(op, value),
            },
            "$replaceRoot" => format!("ReplaceRoot({})", self.literal(value)),
            "$replaceWith" => format!("ReplaceWith({})", self.literal(value)),
            "$out" => match value {
                Value::String(coll) => format!("Out({})", quote(coll)),
                Value::Document(_) => {
                    let db = value.get("db").and_then(Value::as_str).unwrap_or_default();
                    let coll = value.get("coll").and_then(Value::as_str).unwrap_or_default();
                    format!("OutToDb({}, {})", quote(db), quote(coll))
                }
                _ => self.raw_stage(op, value),
            },
            _ => self.raw_stage(op, value),
        };
        Ok(code)
    }

    fn raw_stage(&self, op: &str, value: &Value) -> String {
        debug!("no dedicated builder for stage {op}, emitting RawStage");
        format!("RawStage({}, {})", quote(op), self.literal(value))
    }

    fn stage_document<'v>(&self, op: &str, value: &'v Value) -> Result<&'v [(String, Value)]> {
        value.as_document().ok_or_else(|| {
            GenError::translation(format!("expected document for {op}, got {}", value.kind()))
        })
    }

    fn add_fields(&self, method: &str, op: &str, value: &Value) -> Result<String> {
        let fields = self
            .stage_document(op, value)?
            .iter()
            .map(|(name, expr)| {
                self.call("AddField", &format!("{}, {}", quote(name), self.expression_value(expr)))
            })
            .collect::<Vec<_>>();
        Ok(format!("{method}({})", self.multiline_call("AddFieldsSpec", &fields)))
    }

    /// `bson.D{ bson.E{"k", v}, ... }` with values emitted literally.
    fn entry_list(&self, op: &str, value: &Value) -> Result<String> {
        let entries = self
            .stage_document(op, value)?
            .iter()
            .map(|(name, v)| format!("{}{{{}, {}}}", self.bson("E"), quote(name), self.literal(v)))
            .collect::<Vec<_>>();
        Ok(if entries.is_empty() {
            format!("{}{{}}", self.bson("D"))
        } else {
            format!("{}{{\n{},\n}}", self.bson("D"), entries.join(",\n"))
        })
    }

    fn group(&self, value: &Value) -> Result<String> {
        let fields = self.stage_document("$group", value)?;
        let id = fields
            .iter()
            .find(|(name, _)| name == "_id")
            .map_or_else(|| "nil".to_string(), |(_, id)| self.expression_value(id));
        let accumulators = fields
            .iter()
            .filter(|(name, _)| name != "_id")
            .map(|(name, acc)| {
                self.call("GroupAcc", &format!("{}, {}", quote(name), self.expression_value(acc)))
            })
            .collect::<Vec<_>>();
        let spec = if accumulators.is_empty() {
            self.call("GroupSpec", &id)
        } else {
            self.call("GroupSpec", &format!("{id},\n{},\n", accumulators.join(",\n")))
        };
        Ok(format!("Group({spec})"))
    }

    fn count_arg(&self, op: &str, value: &Value) -> Result<i64> {
        value.as_i64().ok_or_else(|| {
            GenError::translation(format!("expected number for {op}, got {}", value.kind()))
        })
    }
}
