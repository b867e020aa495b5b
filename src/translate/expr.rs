//! Aggregation expressions (`$add`, `$cond`, `$filter`, ...) to builder calls.
//!
//! Nothing here fails: an operator outside [`EXPR_OPS`] or a value that breaks
//! its operator's shape is emitted as a raw `bson.D` pair instead.
use log::{debug, trace};

use super::Translator;
use super::literal::quote;
use super::ops::{Arity, EXPR_OPS, ExprOp, Param, ParamKind};
use crate::value::{Value, lookup};

impl Translator<'_> {
    /// Translate `value` if it is a single-key `$`-document, else format it as
    /// a literal.
    pub(crate) fn expression_value(&self, value: &Value) -> String {
        match value.as_document() {
            Some([(op, arg)]) if op.starts_with('$') => self.expression(op, arg),
            _ => self.literal(value),
        }
    }

    /// One `{op: arg}` expression.
    pub(crate) fn expression(&self, op: &str, arg: &Value) -> String {
        let Some(spec) = EXPR_OPS.get(op) else {
            debug!("unknown expression operator {op}, emitting raw document");
            return self.raw_pair(op, &self.expression_value(arg));
        };
        trace!("expression {op} → {}", spec.builder);
        match self.expression_call(spec, arg) {
            Some(code) => code,
            None => {
                debug!("malformed {op} argument ({}), emitting raw document", arg.kind());
                self.raw_pair(op, &self.literal(arg))
            }
        }
    }

    /// `None` when `arg` does not have the shape the operator requires.
    fn expression_call(&self, spec: &ExprOp, arg: &Value) -> Option<String> {
        let args = match spec.arity {
            Arity::Nullary => String::new(),
            Arity::Unary => self.expression_value(arg),
            Arity::Literal => self.literal(arg),
            Arity::Fixed(n) => match arg {
                Value::Array(items) if items.len() == n => self.expression_list(items),
                Value::Array(_) => return None,
                bare if n == 1 => self.expression_value(bare),
                _ => return None,
            },
            Arity::Variadic => self.expression_list(arg.as_array()?),
            Arity::Structured(params) => match arg {
                Value::Document(fields) => self.structured_args(params, fields)?,
                Value::Array(items) if spec.positional && items.len() == params.len() => {
                    self.expression_list(items)
                }
                _ => return None,
            },
        };
        Some(self.call(spec.builder, &args))
    }

    fn expression_list(&self, items: &[Value]) -> String {
        items
            .iter()
            .map(|v| self.expression_value(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn structured_args(&self, params: &[Param], fields: &[(String, Value)]) -> Option<String> {
        let mut args = Vec::with_capacity(params.len());
        for param in params {
            let arg = match lookup(fields, param.name) {
                None => self.missing_param(param, fields),
                Some(value) => self.param_value(param, value)?,
            };
            args.push(arg);
        }
        Some(args.join(", "))
    }

    fn missing_param(&self, param: &Param, fields: &[(String, Value)]) -> String {
        // `{regex: /x/i}` without `options` carries its flags inline
        if param.name == "options" {
            if let Some(Value::Regex(re)) = lookup(fields, "regex") {
                return quote(re.options.as_str());
            }
        }
        param.default.to_string()
    }

    fn param_value(&self, param: &Param, value: &Value) -> Option<String> {
        match param.kind {
            ParamKind::Expr => Some(self.expression_value(value)),
            ParamKind::Literal => Some(self.literal(value)),
            ParamKind::Str => match value {
                Value::String(s) => Some(quote(s)),
                Value::Regex(re) if param.name == "regex" => Some(quote(re.pattern.as_str())),
                _ => None,
            },
            ParamKind::Bool => match value {
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            },
            ParamKind::Branches => self.switch_branches(value),
        }
    }

    /// `[]gmqb.SwitchBranch{{Case: ..., Then: ...}, ...}`
    fn switch_branches(&self, value: &Value) -> Option<String> {
        let branches = value
            .as_array()?
            .iter()
            .map(|branch| {
                let fields = branch.as_document()?;
                let case = lookup(fields, "case")?;
                let then = lookup(fields, "then")?;
                Some(format!(
                    "{{Case: {}, Then: {}}}",
                    self.expression_value(case),
                    self.expression_value(then)
                ))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(format!("[]{}{{{}}}", self.func("SwitchBranch"), branches.join(", ")))
    }
}
