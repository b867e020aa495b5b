//! MongoDB queries to Go builder code.
//!
//! Objects are predicate documents and become a filter expression; arrays are
//! aggregation pipelines and become a `NewPipeline()` method chain. Fragments
//! are assembled as plain text and laid out by [`crate::gofmt`] at the end.
pub mod ops;

mod expr;
mod filter;
mod literal;
mod stage;

pub use literal::quote;
use log::debug;

use crate::config::Options;
use crate::error::{GenError, Result};
use crate::gofmt::format_source;
use crate::value::Value;

/// Turns query text into formatted Go source.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: Options,
}

impl Generator {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Input starting with `[` (after trimming) is a pipeline, anything else a
    /// filter.
    pub fn generate(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.starts_with('[') {
            debug!("input is an array, translating as a pipeline");
            self.generate_pipeline(text)
        } else {
            debug!("input is not an array, translating as a filter");
            self.generate_filter(text)
        }
    }

    pub fn generate_filter(&self, text: &str) -> Result<String> {
        let pairs = Value::document_from_ext_json(text)?;
        self.filter_code(&pairs)
    }

    pub fn generate_pipeline(&self, text: &str) -> Result<String> {
        let stages = Value::array_from_ext_json(text)?;
        self.pipeline_code(&stages)
    }

    /// Same as [`Generator::generate`] for an already decoded value.
    pub fn value_code(&self, value: &Value) -> Result<String> {
        match value {
            Value::Array(stages) => self.pipeline_code(stages),
            Value::Document(pairs) => self.filter_code(pairs),
            other => Err(GenError::Parse(format!(
                "expected a JSON object or array, got {}",
                other.kind()
            ))),
        }
    }

    pub fn filter_code(&self, pairs: &[(String, Value)]) -> Result<String> {
        format_source(&Translator::new(&self.options).filter_document(pairs)?)
    }

    pub fn pipeline_code(&self, stages: &[Value]) -> Result<String> {
        format_source(&Translator::new(&self.options).pipeline(stages)?)
    }
}

/// Per-call translation state: only the options, borrowed.
pub(crate) struct Translator<'a> {
    options: &'a Options,
}

impl<'a> Translator<'a> {
    pub(crate) fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// Builder-package function name, qualified unless the package is empty.
    pub(crate) fn func(&self, name: &str) -> String {
        qualify(&self.options.builder_package, name)
    }

    pub(crate) fn bson(&self, name: &str) -> String {
        qualify(&self.options.bson_package, name)
    }

    pub(crate) fn call(&self, name: &str, args: &str) -> String {
        format!("{}({args})", self.func(name))
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}
