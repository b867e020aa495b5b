//! Translate MongoDB extended-JSON filters and aggregation pipelines into Go
//! code for the `gmqb` query builder.
//!
//! ```
//! let code = gmqb_gen::generate(r#"{"status": {"$in": ["A", "B"]}}"#).unwrap();
//! assert_eq!(code, r#"gmqb.In("status", "A", "B")"#);
//! ```
pub mod config;
pub mod error;
pub mod gofmt;
pub mod translate;
pub mod value;

mod path_de;

pub use config::{ConfigError, Options};
pub use error::{GenError, Result};
pub use translate::Generator;
pub use value::Value;

/// Translate with default options. Input starting with `[` is a pipeline,
/// anything else a filter document.
pub fn generate(text: &str) -> Result<String> {
    Generator::default().generate(text)
}
