//! Generator options, loadable from a TOML file.
//!
//! ```toml
//! builder-package = "q"
//! raw-filter-fallback = true
//! ```
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static GO_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{Nd}_]*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Qualifier of builder calls. Empty means unqualified calls, as with a
    /// dot-import.
    pub builder_package: String,
    /// Qualifier of `D`, `A`, `E` and the other BSON types.
    pub bson_package: String,
    /// Emit unknown field operators as a `Raw` condition instead of failing.
    pub raw_filter_fallback: bool,
    /// CLI only: retry shell-escaped input (`{\"a\": 1}`) once, unescaped.
    pub unescape_fallback: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            builder_package: "gmqb".to_string(),
            bson_package: "bson".to_string(),
            raw_filter_fallback: false,
            unescape_fallback: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{field} {value:?} is not a Go identifier")]
    InvalidPackage { field: &'static str, value: String },
}

impl Options {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Package qualifiers must be Go identifiers; the builder package may
    /// also be empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.builder_package.is_empty() && !GO_IDENT.is_match(&self.builder_package) {
            return Err(ConfigError::InvalidPackage {
                field: "builder-package",
                value: self.builder_package.clone(),
            });
        }
        if !GO_IDENT.is_match(&self.bson_package) {
            return Err(ConfigError::InvalidPackage {
                field: "bson-package",
                value: self.bson_package.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Options::from_toml("").unwrap(), Options::default());
    }

    #[test]
    fn kebab_case_keys() {
        let options = Options::from_toml(
            "builder-package = \"\"\nbson-package = \"mbson\"\nraw-filter-fallback = true\n",
        )
        .unwrap();
        assert_eq!(options.builder_package, "");
        assert_eq!(options.bson_package, "mbson");
        assert!(options.raw_filter_fallback);
        assert!(options.unescape_fallback);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_packages() {
        assert!(matches!(
            Options::from_toml("raw_filter_fallback = true"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Options::from_toml("bson-package = \"go-bson\""),
            Err(ConfigError::InvalidPackage { field: "bson-package", .. })
        ));
        assert!(matches!(
            Options::from_toml("bson-package = \"\""),
            Err(ConfigError::InvalidPackage { .. })
        ));
    }

    #[test]
    fn missing_file() {
        let err = Options::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
