use thiserror::Error;

/// Everything that can go wrong between query text and formatted Go code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// The input is not extended JSON of the expected shape.
    #[error("failed to parse JSON: {0}")]
    Parse(String),

    /// Well-formed JSON that breaks an operator's shape contract
    /// (`$mod` without two elements, `$and` without an array, ...).
    #[error("{0}")]
    Translation(String),

    /// A field-level query operator outside the supported set.
    #[error("unsupported operator: {operator}")]
    UnsupportedOperator { operator: String },

    /// The assembled text failed the layout pass. Always a generator defect;
    /// `raw` is the unformatted text for diagnosis.
    #[error("failed to format generated code: {message}\nOutput was:\n{raw}")]
    Formatting { message: String, raw: String },
}

impl GenError {
    pub(crate) fn translation(msg: impl Into<String>) -> Self {
        Self::Translation(msg.into())
    }

    pub(crate) fn unsupported(operator: &str) -> Self {
        Self::UnsupportedOperator { operator: operator.to_string() }
    }

    /// The unformatted text carried by a formatting failure.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Formatting { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T, E = GenError> = std::result::Result<T, E>;
