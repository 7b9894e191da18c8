use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A posted expression is arithmetic rather than a truth value.
    NotBoolean { expr: String },
    EmptyDomain { name: String },
    InvalidPrecision { name: String },
    NotFinite { value: f64 },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotBoolean { expr } => write!(f, "constraint `{expr}` is not boolean"),
            ModelError::EmptyDomain { name } => write!(f, "variable `{name}` has an empty domain"),
            ModelError::InvalidPrecision { name } => {
                write!(f, "variable `{name}` needs a positive grid step")
            }
            ModelError::NotFinite { value } => write!(f, "{value} is not a finite number"),
        }
    }
}

impl std::error::Error for ModelError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// z3 answered `unknown`: a timeout, or arithmetic it cannot decide.
    Unknown { reason: String },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Unknown { reason } => write!(f, "the solver gave up: {reason}"),
        }
    }
}

impl std::error::Error for SearchError {}
