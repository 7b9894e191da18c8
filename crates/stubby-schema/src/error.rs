//! Schema and API-file loading errors.

use std::fmt;

use stubby_common::span::Span;
use stubby_parser::ParseError;

/// A field, type or value that does not fit the declared schema.
///
/// Variants raised while resolving a contract carry the span of the
/// offending access; structural checks on the schema itself do not.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    UnknownType {
        name: String,
        referenced_by: String,
    },
    UnknownField {
        ty: String,
        field: String,
        span: Option<Span>,
    },
    /// The first segment of an access is neither `result` nor a parameter.
    UnknownRoot {
        name: String,
        method: String,
        span: Option<Span>,
    },
    /// A field access descends into a value that has no fields.
    NotAStruct {
        ty: String,
        field: String,
        span: Option<Span>,
    },
    InvalidTypeRef {
        text: String,
    },
    UnknownConstructorParam {
        ty: String,
        param: String,
    },
    DuplicateField {
        ty: String,
        field: String,
    },
    EmptyEnum {
        name: String,
    },
    DuplicateMethod {
        name: String,
    },
    ArgumentMismatch {
        param: String,
        expected: String,
        found: String,
    },
    AssignmentMismatch {
        field: String,
        expected: String,
        found: String,
        span: Option<Span>,
    },
    InvalidConfig {
        message: String,
    },
}

impl SchemaError {
    pub fn span(&self) -> Option<Span> {
        match self {
            SchemaError::UnknownField { span, .. }
            | SchemaError::UnknownRoot { span, .. }
            | SchemaError::NotAStruct { span, .. }
            | SchemaError::AssignmentMismatch { span, .. } => *span,
            _ => None,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownType {
                name,
                referenced_by,
            } => write!(f, "unknown type `{name}` referenced by {referenced_by}"),
            SchemaError::UnknownField { ty, field, .. } => {
                write!(f, "type `{ty}` has no field `{field}`")
            }
            SchemaError::UnknownRoot { name, method, .. } => write!(
                f,
                "`{name}` is neither `result` nor a parameter of `{method}`"
            ),
            SchemaError::NotAStruct { ty, field, .. } => {
                write!(f, "cannot access field `{field}` on a value of type `{ty}`")
            }
            SchemaError::InvalidTypeRef { text } => write!(f, "invalid type `{text}`"),
            SchemaError::UnknownConstructorParam { ty, param } => write!(
                f,
                "constructor of `{ty}` takes `{param}`, which is not a field"
            ),
            SchemaError::DuplicateField { ty, field } => {
                write!(f, "type `{ty}` declares field `{field}` twice")
            }
            SchemaError::EmptyEnum { name } => write!(f, "enum `{name}` has no variants"),
            SchemaError::DuplicateMethod { name } => write!(f, "method `{name}` is declared twice"),
            SchemaError::ArgumentMismatch {
                param,
                expected,
                found,
            } => write!(f, "argument `{param}` expects {expected}, found {found}"),
            SchemaError::AssignmentMismatch {
                field,
                expected,
                found,
                ..
            } => write!(f, "cannot assign {found} to `{field}` of type {expected}"),
            SchemaError::InvalidConfig { message } => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Failure to load an API file.
#[derive(Debug)]
pub enum LoadError {
    Io { path: String, message: String },
    Toml { message: String },
    Schema(SchemaError),
    /// A method's contract block does not parse. Carries the block so the
    /// error can be rendered against it.
    Parse {
        method: String,
        error: ParseError,
        source: String,
    },
}

impl From<SchemaError> for LoadError {
    fn from(err: SchemaError) -> Self {
        LoadError::Schema(err)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, message } => write!(f, "failed to read {path}: {message}"),
            LoadError::Toml { message } => write!(f, "failed to parse API file: {message}"),
            LoadError::Schema(err) => write!(f, "{err}"),
            LoadError::Parse { method, error, .. } => {
                write!(f, "contracts of `{method}`: {error}")
            }
        }
    }
}

impl std::error::Error for LoadError {}
