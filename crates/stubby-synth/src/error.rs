//! Synthesis errors.

use std::fmt;

use stubby_common::span::Span;
use stubby_parser::{BinOp, ParseError};
use stubby_schema::SchemaError;

/// Everything that can stop one synthesis call.
///
/// All variants are reported to the caller; only infeasibility gets one
/// retry (after a solver reset) before it is raised.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthError {
    Schema(SchemaError),
    /// A contract construct the compiler does not model.
    UnsupportedExpression { message: String, span: Span },
    UnsupportedOperator { op: BinOp, span: Span },
    /// No assignment satisfies the method's postconditions.
    Infeasible { method: String },
    /// A `requires` clause is false for the actual arguments.
    PreconditionFailed { name: String, span: Span },
    Evaluation { message: String, span: Span },
    /// z3 gave up, usually on the configured timeout.
    SolveBudgetExceeded { method: String, reason: String },
    /// Two `ensures` clauses decide the same result field, or one decides a
    /// field inside a value the other decides.
    ConflictingTargets {
        path: String,
        other: String,
        span: Span,
        other_span: Span,
    },
    Parse(ParseError),
    UnknownMethod { name: String },
}

impl SynthError {
    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        SynthError::UnsupportedExpression {
            message: message.into(),
            span,
        }
    }

    pub fn evaluation(message: impl Into<String>, span: Span) -> Self {
        SynthError::Evaluation {
            message: message.into(),
            span,
        }
    }

    /// Location in the method's contract source, when there is one.
    pub fn span(&self) -> Option<Span> {
        match self {
            SynthError::Schema(err) => err.span(),
            SynthError::UnsupportedExpression { span, .. }
            | SynthError::UnsupportedOperator { span, .. }
            | SynthError::PreconditionFailed { span, .. }
            | SynthError::Evaluation { span, .. }
            | SynthError::ConflictingTargets { span, .. } => Some(*span),
            SynthError::Parse(err) => Some(err.span),
            SynthError::Infeasible { .. }
            | SynthError::SolveBudgetExceeded { .. }
            | SynthError::UnknownMethod { .. } => None,
        }
    }
}

impl From<SchemaError> for SynthError {
    fn from(err: SchemaError) -> Self {
        SynthError::Schema(err)
    }
}

impl From<ParseError> for SynthError {
    fn from(err: ParseError) -> Self {
        SynthError::Parse(err)
    }
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::Schema(err) => write!(f, "{err}"),
            SynthError::UnsupportedExpression { message, .. } => {
                write!(f, "unsupported expression: {message}")
            }
            SynthError::UnsupportedOperator { op, .. } => {
                write!(f, "operator `{op}` is not supported here")
            }
            SynthError::Infeasible { method } => {
                write!(f, "the postconditions of `{method}` cannot be satisfied")
            }
            SynthError::PreconditionFailed { name, .. } => {
                write!(f, "precondition `{name}` does not hold")
            }
            SynthError::Evaluation { message, .. } => write!(f, "{message}"),
            SynthError::SolveBudgetExceeded { method, reason } => write!(
                f,
                "the solver gave up on the postconditions of `{method}`: {reason}"
            ),
            SynthError::ConflictingTargets { path, other, .. } if path == other => {
                write!(f, "`{path}` is set by more than one `ensures` clause")
            }
            SynthError::ConflictingTargets { path, other, .. } => {
                write!(f, "`{path}` is set inside `{other}`, which is also set")
            }
            SynthError::Parse(err) => write!(f, "{err}"),
            SynthError::UnknownMethod { name } => write!(f, "no method named `{name}`"),
        }
    }
}

impl std::error::Error for SynthError {}
