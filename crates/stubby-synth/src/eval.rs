//! Contract expression interpreter over actual arguments.
//!
//! Used for `requires` clauses, for the right-hand sides of assignment
//! and pattern clauses, and never for anything that reads `result`.

use std::cmp::Ordering;

use stubby_common::span::Span;
use stubby_parser::{BinOp, ContractRecord, Expr, ExprKind, Literal, UnaryOp};
use stubby_schema::{MethodDescriptor, Schema};

use crate::error::SynthError;
use crate::path::{self, PathRoot};
use crate::value::Value;
use crate::Arguments;

/// What an expression can see: the method's parameters and their values.
pub struct Env<'a> {
    pub method: &'a MethodDescriptor,
    pub schema: &'a Schema,
    pub args: &'a Arguments,
}

impl Env<'_> {
    pub fn eval(&self, expr: &Expr) -> Result<Value, SynthError> {
        match &expr.kind {
            ExprKind::Var(access) => {
                let var = path::resolve(access, self.method, self.schema)?;
                let PathRoot::Parameter(param) = &var.path.root else {
                    return Err(SynthError::unsupported(
                        "`result` cannot be read in this clause",
                        access.root().span,
                    ));
                };
                let mut value = self.args.get(param).unwrap_or(&Value::Null);
                for (segment, ident) in var.path.segments.iter().zip(access.fields()) {
                    if value.is_null() {
                        return Err(SynthError::evaluation(
                            format!("cannot read `{segment}` of null"),
                            ident.span,
                        ));
                    }
                    value = value.field(segment).unwrap_or(&Value::Null);
                }
                Ok(value.clone())
            }
            ExprKind::Index { base, index } => {
                let base_value = self.eval(base)?;
                let index_value = self.eval(index)?;
                let (Value::List(items) | Value::Set(items)) = &base_value else {
                    return Err(type_error("only lists can be indexed", &base_value, base.span));
                };
                let Value::Int(i) = index_value else {
                    return Err(type_error("index must be an integer", &index_value, index.span));
                };
                usize::try_from(i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        SynthError::evaluation(
                            format!("index {i} is out of bounds for a list of {}", items.len()),
                            expr.span,
                        )
                    })
            }
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::Int(v) => Value::Int(*v),
                Literal::Float(v) => Value::Real(*v),
                Literal::Bool(v) => Value::Bool(*v),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Null => Value::Null,
            }),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match (op, value) {
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::Int(v)) => v
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| SynthError::evaluation("integer overflow", expr.span)),
                    (UnaryOp::Neg, Value::Real(v)) => Ok(Value::Real(-v)),
                    (UnaryOp::Not, other) => Err(type_error("`!` needs a boolean", &other, operand.span)),
                    (UnaryOp::Neg, other) => Err(type_error("`-` needs a number", &other, operand.span)),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, expr.span),
            ExprKind::Call { .. } => Err(SynthError::unsupported(
                "function calls are not supported",
                expr.span,
            )),
        }
    }

    fn binary(&self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Result<Value, SynthError> {
        if op.is_logical() {
            let left = self.eval_bool(lhs)?;
            let short_circuit = match op {
                BinOp::And => !left,
                _ => left,
            };
            if short_circuit {
                return Ok(Value::Bool(left));
            }
            return Ok(Value::Bool(self.eval_bool(rhs)?));
        }

        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;
        match op {
            BinOp::Eq => Ok(Value::Bool(equal(&left, &right))),
            BinOp::NotEq => Ok(Value::Bool(!equal(&left, &right))),
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
                let ordering = order(&left, &right).ok_or_else(|| {
                    SynthError::evaluation(
                        format!(
                            "cannot compare {} with {}",
                            left.kind_name(),
                            right.kind_name()
                        ),
                        span,
                    )
                })?;
                Ok(Value::Bool(match op {
                    BinOp::Lt => ordering == Ordering::Less,
                    BinOp::Gt => ordering == Ordering::Greater,
                    BinOp::LtEq => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }))
            }
            _ => arithmetic(op, left, right, span),
        }
    }

    fn eval_bool(&self, expr: &Expr) -> Result<bool, SynthError> {
        match self.eval(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(type_error("expected a boolean", &other, expr.span)),
        }
    }

    /// Check every `requires` clause, in order, against the arguments.
    pub fn check_requires(&self) -> Result<(), SynthError> {
        for contract in self.method.requires() {
            self.check(contract)?;
        }
        Ok(())
    }

    fn check(&self, contract: &ContractRecord) -> Result<(), SynthError> {
        match self.eval(&contract.expression)? {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) => Err(SynthError::PreconditionFailed {
                name: contract.display_name().to_string(),
                span: contract.span,
            }),
            other => Err(type_error(
                "a `requires` clause must be a condition",
                &other,
                contract.expression.span,
            )),
        }
    }
}

fn type_error(message: &str, found: &Value, span: Span) -> SynthError {
    SynthError::evaluation(format!("{message}, found {}", found.kind_name()), span)
}

fn as_real(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Real(v) => Some(*v),
        _ => None,
    }
}

fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Real(_)) | (Value::Real(_), Value::Int(_)) => {
            as_real(left) == as_real(right)
        }
        _ => left == right,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => as_real(left)?.partial_cmp(&as_real(right)?),
    }
}

fn arithmetic(op: BinOp, left: Value, right: Value, span: Span) -> Result<Value, SynthError> {
    if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
        let (a, b) = (*a, *b);
        if b == 0 && matches!(op, BinOp::Div | BinOp::Rem) {
            return Err(SynthError::evaluation("division by zero", span));
        }
        let result = match op {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| SynthError::evaluation("integer overflow", span));
    }

    let (Some(a), Some(b)) = (as_real(&left), as_real(&right)) else {
        return Err(SynthError::evaluation(
            format!(
                "`{op}` needs numbers, found {} and {}",
                left.kind_name(),
                right.kind_name()
            ),
            span,
        ));
    };
    if b == 0.0 && matches!(op, BinOp::Div | BinOp::Rem) {
        return Err(SynthError::evaluation("division by zero", span));
    }
    Ok(Value::Real(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        _ => a % b,
    }))
}
