//! Lowering of [`ArExpr`] trees onto z3 terms.

use z3::ast::{Ast, Bool, Int, Real};
use z3::Context;

use crate::error::ModelError;
use crate::model::{ArExpr, ArOp, ArUnary};

/// A z3 term of one of the three sorts a model uses.
#[derive(Clone)]
pub(crate) enum Term<'ctx> {
    Int(Int<'ctx>),
    Real(Real<'ctx>),
    Bool(Bool<'ctx>),
}

enum Numbers<'ctx> {
    Int(Int<'ctx>, Int<'ctx>),
    Real(Real<'ctx>, Real<'ctx>),
}

/// Exact rational for a finite `f64`, read from its shortest decimal form.
pub(crate) fn decimal<'ctx>(ctx: &'ctx Context, value: f64) -> Result<Real<'ctx>, ModelError> {
    let unrepresentable = || ModelError::NotFinite { value };
    if !value.is_finite() {
        return Err(unrepresentable());
    }
    let text = format!("{}", value.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let digits = format!("{whole}{fraction}");
    let numerator = match digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let denominator = format!("1{}", "0".repeat(fraction.len()));
    let magnitude =
        Real::from_real_str(ctx, numerator, &denominator).ok_or_else(unrepresentable)?;
    Ok(if value < 0.0 {
        magnitude.unary_minus()
    } else {
        magnitude
    })
}

/// Encodes the constraints of one model. `vars` holds the term for every
/// declared variable, indexed by [`VarId`](crate::VarId).
pub(crate) struct Encoder<'a, 'ctx> {
    ctx: &'ctx Context,
    vars: &'a [Term<'ctx>],
    /// Divisors that must be non-zero for the constraint being encoded.
    guards: Vec<Bool<'ctx>>,
}

impl<'a, 'ctx> Encoder<'a, 'ctx> {
    pub(crate) fn new(ctx: &'ctx Context, vars: &'a [Term<'ctx>]) -> Self {
        Self {
            ctx,
            vars,
            guards: Vec::new(),
        }
    }

    /// The assertion for one posted constraint. A division by zero anywhere
    /// inside it makes the whole constraint false.
    pub(crate) fn constraint(&mut self, expr: &ArExpr) -> Result<Bool<'ctx>, ModelError> {
        self.guards.clear();
        let root = self.encode(expr)?;
        let root = self.truth(root);
        let mut parts: Vec<&Bool<'ctx>> = self.guards.iter().collect();
        parts.push(&root);
        Ok(Bool::and(self.ctx, &parts))
    }

    fn encode(&mut self, expr: &ArExpr) -> Result<Term<'ctx>, ModelError> {
        let term = match expr {
            ArExpr::Var(id) => self.vars[id.index()].clone(),
            ArExpr::Int(v) => Term::Int(Int::from_i64(self.ctx, *v)),
            ArExpr::Real(v) => Term::Real(decimal(self.ctx, *v)?),
            ArExpr::Bool(v) => Term::Bool(Bool::from_bool(self.ctx, *v)),
            ArExpr::Unary(ArUnary::Not, operand) => {
                let operand = self.encode(operand)?;
                Term::Bool(self.truth(operand).not())
            }
            ArExpr::Unary(ArUnary::Neg, operand) => match self.encode(operand)? {
                Term::Real(r) => Term::Real(r.unary_minus()),
                other => Term::Int(self.int(other).unary_minus()),
            },
            ArExpr::Binary(op, lhs, rhs) => {
                let lhs = self.encode(lhs)?;
                let rhs = self.encode(rhs)?;
                self.binary(*op, lhs, rhs)
            }
        };
        Ok(term)
    }

    fn binary(&mut self, op: ArOp, lhs: Term<'ctx>, rhs: Term<'ctx>) -> Term<'ctx> {
        let ctx = self.ctx;
        match op {
            ArOp::And => {
                let (l, r) = (self.truth(lhs), self.truth(rhs));
                return Term::Bool(Bool::and(ctx, &[&l, &r]));
            }
            ArOp::Or => {
                let (l, r) = (self.truth(lhs), self.truth(rhs));
                return Term::Bool(Bool::or(ctx, &[&l, &r]));
            }
            ArOp::Eq | ArOp::Ne => {
                let equal = match (lhs, rhs) {
                    (Term::Bool(l), Term::Bool(r)) => l._eq(&r),
                    (lhs, rhs) => match self.numbers(lhs, rhs) {
                        Numbers::Int(l, r) => l._eq(&r),
                        Numbers::Real(l, r) => l._eq(&r),
                    },
                };
                return Term::Bool(if op == ArOp::Eq { equal } else { equal.not() });
            }
            _ => {}
        }

        match (op, self.numbers(lhs, rhs)) {
            (ArOp::Lt, Numbers::Int(l, r)) => Term::Bool(l.lt(&r)),
            (ArOp::Lt, Numbers::Real(l, r)) => Term::Bool(l.lt(&r)),
            (ArOp::Le, Numbers::Int(l, r)) => Term::Bool(l.le(&r)),
            (ArOp::Le, Numbers::Real(l, r)) => Term::Bool(l.le(&r)),
            (ArOp::Gt, Numbers::Int(l, r)) => Term::Bool(l.gt(&r)),
            (ArOp::Gt, Numbers::Real(l, r)) => Term::Bool(l.gt(&r)),
            (ArOp::Ge, Numbers::Int(l, r)) => Term::Bool(l.ge(&r)),
            (ArOp::Ge, Numbers::Real(l, r)) => Term::Bool(l.ge(&r)),
            (ArOp::Add, Numbers::Int(l, r)) => Term::Int(Int::add(ctx, &[&l, &r])),
            (ArOp::Add, Numbers::Real(l, r)) => Term::Real(Real::add(ctx, &[&l, &r])),
            (ArOp::Sub, Numbers::Int(l, r)) => Term::Int(Int::sub(ctx, &[&l, &r])),
            (ArOp::Sub, Numbers::Real(l, r)) => Term::Real(Real::sub(ctx, &[&l, &r])),
            (ArOp::Mul, Numbers::Int(l, r)) => Term::Int(Int::mul(ctx, &[&l, &r])),
            (ArOp::Mul, Numbers::Real(l, r)) => Term::Real(Real::mul(ctx, &[&l, &r])),
            (ArOp::Div, Numbers::Int(l, r)) => {
                self.guards.push(r._eq(&Int::from_i64(ctx, 0)).not());
                Term::Int(truncating_div(ctx, &l, &r))
            }
            (ArOp::Div, Numbers::Real(l, r)) => {
                self.guards.push(r._eq(&Real::from_real(ctx, 0, 1)).not());
                Term::Real(l.div(&r))
            }
            // Logical and equality operators returned above.
            (_, _) => Term::Bool(Bool::from_bool(ctx, false)),
        }
    }

    /// Both operands in one numeric sort; an `Int` meeting a `Real` is widened.
    fn numbers(&self, lhs: Term<'ctx>, rhs: Term<'ctx>) -> Numbers<'ctx> {
        match (lhs, rhs) {
            (Term::Real(l), r) => Numbers::Real(l, self.real(r)),
            (l, Term::Real(r)) => Numbers::Real(self.real(l), r),
            (l, r) => Numbers::Int(self.int(l), self.int(r)),
        }
    }

    fn int(&self, term: Term<'ctx>) -> Int<'ctx> {
        match term {
            Term::Int(i) => i,
            Term::Real(r) => r.to_int(),
            Term::Bool(b) => b.ite(&Int::from_i64(self.ctx, 1), &Int::from_i64(self.ctx, 0)),
        }
    }

    fn real(&self, term: Term<'ctx>) -> Real<'ctx> {
        match term {
            Term::Real(r) => r,
            other => self.int(other).to_real(),
        }
    }

    fn truth(&self, term: Term<'ctx>) -> Bool<'ctx> {
        match term {
            Term::Bool(b) => b,
            Term::Int(i) => i._eq(&Int::from_i64(self.ctx, 0)).not(),
            Term::Real(r) => r._eq(&Real::from_real(self.ctx, 0, 1)).not(),
        }
    }
}

/// Integer division rounding toward zero. z3's `div` is Euclidean, which
/// agrees with truncation for a non-negative dividend.
fn truncating_div<'ctx>(ctx: &'ctx Context, l: &Int<'ctx>, r: &Int<'ctx>) -> Int<'ctx> {
    let zero = Int::from_i64(ctx, 0);
    let toward_zero = l.unary_minus().div(r).unary_minus();
    l.ge(&zero).ite(&l.div(r), &toward_zero)
}
