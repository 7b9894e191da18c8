//! Variables, expressions and posted constraints.
//!
//! A [`Model`] is plain data; nothing touches z3 until a
//! [`Solver`](crate::Solver) is built from it. That keeps models cheap to
//! clone and lets the same model be solved once per call.

use std::fmt;

use crate::error::ModelError;

/// Handle to a variable declared on a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    Int,
    Bool,
    Real,
}

/// The values a variable may take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Domain {
    Int { lo: i64, hi: i64 },
    /// `steps * precision` for integer `steps` in `[lo, hi]`.
    Grid { lo: i64, hi: i64, precision: f64 },
    Bool,
    IntConst(i64),
    RealConst(f64),
    BoolConst(bool),
}

impl Domain {
    pub(crate) fn kind(self) -> VarKind {
        match self {
            Domain::Int { .. } | Domain::IntConst(_) => VarKind::Int,
            Domain::Grid { .. } | Domain::RealConst(_) => VarKind::Real,
            Domain::Bool | Domain::BoolConst(_) => VarKind::Bool,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VarDecl {
    pub(crate) name: String,
    pub(crate) domain: Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl ArOp {
    fn symbol(self) -> &'static str {
        match self {
            ArOp::Add => "+",
            ArOp::Sub => "-",
            ArOp::Mul => "*",
            ArOp::Div => "/",
            ArOp::Eq => "==",
            ArOp::Ne => "!=",
            ArOp::Lt => "<",
            ArOp::Le => "<=",
            ArOp::Gt => ">",
            ArOp::Ge => ">=",
            ArOp::And => "&&",
            ArOp::Or => "||",
        }
    }

    pub(crate) fn is_arithmetic(self) -> bool {
        matches!(self, ArOp::Add | ArOp::Sub | ArOp::Mul | ArOp::Div)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArUnary {
    Neg,
    Not,
}

/// An arithmetic or boolean expression over model variables.
#[derive(Debug, Clone, PartialEq)]
pub enum ArExpr {
    Var(VarId),
    Int(i64),
    Real(f64),
    Bool(bool),
    Unary(ArUnary, Box<ArExpr>),
    Binary(ArOp, Box<ArExpr>, Box<ArExpr>),
}

macro_rules! binary_builders {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(self, rhs: ArExpr) -> ArExpr {
                ArExpr::Binary(ArOp::$op, Box::new(self), Box::new(rhs))
            }
        )*
    };
}

impl ArExpr {
    binary_builders! {
        add => Add,
        sub => Sub,
        mul => Mul,
        div => Div,
        eq => Eq,
        ne => Ne,
        lt => Lt,
        le => Le,
        gt => Gt,
        ge => Ge,
        and => And,
        or => Or,
    }

    pub fn not(self) -> ArExpr {
        ArExpr::Unary(ArUnary::Not, Box::new(self))
    }

    pub fn neg(self) -> ArExpr {
        ArExpr::Unary(ArUnary::Neg, Box::new(self))
    }
}

impl From<VarId> for ArExpr {
    fn from(id: VarId) -> Self {
        ArExpr::Var(id)
    }
}

impl fmt::Display for ArExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArExpr::Var(id) => write!(f, "v{}", id.0),
            ArExpr::Int(v) => write!(f, "{v}"),
            ArExpr::Real(v) => write!(f, "{v:?}"),
            ArExpr::Bool(v) => write!(f, "{v}"),
            ArExpr::Unary(ArUnary::Neg, e) => write!(f, "(-{e})"),
            ArExpr::Unary(ArUnary::Not, e) => write!(f, "(!{e})"),
            ArExpr::Binary(op, l, r) => write!(f, "({l} {} {r})", op.symbol()),
        }
    }
}

/// A set of variables and the constraints posted over them.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) vars: Vec<VarDecl>,
    pub(crate) constraints: Vec<ArExpr>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int_var(&mut self, name: &str, lo: i64, hi: i64) -> Result<VarId, ModelError> {
        if lo > hi {
            return Err(ModelError::EmptyDomain {
                name: name.to_string(),
            });
        }
        Ok(self.declare(name, Domain::Int { lo, hi }))
    }

    /// A real variable restricted to the multiples of `precision` in
    /// `[lo, hi]`.
    pub fn real_var(
        &mut self,
        name: &str,
        lo: f64,
        hi: f64,
        precision: f64,
    ) -> Result<VarId, ModelError> {
        if !(precision > 0.0 && precision.is_finite()) {
            return Err(ModelError::InvalidPrecision {
                name: name.to_string(),
            });
        }
        let first = (lo / precision - GRID_SLACK).ceil();
        let last = (hi / precision + GRID_SLACK).floor();
        if first > last || !first.is_finite() || !last.is_finite() {
            return Err(ModelError::EmptyDomain {
                name: name.to_string(),
            });
        }
        let domain = Domain::Grid {
            lo: first as i64,
            hi: last as i64,
            precision,
        };
        Ok(self.declare(name, domain))
    }

    pub fn bool_var(&mut self, name: &str) -> VarId {
        self.declare(name, Domain::Bool)
    }

    pub fn int_const(&mut self, name: &str, value: i64) -> VarId {
        self.declare(name, Domain::IntConst(value))
    }

    /// A real constant, kept exactly even when it is off every grid.
    pub fn real_const(&mut self, name: &str, value: f64) -> Result<VarId, ModelError> {
        if !value.is_finite() {
            return Err(ModelError::NotFinite { value });
        }
        Ok(self.declare(name, Domain::RealConst(value)))
    }

    pub fn bool_const(&mut self, name: &str, value: bool) -> VarId {
        self.declare(name, Domain::BoolConst(value))
    }

    fn declare(&mut self, name: &str, domain: Domain) -> VarId {
        self.vars.push(VarDecl {
            name: name.to_string(),
            domain,
        });
        VarId(self.vars.len() - 1)
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn var_name(&self, id: VarId) -> &str {
        &self.vars[id.0].name
    }

    pub fn var_kind(&self, id: VarId) -> VarKind {
        self.vars[id.0].domain.kind()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Post a boolean-valued constraint.
    pub fn post(&mut self, expr: ArExpr) -> Result<(), ModelError> {
        if self.sort_of(&expr) != VarKind::Bool {
            return Err(ModelError::NotBoolean {
                expr: expr.to_string(),
            });
        }
        if let Some(value) = first_non_finite(&expr) {
            return Err(ModelError::NotFinite { value });
        }
        self.constraints.push(expr);
        Ok(())
    }

    /// Booleans used as numbers count as `Int` (0 or 1).
    pub(crate) fn sort_of(&self, expr: &ArExpr) -> VarKind {
        match expr {
            ArExpr::Var(id) => self.var_kind(*id),
            ArExpr::Int(_) => VarKind::Int,
            ArExpr::Real(_) => VarKind::Real,
            ArExpr::Bool(_) | ArExpr::Unary(ArUnary::Not, _) => VarKind::Bool,
            ArExpr::Unary(ArUnary::Neg, e) => match self.sort_of(e) {
                VarKind::Real => VarKind::Real,
                _ => VarKind::Int,
            },
            ArExpr::Binary(op, l, r) if op.is_arithmetic() => {
                if self.sort_of(l) == VarKind::Real || self.sort_of(r) == VarKind::Real {
                    VarKind::Real
                } else {
                    VarKind::Int
                }
            }
            ArExpr::Binary(..) => VarKind::Bool,
        }
    }
}

/// Tolerance for bounds that are meant to sit exactly on a grid point.
const GRID_SLACK: f64 = 1e-9;

fn first_non_finite(expr: &ArExpr) -> Option<f64> {
    match expr {
        ArExpr::Real(v) if !v.is_finite() => Some(*v),
        ArExpr::Unary(_, e) => first_non_finite(e),
        ArExpr::Binary(_, l, r) => first_non_finite(l).or_else(|| first_non_finite(r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_rejects_non_boolean() {
        let mut model = Model::new();
        let x = model.int_var("x", 0, 10).unwrap();
        let err = model
            .post(ArExpr::Var(x).add(ArExpr::Int(1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "constraint `(v0 + 1)` is not boolean");
        assert!(model.post(ArExpr::Var(x).gt(ArExpr::Int(1))).is_ok());
        assert_eq!(model.constraint_count(), 1);
    }

    #[test]
    fn real_domain_counts_grid_steps() {
        let mut model = Model::new();
        let r = model.real_var("r", 0.123, 1.0, 0.1).unwrap();
        assert_eq!(
            model.vars[r.index()].domain,
            Domain::Grid {
                lo: 2,
                hi: 10,
                precision: 0.1
            }
        );
        assert_eq!(model.var_kind(r), VarKind::Real);
        assert!(model.real_var("bad", 0.11, 0.19, 0.1).is_err());
        assert!(model.real_var("bad", 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn mixed_arithmetic_is_real() {
        let mut model = Model::new();
        let x = model.int_var("x", 0, 10).unwrap();
        let flag = model.bool_var("flag");
        assert_eq!(model.sort_of(&ArExpr::Var(x).mul(ArExpr::Real(0.5))), VarKind::Real);
        assert_eq!(model.sort_of(&ArExpr::Var(flag).add(ArExpr::Int(1))), VarKind::Int);
        assert_eq!(model.sort_of(&ArExpr::Var(x).neg()), VarKind::Int);
    }

    #[test]
    fn infinite_literals_are_rejected() {
        let mut model = Model::new();
        let x = model.int_var("x", 0, 10).unwrap();
        assert_eq!(
            model.post(ArExpr::Var(x).lt(ArExpr::Real(f64::INFINITY))),
            Err(ModelError::NotFinite {
                value: f64::INFINITY
            })
        );
        assert!(model.real_const("p", f64::NAN).is_err());
    }

    #[test]
    fn empty_int_domain() {
        let mut model = Model::new();
        assert!(matches!(
            model.int_var("x", 3, 1),
            Err(ModelError::EmptyDomain { .. })
        ));
    }
}
