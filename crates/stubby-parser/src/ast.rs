//! Expression AST for contract blocks.
//!
//! The tree is a closed sum type: every consumer matches [`ExprKind`]
//! exhaustively, so a new node kind cannot be silently ignored downstream.

use std::fmt;

use stubby_common::span::Span;

/// An expression with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The variable-access chain, if this expression is one.
    pub fn as_var(&self) -> Option<&VarAccess> {
        match &self.kind {
            ExprKind::Var(access) => Some(access),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `a`, `result.b.c`
    Var(VarAccess),
    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },
    Literal(Literal),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
}

/// A dotted chain of identifiers. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct VarAccess {
    pub segments: Vec<Ident>,
}

impl VarAccess {
    /// The first segment: `result` or a parameter name.
    pub fn root(&self) -> &Ident {
        &self.segments[0]
    }

    /// Everything after the root.
    pub fn fields(&self) -> &[Ident] {
        &self.segments[1..]
    }

    pub fn span(&self) -> Span {
        let first = self.segments[0].span;
        let last = self.segments[self.segments.len() - 1].span;
        first.merge(last)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Whether a contract is a precondition or a postcondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Requires,
    Ensures,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractKind::Requires => f.write_str("requires"),
            ContractKind::Ensures => f.write_str("ensures"),
        }
    }
}

/// Reserved contract name marking a regex-ensures clause.
pub const REGEX_ENSURES: &str = "rex";

/// One `requires`/`ensures` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRecord {
    pub kind: ContractKind,
    pub name: Option<String>,
    pub expression: Expr,
    /// From the keyword through the terminating `;`.
    pub span: Span,
}

impl ContractRecord {
    /// A regex-ensures clause: an `ensures` named `rex`.
    pub fn is_regex_ensures(&self) -> bool {
        self.kind == ContractKind::Ensures && self.name.as_deref() == Some(REGEX_ENSURES)
    }

    /// The name, or `unset name` for anonymous clauses.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unset name")
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

impl fmt::Display for VarAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&seg.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Str(s) => write!(f, "{s:?}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Fully parenthesized form, used in logs and tests to show tree shape.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Var(access) => write!(f, "{access}"),
            ExprKind::Index { base, index } => write!(f, "{base}[{index}]"),
            ExprKind::Literal(lit) => write!(f, "{lit}"),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "(!{operand})"),
                UnaryOp::Neg => write!(f, "(-{operand})"),
            },
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
