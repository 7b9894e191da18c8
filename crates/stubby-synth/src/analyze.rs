//! Contract analysis: which fields each `ensures` clause constrains, and
//! how each clause will be satisfied.
//!
//! Clauses over solver-representable fields only are solved together.
//! Clauses touching any other field are direct assignments, and `rex`
//! clauses are pattern generation.

use stubby_parser::{BinOp, ContractRecord, Expr, ExprKind, Literal};
use stubby_schema::{MethodDescriptor, Schema, SemanticType};

use crate::error::SynthError;
use crate::path::{self, ModelVariable};

/// An `ensures` clause with the distinct fields it references, in order of
/// first appearance.
#[derive(Debug)]
pub struct ContractWithVariables<'c> {
    pub contract: &'c ContractRecord,
    pub variables: Vec<ModelVariable>,
}

/// `result.path == value`, satisfied by evaluating `value`.
#[derive(Debug)]
pub struct Assignment<'c> {
    pub contract: &'c ContractRecord,
    pub target: ModelVariable,
    pub value: &'c Expr,
}

/// `rex: result.path == pattern`, satisfied by generating a match.
#[derive(Debug)]
pub struct PatternClause<'c> {
    pub contract: &'c ContractRecord,
    pub target: ModelVariable,
    pub pattern: &'c Expr,
}

#[derive(Debug, Default)]
pub struct Analysis<'c> {
    pub requires: Vec<&'c ContractRecord>,
    pub primitive: Vec<ContractWithVariables<'c>>,
    pub assignments: Vec<Assignment<'c>>,
    pub patterns: Vec<PatternClause<'c>>,
}

impl Analysis<'_> {
    /// Every field the solved clauses reference, deduplicated by canonical
    /// name, in order of first appearance.
    pub fn solver_variables(&self) -> Vec<&ModelVariable> {
        let mut vars: Vec<&ModelVariable> = Vec::new();
        for contract in &self.primitive {
            for var in &contract.variables {
                if !vars.contains(&var) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}

pub fn analyze<'c>(
    method: &'c MethodDescriptor,
    schema: &Schema,
) -> Result<Analysis<'c>, SynthError> {
    let mut analysis = Analysis {
        requires: method.requires().collect(),
        ..Analysis::default()
    };

    for contract in method.ensures() {
        if contract.is_regex_ensures() {
            analysis.patterns.push(pattern_clause(contract, method, schema)?);
            continue;
        }

        let mut variables = Vec::new();
        collect_variables(&contract.expression, method, schema, &mut variables)?;
        if variables.iter().all(|v| v.semantic.is_solver_primitive()) {
            check_numeric(&contract.expression)?;
            analysis.primitive.push(ContractWithVariables {
                contract,
                variables,
            });
        } else {
            analysis.assignments.push(assignment(contract, method, schema)?);
        }
    }
    check_targets(&analysis)?;
    Ok(analysis)
}

/// Assignments and `rex` clauses each write their target whole, so no two
/// of them may write the same field or one field inside another.
fn check_targets(analysis: &Analysis<'_>) -> Result<(), SynthError> {
    let targets: Vec<&ModelVariable> = analysis
        .assignments
        .iter()
        .map(|a| &a.target)
        .chain(analysis.patterns.iter().map(|p| &p.target))
        .collect();
    for (i, later) in targets.iter().enumerate() {
        for earlier in &targets[..i] {
            let (inner, outer) = if later.path.segments.len() >= earlier.path.segments.len() {
                (later, earlier)
            } else {
                (earlier, later)
            };
            if inner.path.segments.starts_with(&outer.path.segments) {
                return Err(SynthError::ConflictingTargets {
                    path: inner.path.to_string(),
                    other: outer.path.to_string(),
                    span: inner.span,
                    other_span: outer.span,
                });
            }
        }
    }
    Ok(())
}

/// Walk `expr`, resolving every variable access it contains.
fn collect_variables(
    expr: &Expr,
    method: &MethodDescriptor,
    schema: &Schema,
    out: &mut Vec<ModelVariable>,
) -> Result<(), SynthError> {
    match &expr.kind {
        ExprKind::Var(access) => {
            let var = path::resolve(access, method, schema)?;
            if !out.contains(&var) {
                out.push(var);
            }
            Ok(())
        }
        ExprKind::Literal(_) => Ok(()),
        ExprKind::Unary { operand, .. } => collect_variables(operand, method, schema, out),
        ExprKind::Binary { lhs, rhs, .. } => {
            collect_variables(lhs, method, schema, out)?;
            collect_variables(rhs, method, schema, out)
        }
        ExprKind::Index { .. } => Err(SynthError::unsupported(
            "indexed fields cannot be constrained",
            expr.span,
        )),
        ExprKind::Call { .. } => Err(SynthError::unsupported(
            "function calls cannot be constrained",
            expr.span,
        )),
    }
}

/// Reject the constructs a numeric model cannot express.
fn check_numeric(expr: &Expr) -> Result<(), SynthError> {
    match &expr.kind {
        ExprKind::Literal(Literal::Str(_) | Literal::Null) => Err(SynthError::unsupported(
            "only numbers and booleans can appear in a solved clause",
            expr.span,
        )),
        ExprKind::Binary { op: BinOp::Rem, .. } => Err(SynthError::UnsupportedOperator {
            op: BinOp::Rem,
            span: expr.span,
        }),
        ExprKind::Binary { lhs, rhs, .. } => {
            check_numeric(lhs)?;
            check_numeric(rhs)
        }
        ExprKind::Unary { operand, .. } => check_numeric(operand),
        _ => Ok(()),
    }
}

/// Split a clause of the form `result.path == rhs`.
fn split_equality<'c>(
    contract: &'c ContractRecord,
    method: &MethodDescriptor,
    schema: &Schema,
    what: &str,
) -> Result<(ModelVariable, &'c Expr), SynthError> {
    let expr = &contract.expression;
    let ExprKind::Binary { op, lhs, rhs } = &expr.kind else {
        return Err(SynthError::unsupported(
            format!("{what} must have the form `result.field == value`"),
            expr.span,
        ));
    };
    if *op != BinOp::Eq {
        return Err(SynthError::UnsupportedOperator {
            op: *op,
            span: expr.span,
        });
    }
    let Some(access) = lhs.as_var() else {
        return Err(SynthError::unsupported(
            format!("the left side of {what} must be a field of `result`"),
            lhs.span,
        ));
    };
    let target = path::resolve(access, method, schema)?;
    if !target.path.is_result() {
        return Err(SynthError::unsupported(
            format!("the left side of {what} must be a field of `result`"),
            lhs.span,
        ));
    }
    Ok((target, rhs))
}

fn assignment<'c>(
    contract: &'c ContractRecord,
    method: &MethodDescriptor,
    schema: &Schema,
) -> Result<Assignment<'c>, SynthError> {
    let (target, value) = split_equality(contract, method, schema, "a non-numeric clause")?;
    Ok(Assignment {
        contract,
        target,
        value,
    })
}

fn pattern_clause<'c>(
    contract: &'c ContractRecord,
    method: &MethodDescriptor,
    schema: &Schema,
) -> Result<PatternClause<'c>, SynthError> {
    let (target, pattern) = split_equality(contract, method, schema, "a `rex` clause")?;
    if target.semantic != SemanticType::Str {
        return Err(SynthError::unsupported(
            format!("`{}` is {}, but a `rex` clause needs a String", target.path, target.ty),
            target.span,
        ));
    }
    Ok(PatternClause {
        contract,
        target,
        pattern,
    })
}
