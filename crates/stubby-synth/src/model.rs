//! Translate the solved `ensures` bucket into a `stubby-csp` model.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use stubby_common::span::Span;
use stubby_csp::{ArExpr, Model, ModelError, VarId};
use stubby_parser::{BinOp, Expr, ExprKind, Literal, UnaryOp};
use stubby_schema::{MethodDescriptor, Schema, SemanticType, SynthConfig};

use crate::analyze::Analysis;
use crate::error::SynthError;
use crate::path::{self, ModelVariable, PathRoot};
use crate::value::Value;
use crate::Arguments;

/// A solver model plus the field each of its variables stands for.
#[derive(Debug)]
pub struct ConstraintModel {
    pub model: Model,
    pub bindings: Vec<(ModelVariable, VarId)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sort {
    Number,
    Bool,
}

/// Build the model for `analysis`.
///
/// With `args`, parameter fields become constants holding the caller's
/// values. Without them (contract checking) they are free variables over
/// the configured domain. `pinned` maps canonical names of result fields
/// that an assignment already decides to the value they will end up with;
/// those are constants too.
pub fn build(
    analysis: &Analysis<'_>,
    method: &MethodDescriptor,
    schema: &Schema,
    args: Option<&Arguments>,
    pinned: &FxHashMap<String, Value>,
    config: &SynthConfig,
) -> Result<ConstraintModel, SynthError> {
    let mut model = Model::new();
    let mut bindings = Vec::new();
    let mut ids: FxHashMap<String, VarId> = FxHashMap::default();
    let mut free_reals = FxHashSet::default();

    // Every variable is declared before the first post.
    for var in analysis.solver_variables() {
        let fixed = match (&var.path.root, args) {
            (PathRoot::Parameter(param), Some(args)) => {
                Some(argument_value(args, param, &var.path.segments))
            }
            _ => pinned.get(&var.canonical_name),
        };
        let id = match fixed {
            Some(value) => constant(&mut model, var, value)?,
            None => {
                let id = declare(&mut model, var, config)?;
                if var.semantic == SemanticType::Real {
                    free_reals.insert(id);
                }
                id
            }
        };
        debug!("{}: {} `{}`", method.name, var.semantic, var.canonical_name);
        ids.insert(var.canonical_name.clone(), id);
        bindings.push((var.clone(), id));
    }

    let translator = Translator {
        method,
        schema,
        ids: &ids,
        free_reals: &free_reals,
        precision: config.real_precision,
    };
    for contract in &analysis.primitive {
        let expr = &contract.contract.expression;
        let (constraint, sort) = translator.translate(expr)?;
        if sort != Sort::Bool {
            return Err(SynthError::unsupported(
                "an `ensures` clause must be a condition",
                expr.span,
            ));
        }
        debug!("{}: post {constraint}", method.name);
        model
            .post(constraint)
            .map_err(|err| SynthError::unsupported(err.to_string(), expr.span))?;
    }

    Ok(ConstraintModel { model, bindings })
}

/// A variable whose value is already known.
fn constant(model: &mut Model, var: &ModelVariable, value: &Value) -> Result<VarId, SynthError> {
    let name = var.canonical_name.as_str();
    let domain_error = |err: ModelError| SynthError::unsupported(err.to_string(), var.span);
    match (var.semantic, value) {
        (SemanticType::Int, Value::Int(v)) => Ok(model.int_const(name, *v)),
        (SemanticType::Real, Value::Int(v)) => model.real_const(name, *v as f64).map_err(domain_error),
        (SemanticType::Real, Value::Real(v)) => model.real_const(name, *v).map_err(domain_error),
        (SemanticType::Bool, Value::Bool(v)) => Ok(model.bool_const(name, *v)),
        (_, other) => Err(SynthError::evaluation(
            format!("`{}` is {}, but the contracts need {}", var.path, other.kind_name(), var.ty),
            var.span,
        )),
    }
}

fn declare(model: &mut Model, var: &ModelVariable, config: &SynthConfig) -> Result<VarId, SynthError> {
    let name = var.canonical_name.as_str();
    let domain_error = |err: ModelError| SynthError::unsupported(err.to_string(), var.span);
    match var.semantic {
        SemanticType::Int => model
            .int_var(name, config.int_min, config.int_max)
            .map_err(domain_error),
        SemanticType::Real => model
            .real_var(
                name,
                config.int_min as f64,
                config.int_max as f64,
                config.real_precision,
            )
            .map_err(domain_error),
        SemanticType::Bool => Ok(model.bool_var(name)),
        SemanticType::Str | SemanticType::Struct => Err(SynthError::unsupported(
            format!("`{}` of type {} cannot be solved for", var.path, var.ty),
            var.span,
        )),
    }
}

/// The caller's value at `param.segments...`; missing values read as null.
fn argument_value<'a>(args: &'a Arguments, param: &str, segments: &[String]) -> &'a Value {
    let mut value = args.get(param).unwrap_or(&Value::Null);
    for segment in segments {
        value = value.field(segment).unwrap_or(&Value::Null);
    }
    value
}

struct Translator<'a> {
    method: &'a MethodDescriptor,
    schema: &'a Schema,
    ids: &'a FxHashMap<String, VarId>,
    /// Solved `Double` fields; these only take multiples of `precision`.
    free_reals: &'a FxHashSet<VarId>,
    precision: f64,
}

impl Translator<'_> {
    /// Post-order translation: operands first, then the operator.
    fn translate(&self, expr: &Expr) -> Result<(ArExpr, Sort), SynthError> {
        match &expr.kind {
            ExprKind::Var(access) => {
                let var = path::resolve(access, self.method, self.schema)?;
                let id = self.ids.get(&var.canonical_name).copied().ok_or_else(|| {
                    SynthError::unsupported(format!("`{}` is not in the model", var.path), expr.span)
                })?;
                let sort = if var.semantic == SemanticType::Bool {
                    Sort::Bool
                } else {
                    Sort::Number
                };
                Ok((ArExpr::Var(id), sort))
            }
            ExprKind::Literal(lit) => match lit {
                Literal::Int(v) => Ok((ArExpr::Int(*v), Sort::Number)),
                Literal::Float(v) => Ok((ArExpr::Real(*v), Sort::Number)),
                Literal::Bool(v) => Ok((ArExpr::Bool(*v), Sort::Bool)),
                Literal::Str(_) | Literal::Null => Err(SynthError::unsupported(
                    "only numbers and booleans can appear in a solved clause",
                    expr.span,
                )),
            },
            ExprKind::Unary { op, operand } => {
                let (inner, sort) = self.translate(operand)?;
                match op {
                    UnaryOp::Not => {
                        expect_sort(sort, Sort::Bool, "`!`", operand.span)?;
                        Ok((inner.not(), Sort::Bool))
                    }
                    UnaryOp::Neg => {
                        expect_sort(sort, Sort::Number, "`-`", operand.span)?;
                        Ok((inner.neg(), Sort::Number))
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let (left, left_sort) = self.translate(lhs)?;
                let (right, right_sort) = self.translate(rhs)?;
                let what = format!("`{op}`");
                let operand_sort = match op {
                    BinOp::And | BinOp::Or => Sort::Bool,
                    BinOp::Eq | BinOp::NotEq => left_sort,
                    _ => Sort::Number,
                };
                expect_sort(left_sort, operand_sort, &what, lhs.span)?;
                expect_sort(right_sort, operand_sort, &what, rhs.span)?;
                if matches!(op, BinOp::Eq | BinOp::NotEq) {
                    self.check_on_grid(&left, &right, expr.span)?;
                }

                let constraint = match op {
                    BinOp::And => left.and(right),
                    BinOp::Or => left.or(right),
                    BinOp::Eq => left.eq(right),
                    BinOp::NotEq => left.ne(right),
                    BinOp::Lt => left.lt(right),
                    BinOp::Gt => left.gt(right),
                    BinOp::LtEq => left.le(right),
                    BinOp::GtEq => left.ge(right),
                    BinOp::Add => left.add(right),
                    BinOp::Sub => left.sub(right),
                    BinOp::Mul => left.mul(right),
                    BinOp::Div => left.div(right),
                    BinOp::Rem => {
                        return Err(SynthError::UnsupportedOperator {
                            op: *op,
                            span: expr.span,
                        })
                    }
                };
                let sort = if op.is_logical() || op.is_comparison() {
                    Sort::Bool
                } else {
                    Sort::Number
                };
                Ok((constraint, sort))
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
}

impl Translator<'_> {
    /// Reject `==`/`!=` between a solved `Double` and a literal off its grid.
    fn check_on_grid(&self, left: &ArExpr, right: &ArExpr, span: Span) -> Result<(), SynthError> {
        let (id, literal) = match (left, right) {
            (ArExpr::Var(id), ArExpr::Real(v)) | (ArExpr::Real(v), ArExpr::Var(id)) => (id, *v),
            (ArExpr::Var(id), ArExpr::Int(v)) | (ArExpr::Int(v), ArExpr::Var(id)) => (id, *v as f64),
            _ => return Ok(()),
        };
        if !self.free_reals.contains(id) {
            return Ok(());
        }
        let steps = literal / self.precision;
        if (steps - steps.round()).abs() <= GRID_TOLERANCE {
            return Ok(());
        }
        Err(SynthError::unsupported(
            format!(
                "{literal} is not a multiple of `real_precision` ({}); a solved Double is never equal to it",
                self.precision
            ),
            span,
        ))
    }
}

const GRID_TOLERANCE: f64 = 1e-9;

fn expect_sort(found: Sort, expected: Sort, what: &str, span: Span) -> Result<(), SynthError> {
    if found == expected {
        return Ok(());
    }
    let name = |sort: Sort| match sort {
        Sort::Number => "a number",
        Sort::Bool => "a boolean",
    };
    Err(SynthError::unsupported(
        format!("{what} needs {}, found {}", name(expected), name(found)),
        span,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use stubby_csp::{new_context, Solver, VarKind, DEFAULT_TIMEOUT_MS};
    use stubby_schema::Api;

    fn api(contracts: &str) -> Api {
        Api::from_str(&format!(
            r#"
[types.Pet]
fields = [
    {{ name = "age", type = "Int" }},
    {{ name = "weight", type = "Double" }},
    {{ name = "vaccinated", type = "Bool" }},
]

[[methods]]
name = "m"
returns = "Pet"
params = [{{ name = "x", type = "Int" }}, {{ name = "w", type = "Double" }}]
contracts = """{contracts}"""
"#
        ))
        .unwrap()
    }

    fn build_for(api: &Api, args: Option<&Arguments>) -> Result<ConstraintModel, SynthError> {
        let method = api.method("m").unwrap();
        let analysis = analyze(method, &api.schema)?;
        build(&analysis, method, &api.schema, args, &FxHashMap::default(), &api.config)
    }

    fn args() -> Arguments {
        let mut args = Arguments::default();
        args.insert("x".into(), Value::Int(3));
        args.insert("w".into(), Value::Int(2));
        args
    }

    #[test]
    fn one_variable_per_field() {
        let api = api(
            "ensures result.age > x; ensures result.age < 10 && result.weight >= w; ensures result.vaccinated;",
        );
        let built = build_for(&api, Some(&args())).unwrap();
        assert_eq!(built.model.var_count(), 5);
        assert_eq!(built.model.constraint_count(), 3);

        let kinds: Vec<(String, VarKind)> = built
            .bindings
            .iter()
            .map(|(var, id)| (var.canonical_name.clone(), built.model.var_kind(*id)))
            .collect();
        assert_eq!(kinds[0], ("$result$age".to_string(), VarKind::Int));
        assert_eq!(kinds[1], ("$x".to_string(), VarKind::Int));
        assert_eq!(kinds[4], ("$result$vaccinated".to_string(), VarKind::Bool));
    }

    #[test]
    fn parameters_are_constants() {
        let api = api("ensures result.age == x * 2;");
        let built = build_for(&api, Some(&args())).unwrap();
        let (_, age) = &built.bindings[0];
        let ctx = new_context(DEFAULT_TIMEOUT_MS);
        let solution = Solver::new(&ctx, &built.model, 0)
            .unwrap()
            .find_solution()
            .unwrap()
            .unwrap();
        assert_eq!(solution.int(*age), 6);
    }

    #[test]
    fn without_arguments_parameters_are_free() {
        let api = api("ensures result.age == x * 2;");
        let built = build_for(&api, None).unwrap();
        let (_, x) = &built.bindings[1];
        assert_eq!(built.model.var_kind(*x), VarKind::Int);
        let ctx = new_context(DEFAULT_TIMEOUT_MS);
        let mut solver = Solver::new(&ctx, &built.model, 0).unwrap();
        assert!(solver.find_solution().unwrap().is_some());
    }

    #[test]
    fn sorts_are_checked() {
        for contracts in [
            "ensures result.age + 1;",
            "ensures result.vaccinated + 1 > 0;",
            "ensures result.age && result.vaccinated;",
            "ensures !result.age;",
            "ensures result.vaccinated == 1;",
        ] {
            let api = api(contracts);
            assert!(
                matches!(
                    build_for(&api, Some(&args())),
                    Err(SynthError::UnsupportedExpression { .. })
                ),
                "{contracts}"
            );
        }
    }

    #[test]
    fn missing_parameter_value() {
        let api = api("ensures result.age > x;");
        let err = build_for(&api, Some(&Arguments::default())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`x` is null, but the contracts need Int"
        );
    }

    #[test]
    fn pinned_fields_are_constants() {
        let api = api("ensures result.age > 100;");
        let method = api.method("m").unwrap();
        let analysis = analyze(method, &api.schema).unwrap();
        let mut pinned = FxHashMap::default();
        pinned.insert("$result$age".to_string(), Value::Int(1));
        let built = build(&analysis, method, &api.schema, None, &pinned, &api.config).unwrap();
        let ctx = new_context(DEFAULT_TIMEOUT_MS);
        let mut solver = Solver::new(&ctx, &built.model, 0).unwrap();
        assert_eq!(solver.find_solution().unwrap(), None);
    }

    #[test]
    fn off_grid_equality_is_rejected() {
        let off_grid = api("ensures result.weight == 0.333;");
        let err = build_for(&off_grid, Some(&args())).unwrap_err();
        assert!(
            err.to_string().contains("0.333 is not a multiple of `real_precision`"),
            "{err}"
        );

        for contracts in [
            "ensures result.weight == 0.25;",
            "ensures result.weight != 3;",
            "ensures result.weight > 0.333;",
            "ensures w == 0.333;",
        ] {
            assert!(build_for(&api(contracts), Some(&args())).is_ok(), "{contracts}");
        }
    }
}
