//! Stubby synthesis: produce a result for an API method that satisfies its
//! contracts.
//!
//! One call runs the whole pipeline:
//!
//! 1. `requires` clauses are evaluated against the arguments ([`eval`]).
//! 2. `ensures` clauses are sorted into solved clauses, assignments and
//!    pattern clauses ([`analyze`]).
//! 3. A random value of the return type is generated ([`random`]).
//! 4. Assignments are evaluated. Solved fields inside an assigned value
//!    become constants holding the assigned sub-value.
//! 5. Solved clauses become a constraint model ([`model`]); the session
//!    picks which solution this call gets ([`driver`]) and the solved
//!    fields are written into the random value ([`restore`]).
//! 6. Assignments and pattern clauses are applied last.

pub mod analyze;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod eval;
pub mod model;
pub mod path;
pub mod random;
pub mod restore;
mod rex;
pub mod session;
pub mod value;

use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde_json::Value as Json;
use stubby_schema::{Api, MethodDescriptor, Schema, SchemaError, SynthConfig};

pub use diagnostics::{render_diagnostic, DiagnosticOptions};
pub use error::SynthError;
pub use session::{MethodSession, SessionRegistry};
pub use value::Value;

use analyze::analyze;
use eval::Env;
use random::RandomSynth;

/// Argument values by parameter name.
pub type Arguments = FxHashMap<String, Value>;

/// Synthesize one result for `method` called with `args`.
///
/// `session` carries the method's enumeration state; passing the same
/// session to consecutive calls walks through distinct solutions.
pub fn synthesize(
    method: &MethodDescriptor,
    schema: &Schema,
    args: &Arguments,
    session: &MethodSession,
    config: &SynthConfig,
) -> Result<Value, SynthError> {
    let request = session.record_request();
    let env = Env {
        method,
        schema,
        args,
    };
    env.check_requires()?;

    let analysis = analyze(method, schema)?;
    debug!(
        "{}: {} solved, {} assigned, {} pattern clauses",
        method.name,
        analysis.primitive.len(),
        analysis.assignments.len(),
        analysis.patterns.len()
    );

    let mut random = RandomSynth::new(schema, config, session.seed().wrapping_add(request));
    let mut answer = random.value(&method.returns);

    let mut assigned = Vec::with_capacity(analysis.assignments.len());
    for assignment in &analysis.assignments {
        let value = env.eval(assignment.value)?;
        let target = &assignment.target;
        let found = value.kind_name();
        let value = value.coerce_to(&target.ty, schema).ok_or_else(|| {
            SchemaError::AssignmentMismatch {
                field: target.path.to_string(),
                expected: target.ty.to_string(),
                found,
                span: Some(assignment.value.span),
            }
        })?;
        assigned.push((target, value));
    }

    if !analysis.primitive.is_empty() {
        let pinned = pinned_fields(&analysis, &assigned);
        let built = model::build(&analysis, method, schema, Some(args), &pinned, config)?;
        let solution = driver::solve(&built.model, session, &method.name, config.solve_timeout_ms)?;
        restore::restore(
            &mut answer,
            &method.returns,
            &built.bindings,
            &solution,
            config.real_decimals,
            schema,
            &mut random,
        )?;
    }

    for (target, value) in assigned {
        debug!("assign {} = {value}", target.path);
        restore::assign(
            &mut answer,
            &method.returns,
            &target.path,
            value,
            schema,
            &mut random,
        )?;
    }

    for clause in &analysis.patterns {
        let pattern = match env.eval(clause.pattern)? {
            Value::Str(pattern) => pattern,
            other => {
                return Err(SynthError::evaluation(
                    format!("a `rex` pattern must be a String, found {}", other.kind_name()),
                    clause.pattern.span,
                ))
            }
        };
        let generated = random.matching(&pattern).map_err(|err| {
            SynthError::evaluation(format!("invalid pattern: {err}"), clause.pattern.span)
        })?;
        debug!("generate {} from {pattern:?}", clause.target.path);
        restore::assign(
            &mut answer,
            &method.returns,
            &clause.target.path,
            Value::Str(generated),
            schema,
            &mut random,
        )?;
    }

    Ok(answer)
}

/// Solver fields that lie inside an assigned value, with the value the
/// assignment gives them. Missing sub-values read as null.
fn pinned_fields(
    analysis: &analyze::Analysis<'_>,
    assigned: &[(&path::ModelVariable, Value)],
) -> FxHashMap<String, Value> {
    let mut pinned = FxHashMap::default();
    for var in analysis.solver_variables() {
        if !var.path.is_result() {
            continue;
        }
        for (target, value) in assigned {
            let Some(rest) = var.path.segments.strip_prefix(target.path.segments.as_slice()) else {
                continue;
            };
            let mut inner = value;
            for segment in rest {
                inner = inner.field(segment).unwrap_or(&Value::Null);
            }
            debug!("`{}` is fixed by the assignment to `{}`", var.path, target.path);
            pinned.insert(var.canonical_name.clone(), inner.clone());
        }
    }
    pinned
}

/// What [`check_method`] found in a method's contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSummary {
    pub requires: usize,
    pub solved: usize,
    pub assignments: usize,
    pub patterns: usize,
    /// Solver variables, by canonical name.
    pub variables: Vec<String>,
}

/// Validate a method's contracts without synthesizing: paths resolve,
/// every clause lands in a bucket, and the solved clauses translate.
pub fn check_method(
    method: &MethodDescriptor,
    schema: &Schema,
    config: &SynthConfig,
) -> Result<ContractSummary, SynthError> {
    let analysis = analyze(method, schema)?;
    let built = model::build(&analysis, method, schema, None, &FxHashMap::default(), config)?;
    Ok(ContractSummary {
        requires: analysis.requires.len(),
        solved: analysis.primitive.len(),
        assignments: analysis.assignments.len(),
        patterns: analysis.patterns.len(),
        variables: built
            .bindings
            .iter()
            .map(|(var, _)| var.canonical_name.clone())
            .collect(),
    })
}

/// An API ready to serve: methods, schema, config and per-method sessions.
///
/// Safe to share between threads; every call goes through its method's
/// session.
#[derive(Debug)]
pub struct StubService {
    api: Api,
    sessions: SessionRegistry,
}

impl StubService {
    /// `seed` overrides the API file's `config.seed`.
    pub fn new(api: Api, seed: Option<u64>) -> Self {
        let sessions = SessionRegistry::new(seed.or(api.config.seed));
        Self { api, sessions }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn method(&self, name: &str) -> Result<&MethodDescriptor, SynthError> {
        self.api.method(name).ok_or_else(|| SynthError::UnknownMethod {
            name: name.to_string(),
        })
    }

    /// Serve one call with JSON arguments. Missing arguments are null.
    pub fn call(&self, name: &str, args: &serde_json::Map<String, Json>) -> Result<Value, SynthError> {
        let method = self.method(name)?;
        for key in args.keys() {
            if method.param(key).is_none() {
                warn!("`{name}` has no parameter `{key}`; ignoring it");
            }
        }
        let mut values = Arguments::default();
        for param in &method.params {
            let json = args.get(&param.name).unwrap_or(&Json::Null);
            let value = value::from_json(&param.name, json, &param.ty, &self.api.schema)?;
            values.insert(param.name.clone(), value);
        }
        let session = self.sessions.session(name);
        synthesize(method, &self.api.schema, &values, &session, &self.api.config)
    }
}
