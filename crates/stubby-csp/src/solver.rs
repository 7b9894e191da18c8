//! Enumerating solutions of a [`Model`] with z3.
//!
//! The model's domains and constraints are asserted once, under a single
//! scope. Each solution found adds a blocking clause inside that scope, so
//! the next check has to move at least one decision variable.
//! [`Solver::reset`] pops the scope and opens a fresh one, which forgets
//! every blocking clause.

use log::{debug, trace};
use z3::ast::{Ast, Bool, Int};
use z3::{Config, Context, Params, SatResult};

use crate::encode::{decimal, Encoder, Term};
use crate::error::{ModelError, SearchError};
use crate::model::{Domain, Model, VarId};

/// Default wall-clock limit for one satisfiability check.
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

/// A z3 context whose checks give up after `timeout_ms` milliseconds.
pub fn new_context(timeout_ms: u32) -> Context {
    let mut cfg = Config::new();
    cfg.set_model_generation(true);
    cfg.set_timeout_msec(u64::from(timeout_ms));
    Context::new(&cfg)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Assigned {
    Int(i64),
    Real(f64),
    Bool(bool),
}

/// One assignment of every model variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Vec<Assigned>,
}

impl Solution {
    pub fn int(&self, var: VarId) -> i64 {
        match self.values[var.index()] {
            Assigned::Int(v) => v,
            Assigned::Real(v) => v.round() as i64,
            Assigned::Bool(b) => i64::from(b),
        }
    }

    pub fn value(&self, var: VarId) -> f64 {
        match self.values[var.index()] {
            Assigned::Int(v) => v as f64,
            Assigned::Real(v) => v,
            Assigned::Bool(b) => f64::from(u8::from(b)),
        }
    }

    pub fn bool(&self, var: VarId) -> bool {
        match self.values[var.index()] {
            Assigned::Bool(b) => b,
            _ => self.value(var) != 0.0,
        }
    }
}

/// The z3 side of one declared variable.
enum Handle<'ctx> {
    Int(Int<'ctx>),
    Steps { steps: Int<'ctx>, precision: f64 },
    Bool(Bool<'ctx>),
    Fixed(Assigned),
}

pub struct Solver<'ctx> {
    ctx: &'ctx Context,
    inner: z3::Solver<'ctx>,
    handles: Vec<Handle<'ctx>>,
    found: usize,
}

impl<'ctx> Solver<'ctx> {
    /// Assert `model` on a fresh z3 solver. `seed` fixes z3's random choices
    /// so the same model and seed enumerate the same solutions.
    pub fn new(ctx: &'ctx Context, model: &Model, seed: u64) -> Result<Self, ModelError> {
        let inner = z3::Solver::new(ctx);
        let mut params = Params::new(ctx);
        params.set_u32("random_seed", (seed % u64::from(u32::MAX)) as u32);
        inner.set_params(&params);

        let mut handles = Vec::with_capacity(model.vars.len());
        let mut terms = Vec::with_capacity(model.vars.len());
        for decl in &model.vars {
            let (handle, term) = match decl.domain {
                Domain::Int { lo, hi } => {
                    let var = Int::new_const(ctx, decl.name.as_str());
                    inner.assert(&var.ge(&Int::from_i64(ctx, lo)));
                    inner.assert(&var.le(&Int::from_i64(ctx, hi)));
                    (Handle::Int(var.clone()), Term::Int(var))
                }
                Domain::Grid { lo, hi, precision } => {
                    let steps = Int::new_const(ctx, format!("{}#steps", decl.name).as_str());
                    inner.assert(&steps.ge(&Int::from_i64(ctx, lo)));
                    inner.assert(&steps.le(&Int::from_i64(ctx, hi)));
                    let real = z3::ast::Real::mul(
                        ctx,
                        &[&steps.to_real(), &decimal(ctx, precision)?],
                    );
                    (Handle::Steps { steps, precision }, Term::Real(real))
                }
                Domain::Bool => {
                    let var = Bool::new_const(ctx, decl.name.as_str());
                    (Handle::Bool(var.clone()), Term::Bool(var))
                }
                Domain::IntConst(v) => (
                    Handle::Fixed(Assigned::Int(v)),
                    Term::Int(Int::from_i64(ctx, v)),
                ),
                Domain::RealConst(v) => (
                    Handle::Fixed(Assigned::Real(v)),
                    Term::Real(decimal(ctx, v)?),
                ),
                Domain::BoolConst(v) => (
                    Handle::Fixed(Assigned::Bool(v)),
                    Term::Bool(Bool::from_bool(ctx, v)),
                ),
            };
            handles.push(handle);
            terms.push(term);
        }

        let mut encoder = Encoder::new(ctx, &terms);
        for constraint in &model.constraints {
            inner.assert(&encoder.constraint(constraint)?);
        }
        inner.push();
        debug!(
            "asserted {} variables and {} constraints",
            model.vars.len(),
            model.constraints.len()
        );

        Ok(Self {
            ctx,
            inner,
            handles,
            found: 0,
        })
    }

    /// The next solution not returned since the last [`reset`](Self::reset),
    /// or `None` once there are no more.
    pub fn find_solution(&mut self) -> Result<Option<Solution>, SearchError> {
        match self.inner.check() {
            SatResult::Unsat => {
                debug!("no further solutions after {}", self.found);
                Ok(None)
            }
            SatResult::Unknown => Err(SearchError::Unknown {
                reason: self
                    .inner
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string()),
            }),
            SatResult::Sat => {
                let solution = self.read_and_block()?;
                self.found += 1;
                trace!("solution {}: {:?}", self.found, solution.values);
                Ok(Some(solution))
            }
        }
    }

    /// Forget every solution returned so far.
    pub fn reset(&mut self) {
        self.inner.pop(1);
        self.inner.push();
        self.found = 0;
    }

    fn read_and_block(&mut self) -> Result<Solution, SearchError> {
        let no_model = || SearchError::Unknown {
            reason: "z3 reported sat without a model".to_string(),
        };
        let assignment = self.inner.get_model().ok_or_else(no_model)?;
        let mut values = Vec::with_capacity(self.handles.len());
        let mut moved = Vec::new();
        for handle in &self.handles {
            let value = match handle {
                Handle::Int(var) => {
                    let v = assignment
                        .eval(var, true)
                        .and_then(|v| v.as_i64())
                        .ok_or_else(no_model)?;
                    moved.push(var._eq(&Int::from_i64(self.ctx, v)).not());
                    Assigned::Int(v)
                }
                Handle::Steps { steps, precision } => {
                    let k = assignment
                        .eval(steps, true)
                        .and_then(|v| v.as_i64())
                        .ok_or_else(no_model)?;
                    moved.push(steps._eq(&Int::from_i64(self.ctx, k)).not());
                    Assigned::Real(k as f64 * precision)
                }
                Handle::Bool(var) => {
                    let b = assignment
                        .eval(var, true)
                        .and_then(|v| v.as_bool())
                        .ok_or_else(no_model)?;
                    moved.push(var._eq(&Bool::from_bool(self.ctx, b)).not());
                    Assigned::Bool(b)
                }
                Handle::Fixed(value) => *value,
            };
            values.push(value);
        }
        // With nothing to move, the one solution is also the last.
        let refs: Vec<&Bool<'ctx>> = moved.iter().collect();
        self.inner.assert(&Bool::or(self.ctx, &refs));
        Ok(Solution { values })
    }
}
