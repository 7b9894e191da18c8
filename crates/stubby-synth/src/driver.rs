//! Pick the solution a call should return.

use log::{debug, info};
use stubby_csp::{new_context, Model, SearchError, Solution, Solver};

use crate::error::SynthError;
use crate::session::MethodSession;

/// The Nth solution for the Nth call to a method.
///
/// The solver is rebuilt from the session seed on every call, so the search
/// order is the same each time and skipping N-1 solutions lands on the one
/// after the previous call's. When the space runs out the search restarts
/// from the first solution.
pub fn solve(
    model: &Model,
    session: &MethodSession,
    method: &str,
    timeout_ms: u32,
) -> Result<Solution, SynthError> {
    let budget_error = |err: SearchError| match err {
        SearchError::Unknown { reason } => SynthError::SolveBudgetExceeded {
            method: method.to_string(),
            reason,
        },
    };

    let call = session.next_call();
    let ctx = new_context(timeout_ms);
    let mut solver = Solver::new(&ctx, model, session.seed())
        .map_err(|err| budget_error(SearchError::Unknown { reason: err.to_string() }))?;
    let mut solution = solver.find_solution().map_err(budget_error)?;
    for _ in 1..call {
        if solution.is_none() {
            break;
        }
        solution = solver.find_solution().map_err(budget_error)?;
    }

    match solution {
        Some(solution) => {
            debug!("{method}: call {call} took solution {call}");
            Ok(solution)
        }
        None => {
            info!("{method}: solutions exhausted at call {call}; starting over");
            solver.reset();
            session.restart();
            solver
                .find_solution()
                .map_err(budget_error)?
                .ok_or_else(|| SynthError::Infeasible {
                    method: method.to_string(),
                })
        }
    }
}
