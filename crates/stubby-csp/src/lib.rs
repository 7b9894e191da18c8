//! Contract models and their solutions.
//!
//! Variables are integers, booleans or reals on a fixed grid. Constraints
//! are boolean [`ArExpr`] trees posted on a [`Model`]. A [`Solver`] hands
//! the model to z3 and enumerates distinct full assignments, one blocking
//! clause per solution returned.

mod encode;
pub mod error;
pub mod model;
pub mod solver;

pub use error::{ModelError, SearchError};
pub use model::{ArExpr, ArOp, ArUnary, Model, VarId, VarKind};
pub use solver::{new_context, Solution, Solver, DEFAULT_TIMEOUT_MS};
