//! Optimisation oracles: anything that can solve a [`Problem`].
//!
//! The model never depends on a particular solver. An oracle reports one of
//! four terminal statuses and only hands out variable values for an optimal
//! solve.

#[cfg(feature = "highs")]
pub mod highs;
pub mod microlp;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::model::{Problem, VarHandle};

#[cfg(feature = "highs")]
pub use self::highs::HighsOracle;
pub use self::microlp::MicrolpOracle;

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Stopped before proving optimality (time limit, numerical trouble).
    NotSolved,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::NotSolved => "not solved",
        };
        f.write_str(s)
    }
}

/// Objective value and one value per problem variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    objective: f64,
    values: Vec<f64>,
}

impl Solution {
    pub fn new(objective: f64, values: Vec<f64>) -> Self {
        Self { objective, values }
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Values indexed by [`VarHandle::index`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, var: VarHandle) -> Option<f64> {
        self.values.get(var.index()).copied()
    }
}

/// Outcome of [`Oracle::solve`].
///
/// A solution is present if and only if the status is
/// [`SolveStatus::Optimal`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedModel {
    status: SolveStatus,
    solution: Option<Solution>,
}

impl SolvedModel {
    pub fn optimal(solution: Solution) -> Self {
        Self {
            status: SolveStatus::Optimal,
            solution: Some(solution),
        }
    }

    /// A non-optimal outcome; carries no values.
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            solution: None,
        }
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// The solution, or the status when there is none.
    pub fn into_optimal(self) -> Result<Solution, SolveStatus> {
        match (self.status, self.solution) {
            (SolveStatus::Optimal, Some(solution)) => Ok(solution),
            (status, _) => Err(status),
        }
    }
}

/// The backend itself failed, as opposed to proving infeasibility.
#[derive(Debug, Error)]
#[error("{backend} solver failed: {message}")]
pub struct OracleError {
    pub backend: &'static str,
    pub message: String,
}

/// Black-box MILP solver.
pub trait Oracle: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Solves `problem` to optimality or reports why it could not.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] only for backend failures; infeasible and
    /// unbounded problems are reported through [`SolvedModel::status`].
    fn solve(&self, problem: &Problem) -> Result<SolvedModel, OracleError>;
}

/// Selectable solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Microlp,
    Highs,
}

impl Backend {
    pub fn is_available(self) -> bool {
        match self {
            Backend::Microlp => true,
            Backend::Highs => cfg!(feature = "highs"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "microlp" => Ok(Backend::Microlp),
            "highs" => Ok(Backend::Highs),
            other => Err(format!("unknown solver backend `{other}` (expected microlp or highs)")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Microlp => f.write_str("microlp"),
            Backend::Highs => f.write_str("highs"),
        }
    }
}

/// Instantiates the oracle for `backend`.
///
/// `time_limit` is passed to backends that honour it natively; the batch
/// runner enforces it for all backends.
///
/// # Errors
///
/// Returns an error message if the backend was not compiled in.
#[cfg_attr(not(feature = "highs"), expect(unused_variables))]
pub fn oracle_for(
    backend: Backend,
    time_limit: Option<Duration>,
) -> Result<Arc<dyn Oracle>, String> {
    match backend {
        // microlp has no native limit.
        Backend::Microlp => Ok(Arc::new(MicrolpOracle)),
        #[cfg(feature = "highs")]
        Backend::Highs => Ok(Arc::new(HighsOracle::new(time_limit))),
        #[cfg(not(feature = "highs"))]
        Backend::Highs => Err("solver backend `highs` requires the `highs` cargo feature".to_string()),
    }
}
