//! Terminal failures of a scenario run.

use std::time::Duration;

use thiserror::Error;

use crate::model::ModelError;
use crate::oracle::{OracleError, SolveStatus};
use crate::params::{CoverageReport, LoadError, TableName};
use crate::results::ExtractError;

/// Why a scenario produced no [`crate::results::ResultRecord`].
///
/// One scenario failing never affects the others in a batch.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario `{scenario}`: input table `{table}` not found ({detail})")]
    ConfigurationNotFound {
        scenario: String,
        table: TableName,
        detail: String,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("parameter keys missing under strict coverage: {report}")]
    MissingParameterKey { report: CoverageReport },
    #[error("invalid `{table}` entry {key}: {message}")]
    InvalidParameter {
        table: TableName,
        key: String,
        message: String,
    },
    #[error("cannot build model: {0}")]
    Model(#[from] ModelError),
    #[error("solver finished without an optimal solution (status: {status})")]
    InfeasibleModel { status: SolveStatus },
    #[error("solve exceeded the {limit:?} time limit")]
    SolveTimedOut { limit: Duration },
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("cannot extract results: {0}")]
    Extract(#[from] ExtractError),
    #[error("scenario task failed: {0}")]
    TaskFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_keeps_sub_second_limits() {
        let err = ScenarioError::SolveTimedOut {
            limit: Duration::from_millis(20),
        };
        assert_eq!(err.to_string(), "solve exceeded the 20ms time limit");

        let err = ScenarioError::SolveTimedOut {
            limit: Duration::from_secs(600),
        };
        assert_eq!(err.to_string(), "solve exceeded the 600s time limit");
    }
}
