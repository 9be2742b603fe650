//! Scenario pipeline: load, check, build, solve, extract.
//!
//! [`run_scenario`] runs one scenario synchronously. [`run_batch`] runs many
//! concurrently on the tokio runtime, one task per scenario, and gathers the
//! outcomes once every task has finished.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinError, JoinSet};
use tokio::time;
use tracing::{error, info, warn};

use crate::compare::{CompareError, ScenarioComparator, ScenarioDifferenceReport};
use crate::error::ScenarioError;
use crate::model::{FleetTransitionModel, ModelVariant, Problem};
use crate::oracle::{Oracle, SolveStatus, SolvedModel};
use crate::params::{ParameterSet, TableName, load_parameter_set};
use crate::results::{ResultExtractor, ResultRecord};
use crate::types::{Horizon, ShipType};

/// One scenario to run: its id and resolved input files.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSpec {
    pub id: String,
    pub tables: BTreeMap<TableName, PathBuf>,
}

/// Settings shared by every scenario of a batch.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub horizon: Horizon,
    pub ship_types: Vec<ShipType>,
    pub variant: ModelVariant,
    pub strict_coverage: bool,
    /// Upper bound on one solve; `None` waits indefinitely.
    pub time_limit: Option<Duration>,
}

/// Everything a successful scenario produced.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub id: String,
    pub params: ParameterSet,
    pub problem: Arc<Problem>,
    pub record: ResultRecord,
}

/// Loads parameters, applies the coverage policy, validates, and builds the
/// model.
///
/// # Errors
///
/// Returns the first [`ScenarioError`] met along the way.
pub fn prepare(
    spec: &ScenarioSpec,
    settings: &RunSettings,
) -> Result<(ParameterSet, Problem), ScenarioError> {
    let params = load_parameter_set(
        &spec.id,
        &spec.tables,
        settings.horizon,
        &settings.ship_types,
        &settings.variant,
    )?;

    let coverage = params.coverage(&settings.variant);
    if !coverage.is_complete() {
        if settings.strict_coverage {
            return Err(ScenarioError::MissingParameterKey { report: coverage });
        }
        coverage.log_warnings(&spec.id);
    }
    params.validate()?;

    let problem = FleetTransitionModel::new(&params, settings.variant.clone()).build()?;
    Ok((params, problem))
}

/// Turns a solve outcome into a result record.
///
/// # Errors
///
/// Returns [`ScenarioError::InfeasibleModel`] for any non-optimal status;
/// extraction is not attempted in that case.
pub fn finish(
    id: &str,
    params: ParameterSet,
    problem: Arc<Problem>,
    solved: &SolvedModel,
    variant: &ModelVariant,
) -> Result<ScenarioRun, ScenarioError> {
    if solved.status() != SolveStatus::Optimal {
        return Err(ScenarioError::InfeasibleModel {
            status: solved.status(),
        });
    }
    let record = ResultExtractor::new(&params, variant).extract(id, &problem, solved)?;
    info!(scenario = id, objective = record.objective, "scenario solved");
    Ok(ScenarioRun {
        id: id.to_string(),
        params,
        problem,
        record,
    })
}

/// Runs one scenario start to finish on the current thread.
///
/// The time limit is not enforced here; use [`run_batch`] for that.
///
/// # Errors
///
/// Returns the scenario's terminal [`ScenarioError`].
pub fn run_scenario(
    spec: &ScenarioSpec,
    settings: &RunSettings,
    oracle: &dyn Oracle,
) -> Result<ScenarioRun, ScenarioError> {
    let (params, problem) = prepare(spec, settings)?;
    info!(scenario = %spec.id, oracle = oracle.name(), "solving");
    let solved = oracle.solve(&problem)?;
    finish(&spec.id, params, Arc::new(problem), &solved, &settings.variant)
}

fn task_failed(err: JoinError) -> ScenarioError {
    ScenarioError::TaskFailed(err.to_string())
}

async fn run_scenario_task(
    spec: ScenarioSpec,
    settings: Arc<RunSettings>,
    oracle: Arc<dyn Oracle>,
) -> Result<ScenarioRun, ScenarioError> {
    let id = spec.id.clone();
    let prep_settings = Arc::clone(&settings);
    let (params, problem) = task::spawn_blocking(move || prepare(&spec, &prep_settings))
        .await
        .map_err(task_failed)??;

    let problem = Arc::new(problem);
    let shared = Arc::clone(&problem);
    info!(scenario = %id, oracle = oracle.name(), "solving");
    let solving = task::spawn_blocking(move || oracle.solve(&shared));
    let joined = match settings.time_limit {
        // A timed-out solve keeps its blocking thread until the backend returns.
        Some(limit) => time::timeout(limit, solving)
            .await
            .map_err(|_| ScenarioError::SolveTimedOut { limit })?,
        None => solving.await,
    };
    let solved = joined.map_err(task_failed)??;

    finish(&id, params, problem, &solved, &settings.variant)
}

/// Outcome of every scenario in a batch, keyed by scenario id.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub runs: BTreeMap<String, Result<ScenarioRun, ScenarioError>>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.runs.values().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.succeeded()
    }

    /// Result records of the successful scenarios.
    pub fn records(&self) -> BTreeMap<String, ResultRecord> {
        self.runs
            .iter()
            .filter_map(|(id, run)| run.as_ref().ok().map(|r| (id.clone(), r.record.clone())))
            .collect()
    }

    /// Compares successful scenarios against `baseline`.
    ///
    /// Returns `None` when the baseline failed or no other scenario
    /// succeeded.
    pub fn compare(
        &self,
        comparator: &ScenarioComparator,
        baseline: &str,
    ) -> Option<Result<ScenarioDifferenceReport, CompareError>> {
        let records = self.records();
        if !records.contains_key(baseline) || records.len() < 2 {
            return None;
        }
        Some(comparator.compare(&records, baseline))
    }
}

/// Runs every scenario concurrently and waits for all of them.
///
/// Each scenario gets its own task; loading and model building run on the
/// blocking pool, and the solve runs there under `settings.time_limit`. A
/// failing scenario is recorded in the outcome and never affects the others.
pub async fn run_batch(
    specs: Vec<ScenarioSpec>,
    settings: Arc<RunSettings>,
    oracle: Arc<dyn Oracle>,
) -> BatchOutcome {
    let mut tasks = JoinSet::new();
    let mut ids = HashMap::new();
    for spec in specs {
        let id = spec.id.clone();
        let settings = Arc::clone(&settings);
        let oracle = Arc::clone(&oracle);
        let handle = tasks.spawn(run_scenario_task(spec, settings, oracle));
        ids.insert(handle.id(), id);
    }
    collect(tasks, ids).await
}

/// Drains `tasks`, naming each outcome through `ids`.
///
/// A task that panicked or was aborted is recorded as
/// [`ScenarioError::TaskFailed`].
async fn collect(
    mut tasks: JoinSet<Result<ScenarioRun, ScenarioError>>,
    mut ids: HashMap<task::Id, String>,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (task_id, result) = match joined {
            Ok((task_id, result)) => (task_id, result),
            Err(err) => {
                error!(%err, "scenario task aborted");
                (err.id(), Err(task_failed(err)))
            }
        };
        let Some(id) = ids.remove(&task_id) else {
            error!(task = %task_id, "finished task has no scenario");
            continue;
        };
        if let Err(err) = &result {
            warn!(scenario = %id, %err, "scenario failed");
        }
        outcome.runs.insert(id, result);
    }
    info!(
        succeeded = outcome.succeeded(),
        failed = outcome.failed(),
        "batch finished"
    );
    outcome
}
