//! Integration tests for the demo registry and batch runner.

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fleet_transition::config::ScenarioRegistry;
use fleet_transition::error::ScenarioError;
use fleet_transition::model::Problem;
use fleet_transition::oracle::{MicrolpOracle, Oracle, OracleError, SolvedModel};
use fleet_transition::params::TableName;
use fleet_transition::runner::{RunSettings, ScenarioSpec, run_batch, run_scenario};

fn demo_registry() -> ScenarioRegistry {
    ScenarioRegistry::from_toml_file(&common::scenario_path("demo.toml"))
        .expect("demo registry should parse")
}

fn demo_settings(registry: &ScenarioRegistry) -> RunSettings {
    registry.run_settings().expect("demo settings should resolve")
}

/// Sleeps before handing the solve to microlp.
struct SlowOracle(Duration);

impl Oracle for SlowOracle {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn solve(&self, problem: &Problem) -> Result<SolvedModel, OracleError> {
        thread::sleep(self.0);
        MicrolpOracle.solve(problem)
    }
}

/// Base scenario whose demand table lacks the last (year, ship type) row.
fn base_without_last_demand_row(registry: &ScenarioRegistry, tag: &str) -> ScenarioSpec {
    let mut spec = registry
        .scenario_specs(&["base".to_string()])
        .expect("base should resolve")
        .remove(0);
    let source = &spec.tables[&TableName::DemandShipping];
    let text = fs::read_to_string(source).expect("demo demand should be readable");
    let mut lines: Vec<&str> = text.lines().collect();
    lines.pop();

    let dir = std::env::temp_dir().join(format!("fleet-transition-batch-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    let path = dir.join(format!("demand_shipping_{tag}.csv"));
    fs::write(&path, lines.join("\n") + "\n").expect("gapped demand should be writable");
    spec.tables.insert(TableName::DemandShipping, path);
    spec
}

#[test]
fn demo_registry_is_valid() {
    let registry = demo_registry();
    assert_eq!(registry.validate(), Vec::new());
    assert_eq!(
        registry.scenario_ids(),
        vec!["base", "bau_fuel_h2", "ets_price_strict"]
    );
}

#[test]
fn base_scenario_solves_with_full_coverage() {
    let registry = demo_registry();
    let mut settings = demo_settings(&registry);
    settings.strict_coverage = true;
    let specs = registry
        .scenario_specs(&["base".to_string()])
        .expect("base should resolve");
    let run = run_scenario(&specs[0], &settings, &MicrolpOracle).expect("base should solve");
    assert_eq!(run.record.rows.len(), 6);
    assert_eq!(run.record.fuel_types.len(), 3);
    assert!((run.record.recomputed_objective() - run.record.objective).abs() < 1e-6 * run.record.objective);
}

#[test]
fn missing_table_names_scenario_and_table() {
    let registry = demo_registry();
    let settings = demo_settings(&registry);
    let mut spec = registry
        .scenario_specs(&["base".to_string()])
        .expect("base should resolve")
        .remove(0);
    spec.tables.remove(&TableName::Lifetime);
    let err = run_scenario(&spec, &settings, &MicrolpOracle).err();
    assert!(
        matches!(
            err,
            Some(ScenarioError::ConfigurationNotFound { ref scenario, table: TableName::Lifetime, .. })
                if scenario == "base"
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn batch_isolates_failing_scenarios() {
    let registry = demo_registry();
    let mut specs = registry.scenario_specs(&[]).expect("specs should resolve");
    let mut broken = ScenarioSpec {
        id: "broken".to_string(),
        tables: specs[0].tables.clone(),
    };
    broken.tables.insert(
        TableName::DemandShipping,
        PathBuf::from("does/not/exist.csv"),
    );
    specs.push(broken);

    let oracle: Arc<dyn Oracle> = Arc::new(MicrolpOracle);
    let outcome = run_batch(specs, Arc::new(demo_settings(&registry)), oracle).await;

    assert_eq!(outcome.runs.len(), 4);
    assert_eq!(outcome.succeeded(), 3);
    assert_eq!(outcome.failed(), 1);
    assert!(matches!(
        outcome.runs.get("broken"),
        Some(Err(ScenarioError::ConfigurationNotFound { table: TableName::DemandShipping, .. }))
    ));

    let report = outcome
        .compare(&registry.comparator(), registry.baseline())
        .expect("baseline and others solved")
        .expect("comparison should succeed");
    assert!(report.fuel_mix, "{report}");
    assert!(report.emissions, "{report}");
}

#[tokio::test]
async fn comparison_needs_the_baseline() {
    let registry = demo_registry();
    let specs = registry
        .scenario_specs(&["bau_fuel_h2".to_string(), "ets_price_strict".to_string()])
        .expect("specs should resolve");
    let outcome = run_batch(specs, Arc::new(demo_settings(&registry)), Arc::new(MicrolpOracle)).await;
    assert_eq!(outcome.succeeded(), 2);
    assert!(outcome.compare(&registry.comparator(), "base").is_none());
}

#[test]
fn strict_coverage_rejects_missing_keys() {
    let registry = demo_registry();
    let spec = base_without_last_demand_row(&registry, "strict");
    let mut settings = demo_settings(&registry);
    settings.strict_coverage = true;

    let err = run_scenario(&spec, &settings, &MicrolpOracle).err();
    match err {
        Some(ScenarioError::MissingParameterKey { report }) => {
            assert_eq!(report.missing.len(), 1, "{report}");
            assert_eq!(report.missing[0].table, TableName::DemandShipping);
            assert_eq!(report.missing[0].keys.len(), 1);
        }
        other => panic!("expected MissingParameterKey, got {other:?}"),
    }
}

#[test]
fn lenient_coverage_reads_missing_keys_as_zero() {
    let registry = demo_registry();
    let spec = base_without_last_demand_row(&registry, "lenient");
    let mut settings = demo_settings(&registry);
    settings.strict_coverage = false;

    let run = run_scenario(&spec, &settings, &MicrolpOracle).expect("gapped base should solve");
    assert_eq!(run.record.rows.len(), 6);
    assert!(!run.params.coverage(&settings.variant).is_complete());
}

#[tokio::test]
async fn slow_solve_times_out() {
    let registry = demo_registry();
    let specs = registry
        .scenario_specs(&["base".to_string()])
        .expect("base should resolve");
    let mut settings = demo_settings(&registry);
    settings.time_limit = Some(Duration::from_millis(20));

    let oracle: Arc<dyn Oracle> = Arc::new(SlowOracle(Duration::from_millis(500)));
    let outcome = run_batch(specs, Arc::new(settings), oracle).await;

    assert_eq!(outcome.succeeded(), 0);
    match outcome.runs.get("base") {
        Some(Err(err @ ScenarioError::SolveTimedOut { limit })) => {
            assert_eq!(*limit, Duration::from_millis(20));
            assert_eq!(err.to_string(), "solve exceeded the 20ms time limit");
        }
        other => panic!("expected SolveTimedOut, got {other:?}"),
    }
}

#[tokio::test]
async fn solve_within_time_limit_succeeds() {
    let registry = demo_registry();
    let specs = registry
        .scenario_specs(&["base".to_string()])
        .expect("base should resolve");
    let mut settings = demo_settings(&registry);
    settings.time_limit = Some(Duration::from_secs(60));

    let oracle: Arc<dyn Oracle> = Arc::new(SlowOracle(Duration::from_millis(10)));
    let outcome = run_batch(specs, Arc::new(settings), oracle).await;
    assert_eq!(outcome.succeeded(), 1);
}
