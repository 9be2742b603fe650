//! End-to-end tests of the `fleet-transition` binary on the demo registry.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fleet-transition"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(args)
        .output()
        .expect("fleet-transition process should run")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fleet-transition-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn demo_run_prints_summaries_and_report() {
    let output = run_cli(&["--config", "scenarios/demo.toml"]);
    assert!(
        output.status.success(),
        "demo run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    for id in ["base", "bau_fuel_h2", "ets_price_strict"] {
        assert!(stdout.contains(&format!("--- Scenario {id} ---")), "{stdout}");
    }
    assert!(stdout.contains("--- Scenario differences vs base ---"));
}

#[test]
fn out_dir_receives_csv_json_and_lp() {
    let dir = scratch_dir("out");
    let dir_arg = dir.to_string_lossy().into_owned();
    let output = run_cli(&[
        "--scenario",
        "base",
        "--scenario",
        "bau_fuel_h2",
        "--out-dir",
        &dir_arg,
        "--write-lp",
    ]);
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let csv = fs::read_to_string(dir.join("results_base.csv")).expect("base results written");
    let mut lines = csv.lines();
    let header = lines.next().unwrap_or("");
    assert!(header.starts_with("Year,CO2_Emissions,Total_Cost,"), "{header}");
    assert!(header.ends_with("Fuel_Demand_HFO,Fuel_Demand_MeOH,Fuel_Demand_H2"), "{header}");
    assert_eq!(lines.count(), 6);

    assert!(dir.join("results_bau_fuel_h2.csv").is_file());
    assert!(!dir.join("results_ets_price_strict.csv").exists());

    let json = fs::read_to_string(dir.join("differences.json")).expect("report written");
    let report: serde_json::Value = serde_json::from_str(&json).expect("report is JSON");
    assert_eq!(report["baseline"], "base");
    assert_eq!(report["fuel_mix"], true);

    let lp = fs::read_to_string(dir.join("model_base.lp")).expect("model written");
    assert!(lp.contains("Minimize\n obj:"), "{lp}");
    assert!(lp.contains("\nSubject To\n"), "{lp}");
    assert!(lp.contains("\nGeneral\n"), "{lp}");
    assert!(lp.trim_end().ends_with("End"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_registry_exits_with_errors() {
    let dir = scratch_dir("bad");
    fs::create_dir_all(&dir).expect("scratch dir");
    let path = dir.join("bad.toml");
    fs::write(&path, "[model]\nfirst_year = 2030\nlast_year = 2020\n").expect("write config");

    let output = run_cli(&["--config", &path.to_string_lossy()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("model.first_year"), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_flag_is_rejected() {
    let output = run_cli(&["--solver", "cplex"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown argument: --solver"));
}
