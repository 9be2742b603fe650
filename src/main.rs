//! fleet-transition entry point: registry loading, batch run, and output files.

mod cli;

use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_transition::config::ScenarioRegistry;
use fleet_transition::io::export::{export_csv, export_lp, export_report_json};
use fleet_transition::oracle::oracle_for;
use fleet_transition::runner::{BatchOutcome, run_batch};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

/// Writes per-scenario CSV (and LP, when asked) files into `dir`.
fn write_outputs(outcome: &BatchOutcome, dir: &Path, write_lp: bool) {
    for (id, run) in &outcome.runs {
        let Ok(run) = run else { continue };
        let csv_path = dir.join(format!("results_{id}.csv"));
        if let Err(e) = export_csv(&run.record, &csv_path) {
            exit_with(format_args!("failed to write {}: {e}", csv_path.display()));
        }
        info!(scenario = %id, path = %csv_path.display(), "results written");
        if write_lp {
            let lp_path = dir.join(format!("model_{id}.lp"));
            if let Err(e) = export_lp(&run.problem, &lp_path) {
                exit_with(format_args!("failed to write {}: {e}", lp_path.display()));
            }
        }
    }
}

fn main() {
    init_tracing();
    let opts = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(2);
    });

    let registry =
        ScenarioRegistry::from_toml_file(&opts.config).unwrap_or_else(|e| exit_with(e));
    let errors = registry.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let settings = registry.run_settings().unwrap_or_else(|e| exit_with(e));
    let specs = registry
        .scenario_specs(&opts.scenarios)
        .unwrap_or_else(|e| exit_with(e));
    let backend = registry.backend().unwrap_or_else(|e| exit_with(e));
    let oracle = oracle_for(backend, settings.time_limit).unwrap_or_else(|e| exit_with(e));
    let baseline = opts
        .baseline
        .clone()
        .unwrap_or_else(|| registry.baseline().to_string());

    if let Some(dir) = &opts.out_dir {
        if let Err(e) = fs::create_dir_all(dir) {
            exit_with(format_args!("cannot create {}: {e}", dir.display()));
        }
    }

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    let outcome = rt.block_on(run_batch(specs, Arc::new(settings), oracle));
    // Timed-out solves may still hold blocking threads.
    rt.shutdown_background();

    for (id, run) in &outcome.runs {
        match run {
            Ok(run) => println!("{}\n", run.record.summary()),
            Err(e) => eprintln!("scenario {id} failed: {e}"),
        }
    }

    if let Some(dir) = &opts.out_dir {
        write_outputs(&outcome, dir, opts.write_lp);
    }

    match outcome.compare(&registry.comparator(), &baseline) {
        Some(Ok(report)) => {
            println!("{report}");
            if let Some(dir) = &opts.out_dir {
                let path = dir.join("differences.json");
                if let Err(e) = export_report_json(&report, &path) {
                    exit_with(format_args!("failed to write {}: {e}", path.display()));
                }
            }
        }
        Some(Err(e)) => eprintln!("comparison skipped: {e}"),
        None => info!(baseline = %baseline, "comparison skipped: needs the baseline and one more solved scenario"),
    }

    if outcome.succeeded() == 0 {
        eprintln!("error: no scenario solved");
        process::exit(1);
    }
}
