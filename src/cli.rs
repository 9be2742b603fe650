use std::env;
use std::path::PathBuf;

/// Registry used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "scenarios/demo.toml";

#[derive(Debug)]
pub struct CliOptions {
    pub config: PathBuf,
    /// Scenario ids to run; empty runs every registered scenario.
    pub scenarios: Vec<String>,
    pub baseline: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub write_lp: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut scenarios = Vec::new();
    let mut baseline = None;
    let mut out_dir = None;
    let mut write_lp = false;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--scenario" => {
                i += 1;
                let id = args.next_or_err(i, "missing value for --scenario (expected a scenario id)")?;
                if scenarios.iter().any(|s| s == id) {
                    return Err(format!("--scenario {id} provided more than once"));
                }
                scenarios.push(id.to_string());
            }
            "--baseline" => {
                i += 1;
                let id = args.next_or_err(i, "missing value for --baseline (expected a scenario id)")?;
                if baseline.replace(id.to_string()).is_some() {
                    return Err("--baseline provided more than once".to_string());
                }
            }
            "--out-dir" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --out-dir (expected a directory)")?;
                if out_dir.replace(PathBuf::from(path)).is_some() {
                    return Err("--out-dir provided more than once".to_string());
                }
            }
            "--write-lp" => write_lp = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if write_lp && out_dir.is_none() {
        return Err("--write-lp requires --out-dir".to_string());
    }

    Ok(CliOptions {
        config: config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG)),
        scenarios,
        baseline,
        out_dir,
        write_lp,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("fleet-transition: multi-year maritime fleet planning");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  fleet-transition [--config <path>] [--scenario <id>]... [--baseline <id>] \
         [--out-dir <dir>] [--write-lp]"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>     Scenario registry (default: {DEFAULT_CONFIG})");
    eprintln!("  --scenario <id>     Run only this scenario; repeatable (default: all)");
    eprintln!("  --baseline <id>     Compare against this scenario instead of the configured one");
    eprintln!("  --out-dir <dir>     Write results_<id>.csv and differences.json here");
    eprintln!("  --write-lp          Also write model_<id>.lp (needs --out-dir)");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.");
}
