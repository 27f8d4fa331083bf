//! es-dispatch entry point: CLI wiring and config-driven batch execution.

use std::path::{Path, PathBuf};
use std::process;

use es_dispatch::config::DecisionConfig;
use es_dispatch::dispatch::{DecisionOutput, build_decision_csvs, write_decision_csvs};
use tracing_subscriber::EnvFilter;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    data_dir: Option<String>,
    horizons: Vec<i64>,
    dry_run: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("es-dispatch: day-ahead energy-storage dispatch planner");
    eprintln!();
    eprintln!("Usage: es-dispatch [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from TOML file");
    eprintln!("  --data-dir <path>        Override the data directory");
    eprintln!("  --horizon <h>            Planning horizon in steps (repeatable)");
    eprintln!("  --dry-run                Plan and print without writing files");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server instead of a single batch");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following the flag at `i`, or exits with a message.
fn take_value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("error: {flag} requires a {what} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        data_dir: None,
        horizons: Vec::new(),
        dry_run: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                cli.config_path = Some(take_value(&args, i, "--config", "path").to_string());
            }
            "--data-dir" => {
                i += 1;
                cli.data_dir = Some(take_value(&args, i, "--data-dir", "path").to_string());
            }
            "--horizon" => {
                i += 1;
                let raw = take_value(&args, i, "--horizon", "integer");
                if let Ok(h) = raw.parse::<i64>() {
                    cli.horizons.push(h);
                } else {
                    eprintln!("error: --horizon value \"{raw}\" is not an integer");
                    process::exit(1);
                }
            }
            "--dry-run" => {
                cli.dry_run = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = take_value(&args, i, "--port", "u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(output: &DecisionOutput, dry_run: bool) {
    for o in &output.outputs {
        if dry_run {
            println!("{} (not written)", o.name);
        } else {
            println!("{}", o.name);
        }
        println!("{}\n", o.summary);
    }
    for w in &output.warnings {
        eprintln!("warning: {w}");
    }
}

fn main() {
    let cli = parse_args();
    init_logging();

    let mut config = if let Some(ref path) = cli.config_path {
        match DecisionConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        DecisionConfig::default()
    };

    if let Some(dir) = cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    if !cli.horizons.is_empty() {
        config.horizons = cli.horizons;
    }

    // Advisory: the batch itself skips bad horizons and fails on fatal inputs.
    for e in config.validate() {
        eprintln!("warning: {e}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(es_dispatch::api::AppState { config });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(es_dispatch::api::serve(state, addr)) {
            eprintln!("error: server failed: {e}");
            process::exit(1);
        }
        return;
    }

    let output = if cli.dry_run {
        build_decision_csvs(&config)
    } else {
        write_decision_csvs(&config)
    };
    report(&output, cli.dry_run);

    if !output.is_ok() {
        eprintln!("error: {}", output.message());
        process::exit(1);
    }
}
