//! The stubby CLI.
//!
//! - `stubby synth <api.toml> <method>` - Synthesize responses for a method
//! - `stubby check <api.toml>` - Validate the contracts of every method
//!
//! Options:
//! - `--args` - Method arguments as a JSON object
//! - `--calls` - Number of consecutive responses to synthesize
//! - `--seed` - Fixed seed, overriding the API file's `config.seed`
//! - `--json` - Output results and diagnostics as JSON (one object per line)
//! - `--no-color` - Disable colorized output
//! - `--log-level` - off, error, warn, info, debug or trace

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use colored::{Color, ColoredString, Colorize};
use log::{info, Level, LevelFilter};
use stubby_schema::{Api, LoadError};
use stubby_synth::{check_method, render_diagnostic, DiagnosticOptions, StubService, SynthError};

#[derive(Parser)]
#[command(name = "stubby", version, about = "Contract-driven API stubs")]
struct Cli {
    /// Log level for messages on stderr
    #[arg(long = "log-level", default_value = "warn", global = true)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize responses for one method
    Synth {
        /// Path to the API file
        api: PathBuf,

        /// Method to call
        method: String,

        /// Arguments as a JSON object, e.g. '{"x": 3}'
        #[arg(long)]
        args: Option<String>,

        /// Number of consecutive calls
        #[arg(long, default_value = "1")]
        calls: u32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output results and diagnostics as JSON (one object per line)
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
    /// Check that every method's contracts can be synthesized
    Check {
        /// Path to the API file
        api: PathBuf,

        /// Output diagnostics as JSON (one object per line)
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let ok = match cli.command {
        Commands::Synth {
            api,
            method,
            args,
            calls,
            seed,
            json,
            no_color,
        } => {
            let diag_opts = diagnostic_options(json, no_color);
            synth(&api, &method, args.as_deref(), calls, seed, &diag_opts)
        }
        Commands::Check {
            api,
            json,
            no_color,
        } => {
            let diag_opts = diagnostic_options(json, no_color);
            check(&api, &diag_opts)
        }
    };
    if !ok {
        process::exit(1);
    }
}

fn diagnostic_options(json: bool, no_color: bool) -> DiagnosticOptions {
    let diag_opts = DiagnosticOptions {
        color: !no_color && !json,
        json,
    };
    if !diag_opts.color {
        colored::control::set_override(false);
    }
    diag_opts
}

fn init_logging(level: LevelFilter) {
    let dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = record.level();
            let color = match level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                Level::Info => Color::Blue,
                Level::Debug => Color::Magenta,
                Level::Trace => Color::Green,
            };
            out.finish(format_args!(
                "{} {}",
                ColoredString::from((level.to_string().to_lowercase() + ":").as_str())
                    .color(color),
                message
            ))
        })
        .level(level)
        .chain(io::stderr());
    if let Err(err) = dispatch.apply() {
        eprintln!("error: cannot install logger: {err}");
    }
}

/// Synthesize `calls` responses through one session. Returns false on the
/// first error.
fn synth(
    path: &Path,
    method: &str,
    args: Option<&str>,
    calls: u32,
    seed: Option<u64>,
    diag_opts: &DiagnosticOptions,
) -> bool {
    let Some(api) = load(path, diag_opts) else {
        return false;
    };

    let args = match args.map(|text| serde_json::from_str::<serde_json::Value>(text)) {
        None => serde_json::Map::new(),
        Some(Ok(serde_json::Value::Object(map))) => map,
        Some(Ok(other)) => {
            report_plain(&format!("--args must be a JSON object, found {other}"), path, diag_opts);
            return false;
        }
        Some(Err(err)) => {
            report_plain(&format!("--args is not valid JSON: {err}"), path, diag_opts);
            return false;
        }
    };

    let service = StubService::new(api, seed);
    for _ in 0..calls {
        match service.call(method, &args) {
            Ok(value) if diag_opts.json => println!("{}", value.to_json()),
            Ok(value) => println!("{value}"),
            Err(err) => {
                let source = service
                    .api()
                    .method(method)
                    .map(|m| m.contract_source.as_str())
                    .unwrap_or("");
                report(&err, source, &contract_file(path, method), diag_opts);
                return false;
            }
        }
    }
    info!("requests served: {:?}", service.sessions().request_counts());
    true
}

/// Check every method; reports all failures, not just the first.
fn check(path: &Path, diag_opts: &DiagnosticOptions) -> bool {
    let Some(api) = load(path, diag_opts) else {
        return false;
    };

    let mut failures = 0;
    for method in &api.methods {
        match check_method(method, &api.schema, &api.config) {
            Ok(summary) => {
                if !diag_opts.json {
                    println!(
                        "ok {}: {} requires, {} solved, {} assigned, {} patterns",
                        method.name,
                        summary.requires,
                        summary.solved,
                        summary.assignments,
                        summary.patterns
                    );
                }
            }
            Err(err) => {
                failures += 1;
                report(
                    &err,
                    &method.contract_source,
                    &contract_file(path, &method.name),
                    diag_opts,
                );
            }
        }
    }
    if failures > 0 && !diag_opts.json {
        eprintln!("{failures} of {} methods failed", api.methods.len());
    }
    failures == 0
}

fn load(path: &Path, diag_opts: &DiagnosticOptions) -> Option<Api> {
    match Api::from_file(path) {
        Ok(api) => Some(api),
        Err(LoadError::Parse {
            method,
            error,
            source,
        }) => {
            report(
                &SynthError::Parse(error),
                &source,
                &contract_file(path, &method),
                diag_opts,
            );
            None
        }
        Err(err) => {
            report_plain(&err.to_string(), path, diag_opts);
            None
        }
    }
}

/// Diagnostics point into a method's contract block, named after both.
fn contract_file(path: &Path, method: &str) -> String {
    format!("{}#{method}", path.display())
}

fn report(err: &SynthError, source: &str, filename: &str, diag_opts: &DiagnosticOptions) {
    let rendered = render_diagnostic(err, source, filename, diag_opts);
    if diag_opts.json {
        eprintln!("{rendered}");
    } else {
        eprint!("{rendered}");
    }
}

/// Errors with no contract source to point into.
fn report_plain(message: &str, path: &Path, diag_opts: &DiagnosticOptions) {
    if diag_opts.json {
        let msg = serde_json::json!({
            "code": "S0000",
            "severity": "error",
            "message": message,
            "file": path.display().to_string(),
            "spans": [],
            "fix": null
        });
        eprintln!("{msg}");
    } else if diag_opts.color {
        eprintln!("{} {message}", "error:".red());
    } else {
        eprintln!("error: {message}");
    }
}
