//! ned CLI entry point.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ned_common::{format_error_human, Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use ned_core::config::{load_config, study_schema, ConfigError, ConfigOptions, ConfigOverrides};
use ned_core::events::{JsonlWriter, ProgressEmitter, RunEmitter};
use ned_core::exit_codes::ExitCode;
use ned_core::log_event;
use ned_core::logging::{
    event_names, generate_run_id, get_host_id, init_logging, LogConfig, LogContext, LogFormat,
    LogLevel, Stage,
};
use ned_core::report::render;
use ned_core::source::{SqliteTraceSource, TraceSource};
use ned_core::study::{Study, StudyOptions};

/// ned - estimate how well dummy traffic hides user interactions
#[derive(Parser)]
#[command(name = "ned")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to study.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Stream progress events as JSONL on stderr
    #[arg(long, global = true)]
    progress: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the study against a trace store
    Run(RunArgs),

    /// List the systems stored in a trace store
    Systems(SystemsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// SQLite trace store
    #[arg(long)]
    db: PathBuf,

    /// Only run these system ids (repeatable)
    #[arg(long = "system")]
    systems: Vec<String>,

    /// Study seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Samples per lambda
    #[arg(long)]
    samples: Option<usize>,

    /// Sampling budget per lambda, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Worker threads per pool
    #[arg(long)]
    workers: Option<usize>,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SystemsArgs {
    /// SQLite trace store
    #[arg(long)]
    db: PathBuf,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective study configuration
    Show,
    /// Validate a study file
    Validate {
        /// Path to study.json (defaults to the resolved one)
        path: Option<PathBuf>,
    },
    /// Print the JSON schema of study.json
    Schema,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id(), get_host_id());

    let exit_code = match &cli.command {
        Commands::Run(args) => run_study(&cli.global, &ctx, args),
        Commands::Systems(args) => run_systems(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Commands
// ============================================================================

fn run_study(global: &GlobalOpts, ctx: &LogContext, args: &RunArgs) -> ExitCode {
    let options = ConfigOptions {
        study_path: global.config.clone(),
        overrides: ConfigOverrides {
            seed: args.seed,
            sample_count: args.samples,
            sample_timeout_secs: args.timeout,
            workers: args.workers,
            systems: args.systems.clone(),
        },
    };
    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(e) => {
            log_event!(
                ctx,
                ERROR,
                event_names::CONFIG_ERROR,
                Stage::Init,
                e.to_string()
            );
            return output_config_error(global, &e);
        }
    };
    if resolved.using_defaults() {
        log_event!(
            ctx,
            INFO,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no study.json found, using built-in defaults"
        );
    } else {
        log_event!(
            ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            format!("study configuration from {}", resolved.paths.study_source),
            config_hash = resolved.snapshot.short_id()
        );
    }

    let source = match SqliteTraceSource::open(&args.db) {
        Ok(source) => source,
        Err(e) => return output_error(global, &e),
    };

    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        format!(
            "running {} systems x {} lambdas",
            resolved.study.systems.len(),
            resolved.study.lambdas.len()
        ),
        seeded = resolved.study.seed.is_some()
    );

    let mut study_options = StudyOptions::new(ctx.clone());
    if global.progress {
        let writer: Arc<dyn ProgressEmitter> = Arc::new(JsonlWriter::new(std::io::stderr()));
        study_options =
            study_options.with_emitter(Arc::new(RunEmitter::new(ctx.run_id.clone(), writer)));
    }

    let study = Study::new(&resolved.study, &resolved.snapshot, study_options);
    let report = match study.run(&source) {
        Ok(report) => report,
        Err(e) => {
            log_event!(
                ctx,
                ERROR,
                event_names::INTERNAL_ERROR,
                Stage::Estimate,
                e.to_string(),
                code = e.code()
            );
            return output_error(global, &e);
        }
    };

    let rendered = match render(&report, global.format) {
        Ok(text) => text,
        Err(e) => return output_error(global, &e),
    };
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, rendered) {
                return output_error(global, &Error::Io(e));
            }
        }
        None => print!("{}", ensure_newline(rendered)),
    }

    let failures = report.failure_count();
    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        format!("study finished with {} failures", failures),
        failures = failures
    );

    if failures > 0 {
        ExitCode::PartialFail
    } else {
        ExitCode::Clean
    }
}

fn run_systems(global: &GlobalOpts, args: &SystemsArgs) -> ExitCode {
    let systems = match SqliteTraceSource::open(&args.db).and_then(|s| s.systems()) {
        Ok(systems) => systems,
        Err(e) => return output_error(global, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "db": args.db.display().to_string(),
                "systems": systems,
            });
            print_json(&response);
        }
        OutputFormat::Md => {
            println!("| system | description | messages |");
            println!("|---|---|---|");
            for system in &systems {
                println!(
                    "| {} | {} | {} |",
                    system.id,
                    system.description.as_deref().unwrap_or(""),
                    system.messages
                );
            }
        }
        OutputFormat::Summary | OutputFormat::Latex => {
            for system in &systems {
                println!(
                    "system {}: {} messages{}",
                    system.id,
                    system.messages,
                    system
                        .description
                        .as_deref()
                        .map(|d| format!(" ({})", d))
                        .unwrap_or_default()
                );
            }
        }
    }
    ExitCode::Clean
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => run_config_show(global),
        ConfigCommands::Validate { path } => {
            run_config_validate(global, path.clone().or_else(|| global.config.clone()))
        }
        ConfigCommands::Schema => {
            print_json(&study_schema());
            ExitCode::Clean
        }
    }
}

/// Display the effective configuration (built-in defaults if no file is found).
fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let options = ConfigOptions {
        study_path: global.config.clone(),
        ..Default::default()
    };
    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(e) => return output_config_error(global, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "source": {
                    "path": resolved.paths.study.as_ref().map(|p| p.display().to_string()),
                    "kind": resolved.paths.study_source.to_string(),
                    "hash": &resolved.snapshot.config_hash,
                    "using_defaults": resolved.using_defaults(),
                },
                "study": &resolved.study,
            });
            print_json(&response);
        }
        _ => {
            let source = resolved
                .paths
                .study
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());
            println!(
                "config {} from {} ({})",
                resolved.snapshot.short_id(),
                source,
                resolved.paths.study_source
            );
            println!(
                "sample duration {} s, {} samples, timeout {} s",
                resolved.study.sample_duration_secs,
                resolved.study.sample_count,
                resolved.study.sample_timeout_secs
            );
            for system in &resolved.study.systems {
                println!(
                    "system {}: outage {} units, precision {} s",
                    system.id, system.outage_threshold, system.precision
                );
            }
            for lambda in &resolved.study.lambdas {
                println!("lambda {:.6}: {}", lambda.lambda, lambda.label);
            }
        }
    }
    ExitCode::Clean
}

fn run_config_validate(global: &GlobalOpts, path: Option<PathBuf>) -> ExitCode {
    let options = ConfigOptions {
        study_path: path,
        ..Default::default()
    };
    match load_config(&options) {
        Ok(resolved) => {
            match global.format {
                OutputFormat::Json => {
                    let response = serde_json::json!({
                        "schema_version": SCHEMA_VERSION,
                        "generated_at": chrono::Utc::now().to_rfc3339(),
                        "status": "valid",
                        "path": resolved.paths.study.as_ref().map(|p| p.display().to_string()),
                        "using_defaults": resolved.using_defaults(),
                        "config_hash": &resolved.snapshot.config_hash,
                    });
                    print_json(&response);
                }
                _ => println!("config validate: OK ({})", resolved.snapshot.short_id()),
            }
            ExitCode::Clean
        }
        Err(e) => output_config_error(global, &e),
    }
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "name": "ned",
            "version": env!("CARGO_PKG_VERSION"),
            "schema_version": SCHEMA_VERSION,
        })),
        _ => println!("ned {}", env!("CARGO_PKG_VERSION")),
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn use_color(global: &GlobalOpts) -> bool {
    !global.no_color && std::io::stderr().is_terminal()
}

/// Report an error on stderr in the appropriate format.
fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(error);
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "status": "error",
                "error": structured,
                "remediation": error.remediation(),
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("{}", structured.to_json()),
            }
        }
        _ => eprintln!("{}", format_error_human(error, use_color(global))),
    }
    ExitCode::from(error)
}

/// Report a config error on stderr in the appropriate format.
fn output_config_error(global: &GlobalOpts, error: &ConfigError) -> ExitCode {
    let exit_code = error.exit_code();
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "error": {
                    "code": error.code(),
                    "message": error.to_string(),
                    "exit_code": exit_code.code_name(),
                }
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("error: {}", error),
            }
        }
        _ => {
            let (red, reset) = if use_color(global) {
                ("\x1b[31m", "\x1b[0m")
            } else {
                ("", "")
            };
            eprintln!("{}✗{} Configuration Error\n  Reason: {}", red, reset, error);
        }
    }
    exit_code
}
