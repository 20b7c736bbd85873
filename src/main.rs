//! drift-tools: drift detection between golden and client content libraries
//!
//! Compares a golden content repository against a client repository and
//! reports per-library drift of libraries, entities and mappings.

#![allow(clippy::struct_excessive_bools)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use drift_tools::{
    cli,
    config::{AppConfig, ConfigPreset, DriftConfigBuilder, discover_config_file, load_or_default},
    pipeline::exit_codes,
    reports::ReportFormat,
    utils::CancellationToken,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const CONFIG_FILE_NAMES: &[&str] = &[
    ".drift-tools.yaml",
    ".drift-tools.yml",
    "drift-tools.yaml",
    "drift-tools.yml",
];

#[derive(Parser)]
#[command(name = "drift-tools")]
#[command(author = "Binarly.io")]
#[command(version)]
#[command(about = "Drift detection between golden and client content libraries", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  No drift detected (or drift without --fail-on-drift)
    1  Drift detected with --fail-on-drift
    2  Error occurred

EXAMPLES:
    # Drift of two libraries between committed HEADs
    drift-tools drift golden/ client/ --library <uuid> --library <uuid>

    # Whole repository, uncommitted working trees, human summary
    drift-tools drift golden/ client/ --all --uncommitted -o summary

    # CI/CD gate
    drift-tools --preset ci-cd drift golden/ client/ --all

    # How is a path classified?
    drift-tools classify 7/components/12.yaml mappings/component-threats/12_40.yaml")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Start from a named preset (default, ci-cd, strict) instead of a config file
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Arguments for the `drift` subcommand
#[derive(Parser)]
struct DriftArgs {
    /// Golden (reference) repository root
    baseline: PathBuf,

    /// Client repository root
    target: PathBuf,

    /// Library UUID to compare (repeatable)
    #[arg(short, long = "library", value_name = "UUID", required_unless_present = "all")]
    libraries: Vec<Uuid>,

    /// Compare every library through one whole-repository diff
    #[arg(long, conflicts_with = "libraries")]
    all: bool,

    /// Compare working trees (uncommitted state) instead of revisions
    #[arg(long)]
    uncommitted: bool,

    /// Baseline revision (default HEAD)
    #[arg(long, conflicts_with = "uncommitted")]
    baseline_rev: Option<String>,

    /// Target revision (default HEAD)
    #[arg(long, conflicts_with = "uncommitted")]
    target_rev: Option<String>,

    /// Content index file (default: index.yaml in the baseline root)
    #[arg(long)]
    index: Option<PathBuf>,

    /// Output format
    #[arg(short, long)]
    output: Option<ReportFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if any drift is detected
    #[arg(long)]
    fail_on_drift: bool,

    /// Maximum worker threads (0 = available parallelism)
    #[arg(short = 'j', long)]
    max_workers: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute drift between a golden and a client repository
    Drift(DriftArgs),

    /// Print how repository-relative paths are classified
    Classify {
        /// Repository-relative paths
        #[arg(required = true)]
        paths: Vec<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (defaults merged with file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .drift-tools.yaml in the current directory
    Init,
}

/// Base configuration: a named preset, or the discovered config file.
fn base_config(cli: &Cli) -> Result<(AppConfig, Option<PathBuf>)> {
    if let Some(name) = &cli.preset {
        let preset = ConfigPreset::from_name(name).with_context(|| {
            let known: Vec<&str> = ConfigPreset::all().iter().map(ConfigPreset::name).collect();
            format!("unknown preset '{name}' (known: {})", known.join(", "))
        })?;
        return Ok((AppConfig::from_preset(preset), None));
    }
    Ok(load_or_default(cli.config.as_deref())?)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Drift(ref args) => {
            let (app, loaded_from) = base_config(&cli)?;
            if let Some(path) = &loaded_from {
                tracing::debug!(path = %path.display(), "configuration loaded");
            }

            let mut builder = DriftConfigBuilder::from_app_config(app)
                .baseline_path(args.baseline.clone())
                .target_path(args.target.clone())
                .libraries(args.libraries.clone())
                .all_libraries(args.all)
                .uncommitted(args.uncommitted)
                .baseline_revision(args.baseline_rev.clone())
                .target_revision(args.target_rev.clone())
                .index_path(args.index.clone())
                .output_file(args.output_file.clone())
                .no_color(cli.no_color)
                .quiet(cli.quiet)
                .fail_on_drift(args.fail_on_drift)
                .max_workers(args.max_workers);
            if let Some(format) = args.output {
                builder = builder.output_format(format);
            }
            let config = builder.build()?;

            cli::run_drift(&config, &CancellationToken::new())
        }

        Commands::Classify { ref paths, json } => cli::run_classify(paths, json),

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "drift-tools", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { ref output } => {
            let schema = drift_tools::config::generate_json_schema()
                .context("failed to serialize config schema")?;
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { ref action } => {
            match action {
                ConfigAction::Show => {
                    let (config, loaded_from) = base_config(&cli)?;
                    match &loaded_from {
                        Some(path) => eprintln!("# Loaded from: {}", path.display()),
                        None if cli.preset.is_some() => eprintln!("# Preset configuration"),
                        None => eprintln!("# No config file found; showing defaults"),
                    }
                    let yaml = serde_yaml_ng::to_string(&config).context("failed to serialize config")?;
                    print!("{yaml}");
                }
                ConfigAction::Path => {
                    let search_paths: [Option<String>; 3] = [
                        std::env::current_dir().ok().map(|p| p.display().to_string()),
                        dirs::config_dir().map(|p| p.join("drift-tools").display().to_string()),
                        dirs::home_dir().map(|p| p.display().to_string()),
                    ];
                    eprintln!("Config file search paths (in order, git root after the first):");
                    for path in search_paths.into_iter().flatten() {
                        eprintln!("  {path}");
                    }
                    eprintln!();
                    eprintln!("Recognized file names:");
                    for name in CONFIG_FILE_NAMES {
                        eprintln!("  {name}");
                    }
                    eprintln!();
                    match discover_config_file(cli.config.as_deref()) {
                        Some(path) => eprintln!("Active config file: {}", path.display()),
                        None => eprintln!("No config file found."),
                    }
                }
                ConfigAction::Init => {
                    let target = std::env::current_dir()
                        .context("cannot determine current directory")?
                        .join(".drift-tools.yaml");
                    if target.exists() {
                        anyhow::bail!(
                            "{} already exists. Remove it first to re-initialize.",
                            target.display()
                        );
                    }
                    let content = drift_tools::config::generate_example_config();
                    std::fs::write(&target, content)
                        .with_context(|| format!("failed to write {}", target.display()))?;
                    eprintln!("Created {}", target.display());
                }
            }
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            exit_codes::ERROR
        }
    };
    if code != exit_codes::SUCCESS {
        std::process::exit(code);
    }
}
