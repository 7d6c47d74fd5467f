//! phazr - phase-based workflow orchestration
//!
//! Thin wiring over the library crates: load configuration, apply overrides,
//! run the requested command and map its outcome to an exit code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phazr_config::document::to_document;
use phazr_config::{apply_env_overrides, ConfigFormat, ConfigManager};
use phazr_core::OrchestratorConfig;
use phazr_executor::{Orchestrator, Reporter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod display;

use display::ConsoleReporter;

#[derive(Parser, Debug)]
#[command(name = "phazr")]
#[command(about = "Phase-based workflow orchestration")]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "orchestrator.yaml")]
    config: PathBuf,

    /// Preview operations without executing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration and prerequisites
    Validate,
    /// Run every enabled phase
    Setup {
        /// Version to set up (defaults to the first declared)
        #[arg(short = 'V', long)]
        version: Option<String>,
    },
    /// Run a single phase
    Run {
        phase: String,
        /// Version to use (defaults to the first declared)
        #[arg(short = 'V', long)]
        version: Option<String>,
    },
    /// Merge configuration files, later files win
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output file; YAML on stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List configured phases
    ListPhases,
    /// List configured versions
    ListVersions,
}

fn init_tracing(level: &str, verbose: bool) {
    let fallback = if verbose {
        "debug".to_string()
    } else {
        level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(manager: &ConfigManager, args: &Args) -> Result<OrchestratorConfig> {
    let mut config = manager
        .load_config(&args.config)
        .context("Error loading configuration")?;

    apply_env_overrides(&mut config.execution);
    if args.dry_run {
        config.execution.dry_run = true;
    }
    if args.verbose {
        config.execution.verbose = true;
    }
    Ok(config)
}

fn orchestrator(config: OrchestratorConfig, reporter: Arc<ConsoleReporter>) -> Result<Orchestrator> {
    Ok(Orchestrator::builder(config).reporter(reporter).build()?)
}

async fn validate(manager: &ConfigManager, config: OrchestratorConfig) -> Result<ExitCode> {
    let reporter = Arc::new(
        ConsoleReporter::new(config.execution.verbose).with_dry_run(config.execution.dry_run),
    );
    reporter.header();
    reporter.info("Validating configuration...");

    let issues = manager.validate_config(&config);
    if !issues.is_empty() {
        reporter.error("Configuration issues found:");
        for issue in &issues {
            reporter.error(&format!("  - {}", issue));
        }
        return Ok(ExitCode::FAILURE);
    }
    reporter.info("Configuration is valid");

    let report = orchestrator(config, reporter)?.validate_prerequisites().await;
    Ok(if report.all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn setup(config: OrchestratorConfig, version: Option<String>) -> Result<ExitCode> {
    let reporter = Arc::new(
        ConsoleReporter::new(config.execution.verbose).with_dry_run(config.execution.dry_run),
    );
    let results = orchestrator(config, reporter)?
        .run_full_setup(version.as_deref())
        .await?;

    let failures: usize = results.iter().map(|r| r.failed_operations).sum();
    Ok(if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_phase(
    config: OrchestratorConfig,
    phase: &str,
    version: Option<String>,
) -> Result<ExitCode> {
    if config.phase(phase).is_none() {
        let available: Vec<&str> = config.phases.iter().map(|p| p.name.as_str()).collect();
        eprintln!(
            "Error: Phase '{}' not found. Available phases: {}",
            phase,
            available.join(", ")
        );
        return Ok(ExitCode::FAILURE);
    }

    let reporter = Arc::new(
        ConsoleReporter::new(config.execution.verbose).with_dry_run(config.execution.dry_run),
    );
    reporter.header();
    let version = match version {
        Some(version) => version,
        None => config
            .default_version()
            .map(|v| v.version.clone())
            .ok_or(phazr_core::Error::NoVersions)?,
    };
    reporter.info(&format!("Running phase {} for version {}", phase, version));

    let result = orchestrator(config, reporter)?
        .run_phase_by_name(phase, Some(&version))
        .await?;
    Ok(if result.is_successful() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn merge(manager: &ConfigManager, files: &[PathBuf], output: Option<PathBuf>) -> Result<ExitCode> {
    eprintln!("Merging {} configuration files...", files.len());
    let merged = manager
        .merge_configs(files)
        .context("Error merging configurations")?;

    match output {
        Some(path) => {
            manager.save_config(&merged, &path)?;
            eprintln!("Merged configuration saved to {}", path.display());
        }
        None => print!("{}", ConfigFormat::Yaml.render(&to_document(&merged)?)?),
    }
    Ok(ExitCode::SUCCESS)
}

fn list_phases(config: &OrchestratorConfig) -> ExitCode {
    if config.phases.is_empty() {
        println!("No phases configured");
        return ExitCode::SUCCESS;
    }

    let or_dash = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    println!(
        "{:<20} {:<30} {:<25} {:<20} {}",
        "Phase", "Description", "Groups", "Dependencies", "Options"
    );
    for phase in &config.phases {
        let mut options = Vec::new();
        if phase.continue_on_error {
            options.push("continue-on-error".to_string());
        }
        if phase.parallel_groups {
            options.push("parallel".to_string());
        }
        if !phase.enabled {
            options.push("DISABLED".to_string());
        }
        println!(
            "{:<20} {:<30} {:<25} {:<20} {}",
            display::truncate(&phase.name, 20),
            display::truncate(phase.description.as_deref().unwrap_or("-"), 30),
            display::truncate(&or_dash(&phase.groups), 25),
            display::truncate(&or_dash(&phase.depends_on), 20),
            or_dash(&options)
        );
    }
    ExitCode::SUCCESS
}

fn list_versions(config: &OrchestratorConfig) -> ExitCode {
    println!("Available versions:");
    for version in &config.versions {
        println!(
            "  - {}: {} groups, {} operations",
            version.version,
            version.groups.len(),
            version.operation_count()
        );
    }
    ExitCode::SUCCESS
}

async fn run(args: Args) -> Result<ExitCode> {
    let manager = ConfigManager::default();

    if let Commands::Merge { files, output } = &args.command {
        init_tracing("warn", args.verbose);
        return merge(&manager, files, output.clone());
    }

    let config = load(&manager, &args)?;
    init_tracing(&config.execution.log_level, config.execution.verbose);
    info!(config = %args.config.display(), environment = %config.environment.name, "Configuration loaded");
    debug!(execution = ?config.execution, "Execution settings");

    match args.command {
        Commands::Validate => validate(&manager, config).await,
        Commands::Setup { version } => setup(config, version).await,
        Commands::Run { phase, version } => run_phase(config, &phase, version).await,
        Commands::ListPhases => Ok(list_phases(&config)),
        Commands::ListVersions => Ok(list_versions(&config)),
        Commands::Merge { files, output } => merge(&manager, &files, output),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
