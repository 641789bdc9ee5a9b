//! Layer Guardian CLI - Command-line interface for layered architecture validation
//!
//! Architecture: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and business logic

use clap::{Parser, Subcommand, ValueEnum};
use layer_guardian::{
    ArchResult, ArchitectureValidator, Bonus, BuildMode, CompositeScore, EngineConfig,
    OutputFormat, QualityMetrics, ReportFormatter, ReportOptions, RuleId, Severity,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Configuration files looked up in the working directory when `--config` is absent
const DEFAULT_CONFIG_FILES: [&str; 3] = [
    "layer_guardian.yaml",
    "layer_guardian.yml",
    ".layer_guardian.yaml",
];

/// Layer Guardian - Layered architecture validation
#[derive(Parser)]
#[command(name = "layer-guardian")]
#[command(version = "0.1.0")]
#[command(about = "Validates block-and-connection architectures against layering rules")]
#[command(
    long_about = "Layer Guardian places code blocks into Presentation, Application, Domain and \
                  Infrastructure layers, checks their dependencies against layering rules, \
                  and scores the result."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a solution document
    Check {
        /// Solution file (YAML or JSON)
        solution: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Store illegal-direction connections and report them instead of refusing the solution
        #[arg(long)]
        lenient: bool,
    },

    /// Compute the weighted composite score from four metrics
    Score {
        #[arg(long)]
        accuracy: f64,

        #[arg(long)]
        efficiency: f64,

        #[arg(long)]
        maintainability: f64,

        #[arg(long)]
        speed: f64,

        /// Bonus multiplier, applied in the order given
        #[arg(long = "bonus", action = clap::ArgAction::Append)]
        bonuses: Vec<f64>,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// List available rules
    Rules {
        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Junit,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Junit => OutputFormat::Junit,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_command(cli: Cli) -> ArchResult<i32> {
    match cli.command {
        Commands::Check {
            solution,
            format,
            severity,
            max_violations,
            lenient,
        } => run_check(
            cli.config,
            &solution,
            format,
            ReportOptions {
                use_colors: !cli.no_color,
                max_violations,
                min_severity: severity.map(Severity::from),
                ..Default::default()
            },
            lenient,
        ),
        Commands::Score {
            accuracy,
            efficiency,
            maintainability,
            speed,
            bonuses,
        } => run_score(
            QualityMetrics::new(accuracy, efficiency, maintainability, speed),
            &bonuses,
        ),
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Explain { rule_id } => run_explain(&rule_id),
        Commands::Rules { enabled_only } => run_list_rules(cli.config, enabled_only),
    }
}

/// Explicit path, else the first default file present, else built-in defaults
fn load_config(config_path: Option<PathBuf>) -> ArchResult<EngineConfig> {
    if let Some(path) = config_path {
        return EngineConfig::load_from_file(path);
    }

    for name in DEFAULT_CONFIG_FILES {
        if Path::new(name).exists() {
            tracing::debug!("Using configuration file {}", name);
            return EngineConfig::load_from_file(name);
        }
    }

    Ok(EngineConfig::default())
}

fn run_check(
    config_path: Option<PathBuf>,
    solution: &Path,
    format: OutputFormatArg,
    options: ReportOptions,
    lenient: bool,
) -> ArchResult<i32> {
    let config = load_config(config_path)?;
    let validator = ArchitectureValidator::new_with_config(config)?
        .with_report_formatter(ReportFormatter::new(options));

    let mode = if lenient { BuildMode::Lenient } else { BuildMode::Strict };
    let report = validator.validate_solution_file(solution, mode)?;

    let formatted = validator.format_report(&report, format.into())?;
    println!("{formatted}");

    if report.is_valid() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn run_score(metrics: QualityMetrics, multipliers: &[f64]) -> ArchResult<i32> {
    let base = CompositeScore::compute(&metrics)?;
    println!("Composite score: {}", base.value());

    let bonuses = multipliers
        .iter()
        .enumerate()
        .map(|(position, &multiplier)| Bonus::new(format!("bonus #{}", position + 1), multiplier));
    let adjusted = base.apply_bonuses(bonuses)?;

    for bonus in adjusted.bonuses() {
        println!("  {} x{}", bonus.label, bonus.multiplier);
    }
    if !adjusted.bonuses().is_empty() {
        println!("Final score: {}", adjusted.value());
    }

    Ok(0)
}

fn run_validate_config(config_path: Option<PathBuf>) -> ArchResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));

    println!("Validating configuration: {}", config_path.display());

    match EngineConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!(
                "  Rules: {} listed, {} enabled",
                config.rules.len(),
                config.enabled_rules().count()
            );
            println!("  Fingerprint: {}", config.fingerprint());
            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn run_explain(rule_id: &str) -> ArchResult<i32> {
    let Some(id) = RuleId::parse(rule_id) else {
        eprintln!("Rule '{rule_id}' not found");
        println!();
        println!("Available rules:");
        for id in RuleId::ALL {
            println!("  - {id}");
        }
        return Ok(1);
    };

    println!("Rule: {id}");
    println!("Default severity: {}", id.default_severity().as_str());
    println!();
    println!("Description:");
    println!("   {}", id.description());

    let config = EngineConfig::default().rule_config(id);
    match id {
        RuleId::NoFatService => {
            println!();
            println!("Parameters:");
            println!("   max_methods: {}", config.params.max_methods());
            println!("   max_method_lines: {}", config.params.max_method_lines());
        }
        RuleId::DtoPurity => {
            println!();
            println!("UI type pattern:");
            println!("   {}", config.params.ui_type_pattern());
        }
        _ => {}
    }

    Ok(0)
}

fn run_list_rules(config_path: Option<PathBuf>, enabled_only: bool) -> ArchResult<i32> {
    let config = load_config(config_path)?;

    println!("Available Rules\n");

    for &id in &config.rules {
        let rule = config.rule_config(id);
        if enabled_only && !rule.enabled {
            continue;
        }

        let status = if rule.enabled { "on " } else { "off" };
        println!(
            "  [{}] {} ({}) - {}",
            status,
            id,
            rule.severity.as_str(),
            id.description()
        );
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, directives.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` directives win when they parse; otherwise `--verbose` picks debug over warn
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}
