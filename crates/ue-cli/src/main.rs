//! CLI entry point for the Union Eyes migration tooling.
//!
//! This binary drives the three stages of moving Union Eyes onto Django:
//! scaffolding models from the existing schema, sizing up the npm
//! dependencies, and copying the data.
//!
//! # Usage
//!
//! ```bash
//! ue-migrate [OPTIONS] <COMMAND>
//!
//! # Generate Django apps from SQL and Drizzle schema files
//! ue-migrate generate db/schema --output backend/apps
//!
//! # Classify npm dependencies and write both reports
//! ue-migrate deps . --json deps.json --markdown deps.md
//!
//! # Rehearse a data migration, then run it for real
//! ue-migrate migrate --platform ue --dry-run
//! ue-migrate migrate --platform ue --resume
//!
//! # Compare row counts
//! ue-migrate migrate --platform abr --validate
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ue_codegen::{write_modules, Emitter, GenerationReport, ModelRegistry};
use ue_core::{Config, MigrateConfig};
use ue_deps::DependencyReport;
use ue_migrator::{Migrator, PgDatabase, Platform, RunOptions, RunSummary, Side};
use ue_schema::parse_schema_files;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Migration tooling for porting Union Eyes to Django.
#[derive(Parser)]
#[command(name = "ue-migrate", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file. Defaults apply to every key it omits.
    #[arg(short, long, global = true, env = "UE_MIGRATE_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate Django apps from SQL and Drizzle schema files.
    Generate {
        /// Schema files or directories to search.
        #[arg(required = true)]
        paths: Vec<Utf8PathBuf>,

        /// Output directory (overrides `codegen.output_dir`).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,

        /// Generation report path (defaults to `<output>/generation_report.json`).
        #[arg(long)]
        report: Option<Utf8PathBuf>,
    },

    /// Classify npm dependencies and measure how widely they are used.
    Deps {
        /// Repository root holding one or more `package.json` files.
        #[arg(default_value = ".")]
        root: Utf8PathBuf,

        /// Write the JSON report here.
        #[arg(long)]
        json: Option<Utf8PathBuf>,

        /// Write the Markdown report here.
        #[arg(long)]
        markdown: Option<Utf8PathBuf>,
    },

    /// Copy data between Postgres databases.
    Migrate(MigrateArgs),
}

/// Arguments of the `migrate` subcommand.
#[derive(clap::Args)]
struct MigrateArgs {
    /// Platform being migrated.
    #[arg(long, value_enum)]
    platform: PlatformArg,

    /// Source connection string.
    #[arg(long, env = "SOURCE_DATABASE_URL", hide_env_values = true)]
    source_url: String,

    /// Target connection string.
    #[arg(long, env = "TARGET_DATABASE_URL", hide_env_values = true)]
    target_url: String,

    /// Count rows without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Skip tables the checkpoint lists as completed.
    #[arg(long)]
    resume: bool,

    /// Restrict the run to these tables (comma separated).
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Rows per INSERT (overrides `migrate.batch_size`).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: Option<u64>,

    /// Compare row counts instead of migrating.
    #[arg(long)]
    validate: bool,

    /// Checkpoint directory (overrides `migrate.checkpoint_dir`).
    #[arg(long)]
    checkpoint_dir: Option<Utf8PathBuf>,

    /// Write the run summary as JSON here.
    #[arg(long)]
    summary: Option<Utf8PathBuf>,
}

/// Platform selector.
#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    /// Union Eyes.
    Ue,
    /// ABR.
    Abr,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ue => Self::Ue,
            PlatformArg::Abr => Self::Abr,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// `sqlx` and `ignore` are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},sqlx=warn,ignore=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Loads the configuration file, or the defaults when none is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
fn load_config(path: Option<&Utf8PathBuf>) -> color_eyre::Result<Config> {
    match path {
        Some(path) => {
            let config = Config::load(path)?;
            info!(path = %path, "Loaded configuration");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Parses schema files and writes one Django app per module.
///
/// # Errors
///
/// Returns an error if a schema file cannot be read or an output file cannot
/// be written.
fn run_generate(
    config: &Config,
    paths: &[Utf8PathBuf],
    output: Option<Utf8PathBuf>,
    report: Option<Utf8PathBuf>,
) -> color_eyre::Result<()> {
    let mut codegen = config.codegen.clone();
    if let Some(output) = output {
        codegen.output_dir = output;
    }

    let schema = parse_schema_files(paths, &codegen)?;
    if schema.tables.is_empty() {
        return Err(color_eyre::eyre::eyre!("No tables found in the given schema paths"));
    }

    let registry = ModelRegistry::from_tables(&schema.tables);
    let emitter = Emitter::new(&codegen, &registry);
    let modules = emitter.render_all(&schema.tables);
    let written = write_modules(&codegen.output_dir, &modules)?;

    let summary = GenerationReport::build(&schema, &emitter);
    let report_path = report.unwrap_or_else(|| codegen.output_dir.join("generation_report.json"));
    summary.write(&report_path)?;

    info!(
        tables = summary.total_tables,
        modules = summary.modules.len(),
        files = written.len(),
        report = %report_path,
        "Generation complete"
    );
    for reference in &summary.unresolved_references {
        warn!(reference = %reference, "Foreign key target was not generated");
    }
    Ok(())
}

/// Classifies dependencies under `root` and writes the requested reports.
///
/// # Errors
///
/// Returns an error if no manifest is found or a report cannot be written.
fn run_deps(
    config: &Config,
    root: &Utf8PathBuf,
    json: Option<&Utf8PathBuf>,
    markdown: Option<&Utf8PathBuf>,
) -> color_eyre::Result<()> {
    if !root.is_dir() {
        return Err(color_eyre::eyre::eyre!("Path is not a directory: {}", root));
    }

    let report = ue_deps::analyze(root, &config.deps)?;
    print_deps_summary(&report);

    if let Some(path) = json {
        report.write_json(path)?;
        info!(path = %path, "JSON report written");
    }
    if let Some(path) = markdown {
        report.write_markdown(path)?;
        info!(path = %path, "Markdown report written");
    }
    Ok(())
}

/// Connects to both databases and migrates or validates.
///
/// # Errors
///
/// Returns an error if either connection fails or the checkpoint cannot be
/// written. Per-table failures are reported in the summary instead.
async fn run_migrate(config: &Config, args: MigrateArgs) -> color_eyre::Result<()> {
    let mut migrate: MigrateConfig = config.migrate.clone();
    if let Some(batch_size) = args.batch_size {
        migrate.batch_size = usize::try_from(batch_size)?;
    }
    if let Some(dir) = args.checkpoint_dir {
        migrate.checkpoint_dir = dir;
    }

    let platform = Platform::from(args.platform);
    let mut options = RunOptions::new(platform, &migrate);
    options.dry_run = args.dry_run;
    options.resume = args.resume;
    options.tables = args.tables;

    let timeout = Duration::from_secs(migrate.connect_timeout_secs);
    let source = PgDatabase::connect(&args.source_url, Side::Source, timeout).await?;
    let target = PgDatabase::connect(&args.target_url, Side::Target, timeout).await?;
    let migrator = Migrator::new(&source, &target, &migrate, options);

    if args.validate {
        let report = migrator.validate().await?;
        if !report.all_green() {
            warn!(mismatched = report.mismatches().count(), "Row counts differ");
        }
        return Ok(());
    }

    let summary = tokio::select! {
        result = migrator.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!(platform = %platform, "Interrupted; completed tables are checkpointed, rerun with --resume");
            return Ok(());
        }
    };

    if let Some(path) = args.summary {
        write_summary(&summary, &path)?;
        info!(path = %path, "Run summary written");
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints category counts and the high-risk list.
fn print_deps_summary(report: &DependencyReport) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Dependency Summary");
    let _ = writeln!(handle, "==================");
    let _ = writeln!(handle);
    let _ = writeln!(
        handle,
        "Total packages: {} ({} production, {} development)",
        report.total_packages, report.production, report.development
    );
    for entry in &report.summary {
        let _ = writeln!(handle, "  {:<22} {}", entry.category.as_str(), entry.count);
    }

    if !report.high_risk.is_empty() {
        let _ = writeln!(handle);
        let _ = writeln!(handle, "High risk ({}):", report.high_risk.len());
        for name in &report.high_risk {
            let _ = writeln!(handle, "  {name}");
        }
    }
}

/// Writes the run summary as pretty JSON.
fn write_summary(summary: &RunSummary, path: &Utf8PathBuf) -> color_eyre::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration
    let config = load_config(cli.config.as_ref())?;

    // 5. Route to appropriate command
    match cli.command {
        Commands::Generate {
            paths,
            output,
            report,
        } => run_generate(&config, &paths, output, report),
        Commands::Deps {
            root,
            json,
            markdown,
        } => run_deps(&config, &root, json.as_ref(), markdown.as_ref()),
        Commands::Migrate(args) => run_migrate(&config, args).await,
    }
}
