use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ether_dash::config::AppConfig;
use ether_dash::logging::init_logging;
use ether_dash::store::{RebuildReport, Store};
use ether_dash::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the CSV exports
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Store file to rebuild or query
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the store and import every CSV file (default)
    Rebuild,
    /// Import only if the store does not exist yet
    Ensure,
    /// Inspect the input directory without touching the store
    Validate,
    /// Print row counts and repositories of the current store
    Summary {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List rows whose foreign keys point at missing rows
    CheckForeignKeys,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data_dir) = &cli.data_dir {
        config.import.data_dir = data_dir.display().to_string();
    }
    if let Some(database) = &cli.database {
        config.import.database_path = database.display().to_string();
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    // Initialize logging
    let _guard = init_logging(
        &config.logging.level,
        config.logging.format == "json",
        config.logging.file_path.as_deref().map(Path::new),
    )?;

    let data_dir = config.data_dir();
    let store = Store::new(config.database_path()).with_foreign_keys(config.import.enforce_foreign_keys);

    match cli.command.unwrap_or(Commands::Rebuild) {
        Commands::Rebuild => {
            let report = store
                .rebuild(&data_dir)
                .with_context(|| format!("Failed to rebuild {}", store.path().display()))?;
            log_report(&report);
        }
        Commands::Ensure => {
            match store
                .ensure(&data_dir)
                .with_context(|| format!("Failed to import into {}", store.path().display()))?
            {
                Some(report) => log_report(&report),
                None => info!("Nothing to do"),
            }
        }
        Commands::Validate => validate_inputs(&data_dir)?,
        Commands::Summary { json } => print_summary(&store, json)?,
        Commands::CheckForeignKeys => check_foreign_keys(&store)?,
    }

    Ok(())
}

fn log_report(report: &RebuildReport) {
    for file in &report.files {
        info!(
            table = file.relation.table(),
            read = file.rows_read,
            inserted = file.rows_inserted,
            duplicates = file.duplicates_dropped,
            duration_ms = file.duration_ms,
            "File summary"
        );
    }
    info!("Imported {} rows", report.total_rows());
}

/// Inspect the input directory; fails if any file cannot be loaded
fn validate_inputs(data_dir: &Path) -> Result<()> {
    let reports = InputValidator::inspect(data_dir);
    let mut problems = 0;

    for report in &reports {
        let file = report.path.display();
        if !report.exists {
            warn!("{}: missing", file);
        } else if let Some(e) = &report.header_error {
            warn!("{}: unreadable header: {}", file, e);
        } else if !report.has_primary_key {
            warn!("{}: no primary key column", file);
        } else {
            info!("{}: ok", file);
        }
        if !report.missing_columns.is_empty() {
            info!("{}: columns stored as null: {:?}", file, report.missing_columns);
        }
        if !report.extra_columns.is_empty() {
            info!("{}: columns ignored: {:?}", file, report.extra_columns);
        }
        if !report.is_loadable() {
            problems += 1;
        }
    }

    if problems > 0 {
        anyhow::bail!("{} of {} input files cannot be loaded", problems, reports.len());
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(store: &Store, json: bool) -> Result<()> {
    let counts = store.row_counts()?;
    let repositories = store.repositories()?;

    if json {
        let counts: Vec<serde_json::Value> = counts
            .iter()
            .map(|(relation, rows)| serde_json::json!({ "table": relation.table(), "rows": rows }))
            .collect();
        let summary = serde_json::json!({ "tables": counts, "repositories": repositories });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for (relation, rows) in &counts {
        println!("{:<14} {:>10}", relation.table(), rows);
    }
    println!();
    for repository in &repositories {
        println!("{:>10}  {}", repository.id, repository.name.as_deref().unwrap_or("-"));
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn check_foreign_keys(store: &Store) -> Result<()> {
    let violations = store.foreign_key_violations()?;
    for violation in &violations {
        let rowid = violation.rowid.map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("{} row {} -> missing {}", violation.table, rowid, violation.parent);
    }
    if violations.is_empty() {
        info!("No dangling foreign keys");
    } else {
        warn!("{} rows with dangling foreign keys", violations.len());
    }
    Ok(())
}
