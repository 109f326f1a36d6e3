use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use factsheet_check::{check_documents, CheckOptions};
use factsheet_extract::{extract_records, ExtractOptions};
use factsheet_storage::RecordSink;

#[derive(Parser)]
#[command(
    name = "factsheet",
    about = "Extract labeled statistics from constituency fact sheets."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract every fact sheet in a directory into one SQLite database.
    Extract {
        /// Directory holding `.xlsx` fact sheets.
        #[arg(long)]
        dir: PathBuf,

        /// Output database path. Defaults to `aggregate.db` inside the
        /// directory; an existing database is replaced.
        #[arg(long)]
        database: Option<PathBuf>,

        /// Keep processing the remaining documents after one fails.
        #[arg(long)]
        keep_going: bool,
    },
    /// Check that all fact sheets share one structure, using the first
    /// document as the reference.
    Check {
        /// Directory holding `.xlsx` fact sheets.
        #[arg(long)]
        dir: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Extract {
            dir,
            database,
            keep_going,
        } => run_extract(&dir, database, keep_going),
        Command::Check { dir, format } => run_check(&dir, format),
    }
}

/// Enumerate the `.xlsx` documents directly inside `dir`, sorted by name so
/// processing order (and the check command's reference choice) is stable.
fn scan_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("scan directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
        if is_xlsx {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        bail!("no .xlsx documents in {}", dir.display());
    }
    Ok(paths)
}

fn run_extract(dir: &Path, database: Option<PathBuf>, keep_going: bool) -> Result<()> {
    let paths = scan_documents(dir)?;
    let db_path = database.unwrap_or_else(|| dir.join("aggregate.db"));

    // One run produces one database; stale contents would collide on the
    // composite key.
    match std::fs::remove_file(&db_path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("remove {}", db_path.display()));
        }
    }
    let mut sink = RecordSink::open_path(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;

    let options = ExtractOptions::default();
    let mut failed = 0usize;
    let mut total = 0usize;
    for path in &paths {
        match extract_one(path, &options, &mut sink) {
            Ok(count) => {
                total += count;
                println!("{} entries from {}", count, path.display());
            }
            Err(err) => {
                failed += 1;
                log::error!("{}: {err:#}", path.display());
                if !keep_going {
                    return Err(err.context(format!("extract {}", path.display())));
                }
            }
        }
    }

    println!(
        "{} records from {} documents into {}",
        total,
        paths.len() - failed,
        db_path.display()
    );
    if failed > 0 {
        bail!("{failed} of {} documents failed", paths.len());
    }
    Ok(())
}

fn extract_one(path: &Path, options: &ExtractOptions, sink: &mut RecordSink) -> Result<usize> {
    let doc = factsheet_xlsx::load_from_path(path)?;
    let records = extract_records(&doc.grid, &doc.area, options)?;
    sink.insert_all(&records)?;
    Ok(records.len())
}

fn run_check(dir: &Path, format: OutputFormat) -> Result<()> {
    let paths = scan_documents(dir)?;
    let report = check_documents(&paths, &CheckOptions::default())?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            for doc in &report.documents {
                if doc.is_clean() {
                    continue;
                }
                println!("{} does not match {}", doc.area, report.reference);
                for issue in &doc.convention_issues {
                    println!("  {issue}");
                }
                for mismatch in &doc.mismatches {
                    println!("  {mismatch}");
                }
            }
        }
    }

    if !report.is_clean() {
        bail!("documents do not share one structure");
    }
    println!("{} documents match {}", report.documents.len(), report.reference);
    Ok(())
}
