//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `moodjournal_core` wiring against a real database file.
//! - Print results as JSON so output can be diffed in scripts.

use clap::Parser;
use moodjournal_core::db::database_path;
use moodjournal_core::{default_log_level, init_logging, Document, JournalStore, StoreConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "moodjournal_cli",
    about = "Save journal documents and search them from the command line"
)]
struct Args {
    /// Journal database file, or a directory holding the default file.
    db_path: PathBuf,
    /// JSON document to save before searching.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Hash of the version the saved document edits.
    #[arg(long, requires = "save")]
    parent: Option<String>,
    /// Directory for rotated log files. Logging stays off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
    /// Search words, combined with OR.
    query: Vec<String>,
}

fn start_logging(log_dir: &Path, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    init_logging(level, &log_dir.to_string_lossy())?;
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        start_logging(log_dir, &args.log_level)?;
    }

    let mut store = JournalStore::open(database_path(&args.db_path), StoreConfig::default())?;

    if let Some(path) = args.save.as_deref() {
        let document: Document = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let receipt = store.save(&document, args.parent.as_deref())?;
        println!("{}", serde_json::to_string(&receipt.version)?);
    }

    let query = args.query.join(" ");
    if !query.trim().is_empty() {
        let hits = store.search(&query)?;
        println!("{}", serde_json::to_string_pretty(&hits)?);
    }

    log::debug!("event=cli_done module=cli status=ok");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    println!("moodjournal_core version={}", moodjournal_core::core_version());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
