use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use stasis_vault::storage::{FileRecordStore, RecordStore};
use stasis_vault::{ActorKind, StasisConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "stasis-tool")]
#[command(about = "Offline inspection of a stasis table file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every decodable entry
    List {
        #[arg(long)]
        file: PathBuf,
    },
    /// Report corrupt entries; fails if any are found
    Check {
        #[arg(long)]
        file: PathBuf,
    },
    /// Rewrite the file without its corrupt entries
    Compact {
        #[arg(long)]
        file: PathBuf,
    },
    /// Validate a config file and print the effective settings
    Config {
        #[arg(long)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::List { file } => list(&file),
        Command::Check { file } => check(&file),
        Command::Compact { file } => compact(&file),
        Command::Config { path } => show_config(&path),
    }
}

fn open(file: &Path) -> Result<FileRecordStore> {
    if !file.exists() {
        bail!("Stasis table '{}' does not exist", file.display());
    }
    let (store, _) = FileRecordStore::open(file)
        .with_context(|| format!("Failed to load '{}'", file.display()))?;
    Ok(store)
}

fn list(file: &Path) -> Result<()> {
    let store = open(file)?;
    println!("Stasis entries: {}", store.len());

    let mut by_kind: BTreeMap<ActorKind, usize> = BTreeMap::new();
    for record in store.records() {
        *by_kind.entry(record.kind).or_default() += 1;
        println!(
            "  {}  {:<12} world={} chunk={} actor={}",
            record.token, record.kind, record.world, record.chunk, record.actor
        );
    }
    for (kind, count) in by_kind {
        println!("{:>6} x {}", count, kind);
    }
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    let store = FileRecordStore::new(file);
    let decoded = store
        .read_file()
        .with_context(|| format!("Failed to read '{}'", file.display()))?;

    println!(
        "{}: {} valid, {} corrupt",
        file.display(),
        decoded.records.len(),
        decoded.dropped.len()
    );
    for dropped in &decoded.dropped {
        println!("  {}: {}", dropped.key, dropped.reason);
    }
    if !decoded.dropped.is_empty() {
        bail!("{} corrupt stasis entries found", decoded.dropped.len());
    }
    Ok(())
}

fn compact(file: &Path) -> Result<()> {
    let mut store = FileRecordStore::new(file);
    let report = store
        .load()
        .with_context(|| format!("Failed to load '{}'", file.display()))?;
    if report.dropped == 0 {
        println!("Nothing to compact ({} entries)", report.loaded);
        return Ok(());
    }
    store
        .save()
        .with_context(|| format!("Failed to rewrite '{}'", file.display()))?;
    println!(
        "Rewrote {} with {} entries ({} dropped)",
        file.display(),
        report.loaded,
        report.dropped
    );
    Ok(())
}

fn show_config(path: &Path) -> Result<()> {
    let config = StasisConfig::from_json_file(path)?;
    let rendered = serde_json::to_string_pretty(&config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}
