//! recipe-merge - duplicate detection and canonical merge for medium recipes
//!
//! Thin command-line wrapper around the `recipe_merge` engine.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recipe_common::config::{ConfigResolver, TomlConfig};
use recipe_merge::models::RecordRef;
use recipe_merge::services::{
    Fingerprinter, Matcher, MergeOrchestrator, MergeSettings, RecordScanner,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line arguments for recipe-merge
#[derive(Parser, Debug)]
#[command(name = "recipe-merge")]
#[command(about = "Find and merge growth-medium recipes with identical ingredient sets")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "RECIPE_MERGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fingerprint of one record
    Fingerprint {
        /// Record YAML file
        file: PathBuf,
    },

    /// Report duplicate groups in a corpus without writing anything
    FindDuplicates {
        /// Corpus directory (defaults to config input_dir)
        dir: Option<PathBuf>,

        /// Parallel fingerprinting
        #[arg(long)]
        parallel: Option<bool>,
    },

    /// Merge a corpus into one canonical record per formulation
    Merge {
        /// Corpus directory (defaults to config input_dir)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to config output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run statistics JSON file
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Minimum group size to emit
        #[arg(long)]
        min_group_size: Option<usize>,
    },

    /// Check that merged output accounts for every grouped input exactly once
    Verify {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let resolved = ConfigResolver::new(args.config.clone()).resolve();
    recipe_common::logging::init_tracing(&resolved.config.logging)?;

    info!("Starting recipe-merge v{}", env!("CARGO_PKG_VERSION"));
    resolved.log_source();
    let config = resolved.config;

    match args.command {
        Command::Fingerprint { file } => fingerprint(&file),
        Command::FindDuplicates { dir, parallel } => {
            let dir = required(dir, config.input_dir.as_ref(), "corpus directory")?;
            find_duplicates(&dir, parallel.unwrap_or(config.parallel), config.top_groups)
        }
        Command::Merge {
            input,
            output,
            stats,
            min_group_size,
        } => {
            let input = required(input, config.input_dir.as_ref(), "--input")?;
            let output = required(output, config.output_dir.as_ref(), "--output")?;
            let mut settings = MergeSettings::from_config(&config, output);
            if stats.is_some() {
                settings.stats_file = stats;
            }
            if let Some(size) = min_group_size {
                if size == 0 {
                    bail!("--min-group-size must be at least 1");
                }
                settings.min_group_size = size;
            }
            merge(&input, settings)
        }
        Command::Verify { input, output } => {
            let input = required(input, config.input_dir.as_ref(), "--input")?;
            let output = required(output, config.output_dir.as_ref(), "--output")?;
            verify(&input, &config, output)
        }
    }
}

/// CLI value, else config value, else an error naming the flag
fn required(cli: Option<PathBuf>, configured: Option<&PathBuf>, what: &str) -> Result<PathBuf> {
    cli.or_else(|| configured.cloned())
        .with_context(|| format!("No {} given on the command line or in config", what))
}

fn fingerprint(file: &Path) -> Result<()> {
    let fingerprint = Fingerprinter::new()
        .fingerprint_file(file)
        .with_context(|| format!("Failed to fingerprint {}", file.display()))?;

    match fingerprint {
        Some(hash) => println!("{}", hash),
        None => println!("no identity (no valid ingredients)"),
    }
    Ok(())
}

fn find_duplicates(dir: &Path, parallel: bool, top_groups: usize) -> Result<()> {
    let paths = RecordScanner::new()
        .scan(dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    let matcher = Matcher::new().with_parallel(parallel);
    let all = matcher.group_under(dir, &paths, 1);

    println!("{}", all.stats.display_string());
    println!("{}", all.duplicates.display_string());

    let mut groups: Vec<_> = all.groups.iter().filter(|(_, refs)| refs.len() >= 2).collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
    for (fingerprint, refs) in groups.into_iter().take(top_groups) {
        let ids: Vec<&str> = refs.iter().map(RecordRef::id).collect();
        let short: String = fingerprint.chars().take(12).collect();
        println!("  {} ({}): {}", short, refs.len(), ids.join(", "));
    }
    Ok(())
}

fn merge(input: &Path, settings: MergeSettings) -> Result<()> {
    let orchestrator = MergeOrchestrator::new(settings);
    let run = orchestrator.run(input)?;
    let stats = &run.statistics;

    println!(
        "{} records -> {} merged records ({} merged away, {:.1}% reduction)",
        stats.input_records, stats.output_records, stats.reduction_count, stats.reduction_percent
    );
    println!(
        "{} cross-source merges, largest group {}, {} failed merges",
        stats.cross_source_merges, stats.largest_group_size, stats.failed_merges
    );
    println!("{}", stats.matching.display_string());
    Ok(())
}

fn verify(input: &Path, config: &TomlConfig, output: PathBuf) -> Result<()> {
    let orchestrator = MergeOrchestrator::new(MergeSettings::from_config(config, output));
    let report = orchestrator.verify(input)?;

    if report.is_consistent() {
        println!("Provenance consistent");
        return Ok(());
    }

    println!(
        "missing: {:?}\nduplicated: {:?}\nunexpected: {:?}\nempty outputs: {}",
        report.missing, report.duplicated, report.unexpected, report.empty_outputs
    );
    bail!("Provenance verification failed")
}
