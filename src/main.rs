//! # Corpus Mill CLI (`cmill`)
//!
//! The `cmill` binary drives the extraction and merge pipeline.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cmill extract <input>` | Normalize a file or directory into a corpus |
//! | `cmill merge <inputs>...` | Concatenate corpora into one file |
//! | `cmill validate <corpus>` | Check required fields of every record |
//! | `cmill stats <corpus>` | Summarize a corpus file |
//!
//! ## Examples
//!
//! ```bash
//! # Normalize a directory of decks, PDFs, and Markdown
//! cmill extract ./docs --out ./out
//!
//! # Merge two extraction runs, bad inputs reported but skipped
//! cmill merge run1/search-index.json run2/search-index.json --out all.json
//!
//! # Inspect what was produced
//! cmill stats ./out/search-index.json
//! ```

mod assets;
mod config;
mod extract_md;
mod extract_pdf;
mod extract_pptx;
mod extractor;
#[allow(dead_code)]
mod index;
mod merge;
mod models;
mod pipeline;
mod serializer;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Corpus Mill — a multi-format document extraction and normalization
/// pipeline for search and RAG.
#[derive(Parser)]
#[command(
    name = "cmill",
    about = "Corpus Mill — normalize PPTX, PDF, and Markdown into one searchable corpus",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./cmill.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Extract a file or directory into a normalized corpus.
    ///
    /// Walks the input (when it is a directory), dispatches each
    /// candidate file to its format extractor, validates the records,
    /// and writes the corpus plus a media directory under `--out`.
    Extract {
        /// Source file or directory.
        input: PathBuf,

        /// Output root for the corpus file and media directory.
        #[arg(long, default_value = "./out")]
        out: PathBuf,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Merge multiple corpus files into one.
    ///
    /// Pure concatenation in argument order; a missing or corrupt
    /// input is reported and skipped, never aborting the merge.
    Merge {
        /// Corpus files to merge, in order.
        inputs: Vec<PathBuf>,

        /// Output corpus file.
        #[arg(long)]
        out: PathBuf,
    },

    /// Validate every record of a corpus file.
    Validate {
        /// Corpus file to check.
        corpus: PathBuf,
    },

    /// Summarize a corpus file: record, format, and asset counts.
    Stats {
        /// Corpus file to summarize.
        corpus: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Extract { input, out, limit } => {
            pipeline::run_extract(&config, &input, &out, limit)?;
        }
        Commands::Merge { inputs, out } => {
            run_merge(&inputs, &out)?;
        }
        Commands::Validate { corpus } => {
            run_validate(&corpus)?;
        }
        Commands::Stats { corpus } => {
            run_stats(&corpus)?;
        }
    }

    Ok(())
}

fn run_merge(inputs: &[PathBuf], out: &PathBuf) -> Result<()> {
    let report = merge::merge(inputs, out)?;
    println!("merge -> {}", out.display());
    for (input, count) in &report.loaded {
        println!("  loaded:  {} ({} records)", input.display(), count);
    }
    for (input, reason) in &report.failures {
        println!("  failed:  {} ({})", input.display(), reason);
    }
    if report.total > 0 {
        println!("  total:   {} records", report.total);
    } else {
        println!("  nothing merged, no file written");
    }
    println!("ok");
    Ok(())
}

fn run_validate(corpus: &PathBuf) -> Result<()> {
    let records = serializer::load(corpus)?;
    let mut invalid = 0usize;
    for record in &records {
        if let Err(e) = validate::validate(record) {
            invalid += 1;
            println!("  invalid record {} ({})", record.id, e);
        }
    }
    println!(
        "validate {} — {} records, {} invalid",
        corpus.display(),
        records.len(),
        invalid
    );
    Ok(())
}

fn run_stats(corpus: &PathBuf) -> Result<()> {
    let records = serializer::load(corpus)?;

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut images = 0usize;
    let mut audio = 0usize;
    let mut video = 0usize;
    for record in &records {
        *by_type.entry(record.file_type.to_string()).or_default() += 1;
        images += record.images.len();
        audio += record.audio_files.len();
        video += record.video_files.len();
    }

    println!("Corpus Mill — Corpus Stats");
    println!("==========================");
    println!();
    println!("  Corpus:    {}", corpus.display());
    println!("  Records:   {}", records.len());
    for (file_type, count) in &by_type {
        println!("    {:<6} {}", file_type, count);
    }
    println!();
    println!("  Images:    {}", images);
    println!("  Audio:     {}", audio);
    println!("  Video:     {}", video);
    Ok(())
}
