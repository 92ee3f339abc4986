//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// biomarker-kb: convert biomarker data between the JSON data model and TSV
#[derive(Parser)]
#[command(name = "biomarker-kb")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert JSON -> TSV or TSV -> JSON (direction from file extensions)
    Convert {
        /// Source file (.json or .tsv)
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Target file (.tsv or .json)
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// JSON configuration file (URL map, name space map, chunk size)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rows per flush (JSON -> TSV) or log checkpoint (TSV -> JSON)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Add synonym, condition and citation metadata (TSV -> JSON)
        #[arg(long)]
        metadata: bool,

        /// Metadata cache file used when --metadata is set
        #[arg(long, value_name = "FILE")]
        metadata_cache: Option<PathBuf>,

        /// Log progress at each checkpoint
        #[arg(long)]
        log_checkpoints: bool,

        /// Print the conversion report as JSON
        #[arg(long)]
        json: bool,
    },
}
