//! Convert command - JSON <-> TSV conversion.

use std::path::PathBuf;

use biomarker_kb::enrich::{CachedLookup, JsonFileCache, MemoryCache, OfflineLookup};
use biomarker_kb::{ConversionConfig, ConversionReport, Converter, WarningKind, infer_direction};
use colored::Colorize;

pub struct ConvertArgs {
    pub source: PathBuf,
    pub target: PathBuf,
    pub config: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub metadata: bool,
    pub metadata_cache: Option<PathBuf>,
    pub log_checkpoints: bool,
    pub json: bool,
    pub verbose: bool,
}

pub fn run(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.source.is_file() {
        return Err(format!("Source file not found: {}", args.source.display()).into());
    }
    if let Some(parent) = args.target.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(format!("Target directory not found: {}", parent.display()).into());
        }
    }
    let direction = infer_direction(&args.source, &args.target)?;
    tracing::debug!(%direction, source = %args.source.display(), "Resolved conversion direction");

    let mut config = match &args.config {
        Some(path) => ConversionConfig::load(path)?,
        None => ConversionConfig::default(),
    };
    if let Some(chunk_size) = args.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    if args.metadata {
        config = config.with_metadata(true);
    }
    if args.log_checkpoints {
        config.log_checkpoints = true;
    }
    config.validate()?;

    if !args.json {
        println!(
            "{} {} {} {}",
            "Converting".cyan().bold(),
            args.source.display().to_string().white(),
            "->".dimmed(),
            args.target.display().to_string().white()
        );
    }

    let rate = config.requests_per_second;
    let mut converter = Converter::new(config);
    if args.metadata {
        tracing::debug!(cache = ?args.metadata_cache, "Metadata enrichment enabled");
        converter = match &args.metadata_cache {
            Some(path) => converter.with_lookup(
                CachedLookup::new(OfflineLookup, JsonFileCache::open(path)?).with_rate_limit(rate),
            ),
            None => converter
                .with_lookup(CachedLookup::new(OfflineLookup, MemoryCache::new()).with_rate_limit(rate)),
        };
    }

    let report = converter.convert(&args.source, &args.target)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, args.verbose);
        println!(
            "{} {} ({})",
            "Wrote".green().bold(),
            args.target.display().to_string().white(),
            direction
        );
    }

    Ok(())
}

fn print_summary(report: &ConversionReport, verbose: bool) {
    println!(
        "Converted {} records / {} rows",
        report.records.to_string().white().bold(),
        report.rows.to_string().white().bold()
    );
    if verbose {
        println!("Source hash: {}", report.source.hash.dimmed());
    }

    if report.warnings.is_empty() {
        return;
    }

    println!();
    println!("{}", "Warnings:".yellow().bold());
    let counts = report.warning_counts();
    let mut kinds: Vec<(WarningKind, usize)> = counts.into_iter().collect();
    kinds.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label().cmp(b.0.label())));
    for (kind, count) in kinds {
        println!("  {:28} {}", kind.label(), count.to_string().yellow());
    }

    if verbose {
        println!();
        for warning in &report.warnings {
            match warning.location {
                Some(at) => println!("  [{}] {}", at, warning.message),
                None => println!("  {}", warning.message),
            }
        }
    }
    println!();
}
