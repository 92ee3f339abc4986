//! biomarker-kb CLI - convert biomarker data between JSON and TSV.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            source,
            target,
            config,
            chunk_size,
            metadata,
            metadata_cache,
            log_checkpoints,
            json,
        } => commands::convert::run(commands::convert::ConvertArgs {
            source,
            target,
            config,
            chunk_size,
            metadata,
            metadata_cache,
            log_checkpoints,
            json,
            verbose: cli.verbose,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise info, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "biomarker_kb=debug"
    } else {
        "biomarker_kb=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
