//! streamfold CLI
//!
//! Runs the mapper and reducer stages over JSON lines, outside the streaming
//! runtime. Envelopes go to stdout, logs go to stderr.

use clap::{Parser, Subcommand};
use colored::Colorize;
use streamfold_cli::commands::{CatalogArgs, MapArgs, ReduceArgs, RunArgs};
use streamfold_config::{LogFormat, ObservabilityConfig, StreamfoldConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "streamfold",
    version,
    about = "Run streamfold mapper and reducer stages over JSON lines",
    long_about = "Run the streamfold stages locally.\n\n\
                  Raw payloads are read one per line from stdin. Mapper and\n\
                  reducer output is written to stdout as envelope JSON lines."
)]
struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "STREAMFOLD_CONFIG",
        value_name = "FILE",
        help = "Path to configuration file"
    )]
    config: Option<std::path::PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mapper over raw payload lines
    #[command(name = "map")]
    Map(MapArgs),

    /// Run a reducer over one window of envelope lines
    #[command(name = "reduce")]
    Reduce(ReduceArgs),

    /// Map, window and reduce a batch of raw payload lines
    #[command(name = "run")]
    Run(RunArgs),

    /// Load a reference catalog and list its entities
    #[command(name = "catalog")]
    Catalog(CatalogArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = StreamfoldConfig::load(cli.config.clone())?;
    config.validate()?;

    init_tracing(cli.verbose, &config.observability);

    match &cli.command {
        Commands::Map(args) => args.execute(&config).await?,
        Commands::Reduce(args) => args.execute(&config).await?,
        Commands::Run(args) => args.execute(&config).await?,
        Commands::Catalog(args) => args.execute(&config).await?,
    }

    Ok(())
}

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over the configured level; `--verbose` raises it to debug.
fn init_tracing(verbose: bool, observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(&observability.log_level)
        }
    });

    let (pretty, json) = match observability.log_format {
        LogFormat::Pretty => (
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Json => (None, Some(fmt::layer().json().with_writer(std::io::stderr))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}
