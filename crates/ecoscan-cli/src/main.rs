//! EcoScan CLI - screen eDNA batches from the command line.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::analyze::{OutputFormat, Overrides};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ecoscan")]
#[command(author, version, about = "EcoScan - find unknown organisms in eDNA samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default ecoscan.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Analyze a CSV batch of samples
    Analyze {
        /// CSV file with a Sequence column
        input: PathBuf,

        /// Where to write results (default: <input>_results.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Expected fraction of new organisms
        #[arg(long)]
        contamination: Option<f64>,

        /// Number of isolation trees
        #[arg(long)]
        trees: Option<usize>,

        /// Random seed for the forest
        #[arg(long)]
        seed: Option<u64>,

        /// k-mer length
        #[arg(long)]
        kmer: Option<usize>,

        /// Flagged samples to list in the summary
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Generate a synthetic demo batch
    Generate {
        /// Number of samples
        #[arg(short = 'n', long, default_value = "200")]
        samples: usize,

        /// Output CSV path
        #[arg(short, long, default_value = "edna_data.csv")]
        output: PathBuf,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Probability that a sample is a random sequence
        #[arg(long, default_value = "0.1")]
        anomaly_rate: f64,

        /// Include a Species ground-truth column
        #[arg(long)]
        labels: bool,
    },

    /// Start the HTTP service (delegates to the ecoscan-web binary)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Path to ecoscan.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Analyze {
            input,
            output,
            format,
            contamination,
            trees,
            seed,
            kmer,
            top,
        } => {
            let overrides = Overrides {
                contamination,
                trees,
                seed,
                kmer,
            };
            commands::analyze::run(&input, output, format, &overrides, top)
        }
        Commands::Generate {
            samples,
            output,
            seed,
            anomaly_rate,
            labels,
        } => commands::generate::run(samples, &output, seed, anomaly_rate, labels),
        Commands::Serve { port, host, config } => commands::serve::run(port, host, config),
    }
}
