//! Analyze a CSV batch and write the annotated results.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use ecoscan::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::config;

/// Result file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Command-line values that take precedence over ecoscan.toml.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub contamination: Option<f64>,
    pub trees: Option<usize>,
    pub seed: Option<u64>,
    pub kmer: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(contamination) = self.contamination {
            config.contamination = contamination;
        }
        if let Some(trees) = self.trees {
            config.n_trees = trees;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(kmer) = self.kmer {
            config.kmer_size = kmer;
        }
        config
    }
}

pub fn run(
    input: &Path,
    output: Option<PathBuf>,
    format: OutputFormat,
    overrides: &Overrides,
    top: usize,
) -> Result<()> {
    if !input.exists() {
        bail!("File does not exist: {}", input.display());
    }

    let settings = config::load()?;
    let pipeline_config = overrides.apply(settings.pipeline);
    debug!(?pipeline_config, "resolved pipeline config");

    println!("{} Reading {}...", "→".blue(), input.display());
    let records = read_batch(input)?;
    println!(
        "  {} {} samples",
        "✓".green(),
        records.len().to_string().cyan()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid progress template")?,
    );
    spinner.set_message(format!(
        "Screening with {} trees...",
        pipeline_config.n_trees
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let analysis = Pipeline::new(pipeline_config)
        .and_then(|pipeline| pipeline.run_with_summary(&records));
    spinner.finish_and_clear();
    let analysis = analysis.with_context(|| format!("Analysis of {} failed", input.display()))?;

    let output = output.unwrap_or_else(|| default_output_path(input, format));
    write_results(&analysis.rows, &output, format)?;

    print_summary(&analysis, top);
    println!();
    println!(
        "{} Results written to {}",
        "✓".green().bold(),
        output.display().to_string().cyan()
    );

    Ok(())
}

/// Read and parse a CSV file, tolerating non-UTF-8 input.
pub fn read_batch(path: &Path) -> Result<Vec<Record>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    let (text, encoding) = decode_text(&bytes);
    if encoding == TextEncoding::Latin1 {
        println!(
            "  {} {} is not UTF-8, decoded as Latin-1",
            "•".yellow(),
            path.display()
        );
    }
    read_records(&text).with_context(|| format!("Failed to parse CSV: {}", path.display()))
}

/// Write results as JSON or CSV.
pub fn write_results(rows: &[ResultRow], path: &Path, format: OutputFormat) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    let writer = BufWriter::new(file);
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(writer, rows).context("Failed to write JSON")?
        }
        OutputFormat::Csv => write_records(rows, writer).context("Failed to write CSV")?,
    }
    Ok(())
}

fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "ecoscan".to_string());
    input.with_file_name(format!("{stem}_results.{}", format.extension()))
}

fn print_summary(analysis: &Analysis, top: usize) {
    let summary = &analysis.summary;
    println!();
    println!("{}", "Analysis Summary".bold());
    println!("  Samples:        {}", summary.samples);
    println!("  k-mer features: {}", summary.features);
    if summary.empty_rows > 0 {
        println!(
            "  {} {} sequence(s) shorter than k",
            "!".yellow(),
            summary.empty_rows
        );
    }
    println!(
        "  New organisms:  {} ({:.1}%)",
        summary.flagged.to_string().red().bold(),
        summary.flagged_rate() * 100.0
    );
    println!("  Threshold:      {:.4}", summary.offset);
    println!(
        "  Map variance:   {:.1}% / {:.1}%",
        summary.explained_variance_ratio[0] * 100.0,
        summary.explained_variance_ratio[1] * 100.0
    );

    let mut flagged: Vec<(usize, &ResultRow)> = analysis
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.status().is_anomaly())
        .collect();
    if flagged.is_empty() || top == 0 {
        return;
    }
    flagged.sort_by(|a, b| a.1.confidence().total_cmp(&b.1.confidence()));

    println!();
    println!("{}", "Most anomalous samples".bold());
    for (index, row) in flagged.iter().take(top) {
        let location = row
            .get("Location")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} row {:<5} {:>8.4}  {}  ({:.2}, {:.2})",
            "!".red().bold(),
            index + 1,
            row.confidence(),
            location,
            row.projection().x,
            row.projection().y
        );
    }
}
