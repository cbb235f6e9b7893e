//! Generate a synthetic demo batch.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use ecoscan::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn run(
    samples: usize,
    output: &Path,
    seed: u64,
    anomaly_rate: f64,
    labels: bool,
) -> Result<()> {
    if samples == 0 {
        bail!("Sample count must be at least 1");
    }
    if !(0.0..=1.0).contains(&anomaly_rate) {
        bail!("Anomaly rate must be between 0 and 1, got {anomaly_rate}");
    }

    let config = SyntheticConfig::default()
        .with_samples(samples)
        .with_seed(seed)
        .with_anomaly_rate(anomaly_rate)
        .with_labels(labels);

    println!(
        "{} Generating {} samples (seed {})...",
        "→".blue(),
        samples.to_string().cyan(),
        seed
    );

    let batch = generate(&config);
    let unknown = batch.iter().filter(|s| s.is_unknown()).count();
    let records: Vec<Record> = batch.iter().map(|s| s.to_record(labels)).collect();

    let file =
        File::create(output).with_context(|| format!("Failed to create: {}", output.display()))?;
    write_table(&records, BufWriter::new(file)).context("Failed to write CSV")?;

    println!(
        "  {} {} known, {} random",
        "✓".green(),
        samples - unknown,
        unknown.to_string().yellow()
    );
    println!();
    println!("{} Wrote {}", "✓".green().bold(), output.display());
    println!();
    println!("Next: {} ecoscan analyze {}", "→".blue(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::analyze::read_batch;

    #[test]
    fn writes_readable_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edna_data.csv");
        run(25, &path, 7, 0.2, true).unwrap();

        let records = read_batch(&path).unwrap();
        assert_eq!(records.len(), 25);
        let columns: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(
            columns,
            ["Sequence", "Location", "Latitude", "Longitude", "Species"]
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        assert!(run(0, &path, 1, 0.1, false).is_err());
        assert!(run(10, &path, 1, 1.5, false).is_err());
        assert!(!path.exists());
    }
}
