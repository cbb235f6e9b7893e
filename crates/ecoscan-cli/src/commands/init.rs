//! Initialize an EcoScan project directory.

use anyhow::{Context, Result};
use colored::Colorize;
use ecoscan::core::{Settings, CONFIG_FILE_NAME};
use std::path::PathBuf;

use crate::config;

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing EcoScan project...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    let config_path = base_path.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        config::save(&Settings::default(), &config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    println!();
    println!("{} EcoScan project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} ecoscan generate", "1.".blue());
    println!("  {} ecoscan analyze edna_data.csv", "2.".blue());
    println!("  {} ecoscan serve", "3.".blue());

    Ok(())
}
