//! Start the HTTP service.

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::process::Command;

pub fn run(port: Option<u16>, host: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let mut cmd = Command::new("ecoscan-web");
    if let Some(port) = port {
        cmd.arg("--port").arg(port.to_string());
    }
    if let Some(host) = host {
        cmd.arg("--host").arg(host);
    }
    if let Some(path) = config {
        cmd.arg("--config").arg(path);
    }

    println!("{} Starting ecoscan-web...", "→".blue());
    let status = cmd.status().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow!("ecoscan-web binary not found. Install with: cargo install ecoscan-web")
        } else {
            anyhow!("Failed to start web server: {e}")
        }
    })?;
    std::process::exit(status.code().unwrap_or(1));
}
