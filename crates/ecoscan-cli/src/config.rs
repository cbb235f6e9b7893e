//! Configuration management for the EcoScan CLI.

use anyhow::{Context, Result};
use ecoscan::core::{Settings, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Load settings from ecoscan.toml in the current or parent directories.
pub fn load() -> Result<Settings> {
    let start = std::env::current_dir().context("Failed to read current directory")?;
    load_from(&start)
}

/// Load settings from the nearest ecoscan.toml at or above `start`.
pub fn load_from(start: &Path) -> Result<Settings> {
    let Some(path) = find_config_file(start) else {
        return Ok(Settings::default());
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(settings)
}

/// Save settings to the specified path.
pub fn save(settings: &Settings, path: &Path) -> Result<()> {
    let content = default_header() + &to_toml(settings)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

/// Serialize settings as TOML.
pub fn to_toml(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to serialize config")
}

fn default_header() -> String {
    "# EcoScan configuration\n\
     # [pipeline] tunes the analysis, [server] the ecoscan-web service.\n\n"
        .to_string()
}

/// Find ecoscan.toml in `start` or its parent directories.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_from(dir.path()).unwrap(), Settings::default());
    }

    #[test]
    fn saved_settings_load_back_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.pipeline.contamination = 0.05;
        settings.server.port = 8123;
        save(&settings, &dir.path().join(CONFIG_FILE_NAME)).unwrap();

        let nested = dir.path().join("runs").join("2024");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(load_from(&nested).unwrap(), settings);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[pipeline]\nn_trees = 0\n").unwrap();
        assert!(load_from(dir.path()).is_err());
    }
}
