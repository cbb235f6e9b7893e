//! Loading `ecoscan.toml` for the server.

use anyhow::{Context, Result};
use ecoscan_core::{Settings, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Read settings from `path`, or from the nearest `ecoscan.toml` above the
/// current directory. Missing files fall back to defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let found = match path {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| find_config_file(&dir)),
    };
    let Some(path) = found else {
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

/// Find `ecoscan.toml` in `start` or any of its parents.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[server]\nport = 9100\n[pipeline]\nseed = 3\n").unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.pipeline.seed, 3);
    }

    #[test]
    fn parent_directories_are_searched() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();

        assert_eq!(
            find_config_file(&nested),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[pipeline]\ncontamination = 0.9\n").unwrap();
        assert!(load_settings(Some(&path)).is_err());

        std::fs::write(&path, "[server\n").unwrap();
        assert!(load_settings(Some(&path)).is_err());
    }
}
