//! Configuration loading for payconn tools
//!
//! Configuration lives under `~/.config/payconn/` unless the
//! `PAYCONN_CONFIG_DIR` environment variable points somewhere else.
//! Persisted sync cursors are kept in a `state/` subdirectory of the same
//! root so a single directory captures everything a deployment needs.
//!
//! Call [`init`] at application startup to bootstrap both directories.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "PAYCONN_CONFIG_DIR";

const APP_DIR: &str = "payconn";
const STATE_DIR: &str = "state";

/// Initialize the config and state directories.
///
/// Returns the config directory. Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    let dir = ensure_config_dir()?;
    ensure_state_dir()?;
    Ok(dir)
}

/// Get the payconn config directory
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Get the directory holding persisted sync state
pub fn state_dir() -> Option<PathBuf> {
    config_dir().map(|p| p.join(STATE_DIR))
}

/// Get the path to a file within the config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    create_dir(&dir)
}

/// Ensure the state directory exists
pub fn ensure_state_dir() -> Result<PathBuf> {
    let dir = state_dir().context("Could not determine state directory")?;
    create_dir(&dir)
}

fn create_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Sample {
        name: String,
        page_size: usize,
    }

    #[test]
    fn test_state_dir_is_inside_config_dir() {
        let config = config_dir();
        let state = state_dir();
        assert!(config.is_some());
        assert_eq!(state, config.map(|p| p.join("state")));
    }

    #[test]
    fn test_config_path() {
        let path = config_path("connectors.json").unwrap();
        assert!(path.ends_with("connectors.json"));
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, r#"{"name": "dummy", "page_size": 40}"#).unwrap();

        let loaded: Sample = load_json_file(&path).unwrap();
        assert_eq!(
            loaded,
            Sample {
                name: "dummy".into(),
                page_size: 40,
            }
        );
    }

    #[test]
    fn test_load_invalid_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_json_file::<Sample>(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = load_json_file::<Sample>(Path::new("/nonexistent/payconn.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/payconn.json"));
    }
}
