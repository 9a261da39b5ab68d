//! Configuration loading and persistence.
//!
//! Reads and writes the peerlink configuration file as JSON under the
//! platform config directory. Missing file means defaults; CLI flags
//! override loaded values in `main`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// Configuration for the peerlink node.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Identity string stamped on outgoing messages.
    pub display_name: String,
    /// Port to listen on at startup; 0 disables listening until `/listen`.
    #[serde(default)]
    pub listen_port: u16,
    /// Outbound dial timeout in seconds.
    #[serde(default = "default_dial_timeout_secs")]
    pub dial_timeout_secs: u64,
}

fn default_dial_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_name: "anonymous".to_string(),
            listen_port: 0,
            dial_timeout_secs: default_dial_timeout_secs(),
        }
    }
}

impl Config {
    /// Path of the config file: `<config dir>/peerlink/config.json`.
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not determine config directory")?;
        Ok(base.join("peerlink").join("config.json"))
    }

    /// Load from the default path; defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path; defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Save to the default path, creating parent directories.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let config = Config {
            display_name: "alice".into(),
            listen_port: 7100,
            dial_timeout_secs: 5,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.display_name, "alice");
        assert_eq!(loaded.listen_port, 7100);
        assert_eq!(loaded.dial_timeout_secs, 5);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loaded = Config::load_from(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(loaded.display_name, "anonymous");
        assert_eq!(loaded.listen_port, 0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"display_name": "bob"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.display_name, "bob");
        assert_eq!(loaded.dial_timeout_secs, 10);
    }
}
