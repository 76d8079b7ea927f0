//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// TOML configuration file contents (`~/.config/wavedeck/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder containing the audio working set
    pub root_folder: Option<String>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset (e.g. "info")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        info!("Root folder from command line: {}", path);
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            info!("Root folder from {}: {}", env_var_name, path);
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = default_config_path() {
        if let Ok(config) = load_toml_config(&config_path) {
            if let Some(root_folder) = config.root_folder {
                info!(
                    "Root folder from {}: {}",
                    config_path.display(),
                    root_folder
                );
                return PathBuf::from(root_folder);
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    let fallback = default_root_folder();
    info!("Root folder defaulted to {}", fallback.display());
    fallback
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir()
        .map(|d| d.join("wavedeck").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if user_config.exists() {
        return Ok(user_config);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/wavedeck/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config(format!(
        "Config file not found: {}",
        user_config.display()
    )))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("wavedeck"))
        .unwrap_or_else(|| PathBuf::from("./wavedeck_data"))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write a TOML config file, creating parent directories as needed.
///
/// Writes to a temporary sibling and renames so a crash mid-write cannot
/// leave a half-written config behind.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = TomlConfig {
            root_folder: Some("/srv/audio".to_string()),
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
        };

        write_toml_config(&config, &path).unwrap();
        let loaded = load_toml_config(&path).unwrap();

        assert_eq!(loaded.root_folder.as_deref(), Some("/srv/audio"));
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn missing_logging_section_defaults_to_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "root_folder = \"/tmp/x\"\n").unwrap();

        let loaded = load_toml_config(&path).unwrap();
        assert_eq!(loaded.logging.level, "info");
    }

    #[test]
    fn cli_argument_wins_over_environment() {
        std::env::set_var("WAVEDECK_TEST_ROOT", "/from/env");
        let resolved = resolve_root_folder(Some("/from/cli"), "WAVEDECK_TEST_ROOT");
        std::env::remove_var("WAVEDECK_TEST_ROOT");

        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }
}
