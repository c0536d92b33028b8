//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use zenith::{ZenithError, config::AppConfig};

/// Local configuration path, relative to the working directory.
const LOCAL_CONFIG: &str = "zenith/config.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for ZenithError {
    fn from(err: ConfigError) -> Self {
        ZenithError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (zenith/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ZenithError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "zenith", "zenith") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ZenithError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use zenith::config::{CheckLevel, OutputFormat};

    use super::*;

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[parser]\nduplicate_definitions = \"error\"\n\n[output]\nformat = \"tokens\"\npositions = true\n",
        )
        .expect("Failed to write config");

        let config = load_config(Some(&path)).expect("Failed to load config");

        assert_eq!(config.parser().duplicate_definitions(), CheckLevel::Error);
        assert_eq!(config.output().format(), OutputFormat::Tokens);
        assert!(config.output().positions());
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempdir().expect("Failed to create temp directory");
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();

        match err {
            ZenithError::Config(message) => {
                assert!(message.starts_with("Missing configuration file"));
            }
            other => panic!("Expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output]\nformat = \"json\"\n").expect("Failed to write config");

        assert!(matches!(
            load_config(Some(&path)),
            Err(ZenithError::Config(_))
        ));
    }
}
