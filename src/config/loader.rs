//! Configuration loading and discovery for `tileview.toml`

use super::schema::RenderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`find_config_from`].
pub const CONFIG_FILE_NAME: &str = "tileview.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse tileview.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Find tileview.toml by walking up from `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate configuration from a file.
///
/// # Example
/// ```ignore
/// let config = load_config(Path::new("tileview.toml"))?;
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config = RenderConfig::from_toml_str(&contents)?;
    tracing::debug!(path = %path.display(), "loaded render config");
    Ok(config)
}

impl RenderConfig {
    /// Parse and validate configuration text.
    pub fn from_toml_str(contents: &str) -> Result<RenderConfig, ConfigError> {
        let config: RenderConfig = toml::from_str(contents)?;

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
        }

        Ok(config)
    }
}
