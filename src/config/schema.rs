//! Configuration schema types for `tileview.toml`
//!
//! Every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::animation::DEFAULT_STEP_DELAY_MS;
use crate::composition::DEFAULT_MAX_LOGGED_FAILURES;

/// Animation playback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Delay after a step that carries none of its own
    #[serde(default = "default_delay_ms")]
    pub default_delay_ms: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { default_delay_ms: default_delay_ms() }
    }
}

fn default_delay_ms() -> u32 {
    DEFAULT_STEP_DELAY_MS
}

/// Map compositor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositorConfig {
    /// Draw failures logged per pass before the rest are only counted
    #[serde(default = "default_max_logged_failures")]
    pub max_logged_failures: usize,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self { max_logged_failures: default_max_logged_failures() }
    }
}

fn default_max_logged_failures() -> usize {
    DEFAULT_MAX_LOGGED_FAILURES
}

/// Tileset sheet settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilesetConfig {
    /// Column count when laying a tileset out as one sheet
    #[serde(default = "default_columns")]
    pub columns: u32,
}

impl Default for TilesetConfig {
    fn default() -> Self {
        Self { columns: default_columns() }
    }
}

fn default_columns() -> u32 {
    16
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub compositor: CompositorConfig,
    #[serde(default)]
    pub tileset: TilesetConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "tileset.columns")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tileview.toml: '{}' {}", self.field, self.message)
    }
}

impl RenderConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.animation.default_delay_ms == 0 {
            errors.push(ConfigValidationError {
                field: "animation.default_delay_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.tileset.columns == 0 {
            errors.push(ConfigValidationError {
                field: "tileset.columns".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }
}
