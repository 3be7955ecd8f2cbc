//! Configuration module for tileview
//!
//! Provides types and parsing for `tileview.toml` render configuration.

pub mod loader;
pub mod schema;

pub use loader::{find_config_from, load_config, ConfigError, CONFIG_FILE_NAME};
pub use schema::*;
