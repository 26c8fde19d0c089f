//! Project configuration for the GraphQL engine.
//!
//! The engine consumes only the normalized [`ProjectConfig`]: schema globs,
//! document groups with their preset lists and delimiters, excludes, and
//! per-preset options. How a host obtains it is up to the host; a JSON
//! loader is provided for the command-line adapter.

mod config;
mod loader;

pub use config::{DocumentGroup, FileClass, PatternList, ProjectConfig};
pub use graphql_extract::DelimiterConfig;
pub use loader::{find_config, load_config, load_config_from_str};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config at {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{0}")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
