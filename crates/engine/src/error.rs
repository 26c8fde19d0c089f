use graphql_analysis::BuildOutcome;
use graphql_config::ConfigError;
use graphql_extract::ExtractError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid delimiters: {0}")]
    Delimiters(#[from] ExtractError),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("invalid options for preset '{preset}': {message}")]
    PresetOptions { preset: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema build {outcome:?} with {error_count} error(s)")]
    SchemaBuild {
        outcome: BuildOutcome,
        error_count: usize,
    },

    #[error(
        "global fragment '{name}' (global:{id}) is declared in both {} and {}",
        first.display(),
        second.display()
    )]
    FragmentCollision {
        name: String,
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A capability provider failed. Reported on the error channel and
/// excluded from the aggregated result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider '{provider}' failed: {message}")]
    Failed { provider: String, message: String },

    #[error("provider '{provider}' panicked: {message}")]
    Panicked { provider: String, message: String },
}

impl ProviderError {
    pub fn failed(provider: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
