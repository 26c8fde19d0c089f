//! Delimiter configuration.

use crate::{ExtractError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default start delimiter: a `gql` or `graphql` tagged template literal.
pub const DEFAULT_START: &str = r"\b(?:gql|graphql)\s*`";
/// Default end delimiter: the closing backtick.
pub const DEFAULT_END: &str = "`";

/// How embedded GraphQL is delimited in host-language files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DelimiterConfig {
    /// Regular expression matching the text right before a GraphQL region
    pub start: String,
    /// Regular expression matching the text right after a GraphQL region
    pub end: String,
    /// Accept `fragment on Type { ... }` and give it a synthetic name
    pub allow_fragment_without_name: bool,
    /// Accept `${...}` where a fragment spread is expected
    pub allow_fragment_interpolation: bool,
    /// Accept `${...}` between top-level definitions
    pub allow_document_interpolation: bool,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
            allow_fragment_without_name: false,
            allow_fragment_interpolation: true,
            allow_document_interpolation: true,
        }
    }
}

/// A compiled [`DelimiterConfig`].
#[derive(Debug, Clone)]
pub struct Delimiters {
    pub(crate) start: Regex,
    pub(crate) end: Regex,
    config: DelimiterConfig,
}

impl Delimiters {
    /// Compile both patterns.
    ///
    /// Patterns that can match the empty string are rejected; the scanner
    /// relies on every match consuming at least one byte.
    pub fn compile(config: &DelimiterConfig) -> Result<Self> {
        Ok(Self {
            start: compile_pattern("start", &config.start)?,
            end: compile_pattern("end", &config.end)?,
            config: config.clone(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &DelimiterConfig {
        &self.config
    }
}

impl PartialEq for Delimiters {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl Eq for Delimiters {}

fn compile_pattern(which: &'static str, pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern).map_err(|e| ExtractError::InvalidPattern {
        which,
        message: e.to_string(),
    })?;
    if regex.is_match("") {
        return Err(ExtractError::EmptyPattern { which });
    }
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_compiles() {
        let delimiters = Delimiters::compile(&DelimiterConfig::default()).unwrap();
        assert!(delimiters.start.is_match("const q = gql`"));
        assert!(delimiters.start.is_match("graphql `"));
        assert!(!delimiters.start.is_match("mygql`"));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = DelimiterConfig {
            start: "(".to_string(),
            ..DelimiterConfig::default()
        };
        let err = Delimiters::compile(&config).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPattern { which: "start", .. }));
    }

    #[test]
    fn test_empty_matching_pattern_rejected() {
        let config = DelimiterConfig {
            end: "x*".to_string(),
            ..DelimiterConfig::default()
        };
        assert_eq!(
            Delimiters::compile(&config).unwrap_err(),
            ExtractError::EmptyPattern { which: "end" }
        );
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let config: DelimiterConfig =
            serde_json::from_str(r#"{ "start": "Relay\\.QL`", "allowFragmentWithoutName": true }"#)
                .unwrap();
        assert_eq!(config.start, "Relay\\.QL`");
        assert_eq!(config.end, DEFAULT_END);
        assert!(config.allow_fragment_without_name);
        assert!(config.allow_document_interpolation);
    }
}
