use crate::{ConfigError, Result};
use graphql_extract::DelimiterConfig;
use graphql_types::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for a single GraphQL project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Schema file globs
    pub schema: PatternList,

    /// Query file globs, each group with its own presets
    #[serde(default)]
    pub documents: Vec<DocumentGroup>,

    /// File patterns to exclude
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Delimiters used for host-language files that don't override them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiters: Option<DelimiterConfig>,

    /// Per-preset options, keyed by preset name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub preset_options: HashMap<String, serde_json::Value>,
}

/// One or more glob patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternList {
    /// Single pattern
    Pattern(String),
    /// Multiple patterns
    Patterns(Vec<String>),
}

impl PatternList {
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::Pattern(pattern) => vec![pattern.as_str()],
            Self::Patterns(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}

/// A set of query files sharing presets and delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentGroup {
    pub include: PatternList,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiters: Option<DelimiterConfig>,
}

/// What the config says about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClass {
    pub kind: SourceKind,
    /// Presets in application order
    pub presets: Vec<String>,
    pub delimiters: DelimiterConfig,
}

impl ProjectConfig {
    /// A project with schema globs and a single document group.
    #[must_use]
    pub fn new(schema: &[&str], documents: &[&str], presets: &[&str]) -> Self {
        Self {
            schema: PatternList::Patterns(schema.iter().map(ToString::to_string).collect()),
            documents: vec![DocumentGroup {
                include: PatternList::Patterns(
                    documents.iter().map(ToString::to_string).collect(),
                ),
                presets: presets.iter().map(ToString::to_string).collect(),
                delimiters: None,
            }],
            exclude: Vec::new(),
            delimiters: None,
            preset_options: HashMap::new(),
        }
    }

    /// Every preset named by any document group, first appearance first.
    #[must_use]
    pub fn all_presets(&self) -> Vec<String> {
        let mut presets: Vec<String> = Vec::new();
        for group in &self.documents {
            for preset in &group.presets {
                if !presets.contains(preset) {
                    presets.push(preset.clone());
                }
            }
        }
        presets
    }

    #[must_use]
    pub fn preset_options(&self, preset: &str) -> Option<&serde_json::Value> {
        self.preset_options.get(preset)
    }

    /// Classify a file by the first pattern it matches.
    ///
    /// Excludes win over everything; schema globs are checked before document
    /// groups, and document groups in order. Schema files carry every preset
    /// of the project because preset schema extensions apply project-wide.
    #[must_use]
    pub fn classify(&self, path: &Path, root: &Path) -> Option<FileClass> {
        let rel_path = path.strip_prefix(root).unwrap_or(path);
        let rel_path_str = rel_path.to_string_lossy();

        if self
            .exclude
            .iter()
            .any(|pattern| matches_pattern(pattern, &rel_path_str))
        {
            tracing::trace!(path = %rel_path_str, "excluded");
            return None;
        }

        let project_delimiters = self.delimiters.clone().unwrap_or_default();

        if self
            .schema
            .patterns()
            .into_iter()
            .any(|pattern| matches_pattern(pattern, &rel_path_str))
        {
            return Some(FileClass {
                kind: SourceKind::Schema,
                presets: self.all_presets(),
                delimiters: project_delimiters,
            });
        }

        self.documents
            .iter()
            .find(|group| {
                group
                    .include
                    .patterns()
                    .into_iter()
                    .any(|pattern| matches_pattern(pattern, &rel_path_str))
            })
            .map(|group| FileClass {
                kind: SourceKind::Query,
                presets: group.presets.clone(),
                delimiters: group
                    .delimiters
                    .clone()
                    .unwrap_or_else(|| project_delimiters.clone()),
            })
    }

    /// Check that every pattern is present and compiles.
    pub fn validate(&self) -> Result<()> {
        let schema = self.schema.patterns();
        if schema.is_empty() {
            return Err(ConfigError::Empty("schema configuration has no patterns"));
        }
        let documents = self.documents.iter().flat_map(|group| group.include.patterns());
        for pattern in schema
            .iter()
            .copied()
            .chain(documents)
            .chain(self.exclude.iter().map(String::as_str))
        {
            if pattern.trim().is_empty() {
                return Err(ConfigError::Empty("empty glob pattern"));
            }
            for expanded in expand_braces(pattern) {
                glob::Pattern::new(&expanded).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

fn matches_pattern(pattern: &str, rel_path: &str) -> bool {
    expand_braces(pattern).iter().any(|expanded| {
        glob::Pattern::new(expanded).is_ok_and(|glob_pattern| glob_pattern.matches(rel_path))
    })
}

/// Normalize a glob pattern for consistent matching
///
/// Handles:
/// - Leading "./" prefix (removes it)
/// - Leading "/" prefix (removes it - patterns are relative to the root)
/// - Consecutive slashes (collapses to single slash)
fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = pattern.strip_prefix("./").unwrap_or(pattern);
    normalized = normalized.strip_prefix('/').unwrap_or(normalized);
    let mut normalized = normalized.to_string();
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    normalized
}

/// Expand brace patterns like "src/**/*.{ts,tsx}" into separate patterns
fn expand_braces(pattern: &str) -> Vec<String> {
    let normalized = normalize_pattern(pattern);

    // Simple brace expansion - handles single brace group
    if let (Some(start), Some(end)) = (normalized.find('{'), normalized.find('}')) {
        if start < end {
            let before = &normalized[..start];
            let after = &normalized[end + 1..];
            return normalized[start + 1..end]
                .split(',')
                .map(|opt| format!("{}{}{}", before, opt.trim(), after))
                .collect();
        }
    }

    vec![normalized]
}
