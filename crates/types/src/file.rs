//! File-related types: [`Language`], [`SourceKind`].

use std::path::Path;

/// Source language of a file (determines how GraphQL is found in it).
///
/// This is orthogonal to [`SourceKind`], which determines the semantic purpose
/// of the content (schema definitions vs. executable documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Raw GraphQL files (.graphql, .gql, .gqls). The whole file is one document.
    GraphQL,
    /// Any other file. GraphQL is located by the configured delimiters.
    Host,
}

impl Language {
    /// Detect language from a file path based on its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("graphql" | "gql" | "gqls") => Self::GraphQL,
            _ => Self::Host,
        }
    }

    /// Returns `true` when GraphQL has to be extracted from the file text.
    #[must_use]
    pub const fn requires_extraction(&self) -> bool {
        matches!(self, Self::Host)
    }
}

/// What a source file contributes to the project.
///
/// The kind is determined by the config (which glob pattern matched the file),
/// NOT by inspecting the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Type-system definitions, merged into the project schema.
    Schema,
    /// Operations and fragments, validated against the schema.
    Query,
}

impl SourceKind {
    /// Returns `true` if this is a schema source.
    #[must_use]
    pub const fn is_schema(self) -> bool {
        matches!(self, Self::Schema)
    }

    /// Returns `true` if this is a query source.
    #[must_use]
    pub const fn is_query(self) -> bool {
        matches!(self, Self::Query)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Query => write!(f, "query"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            Language::from_path(&PathBuf::from("schema.graphql")),
            Language::GraphQL
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("query.gql")),
            Language::GraphQL
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("schema.gqls")),
            Language::GraphQL
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("component.tsx")),
            Language::Host
        );
        assert_eq!(Language::from_path(&PathBuf::from("Makefile")), Language::Host);
    }

    #[test]
    fn test_requires_extraction() {
        assert!(!Language::GraphQL.requires_extraction());
        assert!(Language::Host.requires_extraction());
    }

    #[test]
    fn test_source_kind() {
        assert!(SourceKind::Schema.is_schema());
        assert!(!SourceKind::Schema.is_query());
        assert!(SourceKind::Query.is_query());
        assert_eq!(SourceKind::Query.to_string(), "query");
    }
}
