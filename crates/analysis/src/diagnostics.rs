use graphql_syntax::LineIndex;
use graphql_types::{DiagnosticSeverity, OffsetRange, Range};
use std::path::Path;
use std::sync::Arc;

/// What produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    /// Extraction, grammar and interpolation errors
    Syntax,
    /// A validation rule or a file kind mismatch
    Validation,
    /// The merged schema could not be built or is invalid
    SchemaBuild,
    /// Schema-dependent checks were skipped for lack of a schema
    DependencyUnavailable,
    /// Malformed or colliding fragment scopes
    Scope,
}

impl std::fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Syntax => "syntax",
            Self::Validation => "validation",
            Self::SchemaBuild => "schema-build",
            Self::DependencyUnavailable => "dependency-unavailable",
            Self::Scope => "scope",
        };
        f.write_str(name)
    }
}

/// A range in a file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: Arc<Path>,
    pub range: Range,
}

impl Location {
    /// Convert a byte range using the file's line index.
    #[must_use]
    pub fn new(path: &Arc<Path>, line_index: &LineIndex, range: OffsetRange) -> Self {
        Self {
            path: Arc::clone(path),
            range: Range::new(line_index.position(range.start), line_index.position(range.end)),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.range.start)
    }
}

/// A diagnostic attached to a file. Regenerated wholesale whenever the file
/// is revalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub locations: Vec<Location>,
    pub category: DiagnosticCategory,
    /// Rule name for validation diagnostics
    pub code: Option<String>,
    pub suggestions: Vec<String>,
    /// Embedded document the diagnostic belongs to
    pub document: Option<usize>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            locations: Vec::new(),
            category,
            code: None,
            suggestions: Vec::new(),
            document: None,
        }
    }

    #[must_use]
    pub fn warning(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(category, message)
        }
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    #[must_use]
    pub const fn in_document(mut self, document: usize) -> Self {
        self.document = Some(document);
        self
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.severity.is_error()
    }

    /// The first location, if any
    #[must_use]
    pub fn primary_location(&self) -> Option<&Location> {
        self.locations.first()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(location) = self.primary_location() {
            write!(f, "{location}: ")?;
        }
        write!(f, "{} [{}", self.severity, self.category)?;
        if let Some(code) = &self.code {
            write!(f, "/{code}")?;
        }
        write!(f, "] {}", self.message)
    }
}
