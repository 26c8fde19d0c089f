use crate::fragments::FragmentIndex;
use apollo_compiler::{ast, Name, Node, Schema};
use graphql_syntax::EmbeddedDocument;
use graphql_types::OffsetRange;

/// A finding reported by a rule. Ranges are absolute in the parent file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    pub rule: &'static str,
    pub message: String,
    pub range: OffsetRange,
    pub suggestions: Vec<String>,
}

impl RuleDiagnostic {
    #[must_use]
    pub fn new(rule: &'static str, message: impl Into<String>, range: OffsetRange) -> Self {
        Self {
            rule,
            message: message.into(),
            range,
            suggestions: Vec::new(),
        }
    }

    /// Attach suggestions, appending a "Did you mean" hint to the message.
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        if let Some(hint) = crate::did_you_mean(&suggestions) {
            self.message.push(' ');
            self.message.push_str(&hint);
        }
        self.suggestions = suggestions;
        self
    }
}

/// What a rule gets to look at: one embedded document and the fragments
/// visible from it.
pub struct RuleContext<'a> {
    pub document: &'a EmbeddedDocument,
    pub ast: &'a ast::Document,
    pub fragments: &'a FragmentIndex,
}

impl RuleContext<'_> {
    /// Parent-file range of a node, falling back to the document start.
    #[must_use]
    pub fn node_range<T: ?Sized>(&self, node: &Node<T>) -> OffsetRange {
        self.document
            .node_range(node)
            .unwrap_or_else(|| OffsetRange::at(self.document.range.start))
    }

    #[must_use]
    pub fn name_range(&self, name: &Name) -> OffsetRange {
        self.document
            .name_range(name)
            .unwrap_or_else(|| OffsetRange::at(self.document.range.start))
    }
}

/// Base trait for all validation rules
pub trait ValidationRule: Send + Sync {
    /// Unique identifier, also used as the diagnostic code
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;
}

/// A rule that only needs the document itself
pub trait StandaloneDocumentRule: ValidationRule {
    fn check(&self, cx: &RuleContext<'_>) -> Vec<RuleDiagnostic>;
}

/// A rule that checks a document against the schema
pub trait DocumentSchemaRule: ValidationRule {
    fn check(&self, cx: &RuleContext<'_>, schema: &Schema) -> Vec<RuleDiagnostic>;
}
