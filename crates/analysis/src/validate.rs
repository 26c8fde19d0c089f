use crate::{Diagnostic, DiagnosticCategory, Location};
use apollo_compiler::{ast, Node, Schema};
use graphql_hir::FileStructure;
use graphql_rules::{FragmentIndex, RuleContext, RuleSet};
use graphql_syntax::{LineIndex, Parse, ParseErrorKind};
use graphql_types::{OffsetRange, SourceKind};
use std::path::Path;
use std::sync::Arc;

/// Everything known about one file that validation reads
pub struct FileInput<'a> {
    pub path: &'a Arc<Path>,
    pub kind: SourceKind,
    pub parse: &'a Parse,
    pub structure: &'a FileStructure,
    pub line_index: &'a LineIndex,
}

impl FileInput<'_> {
    fn location(&self, range: OffsetRange) -> Location {
        Location::new(self.path, self.line_index, range)
    }
}

/// Fragment definitions of a parsed file with the document declaring them.
pub fn fragment_definitions(
    parse: &Parse,
) -> impl Iterator<Item = (usize, &Node<ast::FragmentDefinition>)> {
    parse.documents().flat_map(|document| {
        document
            .ast
            .iter()
            .flat_map(|ast| ast.definitions.iter())
            .filter_map(move |definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => Some((document.index, fragment)),
                _ => None,
            })
    })
}

/// Index of the fragments visible from a file: its own, then `globals`.
pub fn fragment_index(
    parse: &Parse,
    globals: impl IntoIterator<Item = Node<ast::FragmentDefinition>>,
) -> FragmentIndex {
    let mut index = FragmentIndex::new();
    for (document, fragment) in fragment_definitions(parse) {
        index.add_local(document, fragment.clone());
    }
    for fragment in globals {
        index.add_global(fragment);
    }
    index
}

/// Diagnostics owned by the file itself: syntax errors, a kind mismatch and
/// malformed scope declarations.
#[must_use]
pub fn file_diagnostics(input: &FileInput<'_>) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = input
        .parse
        .errors()
        .iter()
        .map(|error| {
            let code = match error.kind {
                ParseErrorKind::Extraction => "extraction",
                ParseErrorKind::Grammar => "grammar",
                ParseErrorKind::Interpolation => "interpolation",
            };
            let mut diagnostic = Diagnostic::error(DiagnosticCategory::Syntax, &error.message)
                .with_code(code)
                .at(input.location(error.range));
            diagnostic.document = input
                .parse
                .document_at(error.range.start)
                .map(|document| document.index);
            diagnostic
        })
        .collect();

    if let Some(mismatch) = input.parse.mismatch() {
        let start = input
            .parse
            .documents()
            .next()
            .map_or(0, |document| document.range.start);
        diagnostics.push(
            Diagnostic::warning(DiagnosticCategory::Validation, mismatch.message())
                .with_code("content_mismatch")
                .at(input.location(OffsetRange::at(start))),
        );
    }

    diagnostics.extend(input.structure.scope_errors.iter().map(|error| {
        Diagnostic::error(DiagnosticCategory::Scope, &error.message)
            .with_code("scope")
            .at(input.location(error.range))
    }));
    diagnostics
}

/// Validate every query document of a file with the composed rules.
///
/// Documents with syntax errors are not checked further. Without a schema,
/// rules needing one are skipped and a single dependency diagnostic says so.
#[must_use]
pub fn validate_file(
    input: &FileInput<'_>,
    rules: &RuleSet,
    fragments: &FragmentIndex,
    schema: Option<&Schema>,
) -> Vec<Diagnostic> {
    let mut diagnostics = file_diagnostics(input);
    if input.kind.is_schema() {
        return diagnostics;
    }

    let mut checked_any = false;
    for document in input.parse.documents() {
        let Some(ast) = document.ast.as_deref() else {
            continue;
        };
        let has_errors = input
            .parse
            .errors()
            .iter()
            .any(|error| document.range.contains(error.range.start));
        if has_errors || ast.definitions.is_empty() {
            continue;
        }
        checked_any = true;

        let cx = RuleContext {
            document,
            ast,
            fragments,
        };
        diagnostics.extend(rules.check(&cx, schema).into_iter().map(|found| {
            Diagnostic::error(DiagnosticCategory::Validation, found.message)
                .with_code(found.rule)
                .with_suggestions(found.suggestions)
                .at(input.location(found.range))
                .in_document(document.index)
        }));
    }

    if checked_any && schema.is_none() && rules.iter().any(|(_, rule)| rule.needs_schema()) {
        let start = input
            .parse
            .documents()
            .next()
            .map_or(0, |document| document.range.start);
        diagnostics.push(
            Diagnostic::error(
                DiagnosticCategory::DependencyUnavailable,
                "No schema is available; checks that need the schema were skipped",
            )
            .at(input.location(OffsetRange::at(start))),
        );
    }

    tracing::debug!(
        path = %input.path.display(),
        diagnostics = diagnostics.len(),
        "validated file"
    );
    diagnostics
}
