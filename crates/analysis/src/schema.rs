//! Building the merged project schema.

use crate::{Diagnostic, DiagnosticCategory, Location};
use apollo_compiler::diagnostic::ToCliReport;
use apollo_compiler::parser::Parser;
use apollo_compiler::schema::SchemaBuilder;
use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::Schema;
use graphql_hir::scope::{SCOPE_DIRECTIVE, SCOPE_TAGS_ARGUMENT};
use graphql_syntax::{LineIndex, Parse};
use graphql_types::OffsetRange;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Source name of the definitions every schema starts with
pub const PRELUDE_SOURCE: &str = "<prelude>";

/// Definitions added to every schema
#[must_use]
pub fn prelude_sdl() -> String {
    format!("directive @{SCOPE_DIRECTIVE}({SCOPE_TAGS_ARGUMENT}: [String!]!) on FRAGMENT_DEFINITION\n")
}

/// A schema file as seen by the schema build
pub struct SchemaFile<'a> {
    pub path: &'a Arc<Path>,
    pub parse: &'a Parse,
    pub line_index: &'a LineIndex,
}

/// Extension SDL contributed by a preset
pub struct SchemaExtension<'a> {
    pub preset: &'a str,
    pub sdl: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOutcome {
    /// Built and validated
    Valid,
    /// Built but failed validation; the schema is still usable
    Invalid,
    /// Could not be built
    Failed,
}

/// Result of merging all schema files
#[derive(Debug, Clone)]
pub struct SchemaBuild {
    pub schema: Option<Arc<Schema>>,
    pub outcome: BuildOutcome,
    /// Diagnostics grouped by the schema file they point into
    pub diagnostics: HashMap<Arc<Path>, Vec<Diagnostic>>,
    /// Errors in preset extensions or without a location
    pub unattributed: Vec<String>,
}

impl SchemaBuild {
    /// Whether anything was reported
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty() || !self.unattributed.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.values().map(Vec::len).sum::<usize>() + self.unattributed.len()
    }
}

/// Merge the schema files and preset extensions into one schema.
///
/// Files contribute their already-parsed documents, so grammar errors are
/// reported once by the syntax layer and not again here. Documents whose
/// extraction failed contribute nothing.
#[must_use]
pub fn build_schema(files: &[SchemaFile<'_>], extensions: &[SchemaExtension<'_>]) -> SchemaBuild {
    let mut parser = Parser::new();
    let mut builder = SchemaBuilder::new();
    parser.parse_into_schema_builder(prelude_sdl(), PRELUDE_SOURCE, &mut builder);
    for extension in extensions {
        parser.parse_into_schema_builder(
            extension.sdl,
            format!("<preset:{}>", extension.preset),
            &mut builder,
        );
    }

    let mut sources = HashMap::new();
    for (file_index, file) in files.iter().enumerate() {
        for document in file.parse.documents() {
            let Some(ast) = &document.ast else {
                continue;
            };
            sources.insert(
                graphql_syntax::source_name(file.path, document.index),
                (file_index, document.index),
            );
            builder = builder.add_ast(ast);
        }
    }
    tracing::debug!(files = files.len(), extensions = extensions.len(), "building schema");

    let attribution = Attribution { files, sources };
    match builder.build() {
        Ok(schema) => match schema.validate() {
            Ok(valid) => SchemaBuild {
                schema: Some(Arc::new(valid.into_inner())),
                outcome: BuildOutcome::Valid,
                diagnostics: HashMap::new(),
                unattributed: Vec::new(),
            },
            Err(with_errors) => {
                tracing::warn!(
                    error_count = with_errors.errors.len(),
                    "schema validation errors found (schema still usable for document validation)"
                );
                let (diagnostics, unattributed) = attribution.collect(&with_errors.errors);
                SchemaBuild {
                    schema: Some(Arc::new(with_errors.partial)),
                    outcome: BuildOutcome::Invalid,
                    diagnostics,
                    unattributed,
                }
            }
        },
        Err(with_errors) => {
            tracing::warn!(
                error_count = with_errors.errors.len(),
                "failed to build schema"
            );
            let (diagnostics, unattributed) = attribution.collect(&with_errors.errors);
            SchemaBuild {
                schema: None,
                outcome: BuildOutcome::Failed,
                diagnostics,
                unattributed,
            }
        }
    }
}

struct Attribution<'f, 'a> {
    files: &'f [SchemaFile<'a>],
    /// Source name to (file, document)
    sources: HashMap<String, (usize, usize)>,
}

impl Attribution<'_, '_> {
    fn collect(&self, errors: &DiagnosticList) -> (HashMap<Arc<Path>, Vec<Diagnostic>>, Vec<String>) {
        let mut by_file: HashMap<Arc<Path>, Vec<Diagnostic>> = HashMap::new();
        let mut unattributed = Vec::new();

        for diagnostic in errors.iter() {
            let message = diagnostic.error.to_string();
            let target = diagnostic.error.location().and_then(|span| {
                let source = diagnostic.sources.get(&span.file_id())?;
                let name = source.path().to_string_lossy();
                let &(file_index, document_index) = self.sources.get(name.as_ref())?;
                Some((file_index, document_index, span))
            });

            let Some((file_index, document_index, span)) = target else {
                unattributed.push(message);
                continue;
            };
            let file = &self.files[file_index];
            let range = file.parse.document(document_index).map_or_else(
                || OffsetRange::new(span.offset(), span.end_offset()),
                |document| {
                    document.to_parent_range(OffsetRange::new(span.offset(), span.end_offset()))
                },
            );
            by_file.entry(Arc::clone(file.path)).or_default().push(
                Diagnostic::error(DiagnosticCategory::SchemaBuild, message)
                    .at(Location::new(file.path, file.line_index, range))
                    .in_document(document_index),
            );
        }
        (by_file, unattributed)
    }
}
