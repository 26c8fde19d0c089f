//! # GraphQL Syntax Parsing
//!
//! This crate provides unified parsing for GraphQL documents, whether from pure
//! `.graphql` files or embedded in other source files.
//!
//! ## Unified Document Model
//!
//! All GraphQL content is represented as [`EmbeddedDocument`]s: discrete GraphQL
//! documents with an offset map back into the parent file. Pure GraphQL files
//! have a single document spanning the whole file, while host-language files
//! may have any number of documents found by the configured delimiters.
//!
//! Every position this crate reports is an absolute byte offset in the parent
//! file. GraphQL line 1 is not file line 1.

use apollo_compiler::ast;
use apollo_compiler::diagnostic::ToCliReport;
use apollo_compiler::parser::Parser;
use graphql_base_db::{FileContent, FileMetadata, SourceKind};
use graphql_extract::{EmbeddedCandidate, Interpolation, InterpolationKind, OffsetMap};
use graphql_types::{OffsetRange, Position};
use std::sync::Arc;

/// What went wrong while turning text into an AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The extractor rejected the region
    Extraction,
    /// The GraphQL grammar rejected the text
    Grammar,
    /// A placeholder was substituted into a position where it isn't a
    /// complete fragment spread or a complete definition
    Interpolation,
}

/// A parse error with position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Error message
    pub message: String,
    /// Absolute byte range in the parent file
    pub range: OffsetRange,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.range.start)
    }
}

/// A GraphQL document located inside a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDocument {
    /// Position among the documents of the parent file
    pub index: usize,
    /// The extracted GraphQL source, stand-ins substituted
    pub source: Arc<str>,
    /// The parsed AST. `None` when extraction failed for this region.
    pub ast: Option<Arc<ast::Document>>,
    /// Span of the GraphQL body in the parent file
    pub range: OffsetRange,
    pub offset_map: OffsetMap,
    pub interpolations: Vec<Interpolation>,
}

impl EmbeddedDocument {
    /// Parent-file offset for an offset in [`Self::source`].
    #[must_use]
    pub fn to_parent(&self, offset: usize) -> usize {
        self.offset_map.to_parent(offset)
    }

    #[must_use]
    pub fn to_parent_range(&self, range: OffsetRange) -> OffsetRange {
        let start = self.to_parent(range.start);
        let end = self.to_parent(range.end).max(start);
        OffsetRange::new(start, end)
    }

    /// Offset in [`Self::source`] for a parent-file offset inside this document.
    #[must_use]
    pub fn to_local(&self, parent_offset: usize) -> Option<usize> {
        if parent_offset < self.range.start || parent_offset > self.range.end {
            return None;
        }
        self.offset_map.to_graphql(parent_offset)
    }

    /// Parent-file range of an AST node.
    #[must_use]
    pub fn node_range<T: ?Sized>(&self, node: &apollo_compiler::Node<T>) -> Option<OffsetRange> {
        node.location()
            .map(|span| self.to_parent_range(OffsetRange::new(span.offset(), span.end_offset())))
    }

    /// Parent-file range of a name.
    #[must_use]
    pub fn name_range(&self, name: &apollo_compiler::Name) -> Option<OffsetRange> {
        name.location()
            .map(|span| self.to_parent_range(OffsetRange::new(span.offset(), span.end_offset())))
    }

    /// Whether `name` is a stand-in substituted for a fragment placeholder.
    #[must_use]
    pub fn is_stand_in(&self, name: &str) -> bool {
        self.interpolations
            .iter()
            .any(|interpolation| interpolation.stand_in.as_deref() == Some(name))
    }
}

/// Result of parsing a file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parse {
    documents: Vec<EmbeddedDocument>,
    /// Extraction, grammar and interpolation errors
    errors: Vec<ParseError>,
    mismatch: Option<ContentMismatch>,
}

impl Parse {
    /// All GraphQL documents in this file, in source order.
    pub fn documents(&self) -> impl Iterator<Item = &EmbeddedDocument> {
        self.documents.iter()
    }

    #[must_use]
    pub fn document(&self, index: usize) -> Option<&EmbeddedDocument> {
        self.documents.get(index)
    }

    /// The document containing a parent-file offset.
    #[must_use]
    pub fn document_at(&self, offset: usize) -> Option<&EmbeddedDocument> {
        self.documents
            .iter()
            .find(|doc| doc.range.start <= offset && offset <= doc.range.end)
    }

    /// Returns the number of GraphQL documents in this file.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if there are no GraphQL documents (e.g. a host file without any region).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns the parse errors.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Returns true if there were any parse errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Definitions that don't belong in a file of this kind.
    #[must_use]
    pub const fn mismatch(&self) -> Option<&ContentMismatch> {
        self.mismatch.as_ref()
    }
}

/// Parse a file into its embedded documents
/// This is the foundation - all semantic analysis builds on this
#[salsa::tracked]
pub fn parse(
    db: &dyn GraphQLSyntaxDatabase,
    content: FileContent,
    metadata: FileMetadata,
) -> Parse {
    let text = content.text(db);
    let path = metadata.path(db);

    let candidates: Vec<EmbeddedCandidate> = if metadata.requires_extraction(db) {
        let delimiters = metadata.delimiters(db);
        graphql_extract::extract(&text, &delimiters).collect()
    } else {
        vec![EmbeddedCandidate::whole_file(&text)]
    };

    tracing::debug!(
        path = %path.display(),
        documents = candidates.len(),
        "parsing file"
    );

    let mut parse = Parse::default();
    for (index, candidate) in candidates.into_iter().enumerate() {
        let (document, errors) = parse_candidate(index, candidate, &source_name(&path, index));
        parse.documents.push(document);
        parse.errors.extend(errors);
    }
    parse.mismatch = validate_content_matches_kind(&parse.documents, metadata.kind(db));
    parse
}

/// Name under which an embedded document's source is registered with the
/// GraphQL compiler: `path#index`.
#[must_use]
pub fn source_name(path: &std::path::Path, index: usize) -> String {
    format!("{}#{index}", path.display())
}

fn parse_candidate(
    index: usize,
    candidate: EmbeddedCandidate,
    source_name: &str,
) -> (EmbeddedDocument, Vec<ParseError>) {
    let mut errors: Vec<ParseError> = candidate
        .errors
        .iter()
        .map(|error| {
            let offset = error.offset().unwrap_or(candidate.range.start);
            ParseError {
                kind: ParseErrorKind::Extraction,
                message: error.to_string(),
                range: OffsetRange::at(offset),
            }
        })
        .collect();

    let mut document = EmbeddedDocument {
        index,
        source: Arc::from(candidate.text.as_str()),
        ast: None,
        range: candidate.range,
        offset_map: candidate.offset_map,
        interpolations: candidate.interpolations,
    };

    if !candidate.errors.is_empty() {
        return (document, errors);
    }

    let ast = match Parser::new().parse_ast(&candidate.text, source_name) {
        Ok(ast) => ast,
        Err(with_errors) => {
            errors.extend(with_errors.errors.iter().map(|diagnostic| {
                let range = diagnostic.error.location().map_or(
                    OffsetRange::at(document.range.start),
                    |span| {
                        document.to_parent_range(OffsetRange::new(span.offset(), span.end_offset()))
                    },
                );
                ParseError {
                    kind: ParseErrorKind::Grammar,
                    message: diagnostic.error.to_string(),
                    range,
                }
            }));
            with_errors.partial
        }
    };

    if errors.is_empty() {
        errors.extend(check_interpolations(&document, &ast));
    }
    document.ast = Some(Arc::new(ast));
    (document, errors)
}

/// A fragment placeholder must end up as the complete name of a fragment
/// spread, and a document placeholder must sit between definitions.
fn check_interpolations(document: &EmbeddedDocument, ast: &ast::Document) -> Vec<ParseError> {
    if document.interpolations.is_empty() {
        return Vec::new();
    }

    let mut spreads = Vec::new();
    for definition in &ast.definitions {
        match definition {
            ast::Definition::OperationDefinition(operation) => {
                collect_spread_names(&operation.selection_set, &mut spreads);
            }
            ast::Definition::FragmentDefinition(fragment) => {
                collect_spread_names(&fragment.selection_set, &mut spreads);
            }
            _ => {}
        }
    }

    let definition_spans: Vec<OffsetRange> = ast
        .definitions
        .iter()
        .filter_map(|definition| {
            definition
                .location()
                .map(|span| OffsetRange::new(span.offset(), span.end_offset()))
        })
        .collect();

    let mut errors = Vec::new();
    for interpolation in &document.interpolations {
        let misplaced = match (interpolation.kind, interpolation.stand_in.as_deref()) {
            (InterpolationKind::Fragment, Some(name)) => !spreads.iter().any(|s| s == name),
            (InterpolationKind::Document, _) => definition_spans.iter().any(|span| {
                span.start < interpolation.graphql.end && interpolation.graphql.start < span.end
            }),
            (InterpolationKind::Fragment, None) => false,
        };
        if misplaced {
            let message = match interpolation.kind {
                InterpolationKind::Fragment => {
                    "interpolation must be a complete fragment spread".to_string()
                }
                InterpolationKind::Document => {
                    "interpolation must be a complete definition".to_string()
                }
            };
            errors.push(ParseError {
                kind: ParseErrorKind::Interpolation,
                message,
                range: interpolation.parent,
            });
        }
    }
    errors
}

fn collect_spread_names(selections: &[ast::Selection], out: &mut Vec<String>) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => collect_spread_names(&field.selection_set, out),
            ast::Selection::FragmentSpread(spread) => {
                out.push(spread.fragment_name.to_string());
            }
            ast::Selection::InlineFragment(inline) => {
                collect_spread_names(&inline.selection_set, out);
            }
        }
    }
}

/// Describes a mismatch between a file's expected [`SourceKind`] (from config)
/// and what was actually found in the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMismatch {
    /// Expected schema definitions, found executable definitions
    ExpectedSchemaFoundExecutable {
        /// Names of the executable definitions found
        definitions: Vec<String>,
    },
    /// Expected executable definitions, found schema definitions
    ExpectedExecutableFoundSchema {
        /// Names of the schema definitions found
        definitions: Vec<String>,
    },
}

impl ContentMismatch {
    /// Returns a human-readable message describing the mismatch.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ExpectedSchemaFoundExecutable { definitions } => format!(
                "File in schema config contains executable definitions: {}",
                definitions.join(", ")
            ),
            Self::ExpectedExecutableFoundSchema { definitions } => format!(
                "File in documents config contains schema definitions: {}",
                definitions.join(", ")
            ),
        }
    }
}

/// Validate that the parsed documents match the expected [`SourceKind`].
///
/// - Schema files should NOT contain operations or fragments
/// - Query files should NOT contain type definitions
/// - Empty files or files with only comments are valid for any kind
#[must_use]
pub fn validate_content_matches_kind(
    documents: &[EmbeddedDocument],
    expected: SourceKind,
) -> Option<ContentMismatch> {
    let definitions = documents
        .iter()
        .filter_map(|doc| doc.ast.as_deref())
        .flat_map(|ast| ast.definitions.iter());

    match expected {
        SourceKind::Schema => {
            let executable_defs: Vec<String> = definitions
                .filter_map(|def| match def {
                    ast::Definition::OperationDefinition(op) => Some(op.name.as_ref().map_or_else(
                        || format!("anonymous {}", op.operation_type),
                        ToString::to_string,
                    )),
                    ast::Definition::FragmentDefinition(frag) => {
                        Some(format!("fragment {}", frag.name))
                    }
                    _ => None,
                })
                .collect();

            (!executable_defs.is_empty()).then_some(ContentMismatch::ExpectedSchemaFoundExecutable {
                definitions: executable_defs,
            })
        }
        SourceKind::Query => {
            let schema_defs: Vec<String> = definitions.filter_map(schema_definition_label).collect();

            (!schema_defs.is_empty()).then_some(ContentMismatch::ExpectedExecutableFoundSchema {
                definitions: schema_defs,
            })
        }
    }
}

fn schema_definition_label(def: &ast::Definition) -> Option<String> {
    let label = match def {
        ast::Definition::SchemaDefinition(_) => "schema".to_string(),
        ast::Definition::SchemaExtension(_) => "extend schema".to_string(),
        ast::Definition::ObjectTypeDefinition(t) => format!("type {}", t.name),
        ast::Definition::ObjectTypeExtension(t) => format!("extend type {}", t.name),
        ast::Definition::InterfaceTypeDefinition(t) => format!("interface {}", t.name),
        ast::Definition::InterfaceTypeExtension(t) => format!("extend interface {}", t.name),
        ast::Definition::UnionTypeDefinition(t) => format!("union {}", t.name),
        ast::Definition::UnionTypeExtension(t) => format!("extend union {}", t.name),
        ast::Definition::ScalarTypeDefinition(t) => format!("scalar {}", t.name),
        ast::Definition::ScalarTypeExtension(t) => format!("extend scalar {}", t.name),
        ast::Definition::EnumTypeDefinition(t) => format!("enum {}", t.name),
        ast::Definition::EnumTypeExtension(t) => format!("extend enum {}", t.name),
        ast::Definition::InputObjectTypeDefinition(t) => format!("input {}", t.name),
        ast::Definition::InputObjectTypeExtension(t) => format!("extend input {}", t.name),
        ast::Definition::DirectiveDefinition(d) => format!("directive @{}", d.name),
        ast::Definition::OperationDefinition(_) | ast::Definition::FragmentDefinition(_) => {
            return None
        }
    };
    Some(label)
}

/// Line index for a file (for position conversions)
/// Maps byte offsets to line/column positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Create a new line index from source text
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];

        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Convert a byte offset to a line/column position (0-based)
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));

        let col = offset - self.line_starts[line];
        (line, col)
    }

    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let (line, col) = self.line_col(offset);
        Position::new(line as u32, col as u32)
    }

    /// Byte offset of a position, clamped to the end of its line.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        let start = self.line_start(line)?;
        let line_end = self
            .line_start(line + 1)
            .map_or(self.len, |next| next.saturating_sub(1));
        Some((start + position.character as usize).min(line_end))
    }

    /// Get the byte offset of the start of a line
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Get the number of lines
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Compute line index for a file (for position conversions)
#[salsa::tracked]
pub fn line_index(db: &dyn GraphQLSyntaxDatabase, content: FileContent) -> Arc<LineIndex> {
    Arc::new(LineIndex::new(&content.text(db)))
}

/// The salsa database trait for syntax queries
#[salsa::db]
pub trait GraphQLSyntaxDatabase: salsa::Database {}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_base_db::{Delimiters, Language};
    use graphql_extract::DelimiterConfig;
    use std::path::{Path, PathBuf};

    #[salsa::db]
    #[derive(Clone, Default)]
    struct TestDatabase {
        storage: salsa::Storage<Self>,
    }

    #[salsa::db]
    impl salsa::Database for TestDatabase {}

    #[salsa::db]
    impl GraphQLSyntaxDatabase for TestDatabase {}

    fn parse_text(
        db: &TestDatabase,
        path: &str,
        kind: SourceKind,
        config: &DelimiterConfig,
        text: &str,
    ) -> Parse {
        let path: Arc<Path> = Arc::from(PathBuf::from(path));
        let content = FileContent::new(db, Arc::from(text));
        let metadata = FileMetadata::new(
            db,
            path.clone(),
            Language::from_path(&path),
            kind,
            Arc::from(Vec::new()),
            Arc::new(Delimiters::compile(config).unwrap()),
        );
        parse(db, content, metadata)
    }

    fn parse_query(path: &str, text: &str) -> Parse {
        let db = TestDatabase::default();
        parse_text(&db, path, SourceKind::Query, &DelimiterConfig::default(), text)
    }

    #[test]
    fn test_line_index_new() {
        let text = "line 1\nline 2\nline 3";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_start(0), Some(0));
        assert_eq!(index.line_start(1), Some(7));
        assert_eq!(index.line_start(2), Some(14));
    }

    #[test]
    fn test_line_index_line_col() {
        let text = "line 1\nline 2\nline 3";
        let index = LineIndex::new(text);

        assert_eq!(index.line_col(0), (0, 0));
        assert_eq!(index.line_col(5), (0, 5));
        assert_eq!(index.line_col(7), (1, 0));
        assert_eq!(index.line_col(10), (1, 3));
        assert_eq!(index.line_col(14), (2, 0));
    }

    #[test]
    fn test_line_index_offset_round_trip() {
        let index = LineIndex::new("ab\ncde\n");
        assert_eq!(index.offset(Position::new(1, 2)), Some(5));
        assert_eq!(index.offset(Position::new(1, 99)), Some(6));
        assert_eq!(index.offset(Position::new(9, 0)), None);
        assert_eq!(index.position(5), Position::new(1, 2));
    }

    #[test]
    fn test_line_index_empty() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(0), (0, 0));
    }

    #[test]
    fn test_parse_graphql_file() {
        let parse = parse_query("/p/q.graphql", "query Q { user { id } }");

        assert!(!parse.has_errors());
        assert_eq!(parse.document_count(), 1);
        let doc = parse.document(0).unwrap();
        assert_eq!(doc.range, OffsetRange::new(0, 23));
        assert_eq!(doc.ast.as_ref().unwrap().definitions.len(), 1);
    }

    #[test]
    fn test_parse_graphql_with_error_maps_offset() {
        let parse = parse_query("/p/q.graphql", "query Q { user {");
        assert!(parse.has_errors());
        assert_eq!(parse.errors()[0].kind, ParseErrorKind::Grammar);
        assert!(parse.document(0).unwrap().ast.is_some());
    }

    #[test]
    fn test_parse_host_file_offsets_are_absolute() {
        let text = "import x;\n\nconst Q = gql`\n  query Q { user { id } }\n`;\n";
        let parse = parse_query("/p/q.ts", text);

        assert!(!parse.has_errors());
        let doc = parse.document(0).unwrap();
        let ast = doc.ast.as_ref().unwrap();
        let ast::Definition::OperationDefinition(operation) = &ast.definitions[0] else {
            panic!("expected operation");
        };
        let name = doc.name_range(operation.name.as_ref().unwrap()).unwrap();
        assert_eq!(&text[name.start..name.end], "Q");
        assert_eq!(name.start, text.find("query Q").unwrap() + 6);
        assert_eq!(parse.document_at(name.start).unwrap().index, 0);
    }

    #[test]
    fn test_host_file_without_regions() {
        let parse = parse_query("/p/util.ts", "export const x = 1;");
        assert!(parse.is_empty());
        assert!(!parse.has_errors());
    }

    #[test]
    fn test_extraction_error_skips_parse() {
        let text = "gql`fragment on User { id }`";
        let parse = parse_query("/p/f.ts", text);
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, ParseErrorKind::Extraction);
        assert_eq!(parse.errors()[0].range.start, 4);
        assert!(parse.document(0).unwrap().ast.is_none());
    }

    #[test]
    fn test_fragment_interpolation_as_spread() {
        let text = "gql`query Q { user { ${UserFields} } }`";
        let parse = parse_query("/p/q.ts", text);
        assert!(!parse.has_errors(), "{:?}", parse.errors());
        assert!(parse.document(0).unwrap().is_stand_in("__Interpolation0"));
    }

    #[test]
    fn test_partial_token_interpolation_is_rejected() {
        let text = "gql`query Q { user(id: \"${id}\") { id } }`";
        let parse = parse_query("/p/q.ts", text);
        assert_eq!(parse.errors().len(), 1);
        let error = &parse.errors()[0];
        assert_eq!(error.kind, ParseErrorKind::Interpolation);
        assert_eq!(error.range.start, text.find("${").unwrap());
    }

    #[test]
    fn test_document_interpolation_between_definitions() {
        let text = "gql`\n  ${Fragments}\n  query Q { a }\n`";
        let parse = parse_query("/p/q.ts", text);
        assert!(!parse.has_errors(), "{:?}", parse.errors());
    }

    #[test]
    fn test_content_mismatch() {
        let parse = parse_query("/p/q.graphql", "type User { id: ID }\nquery Q { a }");
        let mismatch = parse.mismatch().unwrap();
        assert_eq!(
            mismatch,
            &ContentMismatch::ExpectedExecutableFoundSchema {
                definitions: vec!["type User".to_string()]
            }
        );

        let db = TestDatabase::default();
        let schema = parse_text(
            &db,
            "/p/s.graphql",
            SourceKind::Schema,
            &DelimiterConfig::default(),
            "type Query { a: Int }\nfragment F on Query { a }",
        );
        assert!(schema
            .mismatch()
            .unwrap()
            .message()
            .contains("fragment F"));
    }
}
