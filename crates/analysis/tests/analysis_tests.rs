use graphql_analysis::{
    build_schema, collect_references, fragment_index, schema_fingerprints, touched_symbols,
    validate_file, BuildOutcome, DiagnosticCategory, FileInput, SchemaExtension, SchemaFile,
    Symbol,
};
use graphql_base_db::{Delimiters, FileContent, FileMetadata, Language, SourceKind};
use graphql_extract::DelimiterConfig;
use graphql_hir::{file_structure, FileStructure, GraphQLHirDatabase};
use graphql_rules::base_rules;
use graphql_syntax::{line_index, parse, LineIndex, Parse};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[salsa::db]
#[derive(Clone, Default)]
struct TestDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for TestDatabase {}

#[salsa::db]
impl graphql_syntax::GraphQLSyntaxDatabase for TestDatabase {}

#[salsa::db]
impl GraphQLHirDatabase for TestDatabase {}

struct Loaded {
    path: Arc<Path>,
    kind: SourceKind,
    parse: Parse,
    structure: Arc<FileStructure>,
    line_index: Arc<LineIndex>,
}

impl Loaded {
    fn input(&self) -> FileInput<'_> {
        FileInput {
            path: &self.path,
            kind: self.kind,
            parse: &self.parse,
            structure: &self.structure,
            line_index: &self.line_index,
        }
    }

    fn schema_file(&self) -> SchemaFile<'_> {
        SchemaFile {
            path: &self.path,
            parse: &self.parse,
            line_index: &self.line_index,
        }
    }
}

fn load(db: &TestDatabase, path: &str, kind: SourceKind, text: &str) -> Loaded {
    let path: Arc<Path> = Arc::from(PathBuf::from(path));
    let content = FileContent::new(db, Arc::from(text));
    let metadata = FileMetadata::new(
        db,
        path.clone(),
        Language::from_path(&path),
        kind,
        Arc::from(Vec::new()),
        Arc::new(Delimiters::compile(&DelimiterConfig::default()).unwrap()),
    );
    Loaded {
        path,
        kind,
        parse: parse(db, content, metadata),
        structure: file_structure(db, content, metadata),
        line_index: line_index(db, content),
    }
}

const SCHEMA: &str = "type Query { viewer: Viewer }\ntype Viewer { name: String friends: [Viewer!] }\n";

#[test]
fn test_valid_schema_builds() {
    let db = TestDatabase::default();
    let schema_file = load(&db, "/p/schema.graphql", SourceKind::Schema, SCHEMA);

    let build = build_schema(&[schema_file.schema_file()], &[]);
    assert_eq!(build.outcome, BuildOutcome::Valid);
    assert!(!build.has_errors());
    let schema = build.schema.unwrap();
    assert!(schema.types.contains_key("Viewer"));
    // the prelude is always part of the schema
    assert!(schema.directive_definitions.contains_key("scope"));
}

#[test]
fn test_schema_errors_point_at_the_offending_file() {
    let db = TestDatabase::default();
    let a = load(&db, "/p/a.graphql", SourceKind::Schema, SCHEMA);
    let b = load(
        &db,
        "/p/b.graphql",
        SourceKind::Schema,
        "\n\ntype Viewer { age: Int }\n",
    );

    let build = build_schema(&[a.schema_file(), b.schema_file()], &[]);
    assert_ne!(build.outcome, BuildOutcome::Valid);

    let in_b = build.diagnostics.get(&b.path).unwrap();
    assert!(!in_b.is_empty());
    assert!(in_b.iter().all(|d| d.category == DiagnosticCategory::SchemaBuild));
    let location = in_b[0].primary_location().unwrap();
    assert_eq!(location.range.start.line, 2);
}

#[test]
fn test_preset_extensions_join_the_schema() {
    let db = TestDatabase::default();
    let schema_file = load(&db, "/p/schema.graphql", SourceKind::Schema, SCHEMA);

    let build = build_schema(
        &[schema_file.schema_file()],
        &[SchemaExtension {
            preset: "apollo",
            sdl: "directive @client on FIELD\n",
        }],
    );
    assert_eq!(build.outcome, BuildOutcome::Valid);
    assert!(build.schema.unwrap().directive_definitions.contains_key("client"));
}

#[test]
fn test_unknown_field_on_viewer() {
    let db = TestDatabase::default();
    let schema_file = load(&db, "/p/schema.graphql", SourceKind::Schema, SCHEMA);
    let query = load(&db, "/p/q.graphql", SourceKind::Query, "query { viewer { nam } }\n");

    let build = build_schema(&[schema_file.schema_file()], &[]);
    let fragments = fragment_index(&query.parse, []);
    let diagnostics = validate_file(
        &query.input(),
        base_rules(),
        &fragments,
        build.schema.as_deref(),
    );

    let rendered: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(rendered.join("\n"), @r#"/p/q.graphql:1:18: error [validation/fields_on_correct_type] Cannot query field "nam" on type "Viewer". Did you mean "name"?"#);
    assert_eq!(diagnostics[0].suggestions, vec!["name".to_string()]);
    assert_eq!(diagnostics[0].document, Some(0));
}

#[test]
fn test_without_schema_only_standalone_rules_run() {
    let db = TestDatabase::default();
    let query = load(
        &db,
        "/p/q.graphql",
        SourceKind::Query,
        "query Q { viewer { ...Missing } }\n",
    );

    let fragments = fragment_index(&query.parse, []);
    let diagnostics = validate_file(&query.input(), base_rules(), &fragments, None);

    let categories: Vec<_> = diagnostics.iter().map(|d| d.category).collect();
    assert_eq!(
        categories,
        vec![
            DiagnosticCategory::Validation,
            DiagnosticCategory::DependencyUnavailable
        ]
    );
    assert_eq!(diagnostics[0].message, "Unknown fragment \"Missing\".");
    assert!(diagnostics.iter().all(|d| d.is_error()));
}

#[test]
fn test_syntax_errors_skip_rules() {
    let db = TestDatabase::default();
    let query = load(&db, "/p/q.graphql", SourceKind::Query, "query { viewer { ");

    let fragments = fragment_index(&query.parse, []);
    let diagnostics = validate_file(&query.input(), base_rules(), &fragments, None);

    assert!(!diagnostics.is_empty());
    assert!(diagnostics
        .iter()
        .all(|d| d.category == DiagnosticCategory::Syntax));
    assert_eq!(diagnostics[0].code.as_deref(), Some("grammar"));
}

#[test]
fn test_schema_files_are_not_validated_as_queries() {
    let db = TestDatabase::default();
    let schema_file = load(&db, "/p/schema.graphql", SourceKind::Schema, SCHEMA);

    let fragments = fragment_index(&schema_file.parse, []);
    let diagnostics = validate_file(&schema_file.input(), base_rules(), &fragments, None);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_references_follow_fields_and_spreads() {
    let db = TestDatabase::default();
    let schema_file = load(&db, "/p/schema.graphql", SourceKind::Schema, SCHEMA);
    let query = load(
        &db,
        "/p/q.graphql",
        SourceKind::Query,
        "query Q { viewer { ...ViewerName } }\nfragment ViewerName on Viewer { name ...Friends @include(if: true) }\n",
    );
    let globals = load(
        &db,
        "/p/friends.graphql",
        SourceKind::Query,
        "fragment Friends on Viewer { friends { name } }\n",
    );

    let build = build_schema(&[schema_file.schema_file()], &[]);
    let global_fragments = graphql_analysis::fragment_definitions(&globals.parse)
        .map(|(_, fragment)| fragment.clone())
        .collect::<Vec<_>>();
    let fragments = fragment_index(&query.parse, global_fragments);
    let references = collect_references(&query.parse, &fragments, build.schema.as_deref());

    for expected in [
        Symbol::SchemaRoot,
        Symbol::Type("Query".into()),
        Symbol::Type("Viewer".into()),
        Symbol::Type("String".into()),
        Symbol::Fragment("ViewerName".into()),
        Symbol::Fragment("Friends".into()),
        Symbol::Directive("include".into()),
    ] {
        assert!(references.contains(&expected), "missing {expected}");
    }
}

#[test]
fn test_references_without_schema_are_syntactic() {
    let db = TestDatabase::default();
    let query = load(
        &db,
        "/p/q.graphql",
        SourceKind::Query,
        "query Q($id: ID!) { node(id: $id) { ... on User { name } } }\n",
    );

    let fragments = fragment_index(&query.parse, []);
    let references = collect_references(&query.parse, &fragments, None);

    assert!(references.contains(&Symbol::Type("ID".into())));
    assert!(references.contains(&Symbol::Type("User".into())));
    assert!(!references.contains(&Symbol::SchemaRoot));
}

#[test]
fn test_touched_symbols_between_schema_versions() {
    let db = TestDatabase::default();
    let before = load(&db, "/p/schema.graphql", SourceKind::Schema, SCHEMA);
    let after = load(
        &db,
        "/p/schema.graphql",
        SourceKind::Schema,
        "type Query { viewer: Viewer }\n\ntype Viewer { name: String friends: [Viewer!] age: Int }\ntype Extra { id: ID }\n",
    );

    let previous = schema_fingerprints([&*before.structure], &[]);
    let current = schema_fingerprints([&*after.structure], &[]);
    let touched = touched_symbols(&previous, &current);

    assert_eq!(
        touched.into_iter().collect::<Vec<_>>(),
        vec![Symbol::Type("Extra".into()), Symbol::Type("Viewer".into())]
    );
}
