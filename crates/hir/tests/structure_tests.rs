use graphql_base_db::{Delimiters, FileContent, FileMetadata, Language, SourceKind};
use graphql_extract::DelimiterConfig;
use graphql_hir::{file_structure, FileStructure, FragmentScope, GraphQLHirDatabase, TypeDefKind};
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

fn structure_of(path: &str, kind: SourceKind, text: &str) -> Arc<FileStructure> {
    let db = TestDatabase::default();
    let path: Arc<Path> = Arc::from(PathBuf::from(path));
    let content = FileContent::new(&db, Arc::from(text));
    let metadata = FileMetadata::new(
        &db,
        path.clone(),
        Language::from_path(&path),
        kind,
        Arc::from(Vec::new()),
        Arc::new(Delimiters::compile(&DelimiterConfig::default()).unwrap()),
    );
    file_structure(&db, content, metadata)
}

#[test]
fn test_schema_type_sites() {
    let text = "type Query { viewer: Viewer }\ntype Viewer { name: String }\nextend type Viewer { age: Int }\ndirective @auth on FIELD\n";
    let structure = structure_of("/p/schema.graphql", SourceKind::Schema, text);

    assert_eq!(structure.type_defs.len(), 3);
    let viewer: Vec<_> = structure.type_defs_named("Viewer").collect();
    assert_eq!(viewer.len(), 2);
    assert!(!viewer[0].is_extension);
    assert!(viewer[1].is_extension);
    assert_eq!(viewer[0].kind, TypeDefKind::Object);

    let query = &structure.type_defs[0];
    assert_eq!(query.fields[0].name.as_ref(), "viewer");
    assert_eq!(query.fields[0].type_name.as_ref(), "Viewer");
    let range = query.fields[0].name_range;
    assert_eq!(&text[range.start..range.end], "viewer");

    assert_eq!(structure.directive_defs[0].name.as_ref(), "auth");
}

#[test]
fn test_definition_fingerprint_ignores_position() {
    let a = structure_of("/p/a.graphql", SourceKind::Schema, "type A { x: Int }");
    let b = structure_of(
        "/p/b.graphql",
        SourceKind::Schema,
        "\n\n# moved\ntype A { x: Int }",
    );
    let c = structure_of("/p/c.graphql", SourceKind::Schema, "type A { x: String }");

    assert_eq!(a.definition_fingerprint("A"), b.definition_fingerprint("A"));
    assert_ne!(a.definition_fingerprint("A"), c.definition_fingerprint("A"));
    assert_eq!(a.definition_fingerprint("B"), None);
}

#[test]
fn test_fragment_defaults_to_document_scope() {
    let text = "fragment F on User { id ...G }\nquery Q { user { ...F } }";
    let structure = structure_of("/p/q.graphql", SourceKind::Query, text);

    let fragment = &structure.fragments[0];
    assert_eq!(fragment.scope, FragmentScope::Document);
    assert_eq!(fragment.tags, vec!["document"]);
    assert_eq!(fragment.spreads, vec![Arc::from("G")]);
    assert_eq!(fragment.type_references, vec![Arc::from("User")]);

    assert_eq!(structure.spreads.len(), 2);
    assert_eq!(structure.spreads[0].enclosing_fragment.as_deref(), Some("F"));
    assert_eq!(structure.spreads[1].enclosing_fragment, None);
    let range = structure.spreads[1].range;
    assert_eq!(&text[range.start..range.end], "F");
    assert_eq!(structure.operations[0].name.as_deref(), Some("Q"));
}

#[test]
fn test_global_scope_gets_file_specific_id() {
    let text = "fragment F on User @scope(tags: [\"global\"]) { id }";
    let a = structure_of("/p/a.graphql", SourceKind::Query, text);
    let b = structure_of("/p/b.graphql", SourceKind::Query, text);

    let (FragmentScope::Global(id_a), FragmentScope::Global(id_b)) =
        (&a.fragments[0].scope, &b.fragments[0].scope)
    else {
        panic!("expected global scopes");
    };
    assert_ne!(id_a, id_b);
    assert!(a.scope_errors.is_empty());
}

#[test]
fn test_malformed_scope_tags_are_reported() {
    let text = "fragment F on User @scope(tags: [\"team\"]) { id }\nfragment G on User @scope(tags: 1) { id }";
    let structure = structure_of("/p/q.graphql", SourceKind::Query, text);

    assert_eq!(structure.scope_errors.len(), 2);
    assert!(structure.scope_errors[0].message.contains("team"));
    assert_eq!(structure.scope_errors[1].fragment.as_ref(), "G");
    assert!(structure
        .fragments
        .iter()
        .all(|f| f.scope == FragmentScope::Document));
}

#[test]
fn test_inline_fragment_type_conditions() {
    let text = "query Q { node { ... on User { id } ... { id } } }";
    let structure = structure_of("/p/q.graphql", SourceKind::Query, text);

    assert_eq!(structure.type_conditions.len(), 1);
    assert_eq!(structure.type_conditions[0].name.as_ref(), "User");
}

#[test]
fn test_embedded_documents_share_one_structure() {
    let text = "const A = gql`fragment A on User { id }`;\nconst B = gql`query B { user { ...A ...${Other} } }`;\nconst C = gql`fragment on User { name }`;\n";
    let structure = structure_of("/p/q.ts", SourceKind::Query, text);

    // the unnamed fragment is rejected by the default delimiters
    assert_eq!(structure.fragments.len(), 1);
    assert_eq!(structure.fragments[0].document, 0);
    assert_eq!(structure.operations[0].document, 1);

    // stand-ins for interpolated spreads are not spread sites
    assert_eq!(structure.spreads.len(), 1);
    let range = structure.fragments[0].name_range;
    assert_eq!(&text[range.start..range.end], "A");
}
