use graphql_engine::{Hint, HintKind, Info, Preset, Provider, ProviderContext, ProviderError, QueryParams};
use graphql_test_utils::{TestEngine, TestProject};
use parking_lot::Mutex;
use std::sync::Arc;

const SCHEMA: &str = "type Query { viewer: Viewer }\ntype Viewer { name: String }\n";

fn project(files: &[(&str, &str)]) -> TestEngine {
    files
        .iter()
        .fold(
            TestProject::new().file("schema/schema.graphql", SCHEMA),
            |project, (path, text)| project.file(path, text),
        )
        .build()
}

#[test]
fn test_field_completion() {
    let project = project(&[("src/query.graphql", "query Q { viewer { name } }\n")]);
    let params = project.params_at("src/query.graphql", "name", 0);

    let hints = project.engine.autocomplete(&params);
    let labels: Vec<&str> = hints.iter().map(|hint| hint.label.as_str()).collect();
    assert!(labels.contains(&"name"));
    assert!(labels.contains(&"__typename"));
    assert!(!labels.contains(&"viewer"));

    let name = hints.iter().find(|hint| hint.label == "name").unwrap();
    assert_eq!(name.kind, HintKind::Field);
    assert_eq!(name.detail.as_deref(), Some("String"));
}

#[test]
fn test_interface_completion_offers_inline_fragments() {
    let project = TestProject::new()
        .file(
            "schema/schema.graphql",
            "type Query { node: Node }\ninterface Node { id: ID! }\ntype User implements Node { id: ID! }\ntype Org implements Node { id: ID! }\n",
        )
        .file("src/query.graphql", "query Q { node { id } }\n")
        .build();
    let params = project.params_at("src/query.graphql", "id", 0);

    let labels: Vec<String> = project
        .engine
        .autocomplete(&params)
        .into_iter()
        .map(|hint| hint.label)
        .collect();
    assert!(labels.contains(&"id".to_string()));
    assert!(labels.contains(&"... on User".to_string()));
    assert!(labels.contains(&"... on Org".to_string()));
}

#[test]
fn test_completion_offers_visible_fragments() {
    let project = project(&[
        (
            "src/fragments.graphql",
            "fragment ViewerFields on Viewer @scope(tags: [\"global\"]) { name }\n",
        ),
        ("src/query.graphql", "query Q { viewer { name } }\n"),
    ]);
    let params = project.params_at("src/query.graphql", "name", 0);

    let labels: Vec<String> = project
        .engine
        .autocomplete(&params)
        .into_iter()
        .map(|hint| hint.label)
        .collect();
    assert!(labels.iter().any(|label| label.contains("ViewerFields")));
}

#[test]
fn test_field_definition_points_into_schema() {
    let project = project(&[("src/query.graphql", "query Q { viewer { name } }\n")]);
    let params = project.params_at("src/query.graphql", "viewer", 2);

    let locations = project.engine.definitions(&params);
    assert_eq!(locations.len(), 1);
    assert_eq!(
        locations[0].path.as_ref(),
        project.path("schema/schema.graphql").as_path()
    );
    assert_eq!(locations[0].range.start.line, 0);
}

#[test]
fn test_fragment_spread_definition() {
    let project = project(&[
        (
            "src/fragments.graphql",
            "fragment ViewerFields on Viewer @scope(tags: [\"global\"]) { name }\n",
        ),
        ("src/query.graphql", "query Q { viewer { ...ViewerFields } }\n"),
    ]);
    let params = project.params_at("src/query.graphql", "ViewerFields", 1);

    let locations = project.engine.definitions(&params);
    assert_eq!(locations.len(), 1);
    assert_eq!(
        locations[0].path.as_ref(),
        project.path("src/fragments.graphql").as_path()
    );
}

#[test]
fn test_field_hover() {
    let project = project(&[("src/query.graphql", "query Q { viewer { name } }\n")]);
    let params = project.params_at("src/query.graphql", "viewer", 0);

    let info = project.engine.info(&params);
    assert_eq!(info.len(), 1);
    assert!(info[0].contents.contains("Query.viewer: Viewer"));
}

#[test]
fn test_fragment_hover_shows_scope() {
    let project = project(&[(
        "src/query.graphql",
        "fragment F on Viewer { name }\nquery Q { viewer { ...F } }\n",
    )]);
    let params = project.params_at("src/query.graphql", "...F", 3);

    let info = project.engine.info(&params);
    assert_eq!(info.len(), 1);
    assert!(info[0].contents.contains("fragment F on Viewer"));
    assert!(info[0].contents.contains("Scope: document"));
}

#[test]
fn test_global_fragment_references() {
    let project = project(&[
        (
            "src/fragments.graphql",
            "fragment ViewerFields on Viewer @scope(tags: [\"global\"]) { name }\n",
        ),
        ("src/a.graphql", "query A { viewer { ...ViewerFields } }\n"),
        ("src/b.graphql", "query B { viewer { ...ViewerFields } }\n"),
        (
            "src/c.graphql",
            "fragment ViewerFields on Viewer { name }\nquery C { viewer { ...ViewerFields } }\n",
        ),
    ]);
    let params = project.params_at("src/fragments.graphql", "ViewerFields", 0);

    let mut paths: Vec<_> = project
        .engine
        .references(&params)
        .into_iter()
        .map(|location| location.path)
        .collect();
    paths.sort();
    // c shadows the global fragment with its own
    assert_eq!(
        paths,
        vec![
            Arc::from(project.path("src/a.graphql")),
            Arc::from(project.path("src/b.graphql")),
        ]
    );
}

#[test]
fn test_queries_outside_a_document_are_empty() {
    let project = project(&[("src/query.graphql", "query Q { viewer { name } }\n")]);
    let params = QueryParams::new(project.path("src/missing.graphql"), 0, 0);
    assert!(project.engine.autocomplete(&params).is_empty());
    assert!(project.engine.info(&params).is_empty());
}

struct Panicking;

impl Provider for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn hints(&self, _cx: &ProviderContext<'_>) -> Result<Vec<Hint>, ProviderError> {
        panic!("boom")
    }

    fn info(&self, _cx: &ProviderContext<'_>) -> Result<Vec<Info>, ProviderError> {
        Err(ProviderError::failed(self.name(), "no hover today"))
    }
}

#[test]
fn test_failing_providers_are_isolated() {
    let project = TestProject::new()
        .with_preset(Preset::new("custom").with_provider(Panicking))
        .with_presets(&["custom"])
        .file("schema/schema.graphql", SCHEMA)
        .file("src/query.graphql", "query Q { viewer { name } }\n")
        .build();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    project
        .engine
        .on_error(move |error| sink.lock().push(error.to_string()));

    let params = project.params_at("src/query.graphql", "name", 0);
    let hints = project.engine.autocomplete(&params);
    assert!(hints.iter().any(|hint| hint.label == "name"));

    let info = project.engine.info(&params);
    assert_eq!(info.len(), 1);

    assert_eq!(
        *errors.lock(),
        vec![
            "provider 'panicking' panicked: boom".to_string(),
            "provider 'panicking' failed: no hover today".to_string(),
        ]
    );
}

#[test]
fn test_preset_providers_only_apply_to_their_groups() {
    let project = TestProject::new()
        .with_preset(Preset::new("custom").with_provider(Panicking))
        .file("schema/schema.graphql", SCHEMA)
        .file("src/query.graphql", "query Q { viewer { name } }\n")
        .build();
    let errors = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&errors);
    project.engine.on_error(move |_| *sink.lock() += 1);

    let params = project.params_at("src/query.graphql", "name", 0);
    assert!(!project.engine.autocomplete(&params).is_empty());
    assert_eq!(*errors.lock(), 0);
}

#[test]
fn test_relay_directive_hints() {
    let project = TestProject::new()
        .with_presets(&["relay"])
        .file("schema/schema.graphql", SCHEMA)
        .file(
            "src/fragment.graphql",
            "fragment Names on Viewer @relay(plural: true) { name }\n",
        )
        .build();
    let params = project.params_at("src/fragment.graphql", "@relay", 2);

    let hints = project.engine.autocomplete(&params);
    let forms: Vec<&str> = hints
        .iter()
        .filter(|hint| hint.kind == HintKind::Directive && hint.insert_text.is_some())
        .map(|hint| hint.label.as_str())
        .collect();
    assert_eq!(
        forms,
        vec!["relay(pattern: true)", "relay(plural: true)", "relay(mask: false)"]
    );
}

#[test]
fn test_client_field_hover() {
    let project = TestProject::new()
        .with_presets(&["apollo"])
        .with_preset_options("apollo", serde_json::json!({ "linkState": true }))
        .file("schema/schema.graphql", SCHEMA)
        .file(
            "src/query.graphql",
            "query Q { viewer { isLoggedIn @client } }\n",
        )
        .build();
    let params = project.params_at("src/query.graphql", "isLoggedIn", 0);

    let info = project.engine.info(&params);
    assert_eq!(info.len(), 1);
    assert!(info[0].contents.contains("client field"));
}
