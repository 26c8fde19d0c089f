use std::path::Path;
use std::sync::Arc;

pub use graphql_extract::Delimiters;
// Re-export types from graphql-types
pub use graphql_types::{Fingerprint, Language, SourceKind};

/// Input: Content of a file
///
/// Set by the engine when a file is read. The engine only writes this input
/// when the content fingerprint changes, so unchanged files keep every
/// derived query cached.
#[salsa::input]
pub struct FileContent {
    pub text: Arc<str>,
}

/// Input: Metadata about a file
///
/// Files are classified along two orthogonal dimensions:
/// - `language`: How to find GraphQL in the file (whole file or delimited regions)
/// - `kind`: What the content represents (schema or query)
#[salsa::input]
pub struct FileMetadata {
    pub path: Arc<Path>,
    /// Source language - determines extraction strategy
    pub language: Language,
    /// Source kind - determines semantic processing
    pub kind: SourceKind,
    /// Presets applying to this file, in application order
    pub presets: Arc<[Arc<str>]>,
    /// Compiled delimiters for host-language files
    pub delimiters: Arc<Delimiters>,
}

impl FileMetadata {
    /// Returns true if this is a schema file
    pub fn is_schema(&self, db: &dyn salsa::Database) -> bool {
        self.kind(db).is_schema()
    }

    /// Returns true if this is a query file
    pub fn is_query(&self, db: &dyn salsa::Database) -> bool {
        self.kind(db).is_query()
    }

    /// Returns true if GraphQL has to be extracted from the file
    pub fn requires_extraction(&self, db: &dyn salsa::Database) -> bool {
        self.language(db).requires_extraction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_extract::DelimiterConfig;
    use salsa::Setter;
    use std::path::PathBuf;

    /// Simple test database for base-db tests.
    /// Only implements `salsa::Database` - no higher-level query traits.
    #[salsa::db]
    #[derive(Clone, Default)]
    struct TestDatabase {
        storage: salsa::Storage<Self>,
    }

    #[salsa::db]
    impl salsa::Database for TestDatabase {}

    fn delimiters() -> Arc<Delimiters> {
        Arc::new(Delimiters::compile(&DelimiterConfig::default()).unwrap())
    }

    #[test]
    fn test_file_content_creation() {
        let db = TestDatabase::default();
        let content: Arc<str> = Arc::from("type Query { hello: String }");
        let file_content = FileContent::new(&db, content);

        assert_eq!(
            file_content.text(&db).as_ref(),
            "type Query { hello: String }"
        );
    }

    #[test]
    fn test_file_metadata_creation() {
        let db = TestDatabase::default();
        let path: Arc<Path> = Arc::from(PathBuf::from("/p/schema.graphql"));

        let metadata = FileMetadata::new(
            &db,
            path.clone(),
            Language::GraphQL,
            SourceKind::Schema,
            Arc::from(Vec::new()),
            delimiters(),
        );

        assert_eq!(metadata.path(&db), path);
        assert_eq!(metadata.language(&db), Language::GraphQL);
        assert!(metadata.is_schema(&db));
        assert!(!metadata.is_query(&db));
        assert!(!metadata.requires_extraction(&db));
    }

    #[test]
    fn test_file_metadata_host_file() {
        let db = TestDatabase::default();
        let presets: Arc<[Arc<str>]> = Arc::from(vec![Arc::from("apollo")]);

        let metadata = FileMetadata::new(
            &db,
            Arc::from(PathBuf::from("/p/query.ts")),
            Language::Host,
            SourceKind::Query,
            presets,
            delimiters(),
        );

        assert!(metadata.is_query(&db));
        assert!(metadata.requires_extraction(&db));
        assert_eq!(metadata.presets(&db).len(), 1);
    }

    #[test]
    fn test_file_content_update() {
        let mut db = TestDatabase::default();
        let file_content = FileContent::new(&db, Arc::from("type Query { hello: String }"));

        file_content
            .set_text(&mut db)
            .to(Arc::from("type Query { world: String }"));

        assert_eq!(
            file_content.text(&db).as_ref(),
            "type Query { world: String }"
        );
    }
}
