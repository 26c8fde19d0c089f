//! Published state and the read-only handle queries run on.

use crate::cursor::target_at;
use crate::fragments::GlobalFragment;
use crate::model::{FileRecord, FileState};
use crate::observers::Observers;
use crate::providers::{Hint, Info, ProviderContext, ProviderRegistry, QueryParams};
use apollo_compiler::Schema;
use graphql_analysis::{BuildOutcome, Diagnostic, Location};
use graphql_types::{OffsetRange, SourceKind};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// The project as of the end of a batch. Never changes once published.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub(crate) generation: u64,
    pub(crate) files: BTreeMap<Arc<Path>, Arc<FileRecord>>,
    pub(crate) schema: Option<Arc<Schema>>,
    pub(crate) schema_outcome: Option<BuildOutcome>,
    /// Schema build errors that don't point into a schema file
    pub(crate) schema_errors: Vec<Diagnostic>,
    pub(crate) globals: Vec<GlobalFragment>,
}

/// A fragment visible from some file
#[derive(Debug, Clone, Copy)]
pub struct FragmentRef<'a> {
    pub name: &'a str,
    pub type_condition: &'a str,
    pub path: &'a Arc<Path>,
    pub name_range: OffsetRange,
    pub is_global: bool,
}

impl Snapshot {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values().map(AsRef::as_ref)
    }

    pub fn files_of_kind(&self, kind: SourceKind) -> impl Iterator<Item = &FileRecord> {
        self.files().filter(move |file| file.kind == kind)
    }

    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileRecord> {
        self.files.get(path).map(AsRef::as_ref)
    }

    /// The schema queries are validated against
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    #[must_use]
    pub const fn schema_outcome(&self) -> Option<BuildOutcome> {
        self.schema_outcome
    }

    pub fn global_fragments(&self) -> impl Iterator<Item = &GlobalFragment> {
        self.globals.iter()
    }

    /// Every diagnostic, files in path order
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.files()
            .flat_map(|file| file.diagnostics.iter().cloned())
            .chain(self.schema_errors.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(|diagnostic| diagnostic.is_error())
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count(|diagnostic| !diagnostic.is_error())
    }

    fn count(&self, filter: impl Fn(&Diagnostic) -> bool) -> usize {
        self.files()
            .flat_map(|file| file.diagnostics.iter())
            .chain(&self.schema_errors)
            .filter(|diagnostic| filter(diagnostic))
            .count()
    }

    /// Fragments a file can spread: its own first, then global fragments of
    /// other files it doesn't shadow.
    #[must_use]
    pub fn visible_fragments<'a>(&'a self, file: &'a FileRecord) -> Vec<FragmentRef<'a>> {
        let mut fragments: Vec<FragmentRef<'a>> = file
            .structure
            .fragments
            .iter()
            .map(|fragment| FragmentRef {
                name: &fragment.name,
                type_condition: &fragment.type_condition,
                path: &file.path,
                name_range: fragment.name_range,
                is_global: fragment.scope.is_global(),
            })
            .collect();
        let local: HashSet<&str> = fragments.iter().map(|fragment| fragment.name).collect();
        fragments.extend(
            self.globals
                .iter()
                .filter(|global| global.path != file.path && !local.contains(global.name.as_ref()))
                .map(|global| FragmentRef {
                    name: &global.name,
                    type_condition: global.definition.type_condition.as_str(),
                    path: &global.path,
                    name_range: global.name_range,
                    is_global: true,
                }),
        );
        fragments
    }

    /// Convert a byte range in a file into a location
    #[must_use]
    pub fn location(&self, path: &Path, range: OffsetRange) -> Option<Location> {
        self.file(path)
            .map(|file| Location::new(&file.path, &file.line_index, range))
    }
}

/// Read-only view of one snapshot.
///
/// Cheap to clone and safe to use from any thread. Queries never wait for
/// the engine; they see the state as of the snapshot they were taken from.
#[derive(Clone)]
pub struct Analysis {
    snapshot: Arc<Snapshot>,
    providers: Arc<ProviderRegistry>,
    observers: Arc<Observers>,
}

impl Analysis {
    pub(crate) const fn new(
        snapshot: Arc<Snapshot>,
        providers: Arc<ProviderRegistry>,
        observers: Arc<Observers>,
    ) -> Self {
        Self {
            snapshot,
            providers,
            observers,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.snapshot.diagnostics()
    }

    #[must_use]
    pub fn file_diagnostics(&self, path: &Path) -> Vec<Diagnostic> {
        self.snapshot
            .file(path)
            .map(|file| file.diagnostics.to_vec())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn file_state(&self, path: &Path) -> FileState {
        self.snapshot
            .file(path)
            .map_or(FileState::Unknown, |file| file.state)
    }

    /// Completion hints at a position
    #[must_use]
    pub fn autocomplete(&self, params: &QueryParams) -> Vec<Hint> {
        self.aggregate(params, |provider, cx| provider.hints(cx))
    }

    #[must_use]
    pub fn definitions(&self, params: &QueryParams) -> Vec<Location> {
        self.aggregate(params, |provider, cx| provider.definitions(cx))
    }

    /// Hover information at a position
    #[must_use]
    pub fn info(&self, params: &QueryParams) -> Vec<Info> {
        self.aggregate(params, |provider, cx| provider.info(cx))
    }

    #[must_use]
    pub fn references(&self, params: &QueryParams) -> Vec<Location> {
        self.aggregate(params, |provider, cx| provider.refs(cx))
    }

    fn aggregate<T>(
        &self,
        params: &QueryParams,
        call: impl Fn(
            &dyn crate::Provider,
            &ProviderContext<'_>,
        ) -> Result<Vec<T>, crate::ProviderError>,
    ) -> Vec<T> {
        let Some(cx) = self.context(params) else {
            return Vec::new();
        };
        self.providers.aggregate(&cx, &self.observers, call)
    }

    fn context(&self, params: &QueryParams) -> Option<ProviderContext<'_>> {
        let file = self.snapshot.file(&params.path)?;
        let offset = file.line_index.offset(params.position)?;
        let document = file.parse.document_at(offset)?;
        let ast = document.ast.as_deref()?;
        let local = document.to_local(offset)?;
        let target = target_at(ast, local, self.snapshot.schema());
        tracing::debug!(path = %params.path.display(), offset, ?target, "query");
        Some(ProviderContext {
            snapshot: &self.snapshot,
            file,
            document,
            offset,
            target,
        })
    }
}
