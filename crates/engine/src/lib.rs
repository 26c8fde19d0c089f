//! Incremental analysis of a GraphQL project.
//!
//! An [`Engine`] owns all mutable project state: the salsa database, one
//! [`FileRecord`] per source file, the merged schema, the global fragment
//! table and the graph of which query files use which definitions. Watch
//! events are queued on a channel and processed a batch at a time. Every
//! batch ends by publishing an immutable [`Snapshot`]; [`Analysis`] handles
//! answer interactive queries against it without waiting on the engine.
//!
//! ```text
//! WatchEvent -> fold per path -> read + parse -> schema rebuild
//!            -> revalidate dependents -> publish Snapshot -> on_change
//! ```

mod cursor;
mod db;
mod error;
mod fragments;
mod graph;
mod loader;
mod model;
mod observers;
mod presets;
mod providers;
mod schema_state;
mod snapshot;

pub use cursor::{target_at, CursorTarget};
pub use db::{queries, EngineStats};
pub use error::{EngineError, ProviderError, Result};
pub use fragments::{Collision, GlobalFragment, GlobalFragments};
pub use graph::DependencyGraph;
pub use graphql_analysis::{BuildOutcome, Diagnostic, DiagnosticCategory, Location, Symbol};
pub use loader::{DiskLoader, SourceLoader};
pub use model::{FileRecord, FileState, WatchEvent, WatchEventKind};
pub use observers::{ChangeListener, ChangeSummary, ErrorListener};
pub use presets::{builtin_preset, Preset, APOLLO, RELAY};
pub use providers::{
    base_providers, CompletionProvider, DefinitionProvider, Hint, HintKind, HoverProvider, Info,
    Provider, ProviderContext, QueryParams, ReferencesProvider,
};
pub use snapshot::{Analysis, FragmentRef, Snapshot};

use crossbeam_channel::{Receiver, Sender};
use db::EngineDatabase;
use graphql_analysis::{
    collect_references, file_diagnostics, fragment_index, validate_file, FileInput,
    SchemaExtension, SchemaFile,
};
use graphql_base_db::{Delimiters, FileContent, FileMetadata, Language};
use graphql_config::{DelimiterConfig, FileClass, ProjectConfig};
use graphql_hir::{DefaultScopeTagValidator, FileStructure, ScopeTagValidator};
use graphql_rules::{base_rules, compose_rules, KnownDirectivesRule, RuleImpl, RuleSet};
use graphql_types::Fingerprint;
use observers::Observers;
use parking_lot::RwLock;
use providers::ProviderRegistry;
use salsa::Setter;
use schema_state::{SchemaChange, SchemaState};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Dispatch;

const KNOWN_DIRECTIVES: &str = "known_directives";

/// Everything [`Engine::new`] takes besides the project itself.
pub struct EngineOptions {
    /// Where files are read from
    pub loader: Arc<dyn SourceLoader>,
    /// Receives the engine's tracing events; a no-op by default
    pub dispatch: Dispatch,
    /// Presets looked up by name before the built-in ones
    pub presets: Vec<Preset>,
    pub scope_validator: Arc<dyn ScopeTagValidator>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            loader: Arc::new(DiskLoader),
            dispatch: Dispatch::none(),
            presets: Vec::new(),
            scope_validator: Arc::new(DefaultScopeTagValidator),
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    #[must_use]
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = dispatch.into();
        self
    }

    #[must_use]
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.push(preset);
        self
    }

    #[must_use]
    pub fn with_scope_validator(mut self, validator: impl ScopeTagValidator + 'static) -> Self {
        self.scope_validator = Arc::new(validator);
        self
    }
}

/// Salsa inputs of one file. Kept after an unlink so that re-adding the
/// same content is served from cache.
#[derive(Clone, Copy)]
struct SourceInputs {
    content: FileContent,
    metadata: FileMetadata,
}

/// What a query file's validation result depends on. An equal key means
/// the cached diagnostics are still correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ValidationKey {
    content: Fingerprint,
    presets: Fingerprint,
    has_schema: bool,
    /// Fingerprints of every schema definition and external fragment the
    /// file referenced when last validated
    externals: Fingerprint,
}

struct Validation {
    key: ValidationKey,
    diagnostics: Arc<[Diagnostic]>,
}

/// Accumulated effects of the events in one batch
#[derive(Default)]
struct Batch {
    changed: BTreeSet<Arc<Path>>,
    removed: BTreeSet<Arc<Path>>,
    schema_dirty: bool,
    touched: BTreeSet<Symbol>,
}

impl Batch {
    fn touch_fragments(&mut self, names: BTreeSet<Arc<str>>) {
        self.touched.extend(names.into_iter().map(Symbol::Fragment));
    }
}

/// Identity of a reported fragment collision: name, id and reported file
type CollisionKey = (Arc<str>, Arc<str>, Arc<Path>);

/// The single owner of a project's analysis state.
pub struct Engine {
    root: PathBuf,
    config: ProjectConfig,
    loader: Arc<dyn SourceLoader>,
    dispatch: Dispatch,
    db: EngineDatabase,

    presets: HashMap<Arc<str>, Preset>,
    /// Schema extension SDL in preset order
    extensions: Vec<(Arc<str>, String)>,
    rule_sets: HashMap<Arc<[Arc<str>]>, Arc<RuleSet>>,
    delimiters: HashMap<DelimiterConfig, Arc<Delimiters>>,

    inputs: HashMap<Arc<Path>, SourceInputs>,
    files: BTreeMap<Arc<Path>, Arc<FileRecord>>,
    validations: HashMap<Arc<Path>, Validation>,
    graph: DependencyGraph,
    fragments: GlobalFragments,
    collisions: BTreeSet<CollisionKey>,
    schema: SchemaState,
    schema_errors: Vec<Diagnostic>,

    sender: Sender<WatchEvent>,
    receiver: Receiver<WatchEvent>,
    published: RwLock<Arc<Snapshot>>,
    observers: Arc<Observers>,
    providers: Arc<ProviderRegistry>,
    running: bool,
    generation: u64,
    counters: EngineStats,
}

impl Engine {
    /// Create an engine for the project rooted at `root`.
    ///
    /// Fails on an invalid config, delimiter patterns that don't compile, a
    /// preset that is neither supplied nor built in, or preset options that
    /// don't decode. Nothing is read until [`Self::start`].
    pub fn new(
        root: impl Into<PathBuf>,
        config: ProjectConfig,
        options: EngineOptions,
    ) -> Result<Self> {
        config.validate()?;
        let EngineOptions {
            loader,
            dispatch,
            presets: supplied,
            scope_validator,
        } = options;

        let mut supplied: HashMap<String, Preset> = supplied
            .into_iter()
            .map(|preset| (preset.name().to_string(), preset))
            .collect();
        let mut presets = HashMap::new();
        let mut extensions = Vec::new();
        let mut registry = ProviderRegistry::new(base_providers());
        for name in config.all_presets() {
            let preset = match supplied.remove(&name) {
                Some(preset) => preset,
                None => builtin_preset(&name, config.preset_options(&name))?
                    .ok_or_else(|| EngineError::UnknownPreset(name))?,
            };
            let shared = preset.shared_name();
            if let Some(sdl) = preset.extension() {
                extensions.push((Arc::clone(&shared), sdl.to_string()));
            }
            registry.register(Arc::clone(&shared), preset.providers().to_vec());
            presets.insert(shared, preset);
        }
        for name in supplied.keys() {
            tracing::debug!(preset = %name, "preset not used by any document group");
        }

        let mut delimiters = HashMap::new();
        let project_delimiters = config.delimiters.clone().unwrap_or_default();
        let group_delimiters = config
            .documents
            .iter()
            .filter_map(|group| group.delimiters.clone());
        for delimiter_config in std::iter::once(project_delimiters).chain(group_delimiters) {
            if let Entry::Vacant(slot) = delimiters.entry(delimiter_config) {
                let compiled = Delimiters::compile(slot.key())?;
                slot.insert(Arc::new(compiled));
            }
        }

        let (sender, receiver) = crossbeam_channel::unbounded();
        Ok(Self {
            root: root.into(),
            config,
            loader,
            dispatch,
            db: EngineDatabase::new(scope_validator),
            presets,
            extensions,
            rule_sets: HashMap::new(),
            delimiters,
            inputs: HashMap::new(),
            files: BTreeMap::new(),
            validations: HashMap::new(),
            graph: DependencyGraph::new(),
            fragments: GlobalFragments::default(),
            collisions: BTreeSet::new(),
            schema: SchemaState::default(),
            schema_errors: Vec::new(),
            sender,
            receiver,
            published: RwLock::new(Arc::new(Snapshot::default())),
            observers: Arc::new(Observers::default()),
            providers: Arc::new(registry),
            running: false,
            generation: 0,
            counters: EngineStats::default(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Scan the project root, analyze every matching file and publish the
    /// first snapshot. Events queued before the call are folded in.
    pub fn start(&mut self) -> Result<ChangeSummary> {
        let dispatch = self.dispatch.clone();
        tracing::dispatcher::with_default(&dispatch, || {
            let paths = self.loader.scan(&self.root).map_err(|source| EngineError::Io {
                path: self.root.clone(),
                source,
            })?;
            let mut events: Vec<WatchEvent> = paths
                .into_iter()
                .filter(|path| self.config.classify(path, &self.root).is_some())
                .map(WatchEvent::add)
                .collect();
            tracing::info!(root = %self.root.display(), files = events.len(), "starting");
            events.extend(self.receiver.try_iter());
            self.running = true;
            Ok(self.run_batch(events))
        })
    }

    /// Stop processing. Listeners are dropped and queued events discarded;
    /// the last published snapshot stays readable.
    pub fn stop(&mut self) {
        self.running = false;
        self.observers.clear();
        let dropped = self.receiver.try_iter().count();
        tracing::info!(dropped, "stopped");
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Every diagnostic of the last published snapshot
    #[must_use]
    pub fn status(&self) -> Vec<Diagnostic> {
        self.published.read().diagnostics()
    }

    /// A sender for watch events. Events are picked up by the next call to
    /// [`Self::process_pending`].
    #[must_use]
    pub fn event_sender(&self) -> Sender<WatchEvent> {
        self.sender.clone()
    }

    /// Process every queued event as one batch.
    ///
    /// Returns `None` when nothing was queued or the engine isn't running.
    pub fn process_pending(&mut self) -> Option<ChangeSummary> {
        let events: Vec<WatchEvent> = self.receiver.try_iter().collect();
        self.dispatch_batch(events)
    }

    /// Queue `events` behind anything already pending and process them all.
    pub fn apply(&mut self, events: impl IntoIterator<Item = WatchEvent>) -> Option<ChangeSummary> {
        let mut pending: Vec<WatchEvent> = self.receiver.try_iter().collect();
        pending.extend(events);
        self.dispatch_batch(pending)
    }

    /// A read-only handle on the last published snapshot
    #[must_use]
    pub fn analysis(&self) -> Analysis {
        Analysis::new(
            Arc::clone(&self.published.read()),
            Arc::clone(&self.providers),
            Arc::clone(&self.observers),
        )
    }

    #[must_use]
    pub fn file_state(&self, path: &Path) -> FileState {
        self.published
            .read()
            .file(path)
            .map_or(FileState::Unknown, |file| file.state)
    }

    #[must_use]
    pub fn autocomplete(&self, params: &QueryParams) -> Vec<Hint> {
        self.with_dispatch(|| self.analysis().autocomplete(params))
    }

    #[must_use]
    pub fn definitions(&self, params: &QueryParams) -> Vec<Location> {
        self.with_dispatch(|| self.analysis().definitions(params))
    }

    #[must_use]
    pub fn info(&self, params: &QueryParams) -> Vec<Info> {
        self.with_dispatch(|| self.analysis().info(params))
    }

    #[must_use]
    pub fn references(&self, params: &QueryParams) -> Vec<Location> {
        self.with_dispatch(|| self.analysis().references(params))
    }

    /// Called once per processed batch
    pub fn on_change(&self, listener: impl Fn(&ChangeSummary) + Send + Sync + 'static) {
        self.observers.on_change(Box::new(listener));
    }

    /// Called for failures attributable to shared state: schema builds,
    /// fragment collisions, unreadable files and failing providers
    pub fn on_error(&self, listener: impl Fn(&EngineError) + Send + Sync + 'static) {
        self.observers.on_error(Box::new(listener));
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            parses: self.db.executions(queries::PARSE),
            structures: self.db.executions(queries::FILE_STRUCTURE),
            ..self.counters
        }
    }

    fn with_dispatch<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    fn dispatch_batch(&mut self, events: Vec<WatchEvent>) -> Option<ChangeSummary> {
        if !self.running {
            if !events.is_empty() {
                tracing::debug!(dropped = events.len(), "engine not running");
            }
            return None;
        }
        if events.is_empty() {
            return None;
        }
        let dispatch = self.dispatch.clone();
        Some(tracing::dispatcher::with_default(&dispatch, || {
            self.run_batch(events)
        }))
    }

    fn run_batch(&mut self, events: Vec<WatchEvent>) -> ChangeSummary {
        let mut batch = Batch::default();
        let mut pending = events;
        // events arriving mid-batch supersede what this batch read
        while !pending.is_empty() {
            for (path, kind) in self.fold(pending) {
                self.apply_event(path, kind, &mut batch);
            }
            pending = self.receiver.try_iter().collect();
        }

        let mut revalidate_all = false;
        if batch.schema_dirty {
            match self.rebuild_schema() {
                SchemaChange::Everything => revalidate_all = true,
                SchemaChange::Symbols(symbols) => batch.touched.extend(symbols),
            }
            self.refresh_schema_files();
        }

        let candidates = self.candidates(&batch, revalidate_all);
        let mut revalidated = Vec::new();
        let mut cache_hits = 0;
        for path in &candidates {
            if self.revalidate(path) {
                revalidated.push(path.to_path_buf());
            } else {
                cache_hits += 1;
            }
        }
        self.counters.cache_hits += cache_hits;
        self.refresh_query_files(&candidates);

        self.publish(&batch, revalidated, cache_hits)
    }

    /// Last event per path wins; relative paths are taken from the root.
    fn fold(&self, events: Vec<WatchEvent>) -> BTreeMap<PathBuf, WatchEventKind> {
        events
            .into_iter()
            .map(|event| {
                let path = if event.path.is_absolute() {
                    event.path
                } else {
                    self.root.join(event.path)
                };
                (path, event.kind)
            })
            .collect()
    }

    fn apply_event(&mut self, path: PathBuf, kind: WatchEventKind, batch: &mut Batch) {
        let Some(class) = self.config.classify(&path, &self.root) else {
            if self.files.contains_key(path.as_path()) {
                self.remove_file(&path, batch);
            } else {
                tracing::trace!(path = %path.display(), "not part of the project");
            }
            return;
        };
        // events can arrive out of order, so what's on disk decides
        let text = match self.loader.read(&path) {
            Ok(text) => {
                if kind == WatchEventKind::Unlink {
                    tracing::debug!(path = %path.display(), "stale unlink, file still exists");
                }
                text
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "gone before it was read");
                self.remove_file(&path, batch);
                return;
            }
            Err(source) => {
                self.observers.report(&EngineError::Io { path, source });
                return;
            }
        };

        let fingerprint = Fingerprint::of_text(&text);
        if self
            .files
            .get(path.as_path())
            .is_some_and(|record| record.fingerprint == fingerprint)
        {
            tracing::debug!(path = %path.display(), "content unchanged");
            return;
        }
        self.upsert_file(Arc::from(path), &class, Arc::from(text), fingerprint, batch);
    }

    fn upsert_file(
        &mut self,
        path: Arc<Path>,
        class: &FileClass,
        text: Arc<str>,
        fingerprint: Fingerprint,
        batch: &mut Batch,
    ) {
        let presets: Arc<[Arc<str>]> = class
            .presets
            .iter()
            .map(|preset| Arc::from(preset.as_str()))
            .collect();

        let inputs = match self.inputs.get(&path).copied() {
            Some(inputs)
                if inputs.metadata.kind(&self.db) == class.kind
                    && inputs.metadata.presets(&self.db) == presets =>
            {
                if inputs.content.text(&self.db) != text {
                    inputs.content.set_text(&mut self.db).to(Arc::clone(&text));
                }
                inputs
            }
            _ => {
                let delimiters = match self.delimiters_for(&class.delimiters) {
                    Ok(delimiters) => delimiters,
                    Err(error) => {
                        self.observers.report(&error);
                        return;
                    }
                };
                let inputs = SourceInputs {
                    content: FileContent::new(&self.db, Arc::clone(&text)),
                    metadata: FileMetadata::new(
                        &self.db,
                        Arc::clone(&path),
                        Language::from_path(&path),
                        class.kind,
                        Arc::clone(&presets),
                        delimiters,
                    ),
                };
                self.inputs.insert(Arc::clone(&path), inputs);
                inputs
            }
        };

        let parse = Arc::new(graphql_syntax::parse(
            &self.db,
            inputs.content,
            inputs.metadata,
        ));
        let structure = graphql_hir::file_structure(&self.db, inputs.content, inputs.metadata);
        let line_index = graphql_syntax::line_index(&self.db, inputs.content);
        tracing::debug!(
            path = %path.display(),
            kind = ?class.kind,
            documents = parse.document_count(),
            "file updated"
        );

        if class.kind.is_query() {
            let declared = GlobalFragments::declared_in(&path, &parse, &structure);
            let touched = self.fragments.replace(&path, declared);
            batch.touch_fragments(touched);
        } else {
            batch.schema_dirty = true;
        }

        let record = FileRecord {
            path: Arc::clone(&path),
            kind: class.kind,
            presets,
            text,
            fingerprint,
            mtime: self.loader.mtime(&path),
            state: FileState::Parsing,
            parse,
            structure,
            line_index,
            diagnostics: Vec::new().into(),
        };
        batch.removed.remove(&path);
        batch.changed.insert(Arc::clone(&path));
        self.files.insert(path, Arc::new(record));
    }

    fn remove_file(&mut self, path: &Path, batch: &mut Batch) {
        let Some(record) = self.files.remove(path) else {
            return;
        };
        tracing::debug!(path = %path.display(), "file removed");
        if record.kind.is_schema() {
            batch.schema_dirty = true;
        } else {
            self.graph.remove(path);
            self.validations.remove(path);
            let names = self.fragments.remove(path);
            batch.touch_fragments(names);
        }
        batch.changed.remove(path);
        batch.removed.insert(Arc::clone(&record.path));
    }

    fn delimiters_for(&mut self, config: &DelimiterConfig) -> Result<Arc<Delimiters>> {
        if let Some(delimiters) = self.delimiters.get(config) {
            return Ok(Arc::clone(delimiters));
        }
        let compiled = Arc::new(Delimiters::compile(config)?);
        self.delimiters.insert(config.clone(), Arc::clone(&compiled));
        Ok(compiled)
    }

    fn rebuild_schema(&mut self) -> SchemaChange {
        let records: Vec<&FileRecord> = self
            .files
            .values()
            .filter(|record| record.kind.is_schema())
            .map(AsRef::as_ref)
            .collect();
        let files: Vec<SchemaFile<'_>> = records
            .iter()
            .map(|record| SchemaFile {
                path: &record.path,
                parse: &record.parse,
                line_index: &record.line_index,
            })
            .collect();
        let structures: Vec<&FileStructure> =
            records.iter().map(|record| record.structure.as_ref()).collect();
        let extensions: Vec<SchemaExtension<'_>> = self
            .extensions
            .iter()
            .map(|(preset, sdl)| SchemaExtension { preset, sdl })
            .collect();

        let change = self.schema.rebuild(&files, &structures, &extensions);
        self.counters.schema_builds += 1;

        if let Some(build) = &self.schema.build {
            if build.outcome != BuildOutcome::Valid {
                tracing::warn!(
                    outcome = ?build.outcome,
                    errors = build.error_count(),
                    "schema build reported errors"
                );
                self.observers.report(&EngineError::SchemaBuild {
                    outcome: build.outcome,
                    error_count: build.error_count(),
                });
            }
        }
        change
    }

    /// Recompute diagnostics of every schema file after a rebuild
    fn refresh_schema_files(&mut self) {
        let mut updated = Vec::new();
        for record in self.files.values().filter(|record| record.kind.is_schema()) {
            let input = FileInput {
                path: &record.path,
                kind: record.kind,
                parse: &record.parse,
                structure: &record.structure,
                line_index: &record.line_index,
            };
            let mut diagnostics = file_diagnostics(&input);
            if let Some(found) = self
                .schema
                .build
                .as_ref()
                .and_then(|build| build.diagnostics.get(&record.path))
            {
                diagnostics.extend(found.iter().cloned());
            }
            if record.state == FileState::Parsing || *record.diagnostics != *diagnostics {
                updated.push(Arc::new(record.with_diagnostics(diagnostics)));
            }
        }
        for record in updated {
            self.files.insert(Arc::clone(&record.path), record);
        }

        self.schema_errors = self
            .schema
            .build
            .iter()
            .flat_map(|build| &build.unattributed)
            .map(|message| {
                Diagnostic::error(DiagnosticCategory::SchemaBuild, message).with_code("schema")
            })
            .collect();
    }

    /// Query files to look at: changed ones and dependents of touched
    /// symbols, or all of them when the schema can't be diffed.
    fn candidates(&self, batch: &Batch, everything: bool) -> BTreeSet<Arc<Path>> {
        if everything {
            return self
                .files
                .values()
                .filter(|record| record.kind.is_query())
                .map(|record| Arc::clone(&record.path))
                .collect();
        }
        let mut candidates: BTreeSet<Arc<Path>> = batch
            .changed
            .iter()
            .filter(|path| self.is_query_file(path))
            .cloned()
            .collect();
        candidates.extend(
            self.graph
                .dependents_of(&batch.touched)
                .into_iter()
                .filter(|path| self.is_query_file(path)),
        );
        candidates
    }

    fn is_query_file(&self, path: &Path) -> bool {
        self.files
            .get(path)
            .is_some_and(|record| record.kind.is_query())
    }

    fn rules_for(&mut self, presets: &Arc<[Arc<str>]>) -> Arc<RuleSet> {
        if let Some(rules) = self.rule_sets.get(presets) {
            return Arc::clone(rules);
        }
        let mut composed = compose_rules(
            base_rules(),
            presets
                .iter()
                .filter_map(|name| self.presets.get(&**name))
                .map(Preset::rules),
        );

        // the schema carries every preset's directives
        let active: HashSet<String> = presets
            .iter()
            .filter_map(|name| self.presets.get(&**name))
            .flat_map(Preset::extension_directives)
            .collect();
        let preset_only: BTreeMap<String, String> = self
            .presets
            .iter()
            .filter(|(name, _)| !presets.contains(*name))
            .flat_map(|(name, preset)| {
                preset
                    .extension_directives()
                    .into_iter()
                    .map(move |directive| (directive, name.to_string()))
            })
            .filter(|(directive, _)| !active.contains(directive))
            .collect();
        if !preset_only.is_empty()
            && composed.get(KNOWN_DIRECTIVES) == base_rules().get(KNOWN_DIRECTIVES)
        {
            composed.insert(
                KNOWN_DIRECTIVES,
                RuleImpl::with_schema(KnownDirectivesRule::hiding(preset_only)),
            );
        }
        let composed = Arc::new(composed);
        tracing::debug!(?presets, rules = composed.len(), "composed rule set");
        self.rule_sets.insert(Arc::clone(presets), Arc::clone(&composed));
        composed
    }

    fn validation_key(&self, record: &FileRecord, references: &BTreeSet<Symbol>) -> ValidationKey {
        let externals: Vec<(&Symbol, Option<Fingerprint>)> = references
            .iter()
            .map(|symbol| {
                let print = match symbol {
                    Symbol::Fragment(name) => self.fragments.fingerprint_of(name, &record.path),
                    _ => self.schema.fingerprints.get(symbol).copied(),
                };
                (symbol, print)
            })
            .collect();
        ValidationKey {
            content: record.fingerprint,
            presets: Fingerprint::of(&*record.presets),
            has_schema: self.schema.effective.is_some(),
            externals: Fingerprint::of(&externals),
        }
    }

    /// Validate a query file unless its cached result is still valid.
    /// Returns whether it was validated.
    fn revalidate(&mut self, path: &Arc<Path>) -> bool {
        let Some(record) = self.files.get(path).cloned() else {
            return false;
        };
        if let (Some(validation), Some(references)) =
            (self.validations.get(path), self.graph.references_of(path))
        {
            if validation.key == self.validation_key(&record, references) {
                tracing::debug!(path = %path.display(), "validation cache hit");
                return false;
            }
        }

        let rules = self.rules_for(&record.presets);
        let globals: Vec<_> = self
            .fragments
            .visible_from(path)
            .map(|fragment| fragment.definition.clone())
            .collect();
        let index = fragment_index(&record.parse, globals);
        let input = FileInput {
            path: &record.path,
            kind: record.kind,
            parse: &record.parse,
            structure: &record.structure,
            line_index: &record.line_index,
        };
        let schema = self.schema.effective.as_deref();
        let diagnostics = validate_file(&input, &rules, &index, schema);
        let references = collect_references(&record.parse, &index, schema);
        let key = self.validation_key(&record, &references);
        tracing::debug!(
            path = %path.display(),
            diagnostics = diagnostics.len(),
            references = references.len(),
            "validated"
        );

        self.graph.set_references(path, references);
        self.validations.insert(
            Arc::clone(path),
            Validation {
                key,
                diagnostics: diagnostics.into(),
            },
        );
        self.counters.validations += 1;
        true
    }

    /// Give query files their final diagnostics: the cached validation
    /// result plus any global fragment collisions they lose.
    fn refresh_query_files(&mut self, candidates: &BTreeSet<Arc<Path>>) {
        let mut collided: BTreeMap<Arc<Path>, Vec<Diagnostic>> = BTreeMap::new();
        let mut current = BTreeSet::new();
        for collision in self.fragments.collisions() {
            let error = EngineError::FragmentCollision {
                name: collision.name.to_string(),
                id: collision.id.to_string(),
                first: collision.first.to_path_buf(),
                second: collision.second.to_path_buf(),
            };
            if let Some(record) = self.files.get(&collision.second) {
                let location = Location::new(&record.path, &record.line_index, collision.range);
                collided
                    .entry(Arc::clone(&collision.second))
                    .or_default()
                    .push(
                        Diagnostic::error(DiagnosticCategory::Scope, error.to_string())
                            .with_code("fragment_collision")
                            .at(location),
                    );
            }
            let key = (collision.name, collision.id, collision.second);
            if !self.collisions.contains(&key) {
                self.observers.report(&error);
            }
            current.insert(key);
        }

        let mut refresh = candidates.clone();
        refresh.extend(
            self.collisions
                .iter()
                .chain(&current)
                .map(|(_, _, path)| Arc::clone(path)),
        );
        self.collisions = current;

        for path in refresh {
            let Some(validation) = self.validations.get(&path) else {
                continue;
            };
            let mut diagnostics = validation.diagnostics.to_vec();
            diagnostics.extend(collided.remove(&path).unwrap_or_default());
            let Some(record) = self.files.get(&path) else {
                continue;
            };
            if record.state != FileState::Parsing && *record.diagnostics == *diagnostics {
                continue;
            }
            let updated = Arc::new(record.with_diagnostics(diagnostics));
            self.files.insert(path, updated);
        }
    }

    fn publish(
        &mut self,
        batch: &Batch,
        revalidated: Vec<PathBuf>,
        cache_hits: usize,
    ) -> ChangeSummary {
        self.generation += 1;
        self.counters.batches += 1;
        let snapshot = Arc::new(Snapshot {
            generation: self.generation,
            files: self.files.clone(),
            schema: self.schema.effective.clone(),
            schema_outcome: self.schema.outcome(),
            schema_errors: self.schema_errors.clone(),
            globals: self.fragments.iter().cloned().collect(),
        });
        *self.published.write() = Arc::clone(&snapshot);

        let summary = ChangeSummary {
            generation: self.generation,
            changed: batch.changed.iter().map(|path| path.to_path_buf()).collect(),
            removed: batch.removed.iter().map(|path| path.to_path_buf()).collect(),
            revalidated,
            cache_hits,
            errors: snapshot.error_count(),
            warnings: snapshot.warning_count(),
        };
        tracing::info!(
            generation = summary.generation,
            changed = summary.changed.len(),
            removed = summary.removed.len(),
            revalidated = summary.revalidated.len(),
            cache_hits,
            errors = summary.errors,
            symbols = self.graph.symbol_count(),
            dependents = self.graph.file_count(),
            "batch published"
        );
        self.observers.notify_change(&summary);
        summary
    }
}
