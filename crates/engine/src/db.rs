//! The engine's salsa database.
//!
//! Besides storage, the database keeps a count of executed queries through
//! salsa's event callback. A query served from cache fires no
//! `WillExecute` event, so the counts say exactly how much work a batch did.

use graphql_hir::{DefaultScopeTagValidator, ScopeTagValidator};
use parking_lot::Mutex;
use salsa::{Event, EventKind, Storage};
use std::collections::HashMap;
use std::sync::Arc;

/// Names of the tracked queries the engine runs
pub mod queries {
    pub const PARSE: &str = "parse";
    pub const FILE_STRUCTURE: &str = "file_structure";
    pub const LINE_INDEX: &str = "line_index";
}

/// Work done since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Executions of the parse query
    pub parses: usize,
    /// Executions of the structure query
    pub structures: usize,
    /// Query files validated from scratch
    pub validations: usize,
    /// Query files whose validation key was unchanged
    pub cache_hits: usize,
    pub schema_builds: usize,
    pub batches: usize,
}

#[derive(Default)]
struct QueryLog {
    counts: HashMap<String, usize>,
}

impl QueryLog {
    fn record(&mut self, query_name: String) {
        *self.counts.entry(query_name).or_insert(0) += 1;
    }

    fn count(&self, query_name: &str) -> usize {
        self.counts.get(query_name).copied().unwrap_or(0)
    }
}

/// `graphql_syntax::parse` is logged as `parse(Id(..))`; keep the bare name.
fn extract_query_name(database_key: &dyn std::fmt::Debug) -> String {
    let debug_str = format!("{database_key:?}");
    let without_args = debug_str.split('(').next().unwrap_or(&debug_str);
    without_args
        .rsplit("::")
        .next()
        .unwrap_or(without_args)
        .to_string()
}

#[derive(Clone)]
pub(crate) struct EngineDatabase {
    storage: Storage<Self>,
    log: Arc<Mutex<QueryLog>>,
    scope_validator: Arc<dyn ScopeTagValidator>,
}

impl Default for EngineDatabase {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScopeTagValidator))
    }
}

impl EngineDatabase {
    pub(crate) fn new(scope_validator: Arc<dyn ScopeTagValidator>) -> Self {
        let log = Arc::new(Mutex::new(QueryLog::default()));
        let log_for_callback = Arc::clone(&log);

        Self {
            storage: Storage::new(Some(Box::new(move |event: Event| {
                if let EventKind::WillExecute { database_key } = event.kind {
                    log_for_callback
                        .lock()
                        .record(extract_query_name(&database_key));
                }
            }))),
            log,
            scope_validator,
        }
    }

    /// How many times a tracked query has executed
    pub(crate) fn executions(&self, query_name: &str) -> usize {
        self.log.lock().count(query_name)
    }
}

#[salsa::db]
impl salsa::Database for EngineDatabase {}

#[salsa::db]
impl graphql_syntax::GraphQLSyntaxDatabase for EngineDatabase {}

#[salsa::db]
impl graphql_hir::GraphQLHirDatabase for EngineDatabase {
    fn scope_tag_validator(&self) -> Arc<dyn ScopeTagValidator> {
        Arc::clone(&self.scope_validator)
    }
}

// SAFETY: storage/storage_mut return references to the owned storage field
unsafe impl salsa::plumbing::HasStorage for EngineDatabase {
    fn storage(&self) -> &Storage<Self> {
        &self.storage
    }

    fn storage_mut(&mut self) -> &mut Storage<Self> {
        &mut self.storage
    }
}
