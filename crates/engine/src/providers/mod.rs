//! Capability providers and their aggregation.
//!
//! Every query (hints, definitions, info, refs) asks each provider that
//! applies to the file: the base providers first, then those of each of the
//! file's presets in order. Results are concatenated. A provider that
//! returns an error or panics is reported on the error channel and left out
//! of the result; the others still contribute.

mod completion;
mod definition;
mod hover;
mod references;

pub use completion::CompletionProvider;
pub use definition::DefinitionProvider;
pub use hover::HoverProvider;
pub use references::ReferencesProvider;

use crate::observers::Observers;
use crate::snapshot::Snapshot;
use crate::{CursorTarget, EngineError, FileRecord, ProviderError};
use apollo_compiler::Schema;
use graphql_analysis::Location;
use graphql_syntax::EmbeddedDocument;
use graphql_types::{Position, Range};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

/// A position in a file, 0-based
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParams {
    pub path: PathBuf,
    pub position: Position,
}

impl QueryParams {
    pub fn new(path: impl Into<PathBuf>, line: u32, character: u32) -> Self {
        Self {
            path: path.into(),
            position: Position::new(line, character),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintKind {
    Field,
    Type,
    Fragment,
    Directive,
}

/// A completion hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub label: String,
    pub kind: HintKind,
    pub detail: Option<String>,
    /// Text to insert when it differs from the label
    pub insert_text: Option<String>,
}

impl Hint {
    pub fn new(label: impl Into<String>, kind: HintKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            insert_text: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_insert_text(mut self, text: impl Into<String>) -> Self {
        self.insert_text = Some(text.into());
        self
    }
}

/// Hover information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    /// Markdown content
    pub contents: String,
    pub range: Option<Range>,
}

impl Info {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            range: None,
        }
    }
}

/// Everything a provider gets to look at
pub struct ProviderContext<'a> {
    pub snapshot: &'a Snapshot,
    pub file: &'a FileRecord,
    /// The embedded document under the cursor
    pub document: &'a EmbeddedDocument,
    /// Cursor offset in the parent file
    pub offset: usize,
    pub target: CursorTarget,
}

impl ProviderContext<'_> {
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.snapshot.schema()
    }
}

/// A read-only contributor to interactive queries.
///
/// Providers run against a published snapshot and must not assume anything
/// about other providers. Every capability defaults to contributing nothing.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn hints(&self, _cx: &ProviderContext<'_>) -> Result<Vec<Hint>, ProviderError> {
        Ok(Vec::new())
    }

    fn definitions(&self, _cx: &ProviderContext<'_>) -> Result<Vec<Location>, ProviderError> {
        Ok(Vec::new())
    }

    fn info(&self, _cx: &ProviderContext<'_>) -> Result<Vec<Info>, ProviderError> {
        Ok(Vec::new())
    }

    fn refs(&self, _cx: &ProviderContext<'_>) -> Result<Vec<Location>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Providers every file gets
#[must_use]
pub fn base_providers() -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(CompletionProvider),
        Arc::new(DefinitionProvider),
        Arc::new(HoverProvider),
        Arc::new(ReferencesProvider),
    ]
}

/// Base providers plus the providers of each preset
#[derive(Default)]
pub(crate) struct ProviderRegistry {
    base: Vec<Arc<dyn Provider>>,
    by_preset: HashMap<Arc<str>, Vec<Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub(crate) fn new(base: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            base,
            by_preset: HashMap::new(),
        }
    }

    pub(crate) fn register(&mut self, preset: Arc<str>, providers: Vec<Arc<dyn Provider>>) {
        self.by_preset.insert(preset, providers);
    }

    fn for_presets<'a>(&'a self, presets: &'a [Arc<str>]) -> impl Iterator<Item = &'a Arc<dyn Provider>> {
        self.base.iter().chain(
            presets
                .iter()
                .filter_map(|preset| self.by_preset.get(preset))
                .flatten(),
        )
    }

    pub(crate) fn aggregate<T>(
        &self,
        cx: &ProviderContext<'_>,
        observers: &Observers,
        call: impl Fn(&dyn Provider, &ProviderContext<'_>) -> Result<Vec<T>, ProviderError>,
    ) -> Vec<T> {
        let mut results = Vec::new();
        for provider in self.for_presets(&cx.file.presets) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(provider.as_ref(), cx)));
            let error = match outcome {
                Ok(Ok(items)) => {
                    results.extend(items);
                    continue;
                }
                Ok(Err(error)) => error,
                Err(payload) => ProviderError::Panicked {
                    provider: provider.name().to_string(),
                    message: panic_message(payload.as_ref()),
                },
            };
            observers.report(&EngineError::Provider(error));
        }
        results
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
