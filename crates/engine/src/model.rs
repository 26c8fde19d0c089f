//! The document model: one record per source file.

use graphql_analysis::Diagnostic;
use graphql_hir::FileStructure;
use graphql_syntax::{LineIndex, Parse};
use graphql_types::{Fingerprint, SourceKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Add,
    Change,
    Unlink,
}

/// A file system notification. Delivery may repeat and arrive out of order;
/// the engine always trusts the content it reads when processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Add,
            path: path.into(),
        }
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Change,
            path: path.into(),
        }
    }

    pub fn unlink(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: WatchEventKind::Unlink,
            path: path.into(),
        }
    }
}

/// Processing state of a file.
///
/// `Unknown` until first seen, `Parsing` while its batch runs, then
/// `Validated` or `Errored` until the next change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileState {
    #[default]
    Unknown,
    Parsing,
    Validated,
    Errored,
}

/// Everything the engine knows about a file.
///
/// Records are immutable once published: a change to the file, or a
/// revalidation caused by another file, produces a new record.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: Arc<Path>,
    pub kind: SourceKind,
    /// Presets applying to the file, in application order
    pub presets: Arc<[Arc<str>]>,
    pub text: Arc<str>,
    pub fingerprint: Fingerprint,
    pub mtime: Option<SystemTime>,
    pub state: FileState,
    pub parse: Arc<Parse>,
    pub structure: Arc<FileStructure>,
    pub line_index: Arc<LineIndex>,
    pub diagnostics: Arc<[Diagnostic]>,
}

impl FileRecord {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// A copy carrying new diagnostics, with the state they imply.
    #[must_use]
    pub(crate) fn with_diagnostics(&self, diagnostics: Vec<Diagnostic>) -> Self {
        let state = if diagnostics.iter().any(Diagnostic::is_error) {
            FileState::Errored
        } else {
            FileState::Validated
        };
        Self {
            state,
            diagnostics: Arc::from(diagnostics),
            ..self.clone()
        }
    }
}
