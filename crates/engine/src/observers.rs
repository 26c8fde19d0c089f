use crate::EngineError;
use parking_lot::RwLock;
use std::path::PathBuf;

/// What a batch did, sent to change listeners once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Generation of the snapshot published by the batch
    pub generation: u64,
    /// Files added or whose content changed
    pub changed: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Query files validated from scratch
    pub revalidated: Vec<PathBuf>,
    /// Query files whose cached validation was reused
    pub cache_hits: usize,
    /// Totals over the whole project after the batch
    pub errors: usize,
    pub warnings: usize,
}

pub type ChangeListener = Box<dyn Fn(&ChangeSummary) + Send + Sync>;
pub type ErrorListener = Box<dyn Fn(&EngineError) + Send + Sync>;

/// Listeners owned by one engine. Shared with its analysis handles so that
/// provider failures reach the same error channel.
#[derive(Default)]
pub(crate) struct Observers {
    change: RwLock<Vec<ChangeListener>>,
    error: RwLock<Vec<ErrorListener>>,
}

impl Observers {
    pub(crate) fn on_change(&self, listener: ChangeListener) {
        self.change.write().push(listener);
    }

    pub(crate) fn on_error(&self, listener: ErrorListener) {
        self.error.write().push(listener);
    }

    pub(crate) fn notify_change(&self, summary: &ChangeSummary) {
        for listener in self.change.read().iter() {
            listener(summary);
        }
    }

    pub(crate) fn report(&self, error: &EngineError) {
        match error {
            EngineError::Io { .. } => tracing::error!(%error, "background error"),
            _ => tracing::warn!(%error, "background error"),
        }
        for listener in self.error.read().iter() {
            listener(error);
        }
    }

    pub(crate) fn clear(&self) {
        self.change.write().clear();
        self.error.write().clear();
    }
}
