//! Watch mode: feeds file system events to the engine in debounced batches.
//!
//! Uses the `notify` crate for cross-platform file system events. Events for
//! paths outside the config are passed through; the engine ignores them.

use crate::output::Printer;
use anyhow::{Context, Result};
use colored::Colorize;
use graphql_config::ProjectConfig;
use graphql_engine::{Engine, WatchEvent, WatchEventKind};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

/// Quiet period before a burst of events is handed to the engine
const DEBOUNCE: Duration = Duration::from_millis(100);

const IDLE_POLL: Duration = Duration::from_secs(60);

pub struct FileWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_paths: BTreeSet<PathBuf>,
}

impl FileWatcher {
    pub fn new(root: &Path, config: &ProjectConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .context("Failed to create file watcher")?;

        Ok(Self {
            watcher,
            rx,
            watch_paths: collect_watch_paths(root, config),
        })
    }

    pub fn start(&mut self) -> Result<()> {
        for path in &self.watch_paths {
            tracing::debug!(path = %path.display(), "watching");
            self.watcher
                .watch(path, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch path: {}", path.display()))?;
        }
        Ok(())
    }

    /// Run until the watcher goes away
    pub fn run(&mut self, engine: &mut Engine, printer: &Printer) {
        let mut pending: Vec<WatchEvent> = Vec::new();
        let mut last_event: Option<Instant> = None;

        loop {
            let timeout = if last_event.is_some() { DEBOUNCE } else { IDLE_POLL };
            match self.rx.recv_timeout(timeout) {
                Ok(Ok(event)) => {
                    let events = to_watch_events(event);
                    if !events.is_empty() {
                        pending.extend(events);
                        last_event = Some(Instant::now());
                    }
                }
                Ok(Err(e)) => {
                    eprintln!("{} {}", "Watch error:".red(), e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    let settled = last_event.is_some_and(|last| last.elapsed() >= DEBOUNCE);
                    if settled {
                        last_event = None;
                        let batch = std::mem::take(&mut pending);
                        tracing::debug!(events = batch.len(), "applying batch");
                        if let Some(summary) = engine.apply(batch) {
                            printer.print_batch(&engine.analysis(), &summary, false);
                        }
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

/// The deepest existing directory above each glob's first wildcard, or the
/// root when a glob starts with one.
fn collect_watch_paths(root: &Path, config: &ProjectConfig) -> BTreeSet<PathBuf> {
    let patterns = config
        .schema
        .patterns()
        .into_iter()
        .chain(config.documents.iter().flat_map(|group| group.include.patterns()));

    let mut paths = BTreeSet::new();
    for pattern in patterns {
        let literal = pattern
            .split(['*', '?', '[', '{'])
            .next()
            .unwrap_or_default();
        let mut dir = root.join(literal);
        while !dir.is_dir() {
            match dir.parent() {
                Some(parent) if parent.starts_with(root) => dir = parent.to_path_buf(),
                _ => {
                    dir = root.to_path_buf();
                    break;
                }
            }
        }
        paths.insert(dir);
    }

    // nested directories are covered by recursive watches on their parents
    let roots: Vec<PathBuf> = paths.iter().cloned().collect();
    paths.retain(|path| {
        !roots
            .iter()
            .any(|other| other != path && path.starts_with(other))
    });
    if paths.is_empty() {
        paths.insert(root.to_path_buf());
    }
    paths
}

fn to_watch_events(event: Event) -> Vec<WatchEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => Some(WatchEventKind::Add),
        // renames report both ends; which one a path is shows on disk
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) => Some(WatchEventKind::Change),
        EventKind::Remove(_) => Some(WatchEventKind::Unlink),
        _ => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| {
            let kind = kind.unwrap_or_else(|| {
                if path.exists() {
                    WatchEventKind::Add
                } else {
                    WatchEventKind::Unlink
                }
            });
            WatchEvent { kind, path }
        })
        .collect()
}
