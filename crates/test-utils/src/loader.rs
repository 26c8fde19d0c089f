//! An in-memory file system for engine tests.

use graphql_engine::SourceLoader;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[derive(Debug, Default)]
struct Files {
    contents: BTreeMap<PathBuf, (String, SystemTime)>,
    unreadable: BTreeSet<PathBuf>,
    writes: u64,
}

/// Files kept in memory. Clones share the same files, so a test can keep
/// one handle and give another to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: Arc<RwLock<Files>>,
}

impl MemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file. Every write gets a later mtime.
    pub fn write(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let mut files = self.files.write();
        files.writes += 1;
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(files.writes);
        files.contents.insert(path.into(), (text.into(), mtime));
    }

    /// Returns whether the file existed
    pub fn remove(&self, path: &Path) -> bool {
        self.files.write().contents.remove(path).is_some()
    }

    /// Make reads of `path` fail with a permission error
    pub fn set_unreadable(&self, path: impl Into<PathBuf>) {
        self.files.write().unreadable.insert(path.into());
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.read().contents.contains_key(path)
    }
}

impl SourceLoader for MemoryLoader {
    fn read(&self, path: &Path) -> io::Result<String> {
        let files = self.files.read();
        if files.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not readable", path.display()),
            ));
        }
        files
            .contents
            .get(path)
            .map(|(text, _)| text.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn mtime(&self, path: &Path) -> Option<SystemTime> {
        self.files.read().contents.get(path).map(|(_, mtime)| *mtime)
    }

    fn scan(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .read()
            .contents
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_remove() {
        let loader = MemoryLoader::new();
        let path = Path::new("/p/a.graphql");
        loader.write(path, "type Query { a: Int }");
        assert_eq!(loader.read(path).unwrap(), "type Query { a: Int }");

        let first = loader.mtime(path).unwrap();
        loader.write(path, "type Query { b: Int }");
        assert!(loader.mtime(path).unwrap() > first);

        assert!(loader.remove(path));
        assert_eq!(loader.read(path).unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_scan_is_sorted_and_scoped() {
        let loader = MemoryLoader::new();
        loader.write("/p/b.graphql", "");
        loader.write("/p/a.graphql", "");
        loader.write("/other/c.graphql", "");
        assert_eq!(
            loader.scan(Path::new("/p")).unwrap(),
            vec![PathBuf::from("/p/a.graphql"), PathBuf::from("/p/b.graphql")]
        );
    }

    #[test]
    fn test_unreadable() {
        let loader = MemoryLoader::new();
        loader.write("/p/a.graphql", "");
        loader.set_unreadable("/p/a.graphql");
        let err = loader.read(Path::new("/p/a.graphql")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
