//! File access used by the engine.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where the engine reads files from.
///
/// The engine never touches the filesystem directly, so hosts can serve
/// unsaved editor buffers and tests can run entirely in memory.
pub trait SourceLoader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Last modification time, if the source has one
    fn mtime(&self, path: &Path) -> Option<SystemTime>;

    /// Every file under `root`, in a stable order.
    fn scan(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Directories never worth descending into
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Reads from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskLoader;

impl SourceLoader for DiskLoader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn mtime(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    fn scan(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = walkdir::WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| SKIPPED_DIRS.contains(&name)))
            });
        for entry in walker {
            let entry = entry.map_err(io::Error::other)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_disk_loader_scans_and_reads() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/queries")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("schema.graphql"), "type Query { a: Int }").unwrap();
        fs::write(dir.path().join("src/queries/a.graphql"), "{ a }").unwrap();
        fs::write(dir.path().join("node_modules/pkg/x.graphql"), "{ a }").unwrap();

        let loader = DiskLoader;
        let files = loader.scan(dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("schema.graphql"),
                PathBuf::from("src/queries/a.graphql")
            ]
        );

        assert_eq!(loader.read(&files[1]).unwrap(), "{ a }");
        assert!(loader.mtime(&files[1]).is_some());
        assert!(loader.read(&dir.path().join("missing.graphql")).is_err());
    }
}
