//! Which query files depend on which definitions.

use graphql_analysis::Symbol;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Edges in both directions: symbol to the files referencing it, and file
/// to the symbols it references. Edges are owned by the referencing file and
/// replaced wholesale whenever it is revalidated.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    dependents: HashMap<Symbol, BTreeSet<Arc<Path>>>,
    references: HashMap<Arc<Path>, BTreeSet<Symbol>>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the references of `file`. Edges of its previous version are
    /// dropped first.
    pub fn set_references(&mut self, file: &Arc<Path>, references: BTreeSet<Symbol>) {
        self.remove(file);
        for symbol in &references {
            self.dependents
                .entry(symbol.clone())
                .or_default()
                .insert(Arc::clone(file));
        }
        self.references.insert(Arc::clone(file), references);
    }

    /// Drop every edge owned by `file`
    pub fn remove(&mut self, file: &Path) {
        let Some(previous) = self.references.remove(file) else {
            return;
        };
        for symbol in previous {
            if let Some(files) = self.dependents.get_mut(&symbol) {
                files.remove(file);
                if files.is_empty() {
                    self.dependents.remove(&symbol);
                }
            }
        }
    }

    /// Files referencing any of `symbols`
    pub fn dependents_of<'a>(
        &self,
        symbols: impl IntoIterator<Item = &'a Symbol>,
    ) -> BTreeSet<Arc<Path>> {
        symbols
            .into_iter()
            .filter_map(|symbol| self.dependents.get(symbol))
            .flatten()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn references_of(&self, file: &Path) -> Option<&BTreeSet<Symbol>> {
        self.references.get(file)
    }

    /// Number of distinct symbols with at least one dependent
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.dependents.len()
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.references.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file(name: &str) -> Arc<Path> {
        Arc::from(PathBuf::from(name))
    }

    fn ty(name: &str) -> Symbol {
        Symbol::Type(Arc::from(name))
    }

    #[test]
    fn test_dependents_follow_references() {
        let mut graph = DependencyGraph::new();
        let a = file("/p/a.graphql");
        let b = file("/p/b.graphql");
        graph.set_references(&a, [ty("User"), ty("Query")].into());
        graph.set_references(&b, [ty("Post"), ty("Query")].into());

        assert_eq!(graph.dependents_of(&[ty("User")]), [a.clone()].into());
        assert_eq!(graph.dependents_of(&[ty("Query")]), [a, b].into());
        assert!(graph.dependents_of(&[ty("Missing")]).is_empty());
    }

    #[test]
    fn test_stale_edges_are_replaced() {
        let mut graph = DependencyGraph::new();
        let a = file("/p/a.graphql");
        graph.set_references(&a, [ty("User")].into());
        graph.set_references(&a, [ty("Post")].into());

        assert!(graph.dependents_of(&[ty("User")]).is_empty());
        assert_eq!(graph.dependents_of(&[ty("Post")]), [a.clone()].into());
        assert_eq!(graph.symbol_count(), 1);

        graph.remove(&a);
        assert_eq!(graph.symbol_count(), 0);
        assert_eq!(graph.file_count(), 0);
        assert!(graph.references_of(&a).is_none());
    }
}
