//! The project-wide table of global fragments.

use apollo_compiler::{ast, Node};
use graphql_analysis::fragment_definitions;
use graphql_hir::{FileStructure, FragmentScope};
use graphql_syntax::Parse;
use graphql_types::{Fingerprint, OffsetRange};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// A fragment visible from every query file
#[derive(Debug, Clone)]
pub struct GlobalFragment {
    pub name: Arc<str>,
    /// Id from the `global:<id>` scope tag
    pub id: Arc<str>,
    pub path: Arc<Path>,
    pub document: usize,
    pub name_range: OffsetRange,
    pub fingerprint: Fingerprint,
    pub definition: Node<ast::FragmentDefinition>,
}

/// Two files declaring a global fragment with the same name and id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub name: Arc<str>,
    pub id: Arc<str>,
    /// The file keeping the identity
    pub first: Arc<Path>,
    /// The file reported
    pub second: Arc<Path>,
    pub range: OffsetRange,
}

/// Global fragments by declaring file. Entries are replaced per file, never
/// edited in place.
#[derive(Debug, Default)]
pub struct GlobalFragments {
    by_file: BTreeMap<Arc<Path>, Vec<GlobalFragment>>,
}

impl GlobalFragments {
    /// Global fragments declared by a parsed file
    #[must_use]
    pub fn declared_in(
        path: &Arc<Path>,
        parse: &Parse,
        structure: &FileStructure,
    ) -> Vec<GlobalFragment> {
        structure
            .fragments
            .iter()
            .filter_map(|fragment| {
                let FragmentScope::Global(id) = &fragment.scope else {
                    return None;
                };
                let definition = fragment_definitions(parse)
                    .find(|(document, definition)| {
                        *document == fragment.document
                            && definition.name.as_str() == fragment.name.as_ref()
                    })
                    .map(|(_, definition)| definition.clone())?;
                Some(GlobalFragment {
                    name: fragment.name.clone(),
                    id: id.clone(),
                    path: Arc::clone(path),
                    document: fragment.document,
                    name_range: fragment.name_range,
                    fingerprint: fragment.fingerprint,
                    definition,
                })
            })
            .collect()
    }

    /// Replace the global fragments of `path`, returning the names whose
    /// definitions were added, changed or removed.
    pub fn replace(&mut self, path: &Arc<Path>, fragments: Vec<GlobalFragment>) -> BTreeSet<Arc<str>> {
        let previous = self.by_file.remove(path).unwrap_or_default();
        let touched = touched_names(&previous, &fragments);
        if !fragments.is_empty() {
            self.by_file.insert(Arc::clone(path), fragments);
        }
        touched
    }

    /// Drop the global fragments of `path`, returning their names
    pub fn remove(&mut self, path: &Path) -> BTreeSet<Arc<str>> {
        self.by_file
            .remove(path)
            .unwrap_or_default()
            .into_iter()
            .map(|fragment| fragment.name)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalFragment> {
        self.by_file.values().flatten()
    }

    /// Global fragments declared outside `path`
    pub fn visible_from<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a GlobalFragment> {
        self.by_file
            .iter()
            .filter(move |(file, _)| file.as_ref() != path)
            .flat_map(|(_, fragments)| fragments)
    }

    /// Combined fingerprint of the global fragments named `name` declared
    /// outside `path`
    #[must_use]
    pub fn fingerprint_of(&self, name: &str, path: &Path) -> Option<Fingerprint> {
        self.visible_from(path)
            .filter(|fragment| fragment.name.as_ref() == name)
            .map(|fragment| fragment.fingerprint)
            .reduce(Fingerprint::combine)
    }

    /// Same name and id declared by more than one file. The first file in
    /// path order keeps the identity; every later one is reported.
    #[must_use]
    pub fn collisions(&self) -> Vec<Collision> {
        let mut owners: BTreeMap<(&str, &str), &Arc<Path>> = BTreeMap::new();
        let mut collisions = Vec::new();
        for (path, fragments) in &self.by_file {
            for fragment in fragments {
                let key = (fragment.name.as_ref(), fragment.id.as_ref());
                match owners.get(&key) {
                    Some(first) if *first != path => collisions.push(Collision {
                        name: fragment.name.clone(),
                        id: fragment.id.clone(),
                        first: Arc::clone(first),
                        second: Arc::clone(path),
                        range: fragment.name_range,
                    }),
                    Some(_) => {}
                    None => {
                        owners.insert(key, path);
                    }
                }
            }
        }
        collisions
    }
}

fn touched_names(previous: &[GlobalFragment], current: &[GlobalFragment]) -> BTreeSet<Arc<str>> {
    let summarize = |fragments: &[GlobalFragment]| {
        let mut by_name: BTreeMap<Arc<str>, Vec<(Arc<str>, Fingerprint)>> = BTreeMap::new();
        for fragment in fragments {
            by_name
                .entry(fragment.name.clone())
                .or_default()
                .push((fragment.id.clone(), fragment.fingerprint));
        }
        by_name
    };
    let before = summarize(previous);
    let after = summarize(current);
    before
        .keys()
        .chain(after.keys())
        .filter(|name| before.get(*name) != after.get(*name))
        .cloned()
        .collect()
}
