use apollo_compiler::{ast, Node};
use std::collections::HashMap;

/// A fragment declared in the same file as the document being checked.
#[derive(Debug, Clone)]
pub struct LocalFragment {
    /// Index of the embedded document declaring it
    pub document: usize,
    pub definition: Node<ast::FragmentDefinition>,
}

impl LocalFragment {
    /// Position used to order duplicates: document, then offset.
    fn order_key(&self) -> (usize, usize) {
        (
            self.document,
            self.definition.location().map_or(0, |span| span.offset()),
        )
    }
}

/// Fragments visible from a document.
///
/// A spread resolves to the fragments of its own file first; only when none
/// matches does it resolve to global fragments, of which there may be
/// several with the same name.
#[derive(Debug, Clone, Default)]
pub struct FragmentIndex {
    local: Vec<LocalFragment>,
    global: HashMap<String, Vec<Node<ast::FragmentDefinition>>>,
}

impl FragmentIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local(&mut self, document: usize, definition: Node<ast::FragmentDefinition>) {
        self.local.push(LocalFragment {
            document,
            definition,
        });
    }

    pub fn add_global(&mut self, definition: Node<ast::FragmentDefinition>) {
        self.global
            .entry(definition.name.to_string())
            .or_default()
            .push(definition);
    }

    /// Local fragments with the given name, in declaration order.
    #[must_use]
    pub fn local_named(&self, name: &str) -> Vec<&LocalFragment> {
        let mut found: Vec<&LocalFragment> = self
            .local
            .iter()
            .filter(|f| f.definition.name.as_str() == name)
            .collect();
        found.sort_by_key(|f| f.order_key());
        found
    }

    /// Definitions a spread of `name` refers to.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Vec<&Node<ast::FragmentDefinition>> {
        let local = self.local_named(name);
        if !local.is_empty() {
            return local.into_iter().map(|f| &f.definition).collect();
        }
        self.global
            .get(name)
            .map(|defs| defs.iter().collect())
            .unwrap_or_default()
    }

    /// Whether the first local declaration of `name` is the one at
    /// `(document, offset)`.
    #[must_use]
    pub fn is_first_local(&self, name: &str, document: usize, offset: usize) -> bool {
        self.local_named(name)
            .first()
            .is_none_or(|first| first.order_key() == (document, offset))
    }

    /// All names a spread could resolve to.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.local
            .iter()
            .map(|f| f.definition.name.as_str())
            .chain(self.global.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_compiler::parser::Parser;

    fn fragments(text: &str) -> Vec<Node<ast::FragmentDefinition>> {
        let doc = Parser::new().parse_ast(text, "f.graphql").unwrap();
        doc.definitions
            .into_iter()
            .filter_map(|d| match d {
                ast::Definition::FragmentDefinition(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_local_fragment_shadows_global() {
        let mut index = FragmentIndex::new();
        let local = fragments("fragment F on User { id }");
        let global = fragments("fragment F on User { name }\nfragment G on User { id }");
        index.add_local(0, local[0].clone());
        for def in global {
            index.add_global(def);
        }

        let resolved = index.resolve("F");
        assert_eq!(resolved.len(), 1);
        let ast::Selection::Field(field) = &resolved[0].selection_set[0] else {
            panic!("expected field");
        };
        assert_eq!(field.name.as_str(), "id");
        assert_eq!(index.resolve("G").len(), 1);
        assert!(index.resolve("H").is_empty());
    }

    #[test]
    fn test_first_local_declaration() {
        let mut index = FragmentIndex::new();
        let defs = fragments("fragment F on User { id }\nfragment F on User { name }");
        let second_offset = defs[1].location().unwrap().offset();
        index.add_local(1, defs[1].clone());
        index.add_local(0, defs[0].clone());

        assert!(index.is_first_local("F", 0, 0));
        assert!(!index.is_first_local("F", 1, second_offset));
    }
}
