//! What a query file depends on.

use apollo_compiler::{ast, Name, Node, Schema};
use graphql_hir::FileStructure;
use graphql_rules::visit::{walk, Ancestor, Visitor};
use graphql_rules::FragmentIndex;
use graphql_syntax::Parse;
use graphql_types::Fingerprint;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// A definition other files can depend on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Type(Arc<str>),
    Directive(Arc<str>),
    /// A fragment, by name
    Fragment(Arc<str>),
    /// The `schema` definition choosing root operation types
    SchemaRoot,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => write!(f, "type {name}"),
            Self::Directive(name) => write!(f, "directive @{name}"),
            Self::Fragment(name) => write!(f, "fragment {name}"),
            Self::SchemaRoot => f.write_str("schema"),
        }
    }
}

/// Symbols referenced by a query file.
///
/// Syntactic references (type conditions, variable types, directives,
/// spreads and everything reachable through spreads) are always recorded.
/// With a schema, the root type of each operation and, for each field, the
/// type it is selected on and the type it returns are recorded as well, so
/// a change to any of them revalidates the file. Names that don't resolve
/// are still recorded so that defining them later does too.
#[must_use]
pub fn collect_references(
    parse: &Parse,
    fragments: &FragmentIndex,
    schema: Option<&Schema>,
) -> BTreeSet<Symbol> {
    let mut collector = ReferenceCollector {
        schema,
        symbols: BTreeSet::new(),
        spreads: Vec::new(),
    };
    for document in parse.documents() {
        if let Some(ast) = document.ast.as_deref() {
            walk(ast, schema, &mut collector);
        }
    }

    let mut visited = HashSet::new();
    while let Some(name) = collector.spreads.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        collector.symbols.insert(Symbol::Fragment(Arc::from(name.as_str())));
        for fragment in fragments.resolve(&name) {
            collector
                .symbols
                .insert(Symbol::Type(Arc::from(fragment.type_condition.as_str())));
            collect_spreads(&fragment.selection_set, &mut collector.spreads);
        }
    }
    collector.symbols
}

fn collect_spreads(selections: &[ast::Selection], out: &mut Vec<Name>) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => collect_spreads(&field.selection_set, out),
            ast::Selection::FragmentSpread(spread) => out.push(spread.fragment_name.clone()),
            ast::Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, out),
        }
    }
}

struct ReferenceCollector<'s> {
    schema: Option<&'s Schema>,
    symbols: BTreeSet<Symbol>,
    spreads: Vec<Name>,
}

impl ReferenceCollector<'_> {
    fn add_type(&mut self, name: &str) {
        self.symbols.insert(Symbol::Type(Arc::from(name)));
    }
}

impl<'a> Visitor<'a> for ReferenceCollector<'_> {
    fn enter_operation(&mut self, operation: &'a Node<ast::OperationDefinition>) {
        for variable in &operation.variables {
            self.add_type(variable.ty.inner_named_type());
        }
        if let Some(schema) = self.schema {
            self.symbols.insert(Symbol::SchemaRoot);
            if let Some(root) = schema.root_operation(operation.operation_type) {
                self.add_type(root);
            }
        }
        // an implicit root type is looked up by its default name
        self.add_type(&operation.operation_type.default_type_name());
    }

    fn enter_fragment(&mut self, fragment: &'a Node<ast::FragmentDefinition>) {
        self.add_type(&fragment.type_condition);
    }

    fn field(
        &mut self,
        field: &'a Node<ast::Field>,
        parent_type: Option<&'a Name>,
        _: &[Ancestor<'a>],
    ) {
        let (Some(schema), Some(parent)) = (self.schema, parent_type) else {
            return;
        };
        self.add_type(parent);
        if let Ok(definition) = schema.type_field(parent, &field.name) {
            self.add_type(definition.ty.inner_named_type());
        }
    }

    fn fragment_spread(&mut self, spread: &'a Node<ast::FragmentSpread>, _: &[Ancestor<'a>]) {
        self.spreads.push(spread.fragment_name.clone());
    }

    fn inline_fragment(&mut self, inline: &'a Node<ast::InlineFragment>, _: &[Ancestor<'a>]) {
        if let Some(condition) = &inline.type_condition {
            self.add_type(condition);
        }
    }

    fn directive(&mut self, directive: &'a Node<ast::Directive>, _: &[Ancestor<'a>]) {
        self.symbols
            .insert(Symbol::Directive(Arc::from(directive.name.as_str())));
    }
}

/// Fingerprint of every schema symbol, combined across files.
///
/// `files` must be in a stable order (by path) so that a definition split
/// over extensions in several files fingerprints the same way each time.
#[must_use]
pub fn schema_fingerprints<'a>(
    files: impl IntoIterator<Item = &'a FileStructure>,
    extensions: &[&str],
) -> BTreeMap<Symbol, Fingerprint> {
    let mut prints: BTreeMap<Symbol, Fingerprint> = BTreeMap::new();
    let mut fold = |symbol: Symbol, print: Fingerprint| {
        prints
            .entry(symbol)
            .and_modify(|current| *current = current.combine(print))
            .or_insert(print);
    };

    for sdl in extensions {
        fold(Symbol::SchemaRoot, Fingerprint::of_text(sdl));
    }
    for structure in files {
        for site in &structure.type_defs {
            fold(Symbol::Type(site.name.clone()), site.fingerprint);
        }
        for site in &structure.directive_defs {
            fold(Symbol::Directive(site.name.clone()), site.fingerprint);
        }
        for print in &structure.schema_defs {
            fold(Symbol::SchemaRoot, *print);
        }
    }
    prints
}

/// Symbols whose fingerprint differs between two schema versions, including
/// ones only present in one of them.
#[must_use]
pub fn touched_symbols(
    previous: &BTreeMap<Symbol, Fingerprint>,
    current: &BTreeMap<Symbol, Fingerprint>,
) -> BTreeSet<Symbol> {
    let removed_or_changed = previous
        .iter()
        .filter(|(symbol, print)| current.get(*symbol) != Some(*print))
        .map(|(symbol, _)| symbol.clone());
    let added = current
        .keys()
        .filter(|symbol| !previous.contains_key(*symbol))
        .cloned();
    removed_or_changed.chain(added).collect()
}
