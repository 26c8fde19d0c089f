use crate::scope::{
    classify_scope, default_scope_tags, normalize_scope_tags, FragmentScope, SCOPE_DIRECTIVE,
    SCOPE_TAGS_ARGUMENT,
};
use apollo_compiler::ast;
use apollo_compiler::Node;
use graphql_base_db::{FileContent, FileMetadata, Fingerprint};
use graphql_extract::ANONYMOUS_FRAGMENT_PREFIX;
use graphql_syntax::EmbeddedDocument;
use graphql_types::OffsetRange;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TypeDefKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

impl std::fmt::Display for TypeDefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = match self {
            Self::Object => "type",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Scalar => "scalar",
            Self::InputObject => "input",
        };
        f.write_str(keyword)
    }
}

/// A field or input field declared on a type definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSite {
    pub name: Arc<str>,
    /// Innermost named type of the field
    pub type_name: Arc<str>,
    pub name_range: OffsetRange,
}

/// A type definition or extension in a schema file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDefinitionSite {
    pub name: Arc<str>,
    pub kind: TypeDefKind,
    pub is_extension: bool,
    pub document: usize,
    pub name_range: OffsetRange,
    pub definition_range: OffsetRange,
    pub fields: Vec<FieldSite>,
    /// Fingerprint of the definition text, independent of its position
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectiveDefinitionSite {
    pub name: Arc<str>,
    pub document: usize,
    pub name_range: OffsetRange,
    pub definition_range: OffsetRange,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl From<ast::OperationType> for OperationType {
    fn from(value: ast::OperationType) -> Self {
        match value {
            ast::OperationType::Query => Self::Query,
            ast::OperationType::Mutation => Self::Mutation,
            ast::OperationType::Subscription => Self::Subscription,
        }
    }
}

/// Operation structure (name and variables, no selection set details)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationStructure {
    pub name: Option<Arc<str>>,
    pub operation_type: OperationType,
    pub variables: Vec<Arc<str>>,
    pub document: usize,
    /// The range of the operation name (if named)
    pub name_range: Option<OffsetRange>,
    pub operation_range: OffsetRange,
}

/// Fragment definition with its resolved scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentStructure {
    pub name: Arc<str>,
    pub type_condition: Arc<str>,
    pub document: usize,
    pub scope: FragmentScope,
    /// Normalized scope tags
    pub tags: Vec<String>,
    /// Names of fragments spread anywhere inside this fragment
    pub spreads: Vec<Arc<str>>,
    /// Type condition plus inline fragment conditions
    pub type_references: Vec<Arc<str>>,
    pub name_range: OffsetRange,
    pub type_condition_range: OffsetRange,
    pub fragment_range: OffsetRange,
    pub fingerprint: Fingerprint,
    /// Name was generated for a `fragment on T` definition
    pub synthetic: bool,
}

/// A `...Name` spread in an executable definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpreadSite {
    pub name: Arc<str>,
    pub document: usize,
    /// Range of the spread name
    pub range: OffsetRange,
    /// Enclosing fragment, if the spread is not inside an operation
    pub enclosing_fragment: Option<Arc<str>>,
}

/// A type condition on a fragment definition or inline fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeConditionSite {
    pub name: Arc<str>,
    pub document: usize,
    pub range: OffsetRange,
}

/// A malformed scope declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeError {
    pub fragment: Arc<str>,
    pub message: String,
    pub range: OffsetRange,
}

/// Names and sites of a file, without selection bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileStructure {
    pub fragments: Vec<FragmentStructure>,
    pub operations: Vec<OperationStructure>,
    pub spreads: Vec<SpreadSite>,
    pub type_conditions: Vec<TypeConditionSite>,
    pub type_defs: Vec<TypeDefinitionSite>,
    pub directive_defs: Vec<DirectiveDefinitionSite>,
    /// Fingerprints of `schema` definitions and extensions
    pub schema_defs: Vec<Fingerprint>,
    pub scope_errors: Vec<ScopeError>,
}

impl FileStructure {
    /// Fragments declared in this file with the given name
    pub fn fragments_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a FragmentStructure> + 'a {
        self.fragments.iter().filter(move |f| f.name.as_ref() == name)
    }

    pub fn type_defs_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a TypeDefinitionSite> + 'a {
        self.type_defs.iter().filter(move |t| t.name.as_ref() == name)
    }

    /// Fingerprint of everything this file contributes under a definition name
    #[must_use]
    pub fn definition_fingerprint(&self, name: &str) -> Option<Fingerprint> {
        let mut prints = self
            .type_defs_named(name)
            .map(|t| t.fingerprint)
            .peekable();
        prints.peek()?;
        Some(prints.fold(Fingerprint::of_text(name), Fingerprint::combine))
    }
}

/// Extract the structure of a file from its parsed documents
#[salsa::tracked]
pub fn file_structure(
    db: &dyn crate::GraphQLHirDatabase,
    content: FileContent,
    metadata: FileMetadata,
) -> Arc<FileStructure> {
    let parse = graphql_syntax::parse(db, content, metadata);
    let path = metadata.path(db);
    let validator = db.scope_tag_validator();

    let mut structure = FileStructure::default();
    for doc in parse.documents() {
        let Some(ast) = doc.ast.as_deref() else {
            continue;
        };
        let mut collector = Collector {
            doc,
            structure: &mut structure,
        };
        for definition in &ast.definitions {
            collector.definition(definition, &path, validator.as_ref());
        }
    }
    Arc::new(structure)
}

struct Collector<'a> {
    doc: &'a EmbeddedDocument,
    structure: &'a mut FileStructure,
}

impl Collector<'_> {
    fn node_range<T: ?Sized>(&self, node: &Node<T>) -> OffsetRange {
        self.doc
            .node_range(node)
            .unwrap_or_else(|| OffsetRange::at(self.doc.range.start))
    }

    fn name_range(&self, name: &apollo_compiler::Name) -> OffsetRange {
        self.doc
            .name_range(name)
            .unwrap_or_else(|| OffsetRange::at(self.doc.range.start))
    }

    /// Fingerprint of a definition's source text
    fn fingerprint<T: ?Sized>(&self, node: &Node<T>) -> Fingerprint {
        let text = node
            .location()
            .and_then(|span| self.doc.source.get(span.offset()..span.end_offset()))
            .unwrap_or_default();
        Fingerprint::of_text(text)
    }

    fn definition(
        &mut self,
        definition: &ast::Definition,
        path: &std::path::Path,
        validator: &dyn crate::ScopeTagValidator,
    ) {
        match definition {
            ast::Definition::OperationDefinition(op) => self.operation(op),
            ast::Definition::FragmentDefinition(frag) => self.fragment(frag, path, validator),
            ast::Definition::DirectiveDefinition(directive) => {
                let site = DirectiveDefinitionSite {
                    name: Arc::from(directive.name.as_str()),
                    document: self.doc.index,
                    name_range: self.name_range(&directive.name),
                    definition_range: self.node_range(directive),
                    fingerprint: self.fingerprint(directive),
                };
                self.structure.directive_defs.push(site);
            }
            ast::Definition::SchemaDefinition(schema) => {
                let print = self.fingerprint(schema);
                self.structure.schema_defs.push(print);
            }
            ast::Definition::SchemaExtension(schema) => {
                let print = self.fingerprint(schema);
                self.structure.schema_defs.push(print);
            }
            ast::Definition::ObjectTypeDefinition(def) => {
                let fields = self.fields(&def.fields);
                self.type_def(def, &def.name, TypeDefKind::Object, false, fields);
            }
            ast::Definition::ObjectTypeExtension(def) => {
                let fields = self.fields(&def.fields);
                self.type_def(def, &def.name, TypeDefKind::Object, true, fields);
            }
            ast::Definition::InterfaceTypeDefinition(def) => {
                let fields = self.fields(&def.fields);
                self.type_def(def, &def.name, TypeDefKind::Interface, false, fields);
            }
            ast::Definition::InterfaceTypeExtension(def) => {
                let fields = self.fields(&def.fields);
                self.type_def(def, &def.name, TypeDefKind::Interface, true, fields);
            }
            ast::Definition::InputObjectTypeDefinition(def) => {
                let fields = self.input_fields(&def.fields);
                self.type_def(def, &def.name, TypeDefKind::InputObject, false, fields);
            }
            ast::Definition::InputObjectTypeExtension(def) => {
                let fields = self.input_fields(&def.fields);
                self.type_def(def, &def.name, TypeDefKind::InputObject, true, fields);
            }
            ast::Definition::UnionTypeDefinition(def) => {
                self.type_def(def, &def.name, TypeDefKind::Union, false, Vec::new());
            }
            ast::Definition::UnionTypeExtension(def) => {
                self.type_def(def, &def.name, TypeDefKind::Union, true, Vec::new());
            }
            ast::Definition::EnumTypeDefinition(def) => {
                self.type_def(def, &def.name, TypeDefKind::Enum, false, Vec::new());
            }
            ast::Definition::EnumTypeExtension(def) => {
                self.type_def(def, &def.name, TypeDefKind::Enum, true, Vec::new());
            }
            ast::Definition::ScalarTypeDefinition(def) => {
                self.type_def(def, &def.name, TypeDefKind::Scalar, false, Vec::new());
            }
            ast::Definition::ScalarTypeExtension(def) => {
                self.type_def(def, &def.name, TypeDefKind::Scalar, true, Vec::new());
            }
        }
    }

    fn type_def<T>(
        &mut self,
        node: &Node<T>,
        name: &apollo_compiler::Name,
        kind: TypeDefKind,
        is_extension: bool,
        fields: Vec<FieldSite>,
    ) {
        let site = TypeDefinitionSite {
            name: Arc::from(name.as_str()),
            kind,
            is_extension,
            document: self.doc.index,
            name_range: self.name_range(name),
            definition_range: self.node_range(node),
            fields,
            fingerprint: self.fingerprint(node),
        };
        self.structure.type_defs.push(site);
    }

    fn fields(&self, fields: &[Node<ast::FieldDefinition>]) -> Vec<FieldSite> {
        fields
            .iter()
            .map(|field| FieldSite {
                name: Arc::from(field.name.as_str()),
                type_name: Arc::from(field.ty.inner_named_type().as_str()),
                name_range: self.name_range(&field.name),
            })
            .collect()
    }

    fn input_fields(&self, fields: &[Node<ast::InputValueDefinition>]) -> Vec<FieldSite> {
        fields
            .iter()
            .map(|field| FieldSite {
                name: Arc::from(field.name.as_str()),
                type_name: Arc::from(field.ty.inner_named_type().as_str()),
                name_range: self.name_range(&field.name),
            })
            .collect()
    }

    fn operation(&mut self, op: &Node<ast::OperationDefinition>) {
        let structure = OperationStructure {
            name: op.name.as_ref().map(|n| Arc::from(n.as_str())),
            operation_type: op.operation_type.into(),
            variables: op
                .variables
                .iter()
                .map(|v| Arc::from(v.name.as_str()))
                .collect(),
            document: self.doc.index,
            name_range: op.name.as_ref().map(|n| self.name_range(n)),
            operation_range: self.node_range(op),
        };
        self.structure.operations.push(structure);

        let mut references = References::default();
        self.selections(&op.selection_set, None, &mut references);
    }

    fn fragment(
        &mut self,
        frag: &Node<ast::FragmentDefinition>,
        path: &std::path::Path,
        validator: &dyn crate::ScopeTagValidator,
    ) {
        let name: Arc<str> = Arc::from(frag.name.as_str());
        let type_condition_range = self.name_range(&frag.type_condition);
        self.structure.type_conditions.push(TypeConditionSite {
            name: Arc::from(frag.type_condition.as_str()),
            document: self.doc.index,
            range: type_condition_range,
        });

        let mut references = References::default();
        references.push_type(frag.type_condition.as_str());
        self.selections(&frag.selection_set, Some(&name), &mut references);

        let tags = match self.scope_tags(frag, &name, validator) {
            Some(tags) => normalize_scope_tags(&tags, path, &name),
            None => default_scope_tags(),
        };

        let structure = FragmentStructure {
            scope: classify_scope(&tags),
            tags,
            type_condition: Arc::from(frag.type_condition.as_str()),
            document: self.doc.index,
            spreads: references.spreads,
            type_references: references.types,
            name_range: self.name_range(&frag.name),
            type_condition_range,
            fragment_range: self.node_range(frag),
            fingerprint: self.fingerprint(frag),
            synthetic: name.starts_with(ANONYMOUS_FRAGMENT_PREFIX),
            name,
        };
        self.structure.fragments.push(structure);
    }

    /// Reads `@scope(tags: [...])`. Malformed declarations are recorded as
    /// scope errors and the fragment falls back to document scope.
    fn scope_tags(
        &mut self,
        frag: &Node<ast::FragmentDefinition>,
        name: &Arc<str>,
        validator: &dyn crate::ScopeTagValidator,
    ) -> Option<Vec<String>> {
        let directive = frag.directives.iter().find(|d| d.name.as_str() == SCOPE_DIRECTIVE)?;
        let range = self.node_range(directive);
        let value = directive
            .arguments
            .iter()
            .find(|arg| arg.name.as_str() == SCOPE_TAGS_ARGUMENT)
            .map(|arg| &arg.value);

        let tags = match value.map(|v| &**v) {
            Some(ast::Value::List(items)) => items
                .iter()
                .map(|item| match &**item {
                    ast::Value::String(tag) => Some(tag.clone()),
                    _ => None,
                })
                .collect::<Option<Vec<String>>>(),
            Some(ast::Value::String(tag)) => Some(vec![tag.clone()]),
            _ => None,
        };

        let Some(tags) = tags else {
            self.structure.scope_errors.push(ScopeError {
                fragment: name.clone(),
                message: format!(
                    "@{SCOPE_DIRECTIVE} on fragment \"{name}\" needs a \"{SCOPE_TAGS_ARGUMENT}\" list of strings"
                ),
                range,
            });
            return None;
        };

        let mut valid = Vec::with_capacity(tags.len());
        for tag in tags {
            match validator.validate(&tag) {
                Ok(()) => valid.push(tag),
                Err(message) => self.structure.scope_errors.push(ScopeError {
                    fragment: name.clone(),
                    message,
                    range,
                }),
            }
        }
        (!valid.is_empty()).then_some(valid)
    }

    fn selections(
        &mut self,
        selections: &[ast::Selection],
        enclosing: Option<&Arc<str>>,
        references: &mut References,
    ) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => {
                    self.selections(&field.selection_set, enclosing, references);
                }
                ast::Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    if self.doc.is_stand_in(name) {
                        continue;
                    }
                    references.push_spread(name);
                    let site = SpreadSite {
                        name: Arc::from(name),
                        document: self.doc.index,
                        range: self.name_range(&spread.fragment_name),
                        enclosing_fragment: enclosing.cloned(),
                    };
                    self.structure.spreads.push(site);
                }
                ast::Selection::InlineFragment(inline) => {
                    if let Some(condition) = &inline.type_condition {
                        references.push_type(condition.as_str());
                        let site = TypeConditionSite {
                            name: Arc::from(condition.as_str()),
                            document: self.doc.index,
                            range: self.name_range(condition),
                        };
                        self.structure.type_conditions.push(site);
                    }
                    self.selections(&inline.selection_set, enclosing, references);
                }
            }
        }
    }
}

#[derive(Default)]
struct References {
    spreads: Vec<Arc<str>>,
    types: Vec<Arc<str>>,
}

impl References {
    fn push_spread(&mut self, name: &str) {
        if !self.spreads.iter().any(|s| s.as_ref() == name) {
            self.spreads.push(Arc::from(name));
        }
    }

    fn push_type(&mut self, name: &str) {
        if !self.types.iter().any(|s| s.as_ref() == name) {
            self.types.push(Arc::from(name));
        }
    }
}
