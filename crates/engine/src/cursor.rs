//! What the cursor is on.

use apollo_compiler::parser::SourceSpan;
use apollo_compiler::{ast, Name, Node, Schema};

/// The syntax under a cursor, resolved against the schema where that's
/// needed to know a parent type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorTarget {
    /// The name of a selected field
    Field {
        parent_type: Option<String>,
        name: String,
        /// Directives applied to the field
        directives: Vec<String>,
    },
    /// Inside a selection set but not on a name
    Selection { parent_type: Option<String> },
    FragmentSpread { name: String },
    FragmentDefinition { name: String },
    /// Type condition of a fragment or inline fragment
    TypeCondition { name: String },
    /// A type reference in a variable, field or argument definition
    NamedType { name: String },
    Directive { name: String },
    /// The name of a type definition or extension
    SchemaType { name: String },
    /// The name of a field definition
    SchemaField { type_name: String, name: String },
    None,
}

impl CursorTarget {
    /// The type this target names, if any
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::TypeCondition { name } | Self::NamedType { name } | Self::SchemaType { name } => {
                Some(name)
            }
            _ => None,
        }
    }

    /// The fragment this target names, if any
    #[must_use]
    pub fn fragment_name(&self) -> Option<&str> {
        match self {
            Self::FragmentSpread { name } | Self::FragmentDefinition { name } => Some(name),
            _ => None,
        }
    }
}

fn covers(span: Option<SourceSpan>, offset: usize) -> bool {
    span.is_some_and(|span| span.offset() <= offset && offset <= span.end_offset())
}

fn on_name(name: &Name, offset: usize) -> bool {
    covers(name.location(), offset)
}

/// Resolve the target at `offset`, an offset in the document's own source.
#[must_use]
pub fn target_at(document: &ast::Document, offset: usize, schema: Option<&Schema>) -> CursorTarget {
    let Some(definition) = document
        .definitions
        .iter()
        .find(|definition| covers(definition.location(), offset))
    else {
        return CursorTarget::None;
    };

    let cursor = Cursor { offset, schema };
    let target = match definition {
        ast::Definition::OperationDefinition(operation) => cursor.operation(operation),
        ast::Definition::FragmentDefinition(fragment) => cursor.fragment(fragment),
        ast::Definition::ObjectTypeDefinition(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.named_types(&def.implements_interfaces))
            .or_else(|| cursor.field_definitions(&def.name, &def.fields))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::ObjectTypeExtension(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.named_types(&def.implements_interfaces))
            .or_else(|| cursor.field_definitions(&def.name, &def.fields))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::InterfaceTypeDefinition(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.named_types(&def.implements_interfaces))
            .or_else(|| cursor.field_definitions(&def.name, &def.fields))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::InterfaceTypeExtension(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.named_types(&def.implements_interfaces))
            .or_else(|| cursor.field_definitions(&def.name, &def.fields))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::UnionTypeDefinition(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.named_types(&def.members))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::UnionTypeExtension(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.named_types(&def.members))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::InputObjectTypeDefinition(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.input_values(&def.fields))
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::EnumTypeDefinition(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::ScalarTypeDefinition(def) => cursor
            .type_name(&def.name)
            .or_else(|| cursor.directives(&def.directives)),
        ast::Definition::DirectiveDefinition(def) => on_name(&def.name, offset)
            .then(|| CursorTarget::Directive {
                name: def.name.to_string(),
            })
            .or_else(|| cursor.input_values(&def.arguments)),
        _ => None,
    };
    target.unwrap_or(CursorTarget::None)
}

struct Cursor<'s> {
    offset: usize,
    schema: Option<&'s Schema>,
}

impl Cursor<'_> {
    fn operation(&self, operation: &Node<ast::OperationDefinition>) -> Option<CursorTarget> {
        if let Some(target) = self.directives(&operation.directives) {
            return Some(target);
        }
        for variable in &operation.variables {
            let named = variable.ty.inner_named_type();
            if on_name(named, self.offset) {
                return Some(CursorTarget::NamedType {
                    name: named.to_string(),
                });
            }
        }
        let root = self
            .schema
            .and_then(|schema| schema.root_operation(operation.operation_type))
            .map(ToString::to_string);
        Some(self.selections(&operation.selection_set, root))
    }

    fn fragment(&self, fragment: &Node<ast::FragmentDefinition>) -> Option<CursorTarget> {
        if on_name(&fragment.name, self.offset) {
            return Some(CursorTarget::FragmentDefinition {
                name: fragment.name.to_string(),
            });
        }
        if on_name(&fragment.type_condition, self.offset) {
            return Some(CursorTarget::TypeCondition {
                name: fragment.type_condition.to_string(),
            });
        }
        if let Some(target) = self.directives(&fragment.directives) {
            return Some(target);
        }
        Some(self.selections(
            &fragment.selection_set,
            Some(fragment.type_condition.to_string()),
        ))
    }

    fn selections(&self, selections: &[ast::Selection], parent_type: Option<String>) -> CursorTarget {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) if covers(field.location(), self.offset) => {
                    if on_name(&field.name, self.offset) {
                        return CursorTarget::Field {
                            parent_type,
                            name: field.name.to_string(),
                            directives: field
                                .directives
                                .iter()
                                .map(|directive| directive.name.to_string())
                                .collect(),
                        };
                    }
                    if let Some(target) = self.directives(&field.directives) {
                        return target;
                    }
                    let field_type = parent_type.as_deref().zip(self.schema).and_then(|(parent, schema)| {
                        schema
                            .type_field(parent, &field.name)
                            .ok()
                            .map(|definition| definition.ty.inner_named_type().to_string())
                    });
                    return self.selections(&field.selection_set, field_type);
                }
                ast::Selection::FragmentSpread(spread) if covers(spread.location(), self.offset) => {
                    return self.directives(&spread.directives).unwrap_or_else(|| {
                        CursorTarget::FragmentSpread {
                            name: spread.fragment_name.to_string(),
                        }
                    });
                }
                ast::Selection::InlineFragment(inline) if covers(inline.location(), self.offset) => {
                    if let Some(condition) = &inline.type_condition {
                        if on_name(condition, self.offset) {
                            return CursorTarget::TypeCondition {
                                name: condition.to_string(),
                            };
                        }
                    }
                    if let Some(target) = self.directives(&inline.directives) {
                        return target;
                    }
                    let inner = inline
                        .type_condition
                        .as_ref()
                        .map(ToString::to_string)
                        .or(parent_type);
                    return self.selections(&inline.selection_set, inner);
                }
                _ => {}
            }
        }
        CursorTarget::Selection { parent_type }
    }

    fn directives(&self, directives: &ast::DirectiveList) -> Option<CursorTarget> {
        directives
            .iter()
            .find(|directive| covers(directive.location(), self.offset))
            .map(|directive| CursorTarget::Directive {
                name: directive.name.to_string(),
            })
    }

    fn type_name(&self, name: &Name) -> Option<CursorTarget> {
        on_name(name, self.offset).then(|| CursorTarget::SchemaType {
            name: name.to_string(),
        })
    }

    fn named_types(&self, names: &[Name]) -> Option<CursorTarget> {
        names
            .iter()
            .find(|name| on_name(name, self.offset))
            .map(|name| CursorTarget::NamedType {
                name: name.to_string(),
            })
    }

    fn field_definitions(
        &self,
        type_name: &Name,
        fields: &[Node<ast::FieldDefinition>],
    ) -> Option<CursorTarget> {
        let field = fields
            .iter()
            .find(|field| covers(field.location(), self.offset))?;
        if on_name(&field.name, self.offset) {
            return Some(CursorTarget::SchemaField {
                type_name: type_name.to_string(),
                name: field.name.to_string(),
            });
        }
        self.named_types(std::slice::from_ref(field.ty.inner_named_type()))
            .or_else(|| self.input_values(&field.arguments))
            .or_else(|| self.directives(&field.directives))
    }

    fn input_values(&self, values: &[Node<ast::InputValueDefinition>]) -> Option<CursorTarget> {
        let value = values
            .iter()
            .find(|value| covers(value.location(), self.offset))?;
        self.named_types(std::slice::from_ref(value.ty.inner_named_type()))
            .or_else(|| self.directives(&value.directives))
    }
}
