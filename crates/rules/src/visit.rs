//! Depth-first walk over executable definitions.
//!
//! The walker tracks the chain of enclosing definitions, fields and inline
//! fragments, and, given a schema, the type each selection set is selected
//! on. Visitors only override the callbacks they need.

use apollo_compiler::{ast, Name, Node, Schema};

/// An enclosing node, outermost first in the ancestor slice.
#[derive(Debug, Clone, Copy)]
pub enum Ancestor<'a> {
    Operation(&'a Node<ast::OperationDefinition>),
    Fragment(&'a Node<ast::FragmentDefinition>),
    Field(&'a Node<ast::Field>),
    InlineFragment(&'a Node<ast::InlineFragment>),
}

impl<'a> Ancestor<'a> {
    #[must_use]
    pub fn directives(&self) -> &'a ast::DirectiveList {
        match *self {
            Self::Operation(node) => &node.directives,
            Self::Fragment(node) => &node.directives,
            Self::Field(node) => &node.directives,
            Self::InlineFragment(node) => &node.directives,
        }
    }
}

pub trait Visitor<'a> {
    fn enter_operation(&mut self, _operation: &'a Node<ast::OperationDefinition>) {}

    fn enter_fragment(&mut self, _fragment: &'a Node<ast::FragmentDefinition>) {}

    /// `parent_type` is the type the field is selected on, when known.
    fn field(
        &mut self,
        _field: &'a Node<ast::Field>,
        _parent_type: Option<&'a Name>,
        _ancestors: &[Ancestor<'a>],
    ) {
    }

    fn fragment_spread(
        &mut self,
        _spread: &'a Node<ast::FragmentSpread>,
        _ancestors: &[Ancestor<'a>],
    ) {
    }

    fn inline_fragment(
        &mut self,
        _inline: &'a Node<ast::InlineFragment>,
        _ancestors: &[Ancestor<'a>],
    ) {
    }

    /// Every directive application inside executable definitions.
    fn directive(&mut self, _directive: &'a Node<ast::Directive>, _ancestors: &[Ancestor<'a>]) {}
}

/// Walk every operation and fragment definition of `document`.
pub fn walk<'a, V: Visitor<'a>>(document: &'a ast::Document, schema: Option<&'a Schema>, visitor: &mut V) {
    let mut walker = Walker {
        schema,
        visitor,
        ancestors: Vec::new(),
    };
    for definition in &document.definitions {
        match definition {
            ast::Definition::OperationDefinition(operation) => walker.operation(operation),
            ast::Definition::FragmentDefinition(fragment) => walker.fragment(fragment),
            _ => {}
        }
    }
}

struct Walker<'a, 'v, V> {
    schema: Option<&'a Schema>,
    visitor: &'v mut V,
    ancestors: Vec<Ancestor<'a>>,
}

impl<'a, V: Visitor<'a>> Walker<'a, '_, V> {
    fn operation(&mut self, operation: &'a Node<ast::OperationDefinition>) {
        self.visitor.enter_operation(operation);
        self.ancestors.push(Ancestor::Operation(operation));
        self.directives(&operation.directives);
        for variable in &operation.variables {
            self.directives(&variable.directives);
        }
        let root = self
            .schema
            .and_then(|schema| schema.root_operation(operation.operation_type));
        self.selections(&operation.selection_set, root);
        self.ancestors.pop();
    }

    fn fragment(&mut self, fragment: &'a Node<ast::FragmentDefinition>) {
        self.visitor.enter_fragment(fragment);
        self.ancestors.push(Ancestor::Fragment(fragment));
        self.directives(&fragment.directives);
        self.selections(&fragment.selection_set, Some(&fragment.type_condition));
        self.ancestors.pop();
    }

    fn directives(&mut self, directives: &'a ast::DirectiveList) {
        for directive in directives.iter() {
            self.visitor.directive(directive, &self.ancestors);
        }
    }

    fn selections(&mut self, selections: &'a [ast::Selection], parent_type: Option<&'a Name>) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => {
                    self.visitor.field(field, parent_type, &self.ancestors);
                    self.ancestors.push(Ancestor::Field(field));
                    self.directives(&field.directives);
                    let field_type = parent_type.and_then(|parent| self.field_type(parent, &field.name));
                    self.selections(&field.selection_set, field_type);
                    self.ancestors.pop();
                }
                ast::Selection::FragmentSpread(spread) => {
                    self.visitor.fragment_spread(spread, &self.ancestors);
                    self.directives(&spread.directives);
                }
                ast::Selection::InlineFragment(inline) => {
                    self.visitor.inline_fragment(inline, &self.ancestors);
                    self.ancestors.push(Ancestor::InlineFragment(inline));
                    self.directives(&inline.directives);
                    let inner = inline.type_condition.as_ref().or(parent_type);
                    self.selections(&inline.selection_set, inner);
                    self.ancestors.pop();
                }
            }
        }
    }

    fn field_type(&self, parent: &str, field: &str) -> Option<&'a Name> {
        let schema = self.schema?;
        schema
            .type_field(parent, field)
            .ok()
            .map(|definition| definition.ty.inner_named_type())
    }
}

/// Whether a directive list carries `@name(argument: true)`.
#[must_use]
pub fn has_true_argument(directives: &ast::DirectiveList, name: &str, argument: &str) -> bool {
    directives
        .iter()
        .filter(|directive| directive.name.as_str() == name)
        .flat_map(|directive| directive.arguments.iter())
        .any(|arg| arg.name.as_str() == argument && matches!(*arg.value, ast::Value::Boolean(true)))
}
