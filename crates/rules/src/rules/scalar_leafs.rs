use crate::traits::{DocumentSchemaRule, RuleContext, RuleDiagnostic, ValidationRule};
use crate::visit::{has_true_argument, walk, Ancestor, Visitor};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::{ast, Name, Node, Schema};

const RULE: &str = "scalar_leafs";

/// Directive and argument marking a fragment as a selection pattern
const PATTERN_DIRECTIVE: &str = "relay";
const PATTERN_ARGUMENT: &str = "pattern";

/// Leaf fields must not have selections and composite fields must.
///
/// The pattern-aware variant lets fields inside a fragment marked
/// `@relay(pattern: true)` omit their selections.
#[derive(Debug, Clone, Default)]
pub struct ScalarLeafsRule {
    pattern_aware: bool,
}

impl ScalarLeafsRule {
    #[must_use]
    pub const fn pattern_aware() -> Self {
        Self {
            pattern_aware: true,
        }
    }
}

impl ValidationRule for ScalarLeafsRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports selections on leaf fields and missing selections on composite fields"
    }
}

impl DocumentSchemaRule for ScalarLeafsRule {
    fn check(&self, cx: &RuleContext<'_>, schema: &Schema) -> Vec<RuleDiagnostic> {
        let mut visitor = LeafCheck {
            cx,
            schema,
            pattern_aware: self.pattern_aware,
            diagnostics: Vec::new(),
        };
        walk(cx.ast, Some(schema), &mut visitor);
        visitor.diagnostics
    }
}

/// Walks outward from a field. The walk stops at the first operation or at
/// the first fragment marked as a pattern; the field is exempt only when it
/// stopped at such a fragment. Unmarked fragments are walked past.
fn in_pattern_fragment(ancestors: &[Ancestor<'_>]) -> bool {
    for ancestor in ancestors.iter().rev() {
        match ancestor {
            Ancestor::Operation(_) => return false,
            Ancestor::Fragment(fragment)
                if has_true_argument(&fragment.directives, PATTERN_DIRECTIVE, PATTERN_ARGUMENT) =>
            {
                return true;
            }
            _ => {}
        }
    }
    false
}

struct LeafCheck<'c, 'a> {
    cx: &'c RuleContext<'a>,
    schema: &'c Schema,
    pattern_aware: bool,
    diagnostics: Vec<RuleDiagnostic>,
}

impl<'a> Visitor<'a> for LeafCheck<'_, '_> {
    fn field(
        &mut self,
        field: &'a Node<ast::Field>,
        parent_type: Option<&'a Name>,
        ancestors: &[Ancestor<'a>],
    ) {
        let Some(parent) = parent_type else {
            return;
        };
        let Ok(definition) = self.schema.type_field(parent, &field.name) else {
            return;
        };
        let type_name = definition.ty.inner_named_type();
        let Some(field_type) = self.schema.types.get(type_name) else {
            return;
        };

        let is_leaf = matches!(field_type, ExtendedType::Scalar(_) | ExtendedType::Enum(_));
        let message = if is_leaf && !field.selection_set.is_empty() {
            format!(
                "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                field.name, definition.ty
            )
        } else if !is_leaf && field.selection_set.is_empty() {
            if self.pattern_aware && in_pattern_fragment(ancestors) {
                return;
            }
            format!(
                "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                field.name, definition.ty, field.name
            )
        } else {
            return;
        };
        self.diagnostics
            .push(RuleDiagnostic::new(RULE, message, self.cx.name_range(&field.name)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check_with_schema, messages};

    const SCHEMA: &str = "directive @relay(pattern: Boolean) on FRAGMENT_DEFINITION\ntype Query { viewer: Viewer }\ntype Viewer { name: String friends: [Viewer!] }";

    #[test]
    fn test_leaf_with_selection() {
        let diagnostics = check_with_schema(
            &ScalarLeafsRule::default(),
            SCHEMA,
            "query Q { viewer { name { x } } }",
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["Field \"name\" must not have a selection since type \"String\" has no subfields."]
        );
    }

    #[test]
    fn test_composite_without_selection() {
        let diagnostics =
            check_with_schema(&ScalarLeafsRule::default(), SCHEMA, "query Q { viewer }");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .message
            .starts_with("Field \"viewer\" of type \"Viewer\" must have a selection"));
    }

    #[test]
    fn test_pattern_fragment_is_exempt_only_when_pattern_aware() {
        let text = "fragment P on Viewer @relay(pattern: true) { friends }";
        assert_eq!(check_with_schema(&ScalarLeafsRule::default(), SCHEMA, text).len(), 1);
        assert!(check_with_schema(&ScalarLeafsRule::pattern_aware(), SCHEMA, text).is_empty());
    }

    #[test]
    fn test_unmarked_fragment_is_not_exempt() {
        let text = "fragment P on Viewer @relay(pattern: false) { friends }\nquery Q { viewer }";
        let diagnostics = check_with_schema(&ScalarLeafsRule::pattern_aware(), SCHEMA, text);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_ancestor_walk() {
        let document = crate::rules::test_support::document(
            "fragment P on Viewer @relay(pattern: true) { friends { name } }\nquery Q { viewer { name } }",
        );
        let ast = document.ast.as_deref().unwrap();
        let ast::Definition::FragmentDefinition(fragment) = &ast.definitions[0] else {
            panic!("expected fragment");
        };
        let ast::Definition::OperationDefinition(operation) = &ast.definitions[1] else {
            panic!("expected operation");
        };
        let ast::Selection::Field(friends) = &fragment.selection_set[0] else {
            panic!("expected field");
        };

        assert!(in_pattern_fragment(&[Ancestor::Fragment(fragment)]));
        assert!(in_pattern_fragment(&[
            Ancestor::Fragment(fragment),
            Ancestor::Field(friends)
        ]));
        assert!(!in_pattern_fragment(&[Ancestor::Operation(operation)]));
        assert!(!in_pattern_fragment(&[]));
    }
}
