use crate::suggestion::suggestion_list;
use crate::traits::{DocumentSchemaRule, RuleContext, RuleDiagnostic, ValidationRule};
use crate::visit::{walk, Ancestor, Visitor};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::{ast, Name, Node, Schema};

const RULE: &str = "fields_on_correct_type";

/// Every selected field must exist on the type it is selected on.
///
/// With a skip directive configured, fields carrying that directive and
/// everything selected below them are not checked.
#[derive(Debug, Clone, Default)]
pub struct FieldsOnCorrectTypeRule {
    skip_directive: Option<&'static str>,
}

impl FieldsOnCorrectTypeRule {
    /// Variant ignoring fields marked with `@directive`.
    #[must_use]
    pub const fn skipping(directive: &'static str) -> Self {
        Self {
            skip_directive: Some(directive),
        }
    }
}

impl ValidationRule for FieldsOnCorrectTypeRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports fields that are not defined on the selected type"
    }
}

impl DocumentSchemaRule for FieldsOnCorrectTypeRule {
    fn check(&self, cx: &RuleContext<'_>, schema: &Schema) -> Vec<RuleDiagnostic> {
        let mut visitor = FieldCheck {
            cx,
            schema,
            skip_directive: self.skip_directive,
            diagnostics: Vec::new(),
        };
        walk(cx.ast, Some(schema), &mut visitor);
        visitor.diagnostics
    }
}

struct FieldCheck<'c, 'a> {
    cx: &'c RuleContext<'a>,
    schema: &'c Schema,
    skip_directive: Option<&'static str>,
    diagnostics: Vec<RuleDiagnostic>,
}

impl FieldCheck<'_, '_> {
    fn skipped(&self, field: &ast::Field, ancestors: &[Ancestor<'_>]) -> bool {
        let Some(skip) = self.skip_directive else {
            return false;
        };
        let marked = |directives: &ast::DirectiveList| directives.get(skip).is_some();
        marked(&field.directives)
            || ancestors
                .iter()
                .any(|ancestor| matches!(ancestor, Ancestor::Field(_)) && marked(ancestor.directives()))
    }

    fn field_names(&self, type_name: &str) -> Vec<&str> {
        match self.schema.types.get(type_name) {
            Some(ExtendedType::Object(object)) => object.fields.keys().map(Name::as_str).collect(),
            Some(ExtendedType::Interface(interface)) => {
                interface.fields.keys().map(Name::as_str).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl<'a> Visitor<'a> for FieldCheck<'_, '_> {
    fn field(
        &mut self,
        field: &'a Node<ast::Field>,
        parent_type: Option<&'a Name>,
        ancestors: &[Ancestor<'a>],
    ) {
        let Some(parent) = parent_type else {
            return;
        };
        // an unknown parent is reported by known_type_names
        if !self.schema.types.contains_key(parent.as_str())
            || field.name.as_str() == "__typename"
            || self.schema.type_field(parent, &field.name).is_ok()
            || self.skipped(field, ancestors)
        {
            return;
        }

        let suggestions = suggestion_list(field.name.as_str(), self.field_names(parent));
        self.diagnostics.push(
            RuleDiagnostic::new(
                RULE,
                format!("Cannot query field \"{}\" on type \"{parent}\".", field.name),
                self.cx.name_range(&field.name),
            )
            .with_suggestions(suggestions),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check_with_schema, messages};

    const SCHEMA: &str = "directive @client on FIELD\ntype Query { viewer: Viewer search: SearchResult }\ntype Viewer { name: String }\nunion SearchResult = Viewer";

    #[test]
    fn test_known_fields_pass() {
        let diagnostics = check_with_schema(
            &FieldsOnCorrectTypeRule::default(),
            SCHEMA,
            "query Q { viewer { name __typename } search { __typename ... on Viewer { name } } }",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_field_without_close_match() {
        let text = "query Q { viewer { name email } }";
        let diagnostics = check_with_schema(&FieldsOnCorrectTypeRule::default(), SCHEMA, text);
        assert_eq!(
            messages(&diagnostics),
            vec!["Cannot query field \"email\" on type \"Viewer\"."]
        );
        assert!(diagnostics[0].suggestions.is_empty());
        assert_eq!(diagnostics[0].range.start, text.find("email").unwrap());
    }

    #[test]
    fn test_unknown_field_with_suggestion() {
        let diagnostics = check_with_schema(
            &FieldsOnCorrectTypeRule::default(),
            SCHEMA,
            "query Q { viewer { nam } }",
        );
        assert_eq!(diagnostics[0].suggestions, vec!["name"]);
        assert!(diagnostics[0].message.ends_with("Did you mean \"name\"?"));
    }

    #[test]
    fn test_union_only_allows_typename() {
        let diagnostics = check_with_schema(
            &FieldsOnCorrectTypeRule::default(),
            SCHEMA,
            "query Q { search { name } }",
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["Cannot query field \"name\" on type \"SearchResult\"."]
        );
    }

    #[test]
    fn test_skip_directive_covers_subselections() {
        let text = "query Q { viewer { local @client { deep } name } }";
        assert_eq!(
            check_with_schema(&FieldsOnCorrectTypeRule::default(), SCHEMA, text).len(),
            1
        );
        assert!(check_with_schema(&FieldsOnCorrectTypeRule::skipping("client"), SCHEMA, text)
            .is_empty());
    }
}
