use crate::suggestion::suggestion_list;
use crate::traits::{DocumentSchemaRule, RuleContext, RuleDiagnostic, ValidationRule};
use crate::visit::{walk, Ancestor, Visitor};
use apollo_compiler::{ast, Name, Node, Schema};

const RULE: &str = "known_type_names";

/// Type conditions and variable types must name schema types
pub struct KnownTypeNamesRule;

impl ValidationRule for KnownTypeNamesRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports type conditions and variable types that are not defined by the schema"
    }
}

impl DocumentSchemaRule for KnownTypeNamesRule {
    fn check(&self, cx: &RuleContext<'_>, schema: &Schema) -> Vec<RuleDiagnostic> {
        let mut visitor = KnownTypes {
            cx,
            schema,
            diagnostics: Vec::new(),
        };
        walk(cx.ast, Some(schema), &mut visitor);
        visitor.diagnostics
    }
}

struct KnownTypes<'c, 'a> {
    cx: &'c RuleContext<'a>,
    schema: &'c Schema,
    diagnostics: Vec<RuleDiagnostic>,
}

impl KnownTypes<'_, '_> {
    fn check_name(&mut self, name: &Name) {
        if self.schema.types.contains_key(name.as_str()) {
            return;
        }
        let suggestions = suggestion_list(
            name.as_str(),
            self.schema
                .types
                .keys()
                .map(Name::as_str)
                .filter(|candidate| !candidate.starts_with("__")),
        );
        self.diagnostics.push(
            RuleDiagnostic::new(
                RULE,
                format!("Unknown type \"{name}\"."),
                self.cx.name_range(name),
            )
            .with_suggestions(suggestions),
        );
    }
}

impl<'a> Visitor<'a> for KnownTypes<'_, '_> {
    fn enter_operation(&mut self, operation: &'a Node<ast::OperationDefinition>) {
        for variable in &operation.variables {
            self.check_name(variable.ty.inner_named_type());
        }
    }

    fn enter_fragment(&mut self, fragment: &'a Node<ast::FragmentDefinition>) {
        self.check_name(&fragment.type_condition);
    }

    fn inline_fragment(&mut self, inline: &'a Node<ast::InlineFragment>, _: &[Ancestor<'a>]) {
        if let Some(condition) = &inline.type_condition {
            self.check_name(condition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check_with_schema, messages};

    const SCHEMA: &str = "type Query { user: User node: Node }\ninterface Node { id: ID }\ntype User implements Node { id: ID name: String }";

    #[test]
    fn test_known_types_pass() {
        let diagnostics = check_with_schema(
            &KnownTypeNamesRule,
            SCHEMA,
            "query Q($id: ID) { node { ... on User { id } } }\nfragment F on User { id }",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_type_condition_with_suggestion() {
        let text = "fragment F on Usr { id }";
        let diagnostics = check_with_schema(&KnownTypeNamesRule, SCHEMA, text);
        assert_eq!(
            messages(&diagnostics),
            vec!["Unknown type \"Usr\". Did you mean \"User\"?"]
        );
        assert_eq!(diagnostics[0].range.start, text.find("Usr").unwrap());
    }

    #[test]
    fn test_unknown_variable_type() {
        let diagnostics = check_with_schema(
            &KnownTypeNamesRule,
            SCHEMA,
            "query Q($filter: UserFilter) { user { id } }",
        );
        assert_eq!(messages(&diagnostics), vec!["Unknown type \"UserFilter\"."]);
    }
}
