use crate::suggestion::suggestion_list;
use crate::traits::{DocumentSchemaRule, RuleContext, RuleDiagnostic, ValidationRule};
use crate::visit::{walk, Ancestor, Visitor};
use apollo_compiler::{ast, Name, Node, Schema};
use std::collections::BTreeMap;

const RULE: &str = "known_directives";

/// Directives used in documents must be defined by the schema or a preset
/// the document uses.
#[derive(Debug, Default)]
pub struct KnownDirectivesRule {
    /// Directives the schema only has because of another preset, mapped to
    /// that preset
    preset_only: BTreeMap<String, String>,
}

impl KnownDirectivesRule {
    /// Report uses of `directives`, given as `(directive, preset)` pairs, as
    /// belonging to a preset the document doesn't use.
    #[must_use]
    pub fn hiding(directives: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            preset_only: directives.into_iter().collect(),
        }
    }
}

impl ValidationRule for KnownDirectivesRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports directives that are not defined"
    }
}

impl DocumentSchemaRule for KnownDirectivesRule {
    fn check(&self, cx: &RuleContext<'_>, schema: &Schema) -> Vec<RuleDiagnostic> {
        let mut visitor = KnownDirectives {
            cx,
            schema,
            preset_only: &self.preset_only,
            diagnostics: Vec::new(),
        };
        walk(cx.ast, None, &mut visitor);
        visitor.diagnostics
    }
}

struct KnownDirectives<'c, 'a> {
    cx: &'c RuleContext<'a>,
    schema: &'c Schema,
    preset_only: &'c BTreeMap<String, String>,
    diagnostics: Vec<RuleDiagnostic>,
}

impl<'a> Visitor<'a> for KnownDirectives<'_, '_> {
    fn directive(&mut self, directive: &'a Node<ast::Directive>, _: &[Ancestor<'a>]) {
        let name = directive.name.as_str();
        if let Some(preset) = self.preset_only.get(name) {
            self.diagnostics.push(RuleDiagnostic::new(
                RULE,
                format!(
                    "Directive \"@{name}\" is provided by the \"{preset}\" preset, which this document doesn't use."
                ),
                self.cx.node_range(directive),
            ));
            return;
        }
        if self.schema.directive_definitions.contains_key(name) {
            return;
        }
        let suggestions = suggestion_list(
            name,
            self.schema
                .directive_definitions
                .keys()
                .map(Name::as_str)
                .filter(|known| !self.preset_only.contains_key(*known)),
        );
        self.diagnostics.push(
            RuleDiagnostic::new(
                RULE,
                format!("Unknown directive \"@{name}\"."),
                self.cx.node_range(directive),
            )
            .with_suggestions(suggestions),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check_with_schema, messages};

    const SCHEMA: &str = "directive @client on FIELD\ntype Query { a: String }";

    #[test]
    fn test_builtin_and_declared_directives_pass() {
        let diagnostics = check_with_schema(
            &KnownDirectivesRule::default(),
            SCHEMA,
            "query Q($skip: Boolean!) { a @skip(if: $skip) @client }",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_directive() {
        let text = "query Q { a @clent }";
        let diagnostics = check_with_schema(&KnownDirectivesRule::default(), SCHEMA, text);
        assert_eq!(
            messages(&diagnostics),
            vec!["Unknown directive \"@clent\". Did you mean \"client\"?"]
        );
        assert_eq!(diagnostics[0].range.start, text.find('@').unwrap());
    }

    #[test]
    fn test_directive_of_an_unused_preset() {
        let rule = KnownDirectivesRule::hiding([("client".to_string(), "apollo".to_string())]);
        let diagnostics = check_with_schema(&rule, SCHEMA, "query Q { a @client @clint }");
        assert_eq!(
            messages(&diagnostics),
            vec![
                "Directive \"@client\" is provided by the \"apollo\" preset, which this document doesn't use.",
                "Unknown directive \"@clint\".",
            ]
        );
    }
}
