use crate::traits::{RuleContext, RuleDiagnostic, StandaloneDocumentRule, ValidationRule};
use apollo_compiler::{ast, Name, Node};
use std::collections::HashSet;

const RULE: &str = "no_undefined_variables";

/// Variables used by an operation, directly or through the fragments it
/// spreads, must be declared by that operation
pub struct NoUndefinedVariablesRule;

impl ValidationRule for NoUndefinedVariablesRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports variables that are not defined by the operation using them"
    }
}

impl StandaloneDocumentRule for NoUndefinedVariablesRule {
    fn check(&self, cx: &RuleContext<'_>) -> Vec<RuleDiagnostic> {
        let mut diagnostics = Vec::new();
        for definition in &cx.ast.definitions {
            let ast::Definition::OperationDefinition(operation) = definition else {
                continue;
            };
            let defined: HashSet<&str> = operation
                .variables
                .iter()
                .map(|variable| variable.name.as_str())
                .collect();

            let mut usages = Usages::default();
            usages.directives(&operation.directives, true);
            usages.selections(&operation.selection_set, true);
            usages.follow_spreads(cx);

            let mut reported = HashSet::new();
            for (name, local) in usages.variables {
                if defined.contains(name.as_str()) || !reported.insert(name.clone()) {
                    continue;
                }
                // usages inside fragments have no position in this document
                let range = if local {
                    cx.name_range(&name)
                } else {
                    operation
                        .name
                        .as_ref()
                        .map_or_else(|| cx.node_range(operation), |n| cx.name_range(n))
                };
                let message = match &operation.name {
                    Some(op) => {
                        format!("Variable \"${name}\" is not defined by operation \"{op}\".")
                    }
                    None => format!("Variable \"${name}\" is not defined."),
                };
                diagnostics.push(RuleDiagnostic::new(RULE, message, range));
            }
        }
        diagnostics
    }
}

#[derive(Default)]
struct Usages {
    /// Variable names with whether the usage is in the operation itself
    variables: Vec<(Name, bool)>,
    spreads: Vec<Name>,
}

impl Usages {
    fn value(&mut self, value: &ast::Value, local: bool) {
        match value {
            ast::Value::Variable(name) => self.variables.push((name.clone(), local)),
            ast::Value::List(items) => {
                for item in items {
                    self.value(item, local);
                }
            }
            ast::Value::Object(fields) => {
                for (_, item) in fields {
                    self.value(item, local);
                }
            }
            _ => {}
        }
    }

    fn arguments(&mut self, arguments: &[Node<ast::Argument>], local: bool) {
        for argument in arguments {
            self.value(&argument.value, local);
        }
    }

    fn directives(&mut self, directives: &ast::DirectiveList, local: bool) {
        for directive in directives.iter() {
            self.arguments(&directive.arguments, local);
        }
    }

    fn selections(&mut self, selections: &[ast::Selection], local: bool) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => {
                    self.arguments(&field.arguments, local);
                    self.directives(&field.directives, local);
                    self.selections(&field.selection_set, local);
                }
                ast::Selection::FragmentSpread(spread) => {
                    self.directives(&spread.directives, local);
                    self.spreads.push(spread.fragment_name.clone());
                }
                ast::Selection::InlineFragment(inline) => {
                    self.directives(&inline.directives, local);
                    self.selections(&inline.selection_set, local);
                }
            }
        }
    }

    /// Collect usages from every fragment reachable through spreads.
    fn follow_spreads(&mut self, cx: &RuleContext<'_>) {
        let mut visited = HashSet::new();
        while let Some(name) = self.spreads.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            for fragment in cx.fragments.resolve(&name) {
                self.directives(&fragment.directives, false);
                self.selections(&fragment.selection_set, false);
            }
        }
    }
}
