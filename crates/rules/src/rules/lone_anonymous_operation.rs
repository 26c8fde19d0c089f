use crate::traits::{RuleContext, RuleDiagnostic, StandaloneDocumentRule, ValidationRule};
use apollo_compiler::ast;

const RULE: &str = "lone_anonymous_operation";

/// An anonymous operation must be the only operation of its document
pub struct LoneAnonymousOperationRule;

impl ValidationRule for LoneAnonymousOperationRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports anonymous operations sharing a document with other operations"
    }
}

impl StandaloneDocumentRule for LoneAnonymousOperationRule {
    fn check(&self, cx: &RuleContext<'_>) -> Vec<RuleDiagnostic> {
        let operations: Vec<_> = cx
            .ast
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::OperationDefinition(operation) => Some(operation),
                _ => None,
            })
            .collect();
        if operations.len() < 2 {
            return Vec::new();
        }
        operations
            .into_iter()
            .filter(|operation| operation.name.is_none())
            .map(|operation| {
                RuleDiagnostic::new(
                    RULE,
                    "This anonymous operation must be the only defined operation.",
                    cx.node_range(operation),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::check_standalone;

    #[test]
    fn test_single_anonymous_operation() {
        assert!(check_standalone(&LoneAnonymousOperationRule, "{ a }").is_empty());
    }

    #[test]
    fn test_anonymous_with_named() {
        let diagnostics = check_standalone(&LoneAnonymousOperationRule, "{ a }\nquery Q { b }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start, 0);
    }
}
