use crate::traits::{RuleContext, RuleDiagnostic, StandaloneDocumentRule, ValidationRule};
use apollo_compiler::ast;
use std::collections::HashSet;

const FRAGMENT_RULE: &str = "unique_fragment_names";
const OPERATION_RULE: &str = "unique_operation_names";

/// Fragment names are unique within a file.
///
/// Every embedded document of a file shares one fragment namespace, so a
/// duplicate in another document of the same file counts. The first
/// declaration wins and later ones are reported.
pub struct UniqueFragmentNamesRule;

impl ValidationRule for UniqueFragmentNamesRule {
    fn name(&self) -> &'static str {
        FRAGMENT_RULE
    }

    fn description(&self) -> &'static str {
        "Reports fragments declared more than once in the same file"
    }
}

impl StandaloneDocumentRule for UniqueFragmentNamesRule {
    fn check(&self, cx: &RuleContext<'_>) -> Vec<RuleDiagnostic> {
        cx.ast
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => Some(fragment),
                _ => None,
            })
            .filter(|fragment| {
                let offset = fragment.location().map_or(0, |span| span.offset());
                !cx.fragments
                    .is_first_local(&fragment.name, cx.document.index, offset)
            })
            .map(|fragment| {
                RuleDiagnostic::new(
                    FRAGMENT_RULE,
                    format!("There can be only one fragment named \"{}\".", fragment.name),
                    cx.name_range(&fragment.name),
                )
            })
            .collect()
    }
}

/// Operation names are unique within a document
pub struct UniqueOperationNamesRule;

impl ValidationRule for UniqueOperationNamesRule {
    fn name(&self) -> &'static str {
        OPERATION_RULE
    }

    fn description(&self) -> &'static str {
        "Reports operations sharing a name within one document"
    }
}

impl StandaloneDocumentRule for UniqueOperationNamesRule {
    fn check(&self, cx: &RuleContext<'_>) -> Vec<RuleDiagnostic> {
        let mut seen = HashSet::new();
        let mut diagnostics = Vec::new();
        for definition in &cx.ast.definitions {
            let ast::Definition::OperationDefinition(operation) = definition else {
                continue;
            };
            let Some(name) = &operation.name else {
                continue;
            };
            if !seen.insert(name.as_str()) {
                diagnostics.push(RuleDiagnostic::new(
                    OPERATION_RULE,
                    format!("There can be only one operation named \"{name}\"."),
                    cx.name_range(name),
                ));
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{check_standalone, document, messages};
    use crate::FragmentIndex;

    #[test]
    fn test_duplicate_fragment_reported_once() {
        let text = "fragment F on User { id }\nfragment F on User { name }\nfragment G on User { id }";
        let diagnostics = check_standalone(&UniqueFragmentNamesRule, text);
        assert_eq!(
            messages(&diagnostics),
            vec!["There can be only one fragment named \"F\"."]
        );
        assert_eq!(diagnostics[0].range.start, text.rfind("F on").unwrap());
    }

    #[test]
    fn test_duplicate_across_documents_of_a_file() {
        let first = document("fragment F on User { id }");
        let mut second = document("fragment F on User { name }");
        second.index = 1;

        let mut fragments = FragmentIndex::new();
        for doc in [&first, &second] {
            if let ast::Definition::FragmentDefinition(f) = &doc.ast.as_ref().unwrap().definitions[0] {
                fragments.add_local(doc.index, f.clone());
            }
        }

        let check = |doc: &graphql_syntax::EmbeddedDocument| {
            let cx = RuleContext {
                document: doc,
                ast: doc.ast.as_deref().unwrap(),
                fragments: &fragments,
            };
            UniqueFragmentNamesRule.check(&cx)
        };
        assert!(check(&first).is_empty());
        assert_eq!(check(&second).len(), 1);
    }

    #[test]
    fn test_global_fragments_do_not_collide_with_local() {
        let doc = document("fragment F on User { id }");
        let mut fragments = FragmentIndex::new();
        let ast::Definition::FragmentDefinition(f) = &doc.ast.as_ref().unwrap().definitions[0]
        else {
            panic!("expected fragment");
        };
        fragments.add_local(0, f.clone());
        fragments.add_global(f.clone());
        let cx = RuleContext {
            document: &doc,
            ast: doc.ast.as_deref().unwrap(),
            fragments: &fragments,
        };
        assert!(UniqueFragmentNamesRule.check(&cx).is_empty());
    }

    #[test]
    fn test_duplicate_operation() {
        let diagnostics = check_standalone(
            &UniqueOperationNamesRule,
            "query Q { a }\nquery Q { b }\nquery R { c }",
        );
        assert_eq!(
            messages(&diagnostics),
            vec!["There can be only one operation named \"Q\"."]
        );
    }
}
