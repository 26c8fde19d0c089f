use crate::traits::{RuleContext, RuleDiagnostic, StandaloneDocumentRule, ValidationRule};
use crate::visit::{walk, Ancestor, Visitor};
use apollo_compiler::{ast, Node};

const RULE: &str = "known_fragment_names";

/// Spreads must resolve to a fragment visible from the document
pub struct KnownFragmentNamesRule;

impl ValidationRule for KnownFragmentNamesRule {
    fn name(&self) -> &'static str {
        RULE
    }

    fn description(&self) -> &'static str {
        "Reports spreads of fragments that are neither declared in the file nor global"
    }
}

impl StandaloneDocumentRule for KnownFragmentNamesRule {
    fn check(&self, cx: &RuleContext<'_>) -> Vec<RuleDiagnostic> {
        let mut visitor = KnownFragments {
            cx,
            diagnostics: Vec::new(),
        };
        walk(cx.ast, None, &mut visitor);
        visitor.diagnostics
    }
}

struct KnownFragments<'c, 'a> {
    cx: &'c RuleContext<'a>,
    diagnostics: Vec<RuleDiagnostic>,
}

impl<'a> Visitor<'a> for KnownFragments<'_, '_> {
    fn fragment_spread(&mut self, spread: &'a Node<ast::FragmentSpread>, _: &[Ancestor<'a>]) {
        let name = spread.fragment_name.as_str();
        // interpolated spreads are resolved by the host language
        if self.cx.document.is_stand_in(name) || !self.cx.fragments.resolve(name).is_empty() {
            return;
        }
        self.diagnostics.push(RuleDiagnostic::new(
            RULE,
            format!("Unknown fragment \"{name}\"."),
            self.cx.name_range(&spread.fragment_name),
        ));
    }
}
