use crate::rules::{
    FieldsOnCorrectTypeRule, KnownDirectivesRule, KnownFragmentNamesRule, KnownTypeNamesRule,
    LoneAnonymousOperationRule, NoUndefinedVariablesRule, ScalarLeafsRule,
    UniqueFragmentNamesRule, UniqueOperationNamesRule,
};
use crate::traits::{DocumentSchemaRule, RuleContext, RuleDiagnostic, StandaloneDocumentRule};
use apollo_compiler::Schema;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// A rule implementation registered under a name.
#[derive(Clone)]
pub enum RuleImpl {
    Standalone(Arc<dyn StandaloneDocumentRule>),
    WithSchema(Arc<dyn DocumentSchemaRule>),
    /// Disables whatever was registered under the name before
    Noop,
}

impl RuleImpl {
    pub fn standalone(rule: impl StandaloneDocumentRule + 'static) -> Self {
        Self::Standalone(Arc::new(rule))
    }

    pub fn with_schema(rule: impl DocumentSchemaRule + 'static) -> Self {
        Self::WithSchema(Arc::new(rule))
    }

    #[must_use]
    pub const fn needs_schema(&self) -> bool {
        matches!(self, Self::WithSchema(_))
    }

    fn run(&self, cx: &RuleContext<'_>, schema: Option<&Schema>) -> Vec<RuleDiagnostic> {
        match (self, schema) {
            (Self::Standalone(rule), _) => rule.check(cx),
            (Self::WithSchema(rule), Some(schema)) => rule.check(cx, schema),
            (Self::WithSchema(_), None) | (Self::Noop, _) => Vec::new(),
        }
    }
}

/// Two implementations are equal when they are the same registered instance.
impl PartialEq for RuleImpl {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Standalone(a), Self::Standalone(b)) => Arc::ptr_eq(a, b),
            (Self::WithSchema(a), Self::WithSchema(b)) => Arc::ptr_eq(a, b),
            (Self::Noop, Self::Noop) => true,
            _ => false,
        }
    }
}

impl Eq for RuleImpl {}

impl std::fmt::Debug for RuleImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone(rule) => write!(f, "Standalone({})", rule.name()),
            Self::WithSchema(rule) => write!(f, "WithSchema({})", rule.name()),
            Self::Noop => f.write_str("Noop"),
        }
    }
}

/// Rules by name, run in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: BTreeMap<String, RuleImpl>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` under `name`, returning the implementation it replaces.
    pub fn insert(&mut self, name: impl Into<String>, rule: RuleImpl) -> Option<RuleImpl> {
        self.rules.insert(name.into(), rule)
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, rule: RuleImpl) -> Self {
        self.insert(name, rule);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuleImpl> {
        self.rules.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleImpl)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over one document. Schema rules are skipped without
    /// a schema.
    #[must_use]
    pub fn check(&self, cx: &RuleContext<'_>, schema: Option<&Schema>) -> Vec<RuleDiagnostic> {
        self.rules
            .values()
            .flat_map(|rule| rule.run(cx, schema))
            .collect()
    }
}

/// Start from `base` and apply each override set in order. A later entry
/// replaces an earlier one with the same name; new names are added.
#[must_use]
pub fn compose_rules<'a>(base: &RuleSet, presets: impl IntoIterator<Item = &'a RuleSet>) -> RuleSet {
    let mut composed = base.clone();
    for preset in presets {
        for (name, rule) in &preset.rules {
            composed.rules.insert(name.clone(), rule.clone());
        }
    }
    composed
}

static BASE_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    [
        RuleImpl::with_schema(KnownTypeNamesRule),
        RuleImpl::with_schema(FieldsOnCorrectTypeRule::default()),
        RuleImpl::with_schema(ScalarLeafsRule::default()),
        RuleImpl::with_schema(KnownDirectivesRule::default()),
        RuleImpl::standalone(KnownFragmentNamesRule),
        RuleImpl::standalone(UniqueFragmentNamesRule),
        RuleImpl::standalone(UniqueOperationNamesRule),
        RuleImpl::standalone(NoUndefinedVariablesRule),
        RuleImpl::standalone(LoneAnonymousOperationRule),
    ]
    .into_iter()
    .fold(RuleSet::new(), |set, rule| {
        let name = match &rule {
            RuleImpl::Standalone(r) => r.name(),
            RuleImpl::WithSchema(r) => r.name(),
            RuleImpl::Noop => "noop",
        };
        set.with(name, rule)
    })
});

/// The rules every document is checked with before presets apply.
#[must_use]
pub fn base_rules() -> &'static RuleSet {
    &BASE_RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_rule_names() {
        let names: Vec<&str> = base_rules().names().collect();
        assert_eq!(
            names,
            vec![
                "fields_on_correct_type",
                "known_directives",
                "known_fragment_names",
                "known_type_names",
                "lone_anonymous_operation",
                "no_undefined_variables",
                "scalar_leafs",
                "unique_fragment_names",
                "unique_operation_names",
            ]
        );
    }

    #[test]
    fn test_compose_replaces_and_adds() {
        let noop_scalars = RuleSet::new().with("scalar_leafs", RuleImpl::Noop);
        let extra = RuleSet::new().with("custom", RuleImpl::Noop);

        let composed = compose_rules(base_rules(), [&noop_scalars, &extra]);
        assert_eq!(composed.len(), base_rules().len() + 1);
        assert_eq!(composed.get("scalar_leafs"), Some(&RuleImpl::Noop));
        assert_eq!(
            composed.get("known_type_names"),
            base_rules().get("known_type_names")
        );
    }

    #[test]
    fn test_compose_is_associative() {
        let p1 = RuleSet::new()
            .with("scalar_leafs", RuleImpl::with_schema(ScalarLeafsRule::pattern_aware()))
            .with("a", RuleImpl::Noop);
        let p2 = RuleSet::new()
            .with("scalar_leafs", RuleImpl::Noop)
            .with("fields_on_correct_type", RuleImpl::with_schema(FieldsOnCorrectTypeRule::skipping("client")));

        let stepwise = compose_rules(&compose_rules(base_rules(), [&p1]), [&p2]);
        let at_once = compose_rules(base_rules(), [&p1, &p2]);
        assert_eq!(stepwise, at_once);
        assert_eq!(at_once.get("scalar_leafs"), Some(&RuleImpl::Noop));
    }

    #[test]
    fn test_compose_never_removes() {
        let composed = compose_rules(base_rules(), std::iter::empty());
        assert_eq!(&composed, base_rules());
    }
}
