//! Validation rules and their composition.
//!
//! A rule is looked up by name in a [`RuleSet`]. Presets override rules by
//! inserting an implementation under an existing name, so a composed set is
//! always "base, then each preset in order" with later entries winning.
//! Nothing is ever removed; a disabled rule is [`RuleImpl::Noop`].

mod fragments;
mod registry;
mod rules;
mod suggestion;
mod traits;
pub mod visit;

pub use fragments::{FragmentIndex, LocalFragment};
pub use registry::{base_rules, compose_rules, RuleImpl, RuleSet};
pub use rules::{
    FieldsOnCorrectTypeRule, KnownDirectivesRule, KnownFragmentNamesRule, KnownTypeNamesRule,
    LoneAnonymousOperationRule, NoUndefinedVariablesRule, ScalarLeafsRule,
    UniqueFragmentNamesRule, UniqueOperationNamesRule,
};
pub use suggestion::{did_you_mean, suggestion_list};
pub use traits::{
    DocumentSchemaRule, RuleContext, RuleDiagnostic, StandaloneDocumentRule, ValidationRule,
};
