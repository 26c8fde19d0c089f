//! Presets: named bundles of rule overrides, schema extensions and
//! providers that document groups opt into.

use crate::providers::{Hint, HintKind, Info, Provider, ProviderContext};
use crate::{CursorTarget, EngineError, ProviderError, Result};
use apollo_compiler::ast;
use graphql_rules::{FieldsOnCorrectTypeRule, RuleImpl, RuleSet, ScalarLeafsRule};
use serde::Deserialize;
use std::sync::Arc;

pub const APOLLO: &str = "apollo";
pub const RELAY: &str = "relay";

const CLIENT_DIRECTIVE: &str = "client";
const RELAY_DIRECTIVE: &str = "relay";

const CLIENT_DIRECTIVE_SDL: &str = "directive @client on FIELD\n";
const RELAY_DIRECTIVE_SDL: &str = "directive @relay(pattern: Boolean, plural: Boolean, mask: Boolean) on FRAGMENT_DEFINITION | FRAGMENT_SPREAD\n";

/// A named bundle applied on top of the base rules and providers.
#[derive(Clone)]
pub struct Preset {
    name: Arc<str>,
    rules: RuleSet,
    extension: Option<String>,
    providers: Vec<Arc<dyn Provider>>,
}

impl Preset {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            rules: RuleSet::new(),
            extension: None,
            providers: Vec::new(),
        }
    }

    /// Register `rule` under `name`, replacing any base rule of that name.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, rule: RuleImpl) -> Self {
        self.rules.insert(name, rule);
        self
    }

    /// Append SDL to the project schema. Extensions of every preset in the
    /// project are merged into the one schema; directives they define are
    /// still reported in documents that don't use the preset.
    #[must_use]
    pub fn with_extension(mut self, sdl: impl Into<String>) -> Self {
        let sdl = sdl.into();
        match &mut self.extension {
            Some(existing) => existing.push_str(&sdl),
            None => self.extension = Some(sdl),
        }
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Names of the directives the extension defines
    pub(crate) fn extension_directives(&self) -> Vec<String> {
        let Some(sdl) = &self.extension else {
            return Vec::new();
        };
        let document = ast::Document::parse(sdl.as_str(), &*self.name)
            .unwrap_or_else(|invalid| invalid.partial);
        document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::DirectiveDefinition(directive) => Some(directive.name.to_string()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl std::fmt::Debug for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preset")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("extension", &self.extension)
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// A preset shipped with the engine, configured from its JSON options.
///
/// Returns `Ok(None)` for names that aren't built in.
pub fn builtin_preset(name: &str, options: Option<&serde_json::Value>) -> Result<Option<Preset>> {
    match name {
        APOLLO => {
            let options: ApolloOptions = decode_options(name, options)?;
            Ok(Some(apollo(&options)))
        }
        RELAY => Ok(Some(relay())),
        _ => Ok(None),
    }
}

fn decode_options<T>(preset: &str, options: Option<&serde_json::Value>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match options {
        None => Ok(T::default()),
        Some(value) => {
            T::deserialize(value).map_err(|e| EngineError::PresetOptions {
                preset: preset.to_string(),
                message: e.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
struct ApolloOptions {
    /// Fields marked `@client` are resolved locally
    link_state: bool,
}

fn apollo(options: &ApolloOptions) -> Preset {
    let preset = Preset::new(APOLLO);
    if !options.link_state {
        return preset;
    }
    preset
        .with_extension(CLIENT_DIRECTIVE_SDL)
        .with_rule(
            "fields_on_correct_type",
            RuleImpl::with_schema(FieldsOnCorrectTypeRule::skipping(CLIENT_DIRECTIVE)),
        )
        .with_provider(ClientFieldInfo)
}

fn relay() -> Preset {
    Preset::new(RELAY)
        .with_extension(RELAY_DIRECTIVE_SDL)
        .with_rule(
            "scalar_leafs",
            RuleImpl::with_schema(ScalarLeafsRule::pattern_aware()),
        )
        .with_provider(RelayDirectiveHints)
}

/// Hover text for fields resolved by the client cache
struct ClientFieldInfo;

impl Provider for ClientFieldInfo {
    fn name(&self) -> &str {
        "apollo-client-fields"
    }

    fn info(&self, cx: &ProviderContext<'_>) -> std::result::Result<Vec<Info>, ProviderError> {
        match &cx.target {
            CursorTarget::Field {
                name, directives, ..
            } if directives.iter().any(|directive| directive == CLIENT_DIRECTIVE) => {
                Ok(vec![Info::new(format!(
                    "`{name}` is a client field: resolved from the local cache and never sent to the server"
                ))])
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// Argument forms of `@relay`
struct RelayDirectiveHints;

const RELAY_FORMS: &[(&str, &str)] = &[
    ("relay(pattern: true)", "Selections may omit subselections"),
    ("relay(plural: true)", "The fragment is read for a list of records"),
    ("relay(mask: false)", "Spread the fragment's data into the parent"),
];

impl Provider for RelayDirectiveHints {
    fn name(&self) -> &str {
        "relay-directive"
    }

    fn hints(&self, cx: &ProviderContext<'_>) -> std::result::Result<Vec<Hint>, ProviderError> {
        let CursorTarget::Directive { name } = &cx.target else {
            return Ok(Vec::new());
        };
        if !RELAY_DIRECTIVE.starts_with(name.as_str()) {
            return Ok(Vec::new());
        }
        Ok(RELAY_FORMS
            .iter()
            .map(|(form, detail)| {
                Hint::new(*form, HintKind::Directive)
                    .with_detail(*detail)
                    .with_insert_text(*form)
            })
            .collect())
    }
}
