//! Schema-aware completion.

use super::{Hint, HintKind, Provider, ProviderContext};
use crate::{CursorTarget, ProviderError};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;
use std::collections::HashSet;

/// Fields, `__typename`, inline fragments for abstract types, fragment
/// names, directive names and type names.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionProvider;

impl Provider for CompletionProvider {
    fn name(&self) -> &str {
        "completion"
    }

    fn hints(&self, cx: &ProviderContext<'_>) -> Result<Vec<Hint>, ProviderError> {
        let hints = match &cx.target {
            CursorTarget::Field { parent_type, .. } | CursorTarget::Selection { parent_type } => {
                selection_hints(cx, parent_type.as_deref())
            }
            CursorTarget::FragmentSpread { .. } => fragment_hints(cx, None),
            CursorTarget::Directive { .. } => directive_hints(cx.schema()),
            CursorTarget::TypeCondition { .. } | CursorTarget::NamedType { .. } => {
                type_hints(cx.schema())
            }
            _ => Vec::new(),
        };
        Ok(hints)
    }
}

fn selection_hints(cx: &ProviderContext<'_>, parent: Option<&str>) -> Vec<Hint> {
    let mut hints = Vec::new();
    if let (Some(schema), Some(parent)) = (cx.schema(), parent) {
        match schema.types.get(parent) {
            Some(ExtendedType::Object(object)) => {
                hints.extend(object.fields.values().map(|field| {
                    Hint::new(field.name.as_str(), HintKind::Field).with_detail(field.ty.to_string())
                }));
            }
            Some(ExtendedType::Interface(interface)) => {
                hints.extend(interface.fields.values().map(|field| {
                    Hint::new(field.name.as_str(), HintKind::Field).with_detail(field.ty.to_string())
                }));
                hints.extend(inline_fragment_hints(possible_types(schema, parent)));
            }
            Some(ExtendedType::Union(_)) => {
                hints.extend(inline_fragment_hints(possible_types(schema, parent)));
            }
            _ => {}
        }
    }
    hints.push(Hint::new("__typename", HintKind::Field).with_detail("String!"));
    hints.extend(fragment_hints(cx, parent));
    hints
}

fn inline_fragment_hints(types: Vec<&str>) -> Vec<Hint> {
    types
        .into_iter()
        .map(|name| Hint::new(format!("... on {name}"), HintKind::Type))
        .collect()
}

/// Object types a value of `name` can have at runtime
pub(crate) fn possible_types<'s>(schema: &'s Schema, name: &'s str) -> Vec<&'s str> {
    match schema.types.get(name) {
        Some(ExtendedType::Object(_)) => vec![name],
        Some(ExtendedType::Union(union_type)) => union_type
            .members
            .iter()
            .map(|member| member.name.as_str())
            .collect(),
        Some(ExtendedType::Interface(_)) => schema
            .types
            .iter()
            .filter(|(_, ty)| match ty {
                ExtendedType::Object(object) => object
                    .implements_interfaces
                    .iter()
                    .any(|interface| interface.name.as_str() == name),
                _ => false,
            })
            .map(|(type_name, _)| type_name.as_str())
            .collect(),
        _ => Vec::new(),
    }
}

/// Whether a fragment on `condition` can be spread where `parent` is expected
fn applies(schema: Option<&Schema>, condition: &str, parent: Option<&str>) -> bool {
    let (Some(schema), Some(parent)) = (schema, parent) else {
        return true;
    };
    if condition == parent {
        return true;
    }
    let parent_types = possible_types(schema, parent);
    possible_types(schema, condition)
        .iter()
        .any(|ty| parent_types.contains(ty))
}

fn fragment_hints(cx: &ProviderContext<'_>, parent: Option<&str>) -> Vec<Hint> {
    let mut seen = HashSet::new();
    cx.snapshot
        .visible_fragments(cx.file)
        .into_iter()
        .filter(|fragment| !fragment.name.starts_with("__"))
        .filter(|fragment| applies(cx.schema(), fragment.type_condition, parent))
        .filter(|fragment| seen.insert(fragment.name))
        .map(|fragment| {
            Hint::new(fragment.name, HintKind::Fragment)
                .with_detail(format!("on {}", fragment.type_condition))
                .with_insert_text(format!("...{}", fragment.name))
        })
        .collect()
}

fn directive_hints(schema: Option<&Schema>) -> Vec<Hint> {
    schema
        .map(|schema| {
            schema
                .directive_definitions
                .values()
                .map(|directive| {
                    let mut hint = Hint::new(directive.name.as_str(), HintKind::Directive);
                    if let Some(description) = &directive.description {
                        hint = hint.with_detail(&**description);
                    }
                    hint
                })
                .collect()
        })
        .unwrap_or_default()
}

fn type_hints(schema: Option<&Schema>) -> Vec<Hint> {
    schema
        .map(|schema| {
            schema
                .types
                .iter()
                .filter(|(name, _)| !name.starts_with("__"))
                .map(|(name, ty)| {
                    Hint::new(name.as_str(), HintKind::Type).with_detail(super::hover::kind_label(ty))
                })
                .collect()
        })
        .unwrap_or_default()
}
