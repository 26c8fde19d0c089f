//! Hover for fields, types, fragments and directives.

use super::{Info, Provider, ProviderContext};
use crate::{CursorTarget, ProviderError};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;

#[derive(Debug, Clone, Copy, Default)]
pub struct HoverProvider;

impl Provider for HoverProvider {
    fn name(&self) -> &str {
        "hover"
    }

    fn info(&self, cx: &ProviderContext<'_>) -> Result<Vec<Info>, ProviderError> {
        let schema = cx.schema();
        let info = match &cx.target {
            CursorTarget::Field {
                parent_type: Some(parent),
                name,
                ..
            }
            | CursorTarget::SchemaField {
                type_name: parent,
                name,
            } => schema.and_then(|schema| field_info(schema, parent, name)),
            CursorTarget::TypeCondition { name }
            | CursorTarget::NamedType { name }
            | CursorTarget::SchemaType { name } => schema.and_then(|schema| type_info(schema, name)),
            CursorTarget::FragmentSpread { name } | CursorTarget::FragmentDefinition { name } => cx
                .snapshot
                .visible_fragments(cx.file)
                .into_iter()
                .find(|fragment| fragment.name == name)
                .map(|fragment| {
                    let scope = if fragment.is_global { "global" } else { "document" };
                    Info::new(format!(
                        "```graphql\nfragment {name} on {}\n```\n\nScope: {scope}",
                        fragment.type_condition
                    ))
                }),
            CursorTarget::Directive { name } => schema
                .and_then(|schema| schema.directive_definitions.get(name.as_str()))
                .map(|definition| {
                    with_description(
                        format!("```graphql\n{}\n```", definition.to_string().trim_end()),
                        definition.description.as_deref(),
                    )
                }),
            _ => None,
        };
        Ok(info.into_iter().collect())
    }
}

/// Keyword introducing a type of this kind
pub(crate) const fn kind_label(ty: &ExtendedType) -> &'static str {
    match ty {
        ExtendedType::Scalar(_) => "scalar",
        ExtendedType::Object(_) => "type",
        ExtendedType::Interface(_) => "interface",
        ExtendedType::Union(_) => "union",
        ExtendedType::Enum(_) => "enum",
        ExtendedType::InputObject(_) => "input",
    }
}

fn with_description(signature: String, description: Option<&str>) -> Info {
    match description {
        Some(description) => Info::new(format!("{signature}\n\n{description}")),
        None => Info::new(signature),
    }
}

fn field_info(schema: &Schema, parent: &str, name: &str) -> Option<Info> {
    let field = schema.type_field(parent, name).ok()?;
    Some(with_description(
        format!("```graphql\n{parent}.{name}: {}\n```", field.ty),
        field.description.as_deref(),
    ))
}

fn type_info(schema: &Schema, name: &str) -> Option<Info> {
    let ty = schema.types.get(name)?;
    Some(with_description(
        format!("```graphql\n{} {name}\n```", kind_label(ty)),
        ty.description().map(|description| &**description),
    ))
}
