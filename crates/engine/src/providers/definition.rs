//! Go to definition for fields, types, fragments and directives.

use super::{Provider, ProviderContext};
use crate::snapshot::Snapshot;
use crate::{CursorTarget, ProviderError};
use graphql_analysis::Location;
use graphql_types::SourceKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionProvider;

impl Provider for DefinitionProvider {
    fn name(&self) -> &str {
        "definition"
    }

    fn definitions(&self, cx: &ProviderContext<'_>) -> Result<Vec<Location>, ProviderError> {
        let locations = match &cx.target {
            CursorTarget::Field {
                parent_type: Some(parent),
                name,
                ..
            } => field_definitions(cx.snapshot, parent, name),
            CursorTarget::TypeCondition { name }
            | CursorTarget::NamedType { name }
            | CursorTarget::SchemaType { name } => type_definitions(cx.snapshot, name),
            CursorTarget::FragmentSpread { name } => cx
                .snapshot
                .visible_fragments(cx.file)
                .into_iter()
                .filter(|fragment| fragment.name == name)
                .filter_map(|fragment| cx.snapshot.location(fragment.path, fragment.name_range))
                .collect(),
            CursorTarget::Directive { name } => directive_definitions(cx.snapshot, name),
            _ => Vec::new(),
        };
        Ok(locations)
    }
}

/// Every definition and extension of a type across the schema files
pub(crate) fn type_definitions(snapshot: &Snapshot, name: &str) -> Vec<Location> {
    snapshot
        .files_of_kind(SourceKind::Schema)
        .flat_map(|file| {
            file.structure
                .type_defs_named(name)
                .map(|site| Location::new(&file.path, &file.line_index, site.name_range))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn field_definitions(snapshot: &Snapshot, parent: &str, field: &str) -> Vec<Location> {
    snapshot
        .files_of_kind(SourceKind::Schema)
        .flat_map(|file| {
            file.structure
                .type_defs_named(parent)
                .flat_map(|site| &site.fields)
                .filter(|site| site.name.as_ref() == field)
                .map(|site| Location::new(&file.path, &file.line_index, site.name_range))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn directive_definitions(snapshot: &Snapshot, name: &str) -> Vec<Location> {
    snapshot
        .files_of_kind(SourceKind::Schema)
        .flat_map(|file| {
            file.structure
                .directive_defs
                .iter()
                .filter(|site| site.name.as_ref() == name)
                .map(|site| Location::new(&file.path, &file.line_index, site.name_range))
                .collect::<Vec<_>>()
        })
        .collect()
}
