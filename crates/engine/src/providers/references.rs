//! Find references for fragments and for types used in type conditions.

use super::{Provider, ProviderContext};
use crate::{CursorTarget, FileRecord, ProviderError};
use graphql_analysis::Location;
use graphql_types::SourceKind;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferencesProvider;

impl Provider for ReferencesProvider {
    fn name(&self) -> &str {
        "references"
    }

    fn refs(&self, cx: &ProviderContext<'_>) -> Result<Vec<Location>, ProviderError> {
        let locations = match &cx.target {
            CursorTarget::FragmentSpread { name } | CursorTarget::FragmentDefinition { name } => {
                fragment_references(cx, name)
            }
            CursorTarget::TypeCondition { name }
            | CursorTarget::NamedType { name }
            | CursorTarget::SchemaType { name } => cx
                .snapshot
                .files_of_kind(SourceKind::Query)
                .flat_map(|file| {
                    file.structure
                        .type_conditions
                        .iter()
                        .filter(|site| site.name.as_ref() == name)
                        .map(|site| Location::new(&file.path, &file.line_index, site.range))
                        .collect::<Vec<_>>()
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(locations)
    }
}

/// The fragment a name resolves to from the cursor's file
enum Resolved<'a> {
    /// Document-scoped, declared in this file
    Local(&'a Path),
    Global,
}

impl Resolved<'_> {
    /// Whether spreads of the name in `file` reach the same fragment
    fn reached_from(&self, file: &FileRecord, name: &str) -> bool {
        match (file.structure.fragments_named(name).next(), self) {
            (Some(_), Self::Local(path)) => file.path.as_ref() == *path,
            (Some(own), Self::Global) => own.scope.is_global(),
            (None, Self::Local(_)) => false,
            (None, Self::Global) => true,
        }
    }
}

fn fragment_references(cx: &ProviderContext<'_>, name: &str) -> Vec<Location> {
    let resolved = match cx.file.structure.fragments_named(name).next() {
        Some(fragment) if !fragment.scope.is_global() => Resolved::Local(&cx.file.path),
        _ => Resolved::Global,
    };
    cx.snapshot
        .files_of_kind(SourceKind::Query)
        .filter(|file| resolved.reached_from(file, name))
        .flat_map(|file| {
            file.structure
                .spreads
                .iter()
                .filter(|spread| spread.name.as_ref() == name)
                .map(|spread| Location::new(&file.path, &file.line_index, spread.range))
                .collect::<Vec<_>>()
        })
        .collect()
}
