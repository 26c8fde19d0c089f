//! The merged schema and what changed between builds.

use apollo_compiler::Schema;
use graphql_analysis::{
    build_schema, schema_fingerprints, touched_symbols, BuildOutcome, SchemaBuild,
    SchemaExtension, SchemaFile, Symbol,
};
use graphql_hir::FileStructure;
use graphql_types::Fingerprint;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Which query files a rebuild affects
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaChange {
    /// Only files referencing these symbols
    Symbols(BTreeSet<Symbol>),
    /// The builds can't be compared; every query file
    Everything,
}

#[derive(Debug, Default)]
pub(crate) struct SchemaState {
    /// The latest build; `None` when there are no schema files
    pub build: Option<SchemaBuild>,
    /// Schema queries are validated against: the latest build when it
    /// produced one, else the last one that did
    pub effective: Option<Arc<Schema>>,
    /// Definition fingerprints of `effective`
    pub fingerprints: BTreeMap<Symbol, Fingerprint>,
    /// Bumped whenever `effective` changes
    pub generation: u64,
}

impl SchemaState {
    pub(crate) fn outcome(&self) -> Option<BuildOutcome> {
        self.build.as_ref().map(|build| build.outcome)
    }

    /// Rebuild from the schema files, given in path order.
    pub(crate) fn rebuild(
        &mut self,
        files: &[SchemaFile<'_>],
        structures: &[&FileStructure],
        extensions: &[SchemaExtension<'_>],
    ) -> SchemaChange {
        let had_schema = self.effective.is_some();
        let previous_failed = self.outcome() == Some(BuildOutcome::Failed);

        if files.is_empty() {
            tracing::debug!("no schema files; schema cleared");
            self.build = None;
            self.effective = None;
            self.fingerprints.clear();
            if had_schema {
                self.generation += 1;
                return SchemaChange::Everything;
            }
            return SchemaChange::Symbols(BTreeSet::new());
        }

        let build = build_schema(files, extensions);
        let outcome = build.outcome;
        let schema = build.schema.clone();
        self.build = Some(build);

        let Some(schema) = schema else {
            // keep validating against the last good schema
            tracing::warn!(
                kept_previous = had_schema,
                "schema build failed; revalidating all query files"
            );
            return SchemaChange::Everything;
        };

        let sdl: Vec<&str> = extensions.iter().map(|extension| extension.sdl).collect();
        let fingerprints = schema_fingerprints(structures.iter().copied(), &sdl);
        let change = if !had_schema || previous_failed {
            SchemaChange::Everything
        } else {
            SchemaChange::Symbols(touched_symbols(&self.fingerprints, &fingerprints))
        };

        tracing::debug!(?outcome, generation = self.generation + 1, "schema rebuilt");
        self.effective = Some(schema);
        self.fingerprints = fingerprints;
        self.generation += 1;
        change
    }
}
