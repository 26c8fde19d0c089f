//! Per-file structure of GraphQL documents.
//!
//! [`file_structure`] summarizes a file as names and sites: fragment
//! definitions with their resolved scope, spreads, type conditions,
//! operations, and schema definitions with per-definition fingerprints. The
//! summary is stable across edits that don't change these, so dependents of
//! a file are only recomputed when its shape changes.

use std::sync::Arc;

pub mod scope;
mod structure;

pub use scope::{
    check_fragment_scopes_document, check_fragment_scopes_global, normalize_scope_tags,
    DefaultScopeTagValidator, FragmentScope, ScopeTagValidator,
};
pub use structure::*;

/// The salsa database trait for HIR queries
#[salsa::db]
pub trait GraphQLHirDatabase: graphql_syntax::GraphQLSyntaxDatabase {
    /// Validator applied to every scope tag.
    /// Implementations override this to accept project-specific tags.
    fn scope_tag_validator(&self) -> Arc<dyn ScopeTagValidator> {
        Arc::new(DefaultScopeTagValidator)
    }
}
