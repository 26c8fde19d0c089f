//! Project-level analysis on top of the per-file layers.
//!
//! This crate turns parsed files into what users see: the merged schema
//! with its build errors attributed back to files, validation of query
//! documents against that schema, and the set of definitions each query
//! file depends on so that only affected files are revalidated when
//! something changes.

mod diagnostics;
mod references;
pub mod schema;
mod validate;

pub use diagnostics::{Diagnostic, DiagnosticCategory, Location};
pub use references::{collect_references, schema_fingerprints, touched_symbols, Symbol};
pub use schema::{build_schema, BuildOutcome, SchemaBuild, SchemaExtension, SchemaFile};
pub use validate::{file_diagnostics, fragment_definitions, fragment_index, validate_file, FileInput};
