//! Embedded GraphQL extraction.
//!
//! A hand-written scanner that finds GraphQL regions inside arbitrary text,
//! delimited by a configurable pair of regular expressions (by default a
//! `gql` / `graphql` tagged template literal). Interpolation placeholders
//! (`${...}`) are replaced by stand-ins so the region stays parseable, and
//! `fragment on Type { ... }` can be given a synthetic name.
//!
//! Every candidate carries an [`OffsetMap`] that translates offsets in the
//! extracted GraphQL text back to absolute offsets in the parent file.

mod config;
mod error;
mod offset_map;
mod scanner;

pub use config::{DelimiterConfig, Delimiters};
pub use error::{ExtractError, Result};
pub use offset_map::OffsetMap;
pub use scanner::{
    extract, EmbeddedCandidate, Extractor, Interpolation, InterpolationKind,
    ANONYMOUS_FRAGMENT_PREFIX, INTERPOLATION_PREFIX,
};

// Re-export types from graphql-types for convenience
pub use graphql_types::OffsetRange;
