//! Shared test utilities for the analysis engine.
//!
//! - [`MemoryLoader`]: an in-memory [`SourceLoader`](graphql_engine::SourceLoader)
//!   whose files can be edited between batches
//! - [`TestProject`]: builds and starts an engine over a `MemoryLoader`
//! - [`format_diagnostics`]: stable text for snapshot assertions

mod assertions;
mod loader;
mod project;

pub use assertions::{format_diagnostic_messages, format_diagnostics};
pub use loader::MemoryLoader;
pub use project::{TestEngine, TestProject, ROOT};
