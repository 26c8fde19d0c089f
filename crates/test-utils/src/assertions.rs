//! Snapshot helpers for engine diagnostics.
//!
//! Diagnostics print with root-relative paths so snapshots don't depend on
//! where a test project lives.

use graphql_engine::Diagnostic;
use std::path::Path;

/// One diagnostic per line, `path:line:col: severity [category/code] message`.
#[must_use]
pub fn format_diagnostics(diagnostics: &[Diagnostic], root: &Path) -> String {
    if diagnostics.is_empty() {
        return String::from("(no diagnostics)");
    }
    let prefix = format!("{}/", root.display());
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.to_string().replacen(&prefix, "", 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Messages only, for assertions that don't care about positions.
#[must_use]
pub fn format_diagnostic_messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect()
}
