//! Terminal and JSON rendering of diagnostics and batch results.

use colored::Colorize;
use graphql_engine::{Analysis, ChangeSummary, Diagnostic, Engine};
use graphql_types::DiagnosticSeverity;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// One JSON object per line for tooling
    Json,
}

pub struct Printer {
    format: OutputFormat,
    root: PathBuf,
    quiet: bool,
}

impl Printer {
    pub const fn new(format: OutputFormat, root: PathBuf, quiet: bool) -> Self {
        Self {
            format,
            root,
            quiet,
        }
    }

    /// Print engine errors (unreadable files, failed schema builds, fragment
    /// collisions, failing providers) as they're reported.
    pub fn register(&self, engine: &Engine) {
        let format = self.format;
        engine.on_error(move |error| match format {
            OutputFormat::Human => eprintln!("{} {error}", "warning:".yellow().bold()),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "type": "engine_error",
                    "timestamp": clock_time(),
                    "message": error.to_string(),
                })
            ),
        });
    }

    pub fn print_watching(&self) {
        if self.quiet || self.format != OutputFormat::Human {
            return;
        }
        println!();
        println!(
            "{} Watching {} for changes... (press {} to stop)",
            "●".cyan(),
            self.root.display().to_string().cyan(),
            "Ctrl+C".bold()
        );
    }

    pub fn print_batch(&self, analysis: &Analysis, summary: &ChangeSummary, initial: bool) {
        let diagnostics = analysis.diagnostics();
        match self.format {
            OutputFormat::Human => {
                for diagnostic in &diagnostics {
                    println!("{}", self.render(diagnostic));
                }
                if !self.quiet {
                    self.print_summary(summary, initial);
                }
            }
            OutputFormat::Json => {
                for diagnostic in &diagnostics {
                    println!("{}", self.to_json(diagnostic));
                }
                println!(
                    "{}",
                    serde_json::json!({
                        "type": "result",
                        "timestamp": clock_time(),
                        "initial": initial,
                        "generation": summary.generation,
                        "changed": self.relative_all(&summary.changed),
                        "removed": self.relative_all(&summary.removed),
                        "revalidated": summary.revalidated.len(),
                        "cache_hits": summary.cache_hits,
                        "errors": summary.errors,
                        "warnings": summary.warnings,
                        "passed": summary.errors == 0,
                    })
                );
            }
        }
    }

    fn print_summary(&self, summary: &ChangeSummary, initial: bool) {
        let timestamp = format!("[{}]", clock_time()).dimmed();
        if !initial {
            println!();
            for path in &summary.changed {
                println!("{timestamp} {} changed", self.relative(path).cyan());
            }
            for path in &summary.removed {
                println!("{timestamp} {} removed", self.relative(path).cyan());
            }
        }

        println!();
        let verdict = match (summary.errors, summary.warnings) {
            (0, 0) => "✓ No problems found".green().bold(),
            (0, warnings) => format!("✓ Passed with {warnings} warning(s)").yellow().bold(),
            (errors, warnings) => format!("✗ {errors} error(s), {warnings} warning(s)").red(),
        };
        println!("{timestamp} {verdict}");
        println!(
            "  {}",
            format!(
                "{} revalidated, {} unchanged",
                summary.revalidated.len(),
                summary.cache_hits
            )
            .dimmed()
        );
    }

    /// `path:line:col: severity [category/code] message`, the path relative
    /// to the root
    fn render(&self, diagnostic: &Diagnostic) -> String {
        let location = diagnostic.primary_location().map_or_else(String::new, |location| {
            format!("{}:{}: ", self.relative(&location.path), location.range.start)
        });
        let severity = match diagnostic.severity {
            DiagnosticSeverity::Error => "error".red().bold(),
            DiagnosticSeverity::Warning => "warning".yellow().bold(),
        };
        let code = match &diagnostic.code {
            Some(code) => format!("[{}/{code}]", diagnostic.category),
            None => format!("[{}]", diagnostic.category),
        };
        format!("{location}{severity} {} {}", code.dimmed(), diagnostic.message)
    }

    fn to_json(&self, diagnostic: &Diagnostic) -> serde_json::Value {
        let location = diagnostic.primary_location().map(|location| {
            serde_json::json!({
                "file": self.relative(&location.path),
                "start": {
                    "line": location.range.start.line + 1,
                    "column": location.range.start.character + 1
                },
                "end": {
                    "line": location.range.end.line + 1,
                    "column": location.range.end.character + 1
                }
            })
        });
        serde_json::json!({
            "type": "diagnostic",
            "severity": diagnostic.severity.to_string(),
            "category": diagnostic.category.to_string(),
            "code": diagnostic.code,
            "message": diagnostic.message,
            "suggestions": diagnostic.suggestions,
            "location": location,
        })
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn relative_all(&self, paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|path| self.relative(path)).collect()
    }
}

/// Wall-clock `HH:MM:SS` (UTC)
fn clock_time() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_engine::{DiagnosticCategory, Location};
    use graphql_types::{Position, Range};
    use std::sync::Arc;

    fn diagnostic() -> Diagnostic {
        let path: Arc<Path> = Arc::from(Path::new("/project/src/query.graphql"));
        Diagnostic::error(
            DiagnosticCategory::Validation,
            r#"Cannot query field "nam" on type "Viewer". Did you mean "name"?"#,
        )
        .with_code("fields_on_correct_type")
        .with_suggestions(vec!["name".to_string()])
        .at(Location {
            path,
            range: Range::new(Position::new(0, 19), Position::new(0, 22)),
        })
    }

    #[test]
    fn test_render_is_relative_to_root() {
        colored::control::set_override(false);
        let printer = Printer::new(OutputFormat::Human, PathBuf::from("/project"), false);
        assert_eq!(
            printer.render(&diagnostic()),
            r#"src/query.graphql:1:20: error [validation/fields_on_correct_type] Cannot query field "nam" on type "Viewer". Did you mean "name"?"#
        );
    }

    #[test]
    fn test_json_diagnostic() {
        let printer = Printer::new(OutputFormat::Json, PathBuf::from("/project"), false);
        let value = printer.to_json(&diagnostic());
        assert_eq!(value["location"]["file"], "src/query.graphql");
        assert_eq!(value["location"]["start"]["column"], 20);
        assert_eq!(value["code"], "fields_on_correct_type");
        assert_eq!(value["suggestions"][0], "name");
    }
}
