mod exit_code;
mod output;
mod watch;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use exit_code::ExitCode;
use graphql_config::ProjectConfig;
use graphql_engine::{Engine, EngineOptions};
use output::{OutputFormat, Printer};
use std::path::{Path, PathBuf};
use tracing::Dispatch;

#[derive(Parser)]
#[command(name = "graphql-watch")]
#[command(about = "Validate a GraphQL project and keep it validated as files change", long_about = None)]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Project root; globs are matched relative to it
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Path to a JSON project config. Searched for from the root when no
    /// globs are given.
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["schema", "documents"])]
    config: Option<PathBuf>,

    /// Schema file glob (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    schema: Vec<String>,

    /// Document file glob (repeatable)
    #[arg(short, long, value_name = "GLOB", requires = "schema")]
    documents: Vec<String>,

    /// Preset applied to the document globs (repeatable)
    #[arg(short, long, value_name = "NAME", requires = "documents")]
    preset: Vec<String>,

    /// Keep running and re-validate on file changes
    #[arg(short, long)]
    watch: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Force colored output even when not a TTY
    #[arg(long, conflicts_with = "no_color")]
    color: bool,

    /// Disable colored output
    #[arg(long, conflicts_with = "color")]
    no_color: bool,

    /// Only print diagnostics
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let dispatch = init_tracing();
    configure_colors(cli.color, cli.no_color);

    let code = match run(&cli, dispatch) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            classify_error(&error)
        }
    };
    code.exit();
}

fn run(cli: &Cli, dispatch: Dispatch) -> Result<ExitCode> {
    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("project root {} does not exist", cli.root.display()))?;
    let config = resolve_config(cli, &root)?;
    tracing::debug!(root = %root.display(), ?config, "resolved project config");

    let options = EngineOptions::default().with_dispatch(dispatch);
    let mut engine = Engine::new(&root, config.clone(), options)?;
    let printer = Printer::new(cli.format, root.clone(), cli.quiet);
    printer.register(&engine);

    let summary = engine.start()?;
    printer.print_batch(&engine.analysis(), &summary, true);

    if !cli.watch {
        return Ok(if summary.errors > 0 {
            ExitCode::ValidationError
        } else {
            ExitCode::Success
        });
    }

    let mut watcher = watch::FileWatcher::new(&root, &config)?;
    watcher.start()?;
    printer.print_watching();
    watcher.run(&mut engine, &printer);
    engine.stop();
    Ok(ExitCode::Success)
}

/// The config comes from the globs on the command line, an explicit file,
/// or the nearest config file above the root, in that order.
fn resolve_config(cli: &Cli, root: &Path) -> Result<ProjectConfig> {
    if !cli.schema.is_empty() {
        let schema: Vec<&str> = cli.schema.iter().map(String::as_str).collect();
        let documents: Vec<&str> = cli.documents.iter().map(String::as_str).collect();
        let presets: Vec<&str> = cli.preset.iter().map(String::as_str).collect();
        return Ok(ProjectConfig::new(&schema, &documents, &presets));
    }

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => match graphql_config::find_config(root)? {
            Some(path) => path,
            None => bail!(
                "no config found above {}; pass --config or --schema",
                root.display()
            ),
        },
    };
    graphql_config::load_config(&path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn classify_error(error: &anyhow::Error) -> ExitCode {
    if error.downcast_ref::<graphql_config::ConfigError>().is_some() {
        return ExitCode::ConfigError;
    }
    match error.downcast_ref::<graphql_engine::EngineError>() {
        Some(graphql_engine::EngineError::Io { .. }) => ExitCode::IoError,
        Some(_) => ExitCode::ConfigError,
        None if error.downcast_ref::<std::io::Error>().is_some() => ExitCode::IoError,
        None => ExitCode::ConfigError,
    }
}

/// Logs go to stderr, filtered by `RUST_LOG`. The same dispatch is handed
/// to the engine so its batch logs land here too.
fn init_tracing() -> Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    // only fails if a global default is already set
    let _ = tracing::dispatcher::set_global_default(dispatch.clone());
    dispatch
}

/// Configure colored output based on flags and environment variables.
///
/// Priority order (highest to lowest):
/// 1. `--color` flag (force colors on)
/// 2. `--no-color` flag (force colors off)
/// 3. `NO_COLOR` environment variable (if set to any value, disable colors)
/// 4. `CLICOLOR_FORCE` environment variable (if set to non-zero, force colors)
/// 5. `CLICOLOR` environment variable (if set to "0", disable colors)
/// 6. Default: colors enabled if stdout is a TTY (handled by `colored` crate)
///
/// See: <https://no-color.org/> and <https://bixense.com/clicolors/>
fn configure_colors(force_color: bool, no_color: bool) {
    use colored::control;

    if force_color {
        control::set_override(true);
    } else if no_color || std::env::var_os("NO_COLOR").is_some() {
        control::set_override(false);
    } else if let Ok(val) = std::env::var("CLICOLOR_FORCE") {
        if !val.is_empty() && val != "0" {
            control::set_override(true);
        }
    } else if std::env::var("CLICOLOR").is_ok_and(|val| val == "0") {
        control::set_override(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("graphql-watch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_globs_build_a_config() {
        let cli = parse(&[
            "--schema",
            "schema/*.graphql",
            "--documents",
            "src/**/*.ts",
            "--preset",
            "apollo",
        ]);
        let config = resolve_config(&cli, Path::new("/project")).unwrap();
        assert_eq!(config.schema.patterns(), vec!["schema/*.graphql"]);
        assert_eq!(config.documents.len(), 1);
        assert_eq!(config.documents[0].presets, vec!["apollo"]);
    }

    #[test]
    fn test_presets_need_documents() {
        let result = Cli::try_parse_from(["graphql-watch", "--schema", "s.graphql", "--preset", "relay"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_conflicts_with_globs() {
        let result = Cli::try_parse_from([
            "graphql-watch",
            "--config",
            "graphql.config.json",
            "--schema",
            "s.graphql",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphql.config.json");
        std::fs::write(
            &path,
            r#"{ "schema": "schema.graphql", "documents": [{ "include": "src/**/*.graphql" }] }"#,
        )
        .unwrap();

        let cli = parse(&["--config", path.to_str().unwrap()]);
        let config = resolve_config(&cli, dir.path()).unwrap();
        assert_eq!(config.schema.patterns(), vec!["schema.graphql"]);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[]);
        let error = resolve_config(&cli, dir.path()).unwrap_err();
        assert!(error.to_string().contains("no config found"));
        assert_eq!(classify_error(&error), ExitCode::ConfigError);
    }
}
