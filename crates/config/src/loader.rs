use crate::{ConfigError, ProjectConfig, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names to search for, in order of preference
const CONFIG_FILES: &[&str] = &[".graphqlrc.json", "graphql.config.json", ".graphqlrc"];

/// Find a config file by walking up the directory tree from `start_dir`.
#[tracing::instrument(fields(start = %start_dir.display()))]
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current_dir = start_dir.to_path_buf();
    let mut checked_dirs = 0;

    loop {
        tracing::trace!(dir = %current_dir.display(), "Checking directory for config files");
        for file_name in CONFIG_FILES {
            let config_path = current_dir.join(file_name);
            if config_path.is_file() {
                tracing::info!(path = %config_path.display(), checked_dirs, "Found config file");
                return Ok(Some(config_path));
            }
        }

        checked_dirs += 1;
        if !current_dir.pop() {
            tracing::debug!(checked_dirs, "No config file found");
            break;
        }
    }

    Ok(None)
}

/// Load a normalized project config from a JSON file.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    tracing::debug!("Reading config file");
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents, path)?;
    tracing::info!(
        document_groups = config.documents.len(),
        presets = ?config.all_presets(),
        "Config loaded successfully"
    );
    Ok(config)
}

/// Load a normalized project config from a string.
/// The path is used for error messages and format detection.
#[tracing::instrument(skip(contents), fields(path = %path.display(), size = contents.len()))]
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<ProjectConfig> {
    let extension = path.extension().and_then(|ext| ext.to_str());
    let file_name = path.file_name().and_then(|name| name.to_str());

    if !(extension == Some("json") || file_name == Some(".graphqlrc")) {
        return Err(ConfigError::UnsupportedFormat(path.to_path_buf()));
    }

    let config: ProjectConfig =
        serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: format!("JSON parse error: {e}"),
        })?;

    tracing::debug!("Validating config");
    config.validate().map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "schema": ["schema.graphql"],
        "documents": [{ "include": "src/**/*.ts", "presets": ["apollo"] }]
    }"#;

    #[test]
    fn test_load_json_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".graphqlrc.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.schema.patterns(), vec!["schema.graphql"]);
        assert_eq!(config.all_presets(), vec!["apollo"]);
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("graphql.config.json"), CONFIG).unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, Some(dir.path().join("graphql.config.json")));
    }

    #[test]
    fn test_unsupported_format() {
        let err = load_config_from_str("schema: x", Path::new("config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let err = load_config_from_str("{", Path::new("/p/.graphqlrc.json")).unwrap_err();
        let ConfigError::Invalid { path, message } = err else {
            panic!("expected invalid config error");
        };
        assert_eq!(path, PathBuf::from("/p/.graphqlrc.json"));
        assert!(message.starts_with("JSON parse error"));
    }

    #[test]
    fn test_validation_empty_schema() {
        let err =
            load_config_from_str(r#"{ "schema": [] }"#, Path::new(".graphqlrc")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
