//! Test project builder.
//!
//! ```ignore
//! use graphql_test_utils::TestProject;
//!
//! let mut project = TestProject::new()
//!     .file("schema/schema.graphql", "type Query { viewer: Viewer } type Viewer { name: String }")
//!     .file("src/query.graphql", "query Q { viewer { name } }")
//!     .build();
//! assert_eq!(project.diagnostics(), "(no diagnostics)");
//!
//! project.write("src/query.graphql", "query Q { viewer { email } }");
//! ```

use crate::{format_diagnostics, MemoryLoader};
use graphql_config::ProjectConfig;
use graphql_engine::{
    ChangeSummary, Diagnostic, Engine, EngineOptions, Preset, QueryParams, WatchEvent,
};
use std::path::{Path, PathBuf};

/// Root every test project lives under
pub const ROOT: &str = "/project";

const SCHEMA_GLOB: &str = "schema/**/*.graphql";
const DOCUMENT_GLOB: &str = "src/**/*.{graphql,gql,ts,tsx,js,jsx}";

/// Builder for an engine over in-memory files.
///
/// Schema files are matched by `schema/**/*.graphql` and documents by
/// `src/**/*` with GraphQL or script extensions, unless a config is given.
pub struct TestProject {
    config: ProjectConfig,
    files: Vec<(String, String)>,
    options: EngineOptions,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ProjectConfig::new(&[SCHEMA_GLOB], &[DOCUMENT_GLOB], &[]),
            files: Vec::new(),
            options: EngineOptions::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ProjectConfig) -> Self {
        self.config = config;
        self
    }

    /// Presets of the default document group
    #[must_use]
    pub fn with_presets(mut self, presets: &[&str]) -> Self {
        for group in &mut self.config.documents {
            group.presets = presets.iter().map(ToString::to_string).collect();
        }
        self
    }

    #[must_use]
    pub fn with_preset_options(mut self, preset: &str, options: serde_json::Value) -> Self {
        self.config
            .preset_options
            .insert(preset.to_string(), options);
        self
    }

    /// Supply a preset that isn't built in
    #[must_use]
    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.options = self.options.with_preset(preset);
        self
    }

    #[must_use]
    pub fn with_options(mut self, f: impl FnOnce(EngineOptions) -> EngineOptions) -> Self {
        self.options = f(self.options);
        self
    }

    /// Add a file, relative to [`ROOT`]
    #[must_use]
    pub fn file(mut self, path: &str, text: &str) -> Self {
        self.files.push((path.to_string(), text.to_string()));
        self
    }

    /// Build and start the engine.
    ///
    /// # Panics
    ///
    /// When the engine can't be created or started.
    #[must_use]
    pub fn build(self) -> TestEngine {
        match self.try_build() {
            Ok(engine) => engine,
            Err(error) => panic!("test project failed to start: {error}"),
        }
    }

    pub fn try_build(self) -> graphql_engine::Result<TestEngine> {
        let loader = MemoryLoader::new();
        let root = PathBuf::from(ROOT);
        for (path, text) in &self.files {
            loader.write(root.join(path), text.as_str());
        }
        let options = self.options.with_loader(loader.clone());
        let mut engine = Engine::new(&root, self.config, options)?;
        engine.start()?;
        Ok(TestEngine {
            engine,
            loader,
            root,
        })
    }
}

/// A started engine plus the files it reads.
pub struct TestEngine {
    pub engine: Engine,
    pub loader: MemoryLoader,
    root: PathBuf,
}

impl TestEngine {
    /// Absolute path of a project file
    #[must_use]
    pub fn path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a file and process the resulting event
    pub fn write(&mut self, path: &str, text: &str) -> Option<ChangeSummary> {
        let path = self.path(path);
        let event = if self.loader.contains(&path) {
            WatchEvent::change(&path)
        } else {
            WatchEvent::add(&path)
        };
        self.loader.write(&path, text);
        self.engine.apply([event])
    }

    /// Delete a file and process the resulting event
    pub fn remove(&mut self, path: &str) -> Option<ChangeSummary> {
        let path = self.path(path);
        self.loader.remove(&path);
        self.engine.apply([WatchEvent::unlink(path)])
    }

    /// Every diagnostic, formatted with root-relative paths
    #[must_use]
    pub fn diagnostics(&self) -> String {
        format_diagnostics(&self.engine.status(), &self.root)
    }

    #[must_use]
    pub fn file_diagnostics(&self, path: &str) -> Vec<Diagnostic> {
        self.engine
            .analysis()
            .file_diagnostics(&self.path(path))
    }

    /// Messages of a file's diagnostics
    #[must_use]
    pub fn messages(&self, path: &str) -> Vec<String> {
        self.file_diagnostics(path)
            .into_iter()
            .map(|diagnostic| diagnostic.message)
            .collect()
    }

    /// Query parameters at the first occurrence of `marker` in a file,
    /// shifted by `offset` bytes
    ///
    /// # Panics
    ///
    /// When the file doesn't exist or doesn't contain `marker`.
    #[must_use]
    pub fn params_at(&self, path: &str, marker: &str, offset: usize) -> QueryParams {
        let absolute = self.path(path);
        let analysis = self.engine.analysis();
        let Some(file) = analysis.snapshot().file(&absolute) else {
            panic!("{path} is not part of the project");
        };
        let Some(found) = file.text.find(marker) else {
            panic!("{marker:?} not found in {path}");
        };
        let position = file.line_index.position(found + offset);
        QueryParams::new(absolute, position.line, position.character)
    }
}
