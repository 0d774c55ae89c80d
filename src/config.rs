//! Configuration management for ghpages-publish.
//!
//! Supports layered configuration: defaults → project → user → explicit file → env

use crate::domain::CommitTemplate;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Name of the per-repository config file
pub const PROJECT_CONFIG_FILE: &str = ".ghpages-publish.toml";

/// Prefix for environment overrides (`GHPAGES_PUBLISH__BRANCHES__PAGES=site`)
pub const ENV_PREFIX: &str = "GHPAGES_PUBLISH";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub branches: BranchConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub publish: PublishOptions,
    #[serde(default)]
    pub log: LogConfig,
}

impl PublishConfig {
    /// Load configuration with hierarchy: defaults → project → user → explicit → env
    pub fn load(project_root: Option<&Path>, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let user_config = Self::user_config_file();
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("sources.paths")
            .with_list_parse_key("build.args")
            .with_list_parse_key("publish.preserve")
            .try_parsing(true);
        Self::load_layers(project_root, user_config.as_deref(), explicit, Some(env))
    }

    /// User config file (~/.config/ghpages-publish/config.toml)
    fn user_config_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "ghpages-publish", "ghpages-publish")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn load_layers(
        project_root: Option<&Path>,
        user_config: Option<&Path>,
        explicit: Option<&Path>,
        env: Option<config::Environment>,
    ) -> Result<Self, ConfigError> {
        use config::{Config, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Project-specific config (.ghpages-publish.toml in repository root)
        if let Some(root) = project_root {
            let project_config = root.join(PROJECT_CONFIG_FILE);
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }

        // 3. User config
        if let Some(user_config) = user_config.filter(|path| path.exists()) {
            builder = builder.add_source(File::from(user_config.to_path_buf()).required(false));
        }

        // 4. Explicit --config file must exist
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        // 5. Environment variables (GHPAGES_PUBLISH__*)
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations that would make a run meaningless or unsafe
    pub fn validate(&self) -> Result<(), ConfigError> {
        let branches = &self.branches;
        for (field, value) in [
            ("branches.source", &branches.source),
            ("branches.pages", &branches.pages),
            ("branches.remote", &branches.remote),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }
        if branches.source == branches.pages {
            return Err(ConfigError::Invalid(format!(
                "source and pages branch are both '{}'",
                branches.source
            )));
        }

        if self.sources.paths.is_empty() {
            return Err(ConfigError::Invalid(
                "sources.paths must list at least one path".to_string(),
            ));
        }
        for path in &self.sources.paths {
            check_relative("sources.paths", path)?;
        }
        for path in &self.publish.preserve {
            check_relative("publish.preserve", path)?;
        }

        if self.build.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "build.program must not be empty".to_string(),
            ));
        }
        if !self.build.directory.as_os_str().is_empty() {
            check_relative("build.directory", &self.build.directory)?;
        }
        check_relative("build.output", &self.build.output)?;

        CommitTemplate::parse(&self.publish.commit_message)?;

        Ok(())
    }

    /// Directory for per-run log files, or `None` when logging to file is off
    pub fn log_directory(&self) -> Option<PathBuf> {
        if !self.log.enabled {
            return None;
        }
        if let Some(dir) = &self.log.directory {
            return Some(dir.clone());
        }
        directories::ProjectDirs::from("com", "ghpages-publish", "ghpages-publish")
            .map(|dirs| dirs.data_local_dir().join("logs"))
    }
}

/// Paths are interpreted relative to the repository root and may not escape it
fn check_relative(field: &str, path: &Path) -> Result<(), ConfigError> {
    let mut normal = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "{} entry '{}' must be relative and stay inside the repository",
                    field,
                    path.display()
                )))
            }
        }
    }
    if normal == 0 {
        return Err(ConfigError::Invalid(format!(
            "{} entry '{}' does not name a path",
            field,
            path.display()
        )));
    }
    Ok(())
}

/// Branch and remote names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Branch holding the documentation sources
    #[serde(default = "default_source_branch")]
    pub source: String,
    /// Branch whose root is served as the website
    #[serde(default = "default_pages_branch")]
    pub pages: String,
    /// Remote the publishing branch is pushed to
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            source: default_source_branch(),
            pages: default_pages_branch(),
            remote: default_remote(),
        }
    }
}

fn default_source_branch() -> String {
    "master".to_string()
}

fn default_pages_branch() -> String {
    "gh-pages".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Paths restored from the source branch before building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_source_paths")]
    pub paths: Vec<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            paths: default_source_paths(),
        }
    }
}

fn default_source_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("doc"), PathBuf::from("src")]
}

/// Documentation generator invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Program to run
    #[serde(default = "default_build_program")]
    pub program: String,
    /// Arguments passed to the program
    #[serde(default = "default_build_args")]
    pub args: Vec<String>,
    /// Working directory (relative to the repository root, empty for the root)
    #[serde(default = "default_build_directory")]
    pub directory: PathBuf,
    /// Directory containing the generated HTML (relative to the repository root)
    #[serde(default = "default_build_output")]
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: default_build_program(),
            args: default_build_args(),
            directory: default_build_directory(),
            output: default_build_output(),
        }
    }
}

fn default_build_program() -> String {
    "make".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["html".to_string()]
}

fn default_build_directory() -> PathBuf {
    PathBuf::from("doc")
}

fn default_build_output() -> PathBuf {
    PathBuf::from("doc/build/html")
}

/// Branch to check out once the run is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReturnTo {
    /// The branch that was checked out when the run started
    #[default]
    Origin,
    /// Always the configured source branch
    Source,
}

/// Commit, push and cleaning behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOptions {
    /// Commit message template ({hash}, {subject}, {source}, {pages})
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// Push the publishing branch after committing
    #[serde(default = "default_true")]
    pub push: bool,
    /// Commit even when the generated site did not change
    #[serde(default = "default_true")]
    pub allow_empty: bool,
    /// Also remove ignored files when cleaning (`git clean -x`)
    #[serde(default = "default_true")]
    pub clean_ignored: bool,
    /// Paths on the publishing branch that survive cleaning
    #[serde(default)]
    pub preserve: Vec<PathBuf>,
    #[serde(default)]
    pub return_to: ReturnTo,
    /// Refuse to start with uncommitted changes
    #[serde(default)]
    pub require_clean: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message(),
            push: true,
            allow_empty: true,
            clean_ignored: true,
            preserve: Vec::new(),
            return_to: ReturnTo::default(),
            require_clean: false,
        }
    }
}

fn default_commit_message() -> String {
    "Generated {pages} for {source}@{hash}".to_string()
}

fn default_true() -> bool {
    true
}

/// Per-run log file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Overrides the platform data directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}
