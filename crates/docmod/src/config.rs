//! Configuration resolution for the docmod CLI.
//!
//! Two switches drive a run:
//! - `populate_fallback_groups`: give synthesized fallback modules a
//!   kind-group index (default `false`)
//! - `strip_tags`: remove consumed `@module`/`@moduledefinition` tags from
//!   comments (default `true`)
//!
//! Each value remembers where it came from. Precedence, highest first:
//! 1. CLI flags
//! 2. Environment variables (`DOCMOD_POPULATE_FALLBACK_GROUPS`, `DOCMOD_STRIP_TAGS`)
//! 3. Project config (`docmod.json`, or the file named by `--config`)
//! 4. Defaults

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use docmod_core::error::DocmodError;
use docmod_core::reorganize::ReorganizeOptions;
use docmod_core::tags::TagCollector;

/// Project config file looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "docmod.json";

/// Environment variable for `populate_fallback_groups`.
pub const ENV_POPULATE_FALLBACK_GROUPS: &str = "DOCMOD_POPULATE_FALLBACK_GROUPS";

/// Environment variable for `strip_tags`.
pub const ENV_STRIP_TAGS: &str = "DOCMOD_STRIP_TAGS";

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The config file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON for [`ProjectConfig`].
    #[error("malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An environment variable holds something other than a boolean.
    #[error("{name}={value:?} is not a boolean (use 1/true/yes/on or 0/false/no/off)")]
    InvalidEnv { name: String, value: String },
}

impl From<ConfigError> for DocmodError {
    fn from(err: ConfigError) -> Self {
        DocmodError::invalid_args(err.to_string())
    }
}

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From `docmod.json` or `--config`.
    ProjectConfig = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

/// Contents of `docmod.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// See [`ResolvedConfig::populate_fallback_groups`].
    #[serde(default)]
    pub populate_fallback_groups: Option<bool>,
    /// See [`ResolvedConfig::strip_tags`].
    #[serde(default)]
    pub strip_tags: Option<bool>,
}

impl ProjectConfig {
    /// Load a project config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// CLI configuration overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--config` flag.
    pub config_path: Option<PathBuf>,
    /// `--populate-fallback-groups` flag.
    pub populate_fallback_groups: Option<bool>,
    /// `--keep-tags` flag (stored as `strip_tags = false`).
    pub strip_tags: Option<bool>,
}

// ============================================================================
// Configuration Resolution
// ============================================================================

/// Resolved configuration with precedence information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Give fallback containers a kind-group index.
    pub populate_fallback_groups: ConfigValue<bool>,
    /// Strip consumed module tags from comments.
    pub strip_tags: ConfigValue<bool>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            populate_fallback_groups: ConfigValue::new(false, ConfigSource::Default),
            strip_tags: ConfigValue::new(true, ConfigSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Configuration holding only defaults.
    pub fn new() -> Self {
        ResolvedConfig::default()
    }

    /// Resolve configuration from all sources, reading the process environment.
    pub fn resolve(workspace_root: &Path, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        Self::resolve_with_env(workspace_root, overrides, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    ///
    /// An explicit `--config` path must exist; `docmod.json` in
    /// `workspace_root` is optional.
    pub fn resolve_with_env(
        workspace_root: &Path,
        overrides: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = ResolvedConfig::new();

        match &overrides.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path: path.clone() });
                }
                config.apply_project_config(&ProjectConfig::load(path)?);
            }
            None => {
                let path = workspace_root.join(PROJECT_CONFIG_FILE);
                if path.exists() {
                    debug!("using project config {}", path.display());
                    config.apply_project_config(&ProjectConfig::load(&path)?);
                }
            }
        }

        config.apply_env_vars(env)?;
        config.apply_cli_overrides(overrides);

        Ok(config)
    }

    fn apply_project_config(&mut self, project: &ProjectConfig) {
        if let Some(value) = project.populate_fallback_groups {
            self.populate_fallback_groups = self
                .populate_fallback_groups
                .merge(ConfigValue::new(value, ConfigSource::ProjectConfig));
        }
        if let Some(value) = project.strip_tags {
            self.strip_tags = self
                .strip_tags
                .merge(ConfigValue::new(value, ConfigSource::ProjectConfig));
        }
    }

    fn apply_env_vars(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = env(ENV_POPULATE_FALLBACK_GROUPS) {
            let value = parse_env_bool(ENV_POPULATE_FALLBACK_GROUPS, &raw)?;
            self.populate_fallback_groups = self
                .populate_fallback_groups
                .merge(ConfigValue::new(value, ConfigSource::EnvVar));
        }
        if let Some(raw) = env(ENV_STRIP_TAGS) {
            let value = parse_env_bool(ENV_STRIP_TAGS, &raw)?;
            self.strip_tags = self
                .strip_tags
                .merge(ConfigValue::new(value, ConfigSource::EnvVar));
        }
        Ok(())
    }

    fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(value) = overrides.populate_fallback_groups {
            self.populate_fallback_groups = self
                .populate_fallback_groups
                .merge(ConfigValue::new(value, ConfigSource::CliFlag));
        }
        if let Some(value) = overrides.strip_tags {
            self.strip_tags = self
                .strip_tags
                .merge(ConfigValue::new(value, ConfigSource::CliFlag));
        }
    }

    /// Engine options for this configuration.
    pub fn reorganize_options(&self) -> ReorganizeOptions {
        ReorganizeOptions::new().with_populate_fallback_groups(self.populate_fallback_groups.value)
    }

    /// Tag collector for this configuration.
    pub fn tag_collector(&self) -> TagCollector {
        TagCollector::new().with_strip_tags(self.strip_tags.value)
    }
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
