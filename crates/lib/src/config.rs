//! Build configuration.
//!
//! Settings are read from `extbuild.toml` in the working directory, then
//! overridden from the environment. Command-line overrides are applied by the
//! caller on top of the loaded value.
//!
//! ```toml
//! sources = ["ext.pxd", "ext.pyx"]
//! artifact = "*.so"
//!
//! [toolchain]
//! program = "python3"
//! args = ["setup.py", "build_ext", "--inplace", "--force"]
//! append_sources = false
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_ARTIFACT_PATTERN, DEFAULT_PYTHON, DEFAULT_TOOLCHAIN_ARGS, PYTHON_ENV_VAR};

/// A bad build declaration. Always fatal; nothing is retried.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("no sources declared")]
  EmptySourceSet,

  #[error("declared source does not exist: {0}")]
  SourceNotFound(PathBuf),

  #[error("invalid artifact pattern `{pattern}`: {message}")]
  InvalidPattern { pattern: String, message: String },

  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// How the external toolchain is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
  /// Executable to spawn.
  pub program: String,
  /// Arguments placed before the source paths.
  pub args: Vec<String>,
  /// Append the source paths, in declaration order, after `args`.
  pub append_sources: bool,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    ToolchainConfig {
      program: DEFAULT_PYTHON.to_string(),
      args: DEFAULT_TOOLCHAIN_ARGS.iter().map(|s| s.to_string()).collect(),
      append_sources: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
  /// Source paths relative to the working directory.
  pub sources: Vec<PathBuf>,
  /// Glob matched against file names in the working directory.
  pub artifact: String,
  pub toolchain: ToolchainConfig,
  /// Echo toolchain output after it exits.
  #[serde(skip)]
  pub verbose: bool,
}

impl Default for BuildConfig {
  fn default() -> Self {
    BuildConfig {
      sources: Vec::new(),
      artifact: DEFAULT_ARTIFACT_PATTERN.to_string(),
      toolchain: ToolchainConfig::default(),
      verbose: false,
    }
  }
}

impl BuildConfig {
  /// Parse a configuration document. `path` is only used for error messages.
  pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load a configuration file that must exist.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    if !path.exists() {
      return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config = Self::from_toml(&content, path)?;
    debug!(path = %path.display(), sources = config.sources.len(), "loaded config");
    Ok(config)
  }

  /// Load a configuration file, falling back to defaults when it is absent.
  pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
    if path.exists() {
      Self::load(path)
    } else {
      debug!(path = %path.display(), "no config file, using defaults");
      Ok(Self::default())
    }
  }

  /// Apply environment overrides (`EXTBUILD_PYTHON`).
  pub fn apply_env(&mut self) {
    if let Ok(program) = std::env::var(PYTHON_ENV_VAR)
      && !program.is_empty()
    {
      debug!(program = %program, "toolchain program overridden from environment");
      self.toolchain.program = program;
    }
  }
}
