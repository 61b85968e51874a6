//! Target implementations and the settings they share.

mod all;
mod clean;
mod refresh;

pub use all::cmd_all;
pub use clean::cmd_clean;
pub use refresh::cmd_refresh;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use extbuild_lib::consts::CONFIG_FILENAME;
use extbuild_lib::{BuildConfig, CommandToolchain, ConfigError, Orchestrator};

use crate::output::{OutputFormat, print_warning};

/// Command-line settings layered over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
  pub directory: PathBuf,
  pub config: Option<PathBuf>,
  pub python: Option<String>,
  pub sources: Vec<PathBuf>,
  pub verbose: bool,
  pub output: OutputFormat,
}

impl Settings {
  /// The working directory, canonicalized.
  pub fn working_dir(&self) -> Result<PathBuf> {
    dunce::canonicalize(&self.directory)
      .with_context(|| format!("Working directory not found: {}", self.directory.display()))
  }

  /// The explicit `--config` file. Relative paths are taken from the working
  /// directory, as with `make -C dir -f file`.
  pub fn config_path(&self, dir: &Path) -> Option<PathBuf> {
    self.config.as_ref().map(|path| dir.join(path))
  }

  /// Load the config and apply overrides: flags > environment > file > defaults.
  pub fn load_config(&self, dir: &Path) -> Result<BuildConfig, ConfigError> {
    let mut config = match self.config_path(dir) {
      Some(path) => BuildConfig::load(&path)?,
      None => BuildConfig::load_or_default(&dir.join(CONFIG_FILENAME))?,
    };

    config.apply_env();

    if let Some(python) = &self.python {
      config.toolchain.program = python.clone();
    }
    if !self.sources.is_empty() {
      config.sources = self.sources.clone();
    }
    config.verbose = self.verbose;

    debug!(
      program = %config.toolchain.program,
      sources = config.sources.len(),
      artifact = %config.artifact,
      "resolved build configuration"
    );
    Ok(config)
  }

  /// Orchestrator for targets that must work even with a broken config.
  pub fn lenient_orchestrator(&self, dir: &Path) -> Result<Orchestrator<CommandToolchain>> {
    let loaded = self
      .load_config(dir)
      .and_then(|config| orchestrator(dir, &config));

    match loaded {
      Ok(orchestrator) => Ok(orchestrator),
      Err(e) => {
        print_warning(&format!("Ignoring build configuration: {}", e));
        orchestrator(dir, &BuildConfig::default()).context("Failed to set up default configuration")
      }
    }
  }
}

pub fn orchestrator(dir: &Path, config: &BuildConfig) -> Result<Orchestrator<CommandToolchain>, ConfigError> {
  let toolchain = CommandToolchain::new(&config.toolchain).with_echo(config.verbose);
  Orchestrator::new(dir, config, toolchain)
}

/// Single-threaded runtime; the toolchain subprocess is the only await point.
pub fn runtime() -> Result<Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
