//! The declared inputs of one buildable unit.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// Ordered, non-empty list of source files.
///
/// Paths are kept as declared so the toolchain sees the same arguments on
/// every run; `resolved` joins them onto the working directory for stat calls.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
  root: PathBuf,
  paths: Vec<PathBuf>,
}

impl SourceSet {
  /// Validate the declaration against the working directory `root`.
  ///
  /// Fails if the list is empty or any path does not exist right now.
  pub fn new(root: impl Into<PathBuf>, paths: Vec<PathBuf>) -> Result<Self, ConfigError> {
    let root = root.into();
    if paths.is_empty() {
      return Err(ConfigError::EmptySourceSet);
    }
    if let Some(missing) = paths.iter().find(|p| !root.join(p).is_file()) {
      return Err(ConfigError::SourceNotFound(missing.clone()));
    }
    Ok(SourceSet { root, paths })
  }

  /// Build a set without touching the filesystem.
  #[cfg(test)]
  pub(crate) fn unchecked(root: impl Into<PathBuf>, paths: Vec<PathBuf>) -> Self {
    SourceSet {
      root: root.into(),
      paths,
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Paths exactly as declared.
  pub fn paths(&self) -> &[PathBuf] {
    &self.paths
  }

  /// Paths joined onto the working directory, in declaration order.
  pub fn resolved(&self) -> impl Iterator<Item = PathBuf> + '_ {
    self.paths.iter().map(|p| self.root.join(p))
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }
}
