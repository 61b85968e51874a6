//! Locating build artifacts in the working directory.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::{MatchOptions, Pattern};

use crate::config::ConfigError;
use crate::consts::CONFIG_FILENAME;
use crate::staleness::{OutputStamp, Timestamps};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: true,
};

/// Glob over file names directly inside the working directory.
///
/// Hidden files never match, so the refresh marker and the build journal are
/// safe from cleanup. Paths passed to [`excluding`](Self::excluding) (the
/// declared sources) and the config file never match either.
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
  root: PathBuf,
  pattern: Pattern,
  excluded: Vec<PathBuf>,
}

impl ArtifactPattern {
  pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self, ConfigError> {
    let compiled = Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
      pattern: pattern.to_string(),
      message: e.msg.to_string(),
    })?;
    let root = root.into();
    let excluded = vec![root.join(CONFIG_FILENAME)];
    Ok(ArtifactPattern {
      root,
      pattern: compiled,
      excluded,
    })
  }

  /// Never match these paths (relative paths are joined onto the root).
  pub fn excluding<I, P>(mut self, paths: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
  {
    for path in paths {
      let joined = self.root.join(path.as_ref());
      self.excluded.push(joined);
    }
    self
  }

  pub fn as_str(&self) -> &str {
    self.pattern.as_str()
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Whether `file_name` would be treated as an artifact.
  pub fn matches_name(&self, file_name: &str) -> bool {
    self.pattern.matches_with(file_name, MATCH_OPTIONS)
  }

  /// All matching regular files, sorted by path. A missing root yields none.
  pub fn find(&self) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(&self.root) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e),
    };

    let mut found = Vec::new();
    for entry in entries {
      let entry = entry?;
      if !entry.file_type()?.is_file() {
        continue;
      }
      let name = entry.file_name();
      let Some(name) = name.to_str() else {
        continue;
      };
      let path = entry.path();
      if self.matches_name(name) && !self.excluded.contains(&path) {
        found.push(path);
      }
    }
    found.sort();
    Ok(found)
  }

  /// The output reference for staleness checks: the newest matching file.
  ///
  /// Matching files a build leaves untouched (vendored libraries, say) are
  /// usually older than the sources and must not keep the output stale.
  pub fn output_stamp(&self, timestamps: &impl Timestamps) -> io::Result<OutputStamp> {
    Ok(self.newest(timestamps)?.map_or(OutputStamp::Missing, OutputStamp::Built))
  }

  /// Modification time of the newest matching artifact.
  pub fn newest(&self, timestamps: &impl Timestamps) -> io::Result<Option<SystemTime>> {
    let mut newest: Option<SystemTime> = None;
    for path in self.find()? {
      if let Some(modified) = timestamps.modified(&path)? {
        newest = Some(newest.map_or(modified, |t| t.max(modified)));
      }
    }
    Ok(newest)
  }
}
