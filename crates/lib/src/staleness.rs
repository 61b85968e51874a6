//! Staleness detection.
//!
//! A build is stale when there is no prior output, when any source is strictly
//! newer than the output, or when the refresh marker is strictly newer than the
//! output. Equal timestamps are not stale: filesystems with coarse timestamp
//! resolution would otherwise trigger a rebuild on every run.
//!
//! Timestamps are read through the [`Timestamps`] trait so the decision can be
//! tested against an in-memory clock.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

use crate::source::SourceSet;

/// Source of modification times.
pub trait Timestamps {
  /// Modification time of `path`, or `Ok(None)` if it does not exist.
  fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>>;
}

/// Reads modification times from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTimestamps;

impl Timestamps for FsTimestamps {
  fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>> {
    match std::fs::metadata(path) {
      Ok(metadata) => metadata.modified().map(Some),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}

/// What the last build left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStamp {
  /// No artifact exists.
  Missing,
  /// Modification time of the newest existing artifact.
  Built(SystemTime),
}

#[derive(Debug, Error)]
pub enum StalenessError {
  /// A declared source vanished after configuration.
  #[error("declared source is missing: {0}")]
  MissingSource(PathBuf),

  #[error("failed to read timestamp of {path}")]
  Stat {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

pub struct StalenessChecker<T = FsTimestamps> {
  timestamps: T,
}

impl Default for StalenessChecker<FsTimestamps> {
  fn default() -> Self {
    StalenessChecker::new(FsTimestamps)
  }
}

impl<T: Timestamps> StalenessChecker<T> {
  pub fn new(timestamps: T) -> Self {
    StalenessChecker { timestamps }
  }

  pub fn timestamps(&self) -> &T {
    &self.timestamps
  }

  /// Decide whether `sources` must be rebuilt against `output`.
  ///
  /// Every source is checked for existence even when no output exists, so a
  /// vanished source is reported instead of being handed to the toolchain.
  /// `marker` is the refresh marker's modification time, if it exists.
  pub fn is_stale(
    &self,
    sources: &SourceSet,
    output: OutputStamp,
    marker: Option<SystemTime>,
  ) -> Result<bool, StalenessError> {
    let mut newest: Option<(PathBuf, SystemTime)> = None;

    for path in sources.resolved() {
      let modified = self
        .timestamps
        .modified(&path)
        .map_err(|source| StalenessError::Stat {
          path: path.clone(),
          source,
        })?
        .ok_or_else(|| StalenessError::MissingSource(path.clone()))?;

      if newest.as_ref().is_none_or(|(_, t)| modified > *t) {
        newest = Some((path, modified));
      }
    }

    let OutputStamp::Built(built) = output else {
      debug!("no prior artifact, build is stale");
      return Ok(true);
    };

    if let Some((path, modified)) = newest
      && modified > built
    {
      debug!(source = %path.display(), "source is newer than artifact");
      return Ok(true);
    }

    if let Some(marker) = marker
      && marker > built
    {
      debug!("refresh marker is newer than artifact");
      return Ok(true);
    }

    Ok(false)
  }
}
