//! The `.refresh` sentinel.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::{FileTime, set_file_mtime};
use tracing::debug;

use crate::consts::MARKER_FILENAME;
use crate::staleness::Timestamps;

/// Sentinel file whose timestamp marks the last forced rebuild point.
///
/// Created on first touch, never removed by cleanup.
#[derive(Debug, Clone)]
pub struct BuildMarker {
  path: PathBuf,
}

impl BuildMarker {
  pub fn new(root: &Path) -> Self {
    BuildMarker {
      path: root.join(MARKER_FILENAME),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn modified(&self, timestamps: &impl Timestamps) -> io::Result<Option<SystemTime>> {
    timestamps.modified(&self.path)
  }

  /// Create the marker if needed and set its timestamp.
  ///
  /// The timestamp is `now`, unless `newest_output` is not strictly earlier
  /// than `now`, in which case it is placed one second past `newest_output` so
  /// that the marker always compares as newer than the current artifacts.
  pub fn touch(&self, newest_output: Option<SystemTime>) -> io::Result<SystemTime> {
    let now = SystemTime::now();
    let stamp = match newest_output {
      Some(output) if output >= now => output + Duration::from_secs(1),
      _ => now,
    };

    OpenOptions::new().create(true).append(true).open(&self.path)?;
    set_file_mtime(&self.path, FileTime::from_system_time(stamp))?;

    debug!(path = %self.path.display(), "touched refresh marker");
    Ok(stamp)
  }
}
