//! Artifact removal for the `clean` target.

use tracing::{debug, info, warn};

use crate::artifact::ArtifactPattern;
use crate::consts::{BACKUP_DIRNAME, JOURNAL_FILENAME};
use crate::invoker::{remove_dir_if_exists, remove_file_if_exists};

pub struct CleanupHandler {
  artifacts: ArtifactPattern,
}

impl CleanupHandler {
  pub fn new(artifacts: ArtifactPattern) -> Self {
    CleanupHandler { artifacts }
  }

  /// Remove every artifact and return how many files were deleted.
  ///
  /// Never fails: files that cannot be removed are logged and skipped. Also
  /// drops the leftovers of an interrupted build. The refresh marker and the
  /// declared sources are never touched.
  pub fn clean(&self) -> usize {
    let found = match self.artifacts.find() {
      Ok(found) => found,
      Err(e) => {
        warn!(dir = %self.artifacts.root().display(), error = %e, "failed to list artifacts");
        Vec::new()
      }
    };

    let mut removed = 0;
    for path in found {
      match std::fs::remove_file(&path) {
        Ok(()) => {
          debug!(artifact = %path.display(), "removed artifact");
          removed += 1;
        }
        Err(e) => warn!(artifact = %path.display(), error = %e, "failed to remove artifact"),
      }
    }

    let root = self.artifacts.root();
    if let Err(e) = remove_dir_if_exists(&root.join(BACKUP_DIRNAME)) {
      warn!(error = %e, "failed to remove build backup");
    }
    if let Err(e) = remove_file_if_exists(&root.join(JOURNAL_FILENAME)) {
      warn!(error = %e, "failed to remove build journal");
    }

    info!(removed, "clean complete");
    removed
  }
}
