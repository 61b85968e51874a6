//! Transactional build execution.
//!
//! A build never leaves a half-written artifact that could pass for an
//! up-to-date one:
//!
//! 1. Existing artifacts are copied into a backup directory with their
//!    timestamps, then a journal is written. The originals stay in place so
//!    the toolchain can still read or link against them.
//! 2. The toolchain runs.
//! 3. On success the journal and backup are dropped. Files the toolchain did
//!    not touch are left as they were. On failure every file matching the
//!    artifact pattern is removed and the backup is renamed back, so the prior
//!    artifacts are restored bit-for-bit.
//!
//! If the process dies during step 2 the journal survives and
//! [`BuildInvoker::recover`] performs the rollback on the next run. A backup
//! directory without a journal is an incomplete copy and is discarded.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use filetime::{FileTime, set_file_mtime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifact::ArtifactPattern;
use crate::consts::{BACKUP_DIRNAME, JOURNAL_FILENAME};
use crate::source::SourceSet;
use crate::toolchain::{BuildError, Toolchain};

/// Contents of the in-progress journal.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildJournal {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub sources: Vec<PathBuf>,
}

/// Artifacts present before the toolchain ran, keyed by path.
type Snapshot = HashMap<PathBuf, Option<SystemTime>>;

pub struct BuildInvoker<T> {
  toolchain: T,
  artifacts: ArtifactPattern,
}

impl<T: Toolchain> BuildInvoker<T> {
  pub fn new(toolchain: T, artifacts: ArtifactPattern) -> Self {
    BuildInvoker { toolchain, artifacts }
  }

  pub fn toolchain(&self) -> &T {
    &self.toolchain
  }

  pub fn artifacts(&self) -> &ArtifactPattern {
    &self.artifacts
  }

  pub fn journal_path(&self) -> PathBuf {
    self.artifacts.root().join(JOURNAL_FILENAME)
  }

  pub fn backup_dir(&self) -> PathBuf {
    self.artifacts.root().join(BACKUP_DIRNAME)
  }

  /// Read the journal of an interrupted build. `None` if there is none or it
  /// cannot be parsed.
  pub fn read_journal(&self) -> Option<BuildJournal> {
    let content = std::fs::read_to_string(self.journal_path()).ok()?;
    match serde_json::from_str(&content) {
      Ok(journal) => Some(journal),
      Err(e) => {
        debug!(error = %e, "unreadable build journal");
        None
      }
    }
  }

  /// Roll back a build interrupted in a previous run.
  ///
  /// Returns `true` if leftovers of an interrupted build were found.
  pub fn recover(&self) -> Result<bool, BuildError> {
    if !self.journal_path().exists() {
      if !self.backup_dir().exists() {
        return Ok(false);
      }
      debug!(backup = %self.backup_dir().display(), "discarding incomplete backup");
      remove_dir_if_exists(&self.backup_dir())?;
      return Ok(true);
    }

    match self.read_journal() {
      Some(journal) => warn!(
        pid = journal.pid,
        started_at_unix = journal.started_at_unix,
        sources = journal.sources.len(),
        "previous build was interrupted, discarding its output"
      ),
      None => warn!(
        journal = %self.journal_path().display(),
        "previous build was interrupted, discarding its output"
      ),
    }
    self.rollback()?;
    Ok(true)
  }

  /// Run the toolchain and return the artifacts it wrote or rewrote.
  pub async fn build(&self, sources: &SourceSet) -> Result<Vec<PathBuf>, BuildError> {
    let before = match self.begin(sources) {
      Ok(before) => before,
      Err(err) => {
        self.abandon(&err);
        return Err(err);
      }
    };

    let outcome = self.toolchain.compile(sources).await.and_then(|_| self.collect(&before));

    match outcome {
      Ok(produced) => {
        self.commit()?;
        info!(artifacts = produced.len(), "build succeeded");
        Ok(produced)
      }
      Err(err) => {
        self.rollback_after(&err);
        Err(err)
      }
    }
  }

  fn begin(&self, sources: &SourceSet) -> Result<Snapshot, BuildError> {
    let backup = self.backup_dir();
    remove_dir_if_exists(&backup)?;

    let mut before = Snapshot::new();
    let previous = self.artifacts.find()?;
    if !previous.is_empty() {
      std::fs::create_dir_all(&backup)?;
    }
    for path in previous {
      let Some(name) = path.file_name() else {
        continue;
      };
      debug!(artifact = %path.display(), "backing up previous artifact");
      let metadata = std::fs::metadata(&path)?;
      let copy = backup.join(name);
      std::fs::copy(&path, &copy)?;
      set_file_mtime(&copy, FileTime::from_last_modification_time(&metadata))?;
      before.insert(path, metadata.modified().ok());
    }

    let journal = BuildJournal {
      version: 1,
      pid: std::process::id(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
      sources: sources.paths().to_vec(),
    };
    let content = serde_json::to_string_pretty(&journal).map_err(io::Error::other)?;
    std::fs::write(self.journal_path(), content)?;
    Ok(before)
  }

  /// Matching files that are new or were rewritten since `before`.
  fn collect(&self, before: &Snapshot) -> Result<Vec<PathBuf>, BuildError> {
    let backup = self.backup_dir();
    let mut produced = Vec::new();
    for path in self.artifacts.find()? {
      let modified = std::fs::metadata(&path)?.modified().ok();
      let untouched = match (before.get(&path), path.file_name()) {
        (Some(previous), Some(name)) if *previous == modified => same_contents(&path, &backup.join(name))?,
        _ => false,
      };
      if untouched {
        debug!(artifact = %path.display(), "left untouched by toolchain");
      } else {
        produced.push(path);
      }
    }
    if produced.is_empty() {
      return Err(BuildError::NoArtifact {
        pattern: self.artifacts.as_str().to_string(),
      });
    }
    Ok(produced)
  }

  fn commit(&self) -> Result<(), BuildError> {
    remove_file_if_exists(&self.journal_path())?;
    remove_dir_if_exists(&self.backup_dir())?;
    Ok(())
  }

  /// Undo a `begin` that did not complete. The originals were never moved,
  /// so only the copies and the journal go.
  fn abandon(&self, cause: &BuildError) {
    warn!(error = %cause, "could not prepare build");
    if let Err(e) = remove_file_if_exists(&self.journal_path()) {
      warn!(error = %e, "could not remove build journal");
    }
    if let Err(e) = remove_dir_if_exists(&self.backup_dir()) {
      warn!(error = %e, "could not remove backup");
    }
  }

  fn rollback_after(&self, cause: &BuildError) {
    warn!(error = %cause, "build failed, restoring previous state");
    if let Err(e) = self.rollback() {
      warn!(error = %e, "rollback incomplete");
    }
  }

  fn rollback(&self) -> Result<(), BuildError> {
    for path in self.artifacts.find()? {
      debug!(artifact = %path.display(), "removing partial artifact");
      remove_file_if_exists(&path)?;
    }

    let backup = self.backup_dir();
    if backup.is_dir() {
      for entry in std::fs::read_dir(&backup)? {
        let entry = entry?;
        let target = self.artifacts.root().join(entry.file_name());
        debug!(artifact = %target.display(), "restoring previous artifact");
        std::fs::rename(entry.path(), target)?;
      }
      remove_dir_if_exists(&backup)?;
    }

    remove_file_if_exists(&self.journal_path())?;
    Ok(())
  }
}

fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
  if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
    return Ok(false);
  }
  Ok(std::fs::read(a)? == std::fs::read(b)?)
}

pub(crate) fn remove_file_if_exists(path: &Path) -> io::Result<()> {
  match std::fs::remove_file(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}

pub(crate) fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
  match std::fs::remove_dir_all(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}
