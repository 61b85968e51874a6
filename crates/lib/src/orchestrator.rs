//! Target resolution and sequencing.
//!
//! ```text
//! all:      Idle -> Checking -> Building -> Idle
//!                           \-> UpToDate -> Idle
//! clean:    Idle -> Cleaning -> Idle
//! .refresh: Idle -> Idle (marker touched)
//! ```
//!
//! Each call to [`Orchestrator::run`] resolves one target to completion and
//! invokes the toolchain at most once. Concurrent orchestrators in the same
//! working directory are not supported.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Instant, SystemTime};

use filetime::{FileTime, set_file_mtime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::ArtifactPattern;
use crate::cleanup::CleanupHandler;
use crate::config::{BuildConfig, ConfigError};
use crate::invoker::BuildInvoker;
use crate::marker::BuildMarker;
use crate::source::SourceSet;
use crate::staleness::{StalenessChecker, StalenessError, Timestamps};
use crate::toolchain::{BuildError, Toolchain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  All,
  Clean,
  #[serde(rename = ".refresh")]
  Refresh,
}

impl Target {
  pub fn as_str(&self) -> &'static str {
    match self {
      Target::All => "all",
      Target::Clean => "clean",
      Target::Refresh => ".refresh",
    }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Target {
  type Err = RunError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "all" => Ok(Target::All),
      "clean" => Ok(Target::Clean),
      ".refresh" | "refresh" => Ok(Target::Refresh),
      other => Err(RunError::UnknownTarget(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  Idle,
  Checking,
  Building,
  UpToDate,
  Cleaning,
}

#[derive(Debug, Error)]
pub enum RunError {
  #[error("unknown target `{0}` (expected all, clean or .refresh)")]
  UnknownTarget(String),

  #[error("configuration error")]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Staleness(#[from] StalenessError),

  #[error("build failed")]
  Build(#[from] BuildError),

  #[error("failed to touch refresh marker {path}")]
  Marker {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to inspect artifacts")]
  Io(#[from] io::Error),
}

/// What a target resolution did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
  Built { artifacts: Vec<PathBuf> },
  UpToDate,
  WouldBuild,
  Cleaned { removed: usize },
  Refreshed { marker: PathBuf },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub target: Target,
  pub outcome: Outcome,
  pub duration_ms: u64,
}

pub struct Orchestrator<T> {
  root: PathBuf,
  sources: Vec<PathBuf>,
  checker: StalenessChecker,
  invoker: BuildInvoker<T>,
  cleanup: CleanupHandler,
  marker: BuildMarker,
  state: State,
}

impl<T: Toolchain> Orchestrator<T> {
  /// Wire the components for working directory `root`.
  ///
  /// Only the artifact pattern is validated here; the source set is validated
  /// when `all` runs so that `clean` and `.refresh` work without one.
  pub fn new(root: impl Into<PathBuf>, config: &BuildConfig, toolchain: T) -> Result<Self, ConfigError> {
    let root = root.into();
    let artifacts = ArtifactPattern::new(&root, &config.artifact)?.excluding(&config.sources);

    Ok(Orchestrator {
      sources: config.sources.clone(),
      checker: StalenessChecker::default(),
      invoker: BuildInvoker::new(toolchain, artifacts.clone()),
      cleanup: CleanupHandler::new(artifacts),
      marker: BuildMarker::new(&root),
      state: State::Idle,
      root,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn state(&self) -> State {
    self.state
  }

  pub fn invoker(&self) -> &BuildInvoker<T> {
    &self.invoker
  }

  /// Resolve one target. The state is back to `Idle` when this returns,
  /// whether or not it succeeded.
  pub async fn run(&mut self, target: Target) -> Result<RunReport, RunError> {
    let start = Instant::now();
    info!(target = %target, dir = %self.root.display(), "running target");

    let outcome = match target {
      Target::All => self.run_all().await,
      Target::Clean => Ok(self.run_clean()),
      Target::Refresh => self.run_refresh(),
    };
    self.transition(State::Idle);

    Ok(RunReport {
      target,
      outcome: outcome?,
      duration_ms: start.elapsed().as_millis() as u64,
    })
  }

  /// Run the staleness check for `all` without building or rolling back.
  pub fn plan(&mut self) -> Result<RunReport, RunError> {
    let start = Instant::now();
    self.transition(State::Checking);
    let checked = self.check(false);
    let outcome = match checked {
      Ok((_, true)) => Ok(Outcome::WouldBuild),
      Ok((_, false)) => {
        self.transition(State::UpToDate);
        Ok(Outcome::UpToDate)
      }
      Err(e) => Err(e),
    };
    self.transition(State::Idle);

    Ok(RunReport {
      target: Target::All,
      outcome: outcome?,
      duration_ms: start.elapsed().as_millis() as u64,
    })
  }

  async fn run_all(&mut self) -> Result<Outcome, RunError> {
    self.transition(State::Checking);
    let (sources, stale) = self.check(true)?;

    if !stale {
      self.transition(State::UpToDate);
      info!("nothing to do");
      return Ok(Outcome::UpToDate);
    }

    self.transition(State::Building);
    info!(sources = sources.len(), "rebuilding");
    let artifacts = self.invoker.build(&sources).await?;
    self.settle(&artifacts)?;

    Ok(Outcome::Built { artifacts })
  }

  fn run_clean(&mut self) -> Outcome {
    self.transition(State::Cleaning);
    let removed = self.cleanup.clean();
    Outcome::Cleaned { removed }
  }

  fn run_refresh(&mut self) -> Result<Outcome, RunError> {
    let newest = self.invoker.artifacts().newest(self.checker.timestamps())?;
    self.marker.touch(newest).map_err(|source| RunError::Marker {
      path: self.marker.path().to_path_buf(),
      source,
    })?;
    info!(marker = %self.marker.path().display(), "refresh marker updated");
    Ok(Outcome::Refreshed {
      marker: self.marker.path().to_path_buf(),
    })
  }

  /// Validate the source set and decide staleness. With `recover`, leftovers
  /// of an interrupted build are rolled back first; without it they count as
  /// stale.
  fn check(&self, recover: bool) -> Result<(SourceSet, bool), RunError> {
    let sources = SourceSet::new(&self.root, self.sources.clone())?;

    if recover {
      self.invoker.recover()?;
    } else if self.invoker.journal_path().exists() {
      debug!("interrupted build pending rollback");
      return Ok((sources, true));
    }

    let timestamps = self.checker.timestamps();
    let output = self.invoker.artifacts().output_stamp(timestamps)?;
    let marker = self.marker.modified(timestamps)?;
    let stale = self.checker.is_stale(&sources, output, marker)?;
    Ok((sources, stale))
  }

  /// Raise artifact timestamps to the refresh marker's so a fresh build is
  /// never considered older than the refresh that requested it.
  fn settle(&self, artifacts: &[PathBuf]) -> Result<(), RunError> {
    let timestamps = self.checker.timestamps();
    let Some(marker) = self.marker.modified(timestamps)? else {
      return Ok(());
    };
    for path in artifacts {
      let modified = timestamps.modified(path)?.unwrap_or(SystemTime::UNIX_EPOCH);
      if modified < marker {
        debug!(artifact = %path.display(), "raising artifact timestamp to refresh marker");
        set_file_mtime(path, FileTime::from_system_time(marker))?;
      }
    }
    Ok(())
  }

  fn transition(&mut self, next: State) {
    if self.state != next {
      debug!(from = ?self.state, to = ?next, "state transition");
      self.state = next;
    }
  }
}
