//! External toolchain invocation.
//!
//! The [`Toolchain`] trait is the seam between orchestration and the actual
//! compiler. [`CommandToolchain`] spawns a subprocess; tests substitute fakes.

use std::future::Future;
use std::io;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ToolchainConfig;
use crate::source::SourceSet;

/// Errors from a build attempt. Fatal for the current run; never retried.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The toolchain could not be started at all.
  #[error("failed to spawn toolchain `{program}`")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The toolchain exited unsuccessfully. `output` holds stdout then stderr.
  #[error("toolchain `{program}` failed with exit code {code:?}\n{output}")]
  Failed {
    program: String,
    code: Option<i32>,
    output: String,
  },

  /// The toolchain reported success but left nothing matching the artifact pattern.
  #[error("toolchain succeeded but produced no artifact matching `{pattern}`")]
  NoArtifact { pattern: String },

  #[error("io error")]
  Io(#[from] io::Error),
}

/// Captured output of a successful toolchain run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainOutput {
  pub stdout: String,
  pub stderr: String,
}

impl ToolchainOutput {
  /// Stdout followed by stderr, trimmed.
  pub fn combined(&self) -> String {
    let mut combined = String::new();
    for part in [self.stdout.trim_end(), self.stderr.trim_end()] {
      if part.is_empty() {
        continue;
      }
      if !combined.is_empty() {
        combined.push('\n');
      }
      combined.push_str(part);
    }
    combined
  }
}

/// Compiles a source set into artifacts inside `sources.root()`.
pub trait Toolchain {
  fn compile(&self, sources: &SourceSet) -> impl Future<Output = Result<ToolchainOutput, BuildError>>;
}

/// Runs a configured program as a subprocess in the working directory.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
  program: String,
  args: Vec<String>,
  append_sources: bool,
  echo: bool,
}

impl CommandToolchain {
  pub fn new(config: &ToolchainConfig) -> Self {
    CommandToolchain {
      program: config.program.clone(),
      args: config.args.clone(),
      append_sources: config.append_sources,
      echo: false,
    }
  }

  /// Echo the subprocess output to stderr once it exits.
  pub fn with_echo(mut self, echo: bool) -> Self {
    self.echo = echo;
    self
  }

  /// Arguments passed to the program for `sources`.
  pub fn arguments(&self, sources: &SourceSet) -> Vec<String> {
    let mut args = self.args.clone();
    if self.append_sources {
      args.extend(sources.paths().iter().map(|p| p.to_string_lossy().into_owned()));
    }
    args
  }
}

impl Toolchain for CommandToolchain {
  async fn compile(&self, sources: &SourceSet) -> Result<ToolchainOutput, BuildError> {
    let args = self.arguments(sources);
    info!(program = %self.program, args = ?args, "invoking toolchain");

    let mut command = Command::new(&self.program);
    command
      .args(&args)
      .current_dir(sources.root())
      .stdin(Stdio::null())
      .kill_on_drop(true);

    debug!(working_dir = %sources.root().display(), "spawning process");

    let output = command.output().await.map_err(|source| BuildError::Spawn {
      program: self.program.clone(),
      source,
    })?;

    let captured = ToolchainOutput {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if self.echo {
      let combined = captured.combined();
      if !combined.is_empty() {
        eprintln!("{}", combined);
      }
    }

    if !output.status.success() {
      if !captured.stderr.is_empty() {
        debug!(stderr = %captured.stderr, "toolchain stderr");
      }
      return Err(BuildError::Failed {
        program: self.program.clone(),
        code: output.status.code(),
        output: captured.combined(),
      });
    }

    if !captured.stdout.is_empty() {
      debug!(stdout = %captured.stdout.trim_end(), "toolchain output");
    }

    Ok(captured)
  }
}
