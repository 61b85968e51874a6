//! Implementation of the `all` target.
//!
//! Checks staleness and rebuilds the extension when any source, or the
//! refresh marker, is newer than the current artifact.

use anyhow::{Context, Result};

use extbuild_lib::Target;

use super::{Settings, orchestrator, runtime};
use crate::output::print_report;

/// Execute the `all` target, or only its staleness check with `dry_run`.
///
/// Fails on a bad configuration, a vanished source or a failed toolchain
/// run; the error carries the toolchain output.
pub fn cmd_all(settings: &Settings, dry_run: bool) -> Result<()> {
  let dir = settings.working_dir()?;
  let config = settings
    .load_config(&dir)
    .context("Failed to load build configuration")?;
  let mut orchestrator = orchestrator(&dir, &config).context("Invalid build configuration")?;

  let report = if dry_run {
    orchestrator.plan()?
  } else {
    runtime()?.block_on(orchestrator.run(Target::All))?
  };

  print_report(&report, settings.output)
}
