//! Implementation of the `clean` target.

use anyhow::Result;

use extbuild_lib::Target;

use super::{Settings, runtime};
use crate::output::print_report;

/// Remove every artifact in the working directory.
///
/// A broken config falls back to the default artifact pattern, so this only
/// fails when the working directory itself is unusable.
pub fn cmd_clean(settings: &Settings) -> Result<()> {
  let dir = settings.working_dir()?;
  let mut orchestrator = settings.lenient_orchestrator(&dir)?;

  let report = runtime()?.block_on(orchestrator.run(Target::Clean))?;
  print_report(&report, settings.output)
}
