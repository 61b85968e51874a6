//! Implementation of the `refresh` target.

use anyhow::Result;

use extbuild_lib::Target;

use super::{Settings, runtime};
use crate::output::{print_report, print_warning};

/// Touch the refresh marker so the next `all` rebuilds.
///
/// Failing to touch the marker is reported as a warning, not an error.
pub fn cmd_refresh(settings: &Settings) -> Result<()> {
  let dir = settings.working_dir()?;
  let mut orchestrator = settings.lenient_orchestrator(&dir)?;

  match runtime()?.block_on(orchestrator.run(Target::Refresh)) {
    Ok(report) => print_report(&report, settings.output),
    Err(e) => {
      print_warning(&format!("{:#}", anyhow::Error::from(e)));
      Ok(())
    }
  }
}
