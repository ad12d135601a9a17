//! `release-modes` command: export the release workflow's mode flags

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::release_modes;
use crate::stage::output;
use std::path::PathBuf;

/// Run the release-modes command
pub fn run_release_modes(
  event_name: Option<String>,
  event_path: Option<PathBuf>,
  github_output: Option<PathBuf>,
) -> ReleaseResult<()> {
  let event_name = event_name.ok_or_else(|| ReleaseError::message("Missing environment variable 'GITHUB_EVENT_NAME'"))?;
  let event_path = event_path.ok_or_else(|| ReleaseError::message("Missing environment variable 'GITHUB_EVENT_PATH'"))?;
  let github_output = github_output.ok_or_else(|| ReleaseError::message("Missing environment variable 'GITHUB_OUTPUT'"))?;

  let event = release_modes::load_event(&event_path)?;
  let modes = release_modes::determine(&event_name, &event)?;
  output::write_outputs(&github_output, &modes.to_output_record())?;

  log::info!(
    "Release modes: dry_run={} should_publish={} should_upload_workflow_artifacts={}",
    modes.dry_run,
    modes.should_publish,
    modes.should_upload_workflow_artifacts
  );
  Ok(())
}
