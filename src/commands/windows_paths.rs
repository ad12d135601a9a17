//! `windows-paths` command: re-export staged paths in Windows form

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::stage::output;
use crate::windows_paths;
use std::path::PathBuf;

/// Run the windows-paths command
pub fn run_windows_paths(artefact_map: Option<String>, github_output: Option<PathBuf>) -> ReleaseResult<()> {
  let artefact_map = artefact_map.ok_or_else(|| ReleaseError::MissingOutput("Missing env 'ARTEFACT_MAP'".to_string()))?;
  let record = windows_paths::normalise_artefact_map(&artefact_map)?;

  let github_output = github_output
    .filter(|path| !path.as_os_str().is_empty())
    .ok_or_else(|| {
      ReleaseError::with_help(
        "Missing environment variable 'GITHUB_OUTPUT'",
        "Pass --github-output or export GITHUB_OUTPUT.",
      )
    })?;
  output::write_outputs(&github_output, &record)?;

  log::info!("Wrote Windows paths for {} artefact(s)", record.len());
  Ok(())
}
