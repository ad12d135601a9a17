//! `stage` command: copy one target's artefacts into its staging directory

use crate::core::config::StagingConfig;
use crate::core::error::{ReleaseError, ReleaseResult, StageError};
use crate::stage::{self, output::GithubOutput};
use crate::utils::display_relative;
use std::path::PathBuf;

/// Run the stage command
pub fn run_stage(
  config_file: PathBuf,
  target: String,
  workspace: Option<PathBuf>,
  github_output: Option<PathBuf>,
) -> ReleaseResult<()> {
  let github_output = github_output
    .filter(|path| !path.as_os_str().is_empty())
    .ok_or_else(|| {
      ReleaseError::with_help(
        "Missing environment variable 'GITHUB_OUTPUT'",
        "Pass --github-output or export GITHUB_OUTPUT.",
      )
    })?;
  let workspace = workspace
    .filter(|path| !path.as_os_str().is_empty())
    .ok_or_else(|| StageError::new("Environment variable 'GITHUB_WORKSPACE' is not set."))?;

  let config = StagingConfig::load(&config_file, &target, &workspace)?;
  let mut sink = GithubOutput::new(github_output);
  let result = stage::stage(&config, &mut sink)?;

  eprintln!(
    "Staged {} artefact(s) into '{}'.",
    result.staged_artefacts.len(),
    display_relative(&config.workspace, &result.staging_dir)
  );
  Ok(())
}
