//! `upload` command: publish staged artefacts to a GitHub release

use crate::core::error::ReleaseResult;
use crate::upload;
use std::path::PathBuf;

/// Run the upload command
pub fn run_upload(release_tag: String, bin_name: String, dist_dir: PathBuf, dry_run: bool) -> ReleaseResult<()> {
  let assets = upload::discover_assets(&dist_dir, &bin_name)?;
  if dry_run {
    println!("{}", upload::render_summary(&assets));
  }
  upload::upload_assets(&release_tag, &assets, dry_run)
}
