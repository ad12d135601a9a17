//! `package` command: build Linux packages with nFPM

use crate::core::error::ReleaseResult;
use crate::package::{self, PackageOptions};

/// Run the package command
pub fn run_package(options: PackageOptions) -> ReleaseResult<()> {
  let plan = package::package(&options)?;
  println!(
    "📦 Built {} package(s) for {} {} in {}",
    plan.formats.len(),
    plan.config.name,
    plan.config.version,
    plan.outdir.display()
  );
  Ok(())
}
