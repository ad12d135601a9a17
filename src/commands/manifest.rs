//! `manifest` command: print a `[package]` field

use crate::core::error::ReleaseResult;
use crate::manifest::{Manifest, ManifestField};
use std::io::Write;
use std::path::PathBuf;

/// Run the manifest command
///
/// The value is printed without a trailing newline so shells can capture it
/// directly.
pub fn run_manifest(field: ManifestField, manifest_path: PathBuf) -> ReleaseResult<()> {
  let manifest = Manifest::load(&manifest_path)?;
  let value = manifest.field(field)?;
  let mut stdout = std::io::stdout();
  write!(stdout, "{}", value)?;
  stdout.flush()?;
  Ok(())
}
