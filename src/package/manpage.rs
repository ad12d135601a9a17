//! Man page preparation for distribution packages

use crate::core::error::{PackageError, ReleaseResult, ResultExt};
use flate2::{Compression, GzBuilder};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Gzip `src` into `stage_dir`, returning the compressed path
///
/// Already-compressed pages are returned unchanged. The gzip header carries a
/// zero mtime so repeated builds produce identical archives.
pub fn gzip_manpage(src: &Path, stage_dir: &Path) -> ReleaseResult<PathBuf> {
  if src.extension().is_some_and(|ext| ext == "gz") {
    return Ok(src.to_path_buf());
  }

  let name = src
    .file_name()
    .ok_or_else(|| PackageError::MissingInput {
      what: "man page missing".to_string(),
      path: src.to_path_buf(),
    })?
    .to_string_lossy()
    .to_string();

  fs::create_dir_all(stage_dir)?;
  let dest = stage_dir.join(format!("{}.gz", name));

  let mut reader = File::open(src).with_context(|| format!("Failed to open man page {}", src.display()))?;
  let writer = File::create(&dest).with_context(|| format!("Failed to create {}", dest.display()))?;
  let mut encoder = GzBuilder::new()
    .filename(name.as_bytes())
    .mtime(0)
    .write(writer, Compression::best());
  io::copy(&mut reader, &mut encoder)?;
  encoder.finish()?;

  Ok(dest)
}

/// Man section from the last extension before `.gz`, else `default`
pub fn infer_section(path: &Path, default: &str) -> String {
  let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
  let name = name.strip_suffix(".gz").unwrap_or(&name);
  match name.rsplit_once('.') {
    Some((_, section)) => section.to_string(),
    None => default.to_string(),
  }
}
