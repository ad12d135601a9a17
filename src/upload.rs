//! Release asset discovery and upload
//!
//! Staged artefacts for every target end up under one dist directory. This
//! module picks out the files worth publishing, gives each a release-unique
//! asset name and hands them to `gh release upload`.

use crate::core::error::{ReleaseError, ReleaseResult, UploadError};
use crate::utils::portable_path;
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Package extensions uploaded under their own file name
const PACKAGE_EXTENSIONS: [&str; 3] = ["deb", "rpm", "pkg"];

/// Extensions that always mark a file as an upload candidate
const CANDIDATE_EXTENSIONS: [&str; 4] = ["deb", "rpm", "pkg", "msi"];

/// One file bound for the release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
  pub path: PathBuf,
  pub asset_name: String,
  pub size: u64,
}

impl ReleaseAsset {
  /// `<path>#<asset name>` argument understood by `gh release upload`
  pub fn descriptor(&self) -> String {
    format!("{}#{}", portable_path(&self.path), self.asset_name)
  }
}

fn extension(path: &Path) -> Option<String> {
  path.extension().map(|ext| ext.to_string_lossy().to_string())
}

fn is_candidate(path: &Path, bin_name: &str) -> bool {
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  if name == bin_name || name == format!("{}.exe", bin_name) || name == format!("{}.1", bin_name) {
    return true;
  }
  if name.ends_with(".sha256") {
    return true;
  }
  extension(path).is_some_and(|ext| CANDIDATE_EXTENSIONS.contains(&ext.as_str()))
}

/// Asset name for `path`: packages keep their name, the rest gain the parent directory
pub fn asset_name(path: &Path) -> String {
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  let is_package = extension(path).is_some_and(|ext| PACKAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
  if is_package {
    return name;
  }
  let parent = path
    .parent()
    .and_then(|p| p.file_name())
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  format!("{}-{}", parent, name)
}

/// Find every publishable file under `dist_dir`, in path order
pub fn discover_assets(dist_dir: &Path, bin_name: &str) -> ReleaseResult<Vec<ReleaseAsset>> {
  if !dist_dir.exists() {
    return Err(
      UploadError::MissingDistDir {
        path: dist_dir.to_path_buf(),
      }
      .into(),
    );
  }

  let pattern = format!("{}/**/*", Pattern::escape(&portable_path(dist_dir)));
  let mut files: Vec<PathBuf> = glob::glob(&pattern)
    .map_err(|e| ReleaseError::message(format!("Invalid dist directory pattern: {}", e)))?
    .filter_map(Result::ok)
    .filter(|path| path.is_file())
    .collect();
  files.sort();

  let mut assets: Vec<ReleaseAsset> = Vec::new();
  for path in files {
    if !is_candidate(&path, bin_name) {
      continue;
    }
    let size = path.metadata()?.len();
    if size == 0 {
      return Err(UploadError::EmptyAsset { path }.into());
    }
    let name = asset_name(&path);
    if let Some(previous) = assets.iter().find(|asset| asset.asset_name == name) {
      return Err(
        UploadError::NameCollision {
          asset_name: name,
          first: previous.path.clone(),
          second: path,
        }
        .into(),
      );
    }
    log::debug!("Release asset {} -> {}", path.display(), name);
    assets.push(ReleaseAsset {
      path,
      asset_name: name,
      size,
    });
  }

  if assets.is_empty() {
    return Err(
      UploadError::NothingDiscovered {
        path: dist_dir.to_path_buf(),
      }
      .into(),
    );
  }
  Ok(assets)
}

/// Human-readable upload plan
pub fn render_summary(assets: &[ReleaseAsset]) -> String {
  let mut lines = vec!["Planned uploads:".to_string()];
  for asset in assets {
    lines.push(format!(
      "  - {} ({} bytes) -> {}",
      asset.asset_name,
      asset.size,
      asset.path.display()
    ));
  }
  lines.join("\n")
}

/// Upload each asset with `gh release upload --clobber`
///
/// In dry-run mode the commands are printed instead of run.
pub fn upload_assets(release_tag: &str, assets: &[ReleaseAsset], dry_run: bool) -> ReleaseResult<()> {
  for asset in assets {
    let descriptor = asset.descriptor();
    if dry_run {
      println!("[dry-run] gh release upload {} {} --clobber", release_tag, descriptor);
      continue;
    }

    let output = Command::new("gh")
      .args(["release", "upload", release_tag, descriptor.as_str(), "--clobber"])
      .output()
      .map_err(|e| {
        ReleaseError::with_help(
          format!("Failed to execute gh: {}", e),
          "Install the GitHub CLI and make sure it is on PATH.",
        )
      })?;

    if !output.status.success() {
      return Err(
        UploadError::CommandFailed {
          command: format!("gh release upload {} {} --clobber", release_tag, descriptor),
          stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into(),
      );
    }
    println!("✅ Uploaded {}", asset.asset_name);
  }
  Ok(())
}
