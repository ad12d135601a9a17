//! Utility functions for cross-platform path handling

use std::path::{Component, Path, PathBuf};

/// Convert a path to portable format (always forward slashes)
///
/// Output records and templates are consumed by CI steps on every runner OS,
/// so paths are rendered with forward slashes even on Windows.
pub fn portable_path(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Lexically normalise a path, folding `.` and `..` without touching the disk
///
/// `..` never climbs above the root or prefix of an absolute path.
pub fn normalize_lexically(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let popped = matches!(normalized.components().next_back(), Some(Component::Normal(_)));
        if popped {
          normalized.pop();
        } else if !normalized.has_root() {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Return true when `path` stays inside `base` after lexical normalisation
pub fn is_contained(base: &Path, path: &Path) -> bool {
  normalize_lexically(path).starts_with(normalize_lexically(base))
}

/// Render `path` relative to `base` when possible, otherwise unchanged
pub fn display_relative(base: &Path, path: &Path) -> String {
  match path.strip_prefix(base) {
    Ok(relative) => portable_path(relative),
    Err(_) => portable_path(path),
  }
}
