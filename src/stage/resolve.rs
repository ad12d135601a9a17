//! Artefact path resolution
//!
//! A rendered artefact pattern is either a literal path or a glob. Literal
//! paths resolve when they name an existing regular file. Globs enumerate every
//! regular file under a search root and pick the newest one, so build-script
//! directories keyed by a hash (`target/<triple>/release/build/<hash>/out`)
//! still resolve to a single, deterministic file.
//!
//! Absolute-path detection never consults the host OS: `/opt/x`, `C:\x`,
//! `C:/x` and `\\server\share\x` are all recognised on every platform, which
//! lets one configuration serve Linux, macOS and Windows runners.

use crate::core::error::StageError;
use crate::utils::portable_path;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Characters that turn a pattern into a glob
const WILDCARDS: [char; 4] = ['*', '?', '[', ']'];

/// Return true when `pattern` contains any glob wildcard
pub fn contains_wildcard(pattern: &str) -> bool {
  pattern.contains(WILDCARDS)
}

/// How a path string is anchored, independent of the host platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathAnchor {
  /// No anchor; resolved against the workspace
  Relative,
  /// POSIX root (`/`)
  PosixRoot,
  /// Windows drive root, normalised to `X:/`
  Drive(char),
  /// Windows UNC share root, normalised to `//server/share/`
  Unc { server: String, share: String },
}

/// A path string split into its anchor and the segments below it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
  pub anchor: PathAnchor,
  pub segments: Vec<String>,
}

impl ParsedPath {
  /// Parse `text` into anchor and remainder segments
  ///
  /// Segments are split on both `/` and `\` for Windows-anchored paths, and on
  /// `/` only otherwise (a backslash is a legal POSIX file name character).
  pub fn parse(text: &str) -> Self {
    let bytes = text.as_bytes();

    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && is_windows_separator(bytes[2]) {
      return Self {
        anchor: PathAnchor::Drive(bytes[0].to_ascii_uppercase() as char),
        segments: split_segments(&text[3..], true),
      };
    }

    if let Some(rest) = text.strip_prefix("\\\\").or_else(|| text.strip_prefix("//")) {
      let mut parts = split_segments(rest, true).into_iter();
      if let (Some(server), Some(share)) = (parts.next(), parts.next()) {
        return Self {
          anchor: PathAnchor::Unc { server, share },
          segments: parts.collect(),
        };
      }
    }

    if let Some(rest) = text.strip_prefix('/') {
      return Self {
        anchor: PathAnchor::PosixRoot,
        segments: split_segments(rest, false),
      };
    }

    Self {
      anchor: PathAnchor::Relative,
      segments: split_segments(text, false),
    }
  }

  pub fn is_absolute(&self) -> bool {
    self.anchor != PathAnchor::Relative
  }

  /// Root directory text for an anchored path
  pub fn root(&self) -> Option<String> {
    match &self.anchor {
      PathAnchor::Relative => None,
      PathAnchor::PosixRoot => Some("/".to_string()),
      PathAnchor::Drive(letter) => Some(format!("{}:/", letter)),
      PathAnchor::Unc { server, share } => Some(format!("//{}/{}/", server, share)),
    }
  }
}

fn is_windows_separator(byte: u8) -> bool {
  byte == b'\\' || byte == b'/'
}

fn split_segments(text: &str, windows: bool) -> Vec<String> {
  text
    .split(|c: char| c == '/' || (windows && c == '\\'))
    .filter(|segment| !segment.is_empty())
    .map(str::to_string)
    .collect()
}

/// Split an absolute pattern into its filesystem root and relative glob
///
/// A pattern that names only a root matches every direct child (`*`).
pub fn glob_root_and_pattern(text: &str) -> Result<(String, String), StageError> {
  let parsed = ParsedPath::parse(text);
  let root = parsed
    .root()
    .ok_or_else(|| StageError::new(format!("Expected absolute path, received '{}'", text)))?;
  let pattern = if parsed.segments.is_empty() {
    "*".to_string()
  } else {
    parsed.segments.join("/")
  };
  Ok((root, pattern))
}

/// Resolve `pattern` to a single existing file
///
/// Returns `Ok(None)` when nothing matches. Errors are reserved for patterns
/// that cannot be interpreted at all.
pub fn resolve(workspace: &Path, pattern: &str) -> Result<Option<PathBuf>, StageError> {
  if !contains_wildcard(pattern) {
    let parsed = ParsedPath::parse(pattern);
    let candidate = if parsed.is_absolute() {
      PathBuf::from(pattern)
    } else {
      workspace.join(pattern)
    };
    log::debug!("Checking literal artefact path {}", candidate.display());
    return Ok(candidate.is_file().then_some(candidate));
  }

  let (root, sub_pattern) = if ParsedPath::parse(pattern).is_absolute() {
    glob_root_and_pattern(pattern)?
  } else {
    (portable_path(workspace), pattern.to_string())
  };

  let candidates = glob_files(&root, &sub_pattern)?;
  Ok(newest(candidates))
}

/// Enumerate regular files under `root` matching `sub_pattern`
fn glob_files(root: &str, sub_pattern: &str) -> Result<Vec<PathBuf>, StageError> {
  let root = root.trim_end_matches('/');
  let full_pattern = if root.is_empty() {
    format!("/{}", sub_pattern)
  } else {
    format!("{}/{}", Pattern::escape(root), sub_pattern)
  };

  let options = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
  };
  let entries = glob::glob_with(&full_pattern, options)
    .map_err(|e| StageError::new(format!("Invalid glob pattern '{}': {}", sub_pattern, e)))?;

  let mut files = Vec::new();
  for entry in entries {
    match entry {
      Ok(path) if path.is_file() => {
        log::debug!("Glob candidate {}", path.display());
        files.push(path);
      }
      Ok(_) => {}
      Err(e) => log::debug!("Skipping unreadable glob entry: {}", e),
    }
  }
  Ok(files)
}

/// Pick the newest file, breaking mtime ties by the greatest portable path
fn newest(candidates: Vec<PathBuf>) -> Option<PathBuf> {
  candidates
    .into_iter()
    .map(|path| (mtime_key(&path), path))
    .max_by(|(left, _), (right, _)| left.cmp(right))
    .map(|(_, path)| path)
}

fn mtime_key(path: &Path) -> (SystemTime, String) {
  let modified = path
    .metadata()
    .and_then(|meta| meta.modified())
    .unwrap_or(SystemTime::UNIX_EPOCH);
  (modified, portable_path(path))
}
