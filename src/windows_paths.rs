//! Windows-form paths for the staged binary and licence
//!
//! Windows packaging steps (WiX, signing) want backslash paths. After staging,
//! the `artefact_map` output is read back and its `binary_path` and
//! `license_path` entries are re-exported in Windows form.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::stage::output::OutputRecord;
use serde_json::{Map, Value};

/// Artefact map entries re-exported by `windows-paths`
pub const WINDOWS_OUTPUT_KEYS: [&str; 2] = ["binary_path", "license_path"];

/// Render `text` the way Windows spells it
///
/// Both separators become `\`, repeated separators and `.` segments collapse,
/// and drive letters keep their case. `..` is left alone.
pub fn windows_path(text: &str) -> String {
  let unified = text.replace('/', "\\");
  let (anchor, rest) = split_anchor(&unified);
  let segments: Vec<&str> = rest
    .split('\\')
    .filter(|segment| !segment.is_empty() && *segment != ".")
    .collect();

  if anchor.is_empty() && segments.is_empty() {
    return ".".to_string();
  }
  format!("{}{}", anchor, segments.join("\\"))
}

/// Split off a UNC share, drive or root prefix from a backslash-only path
fn split_anchor(path: &str) -> (String, &str) {
  if let Some(rest) = path.strip_prefix("\\\\") {
    let mut parts = rest.splitn(3, '\\');
    if let (Some(server), Some(share)) = (parts.next(), parts.next())
      && !server.is_empty()
      && !share.is_empty()
    {
      return (format!("\\\\{}\\{}\\", server, share), parts.next().unwrap_or(""));
    }
  }

  let bytes = path.as_bytes();
  if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
    let (drive, rest) = path.split_at(2);
    return match rest.strip_prefix('\\') {
      Some(rest) => (format!("{}\\", drive), rest),
      None => (drive.to_string(), rest),
    };
  }

  match path.strip_prefix('\\') {
    Some(rest) => ("\\".to_string(), rest),
    None => (String::new(), path),
  }
}

/// Build the `binary_path`/`license_path` record from an `artefact_map` JSON object
pub fn normalise_artefact_map(artefact_map: &str) -> ReleaseResult<OutputRecord> {
  let mapping: Map<String, Value> = serde_json::from_str(artefact_map)
    .map_err(|e| ReleaseError::message(format!("Artefact map is not a JSON object: {}", e)))?;

  // every key is checked for presence before any value is checked
  for key in WINDOWS_OUTPUT_KEYS {
    if !mapping.contains_key(key) {
      return Err(ReleaseError::MissingOutput(format!("Missing artefact '{}'", key)));
    }
  }

  let mut record = OutputRecord::new();
  for key in WINDOWS_OUTPUT_KEYS {
    let path = match &mapping[key] {
      Value::String(path) if !path.is_empty() => path,
      Value::Null | Value::String(_) => {
        return Err(ReleaseError::MissingOutput(format!("{} output empty", key)));
      }
      other => {
        return Err(ReleaseError::MissingOutput(format!(
          "{} output is not a path: {}",
          key, other
        )));
      }
    };
    record.push((key.to_string(), windows_path(path).into()));
  }
  Ok(record)
}
