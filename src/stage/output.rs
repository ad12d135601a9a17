//! Workflow output records
//!
//! Values are appended to a line-oriented file in the format GitHub Actions
//! reads from `$GITHUB_OUTPUT`:
//!
//! ```text
//! scalar=percent%25escaped%0Avalue
//! lines<<gh_LINES_4f1c...
//! first
//! second
//! gh_LINES_4f1c...
//! ```
//!
//! The file is only ever appended to; earlier steps in the same job may have
//! already written their own records.

use crate::core::error::StageError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One output value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputValue {
  /// Single-line value, percent-escaped on write
  Scalar(String),
  /// Multi-line value, written as a delimited block
  Lines(Vec<String>),
}

impl From<String> for OutputValue {
  fn from(value: String) -> Self {
    OutputValue::Scalar(value)
  }
}

impl From<&str> for OutputValue {
  fn from(value: &str) -> Self {
    OutputValue::Scalar(value.to_string())
  }
}

impl From<Vec<String>> for OutputValue {
  fn from(value: Vec<String>) -> Self {
    OutputValue::Lines(value)
  }
}

/// Ordered key/value pairs, written in the order given
pub type OutputRecord = Vec<(String, OutputValue)>;

/// Destination for output records
pub trait OutputSink {
  fn emit(&mut self, record: &OutputRecord) -> Result<(), StageError>;
}

/// Appends records to a GitHub Actions output file
#[derive(Debug, Clone)]
pub struct GithubOutput {
  path: PathBuf,
}

impl GithubOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl OutputSink for GithubOutput {
  fn emit(&mut self, record: &OutputRecord) -> Result<(), StageError> {
    write_outputs(&self.path, record)
  }
}

/// Keeps every emitted record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
  pub records: Vec<OutputRecord>,
}

impl OutputSink for MemorySink {
  fn emit(&mut self, record: &OutputRecord) -> Result<(), StageError> {
    self.records.push(record.clone());
    Ok(())
  }
}

/// Percent-escape `%`, CR and LF, in that order
pub fn escape(value: &str) -> String {
  value.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Inverse of [`escape`]
pub fn unescape(value: &str) -> String {
  value.replace("%0A", "\n").replace("%0D", "\r").replace("%25", "%")
}

/// Fresh block delimiter for `key`
fn delimiter(key: &str) -> String {
  format!("gh_{}_{}", key.to_uppercase(), uuid::Uuid::new_v4().simple())
}

/// Render `record` in output-file syntax
pub fn encode(record: &OutputRecord) -> String {
  let mut encoded = String::new();
  for (key, value) in record {
    match value {
      OutputValue::Lines(lines) => {
        let delim = delimiter(key);
        encoded.push_str(&format!("{}<<{}\n", key, delim));
        encoded.push_str(&lines.join("\n"));
        encoded.push_str(&format!("\n{}\n", delim));
      }
      OutputValue::Scalar(scalar) => {
        encoded.push_str(&format!("{}={}\n", key, escape(scalar)));
      }
    }
  }
  encoded
}

/// Append `record` to the output file at `path`, creating parents as needed
pub fn write_outputs(path: &Path, record: &OutputRecord) -> Result<(), StageError> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(|e| StageError::io("create", parent, e))?;
  }

  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .map_err(|e| StageError::io("open", path, e))?;
  file
    .write_all(encode(record).as_bytes())
    .map_err(|e| StageError::io("write", path, e))?;

  log::debug!("Wrote {} output value(s) to {}", record.len(), path.display());
  Ok(())
}

/// Parse output-file text back into key/value pairs
///
/// Scalars are unescaped. Blocks are returned as [`OutputValue::Lines`].
pub fn parse(content: &str) -> Result<OutputRecord, StageError> {
  let mut record = Vec::new();
  let mut lines = content.lines();

  while let Some(line) = lines.next() {
    if line.is_empty() {
      continue;
    }
    if let Some((key, delim)) = block_header(line) {
      let mut body = Vec::new();
      loop {
        match lines.next() {
          Some(next) if next == delim => break,
          Some(next) => body.push(next.to_string()),
          None => return Err(StageError::new(format!("Unterminated output block for '{}'", key))),
        }
      }
      if body.len() == 1 && body[0].is_empty() {
        body.clear();
      }
      record.push((key.to_string(), OutputValue::Lines(body)));
    } else if let Some((key, value)) = line.split_once('=') {
      record.push((key.to_string(), OutputValue::Scalar(unescape(value))));
    } else {
      return Err(StageError::new(format!("Malformed output line: {}", line)));
    }
  }

  Ok(record)
}

fn block_header(line: &str) -> Option<(&str, &str)> {
  let (key, delim) = line.split_once("<<")?;
  if key.contains('=') {
    return None;
  }
  Some((key, delim))
}
