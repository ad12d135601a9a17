//! nFPM package manifests and invocation
//!
//! The manifest is written as JSON. JSON is a subset of YAML, so nFPM reads it
//! directly and no YAML emitter is needed.

use crate::core::error::{PackageError, ReleaseResult, ResultExt};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Top-level nFPM configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NfpmConfig {
  pub name: String,
  pub arch: String,
  pub platform: String,
  pub version: String,
  pub release: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub maintainer: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub homepage: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub license: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub description: String,
  pub contents: Vec<ContentEntry>,
  #[serde(skip_serializing_if = "Overrides::is_empty")]
  pub overrides: Overrides,
}

/// One file installed by the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
  pub src: String,
  pub dst: String,
  pub file_info: FileInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
  pub mode: String,
}

impl ContentEntry {
  pub fn new(src: impl Into<String>, dst: impl Into<String>, mode: &str) -> Self {
    Self {
      src: src.into(),
      dst: dst.into(),
      file_info: FileInfo { mode: mode.to_string() },
    }
  }
}

/// Per-packager dependency overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
  #[serde(skip_serializing_if = "PackagerOverride::is_empty")]
  pub deb: PackagerOverride,
  #[serde(skip_serializing_if = "PackagerOverride::is_empty")]
  pub rpm: PackagerOverride,
}

impl Overrides {
  pub fn is_empty(&self) -> bool {
    self.deb.is_empty() && self.rpm.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackagerOverride {
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub depends: Vec<String>,
}

impl PackagerOverride {
  pub fn is_empty(&self) -> bool {
    self.depends.is_empty()
  }
}

/// Write `config` to `destination`, creating parent directories
pub fn write_config(config: &NfpmConfig, destination: &Path) -> ReleaseResult<()> {
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut content = serde_json::to_string_pretty(config)?;
  content.push('\n');
  fs::write(destination, content).with_context(|| format!("Failed to write {}", destination.display()))?;
  Ok(())
}

/// Run `nfpm package` once per format, collecting every failure
pub fn run_nfpm(nfpm_binary: &str, config_path: &Path, outdir: &Path, formats: &[String]) -> Result<(), PackageError> {
  let mut failures = Vec::new();

  for format in formats {
    let mut cmd = Command::new(nfpm_binary);
    cmd
      .arg("package")
      .args(["--packager", format.as_str()])
      .arg("-f")
      .arg(config_path)
      .arg("-t")
      .arg(outdir);

    println!(
      "→ {} package --packager {} -f {} -t {}",
      nfpm_binary,
      format,
      config_path.display(),
      outdir.display()
    );

    match cmd.status() {
      Ok(status) if status.success() => {}
      Ok(status) => {
        let code = status.code().unwrap_or(1);
        eprintln!("nfpm failed for format '{}' (exit {})", format, code);
        failures.push((format.clone(), format!("exit {}", code)));
      }
      Err(e) => {
        eprintln!("nfpm could not be started for format '{}': {}", format, e);
        failures.push((format.clone(), e.to_string()));
      }
    }
  }

  if failures.is_empty() {
    Ok(())
  } else {
    Err(PackageError::ToolFailed { failures })
  }
}
