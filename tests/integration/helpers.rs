//! Test helpers for integration tests

use anyhow::{Context, Result};
use release_stage::stage::output::{self, OutputValue};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Environment variables the binary reads; cleared so the host CI cannot leak in
const GITHUB_ENV: [&str; 7] = [
  "GITHUB_WORKSPACE",
  "GITHUB_OUTPUT",
  "GITHUB_EVENT_NAME",
  "GITHUB_EVENT_PATH",
  "CARGO_TOML_PATH",
  "INPUT_DRY_RUN",
  "ARTEFACT_MAP",
];

/// A scratch workspace with an output file next to it
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  pub output_file: PathBuf,
}

impl TestWorkspace {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("workspace");
    std::fs::create_dir_all(&path)?;
    let output_file = root.path().join("github").join("output");
    Ok(Self {
      _root: root,
      path,
      output_file,
    })
  }

  /// Write `content` to `rel`, creating parent directories
  pub fn write_file(&self, rel: &str, content: &str) -> Result<PathBuf> {
    let file = self.path.join(rel);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))?;
    Ok(file)
  }

  /// Set the modification time of `rel` to `secs` after the epoch
  pub fn set_mtime(&self, rel: &str, secs: u64) -> Result<()> {
    let file = File::options().write(true).open(self.path.join(rel))?;
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))?;
    Ok(())
  }

  /// Write a staging config with the given artefact tables for target `linux`
  pub fn write_config(&self, artefacts: &str) -> Result<PathBuf> {
    let content = format!(
      r#"[common]
bin_name = "tool"

[targets.linux]
platform = "linux"
arch = "amd64"
target = "x86_64-unknown-linux-gnu"

{}
"#,
      artefacts
    );
    self.write_file("release-staging.toml", &content)
  }

  pub fn staging_dir(&self) -> PathBuf {
    self.path.join("dist").join("tool_linux_amd64")
  }

  pub fn file_exists(&self, rel: &str) -> bool {
    self.path.join(rel).exists()
  }

  pub fn read_file(&self, rel: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(rel))?)
  }

  /// Raw output file content, empty when nothing was written
  pub fn output_content(&self) -> Result<String> {
    if !self.output_file.exists() {
      return Ok(String::new());
    }
    Ok(std::fs::read_to_string(&self.output_file)?)
  }

  /// Parsed output records
  pub fn outputs(&self) -> Result<Vec<(String, OutputValue)>> {
    Ok(output::parse(&self.output_content()?)?)
  }

  /// Scalar output value for `key`
  pub fn output(&self, key: &str) -> Result<String> {
    match self.outputs()?.into_iter().find(|(k, _)| k == key) {
      Some((_, OutputValue::Scalar(value))) => Ok(value),
      Some((_, other)) => anyhow::bail!("output {} is not a scalar: {:?}", key, other),
      None => anyhow::bail!("output {} not written", key),
    }
  }

  /// Run `release-stage stage` against this workspace
  pub fn stage(&self, config: &Path) -> Result<Output> {
    run_release_stage(
      &self.path,
      &[
        "stage",
        config.to_str().context("non-UTF-8 config path")?,
        "linux",
        "--workspace",
        self.path.to_str().context("non-UTF-8 workspace path")?,
        "--github-output",
        self.output_file.to_str().context("non-UTF-8 output path")?,
      ],
    )
  }
}

/// Run the release-stage binary, returning its output whatever the exit status
pub fn run_release_stage(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-stage");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).args(args);
  for var in GITHUB_ENV {
    cmd.env_remove(var);
  }
  cmd.output().context("Failed to run release-stage")
}

/// Like [`run_release_stage`] but fails on a nonzero exit
pub fn run_release_stage_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_release_stage(cwd, args)?;
  if !output.status.success() {
    anyhow::bail!(
      "release-stage command failed: release-stage {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(output)
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
