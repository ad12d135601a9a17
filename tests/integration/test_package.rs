//! Tests for the `package` command

use crate::helpers::*;
use anyhow::Result;

fn project(ws: &TestWorkspace) -> Result<()> {
  ws.write_file(
    "Cargo.toml",
    "[package]\nname = \"tool\"\nversion = \"1.0.0\"\nlicense = \"MIT\"\nauthors = [\"Ada <ada@example.com>\"]\n",
  )?;
  ws.write_file("target/x86_64-unknown-linux-gnu/release/tool", "bin")?;
  ws.write_file("LICENSE", "MIT")?;
  ws.write_file("docs/tool.1", ".TH TOOL 1")?;
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_package_runs_nfpm_per_format() -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let ws = TestWorkspace::new()?;
  project(&ws)?;
  let fake = ws.write_file("fake-nfpm", "#!/bin/sh\necho \"$@\" >> \"$(dirname \"$0\")/nfpm.log\"\n")?;
  std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755))?;

  run_release_stage_ok(
    &ws.path,
    &[
      "package",
      "--bin-name",
      "tool",
      "--target",
      "x86_64-unknown-linux-gnu",
      "--version",
      "v1.0.0",
      "--formats",
      "deb",
      "rpm",
      "--man-path",
      "docs/tool.1",
      "--deb-depends",
      "libc6",
      "--nfpm-binary",
      fake.to_str().unwrap(),
    ],
  )?;

  let log = ws.read_file("nfpm.log")?;
  let calls: Vec<&str> = log.lines().collect();
  assert_eq!(calls.len(), 2);
  assert!(calls[0].starts_with("package --packager deb -f "));
  assert!(calls[1].starts_with("package --packager rpm -f "));

  let manifest: serde_json::Value = serde_json::from_str(&ws.read_file("dist/nfpm.yaml")?)?;
  assert_eq!(manifest["version"], "1.0.0");
  assert_eq!(manifest["arch"], "amd64");
  assert_eq!(manifest["maintainer"], "Ada <ada@example.com>");
  assert_eq!(manifest["overrides"]["rpm"]["depends"][0], "libc6");
  assert_eq!(manifest["contents"][2]["dst"], "/usr/share/man/man1/tool.1.gz");
  assert!(ws.file_exists("dist/.man/tool.1.gz"));
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_package_collects_tool_failures() -> Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let ws = TestWorkspace::new()?;
  project(&ws)?;
  let fake = ws.write_file("failing-nfpm", "#!/bin/sh\nexit 4\n")?;
  std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755))?;

  let output = run_release_stage(
    &ws.path,
    &[
      "package",
      "--bin-name",
      "tool",
      "--target",
      "x86_64-unknown-linux-gnu",
      "--version",
      "1.0.0",
      "--formats",
      "deb",
      "rpm",
      "--nfpm-binary",
      fake.to_str().unwrap(),
    ],
  )?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("deb failed with exit 4; rpm failed with exit 4"));
  Ok(())
}

#[test]
fn test_package_rejects_unsupported_target() -> Result<()> {
  let ws = TestWorkspace::new()?;
  project(&ws)?;

  let output = run_release_stage(
    &ws.path,
    &[
      "package",
      "--bin-name",
      "tool",
      "--target",
      "x86_64-apple-darwin",
      "--version",
      "1.0.0",
    ],
  )?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("unsupported target triple: x86_64-apple-darwin"));
  Ok(())
}
