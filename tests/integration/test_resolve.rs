//! Tests for artefact resolution through the library API

use crate::helpers::*;
use anyhow::Result;
use release_stage::core::config::{ArtefactDescriptor, StagingConfig};
use release_stage::stage::checksum::ChecksumAlgorithm;
use release_stage::stage::output::MemorySink;
use release_stage::stage::resolve;
use release_stage::utils::portable_path;

fn config(ws: &TestWorkspace, artefacts: Vec<ArtefactDescriptor>) -> StagingConfig {
  StagingConfig {
    workspace: ws.path.clone(),
    bin_name: "tool".to_string(),
    dist_dir: "dist".to_string(),
    checksum_algorithm: ChecksumAlgorithm::Sha256,
    artefacts,
    platform: "linux".to_string(),
    arch: "amd64".to_string(),
    target: "x86_64-unknown-linux-gnu".to_string(),
    bin_ext: String::new(),
    staging_dir_template: "{bin_name}_{platform}_{arch}".to_string(),
    target_key: None,
  }
}

#[test]
fn test_glob_selects_newest_build_output() -> Result<()> {
  let ws = TestWorkspace::new()?;
  for (hash, secs) in [("aaa", 1_000), ("bbb", 3_000), ("ccc", 2_000)] {
    let rel = format!("build/{}/out/tool.1", hash);
    ws.write_file(&rel, hash)?;
    ws.set_mtime(&rel, secs)?;
  }

  let resolved = resolve::resolve(&ws.path, "build/*/out/tool.1")?.expect("a match");
  assert_eq!(resolved, ws.path.join("build/bbb/out/tool.1"));
  Ok(())
}

#[test]
fn test_glob_tie_break_is_stable() -> Result<()> {
  let ws = TestWorkspace::new()?;
  for hash in ["m", "z", "a"] {
    let rel = format!("build/{}/out/tool.1", hash);
    ws.write_file(&rel, hash)?;
    ws.set_mtime(&rel, 5_000)?;
  }

  let first = resolve::resolve(&ws.path, "build/*/out/tool.1")?;
  for _ in 0..5 {
    assert_eq!(resolve::resolve(&ws.path, "build/*/out/tool.1")?, first);
  }
  assert_eq!(first, Some(ws.path.join("build/z/out/tool.1")));
  Ok(())
}

#[test]
fn test_absolute_glob_outside_workspace() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let other = tempfile::TempDir::new()?;
  let file = other.path().join("out").join("tool.1");
  std::fs::create_dir_all(file.parent().unwrap())?;
  std::fs::write(&file, "man")?;

  let pattern = format!("{}/*/tool.1", portable_path(other.path()));
  assert_eq!(resolve::resolve(&ws.path, &pattern)?, Some(file));
  Ok(())
}

#[test]
fn test_fallbacks_tried_in_order() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("second/tool", "second")?;
  ws.write_file("third/tool", "third")?;
  let artefact = ArtefactDescriptor::new("first/{bin_name}")
    .with_alternatives(["second/{bin_name}", "third/{bin_name}"])
    .with_output("binary_path");

  let mut sink = MemorySink::default();
  let result = release_stage::stage::stage(&config(&ws, vec![artefact]), &mut sink)?;
  let staged = &result.outputs["binary_path"];
  assert_eq!(std::fs::read_to_string(staged)?, "second");
  Ok(())
}

#[test]
fn test_optional_skip_recorded_on_result() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "x")?;
  let artefacts = vec![
    ArtefactDescriptor::new("{bin_name}.1").optional(),
    ArtefactDescriptor::new("LICENSE"),
  ];

  let mut sink = MemorySink::default();
  let result = release_stage::stage::stage(&config(&ws, artefacts), &mut sink)?;
  assert_eq!(result.skipped, vec!["{bin_name}.1"]);
  assert_eq!(result.staged_artefacts, vec![ws.staging_dir().join("LICENSE")]);
  assert_eq!(sink.records.len(), 1);
  Ok(())
}

#[test]
fn test_all_optional_missing_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let artefacts = vec![ArtefactDescriptor::new("nothing").optional()];

  let mut sink = MemorySink::default();
  let err = release_stage::stage::stage(&config(&ws, artefacts), &mut sink).unwrap_err();
  assert_eq!(err.message(), "No artefacts were staged.");
  assert!(sink.records.is_empty());
  Ok(())
}

#[test]
fn test_unknown_placeholder_fails_run() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let artefacts = vec![ArtefactDescriptor::new("{version}/tool")];

  let mut sink = MemorySink::default();
  let err = release_stage::stage::stage(&config(&ws, artefacts), &mut sink).unwrap_err();
  assert_eq!(err.message(), "Invalid template key 'version' in '{version}/tool'");
  Ok(())
}
