//! Tests for the `stage` command

use crate::helpers::*;
use anyhow::Result;
use release_stage::stage::checksum::ChecksumAlgorithm;
use release_stage::stage::output::OutputValue;

#[test]
fn test_stage_single_licence() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "Copyright X")?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\n")?;

  let output = ws.stage(&config)?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(stderr(&output).contains("Staged 1 artefact(s) into 'dist/tool_linux_amd64'."));

  let digest = ChecksumAlgorithm::Sha256.digest_reader(&b"Copyright X"[..])?;
  assert_eq!(digest.len(), 64);
  assert_eq!(ws.read_file("dist/tool_linux_amd64/LICENSE")?, "Copyright X");
  assert_eq!(
    ws.read_file("dist/tool_linux_amd64/LICENSE.sha256")?,
    format!("{}  LICENSE\n", digest)
  );

  let staging = ws.staging_dir();
  assert_eq!(ws.output("artifact_dir")?, staging.to_string_lossy());
  assert_eq!(ws.output("dist_dir")?, ws.path.join("dist").to_string_lossy());
  assert_eq!(ws.output("staged_files")?, "LICENSE");
  assert_eq!(ws.output("artefact_map")?, "{}");
  assert_eq!(ws.output("checksum_map")?, format!("{{\"LICENSE\": \"{}\"}}", digest));

  let raw = ws.output_content()?;
  assert!(raw.contains("staged_files=LICENSE\n"));
  assert!(raw.contains(&format!("checksum_map={{\"LICENSE\": \"{}\"}}\n", digest)));
  Ok(())
}

#[test]
fn test_missing_required_leaves_output_untouched() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"missing.bin\"\n")?;
  std::fs::create_dir_all(ws.output_file.parent().unwrap())?;
  std::fs::write(&ws.output_file, "earlier=step\n")?;

  let output = ws.stage(&config)?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("::error title=Staging Failure::Required artefact not found."));
  assert!(err.contains("'missing.bin' -> 'missing.bin'"));
  assert_eq!(ws.output_content()?, "earlier=step\n");
  Ok(())
}

#[test]
fn test_optional_missing_is_skipped() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "Copyright X")?;
  let config = ws.write_config(
    r#"[[common.artefacts]]
source = "missing.txt"
required = false

[[common.artefacts]]
source = "LICENSE"
"#,
  )?;

  let output = ws.stage(&config)?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(stderr(&output).contains("::warning title=Artefact Skipped::Optional artefact missing: missing.txt"));
  assert!(!ws.file_exists("dist/tool_linux_amd64/missing.txt"));
  assert_eq!(ws.output("staged_files")?, "LICENSE");
  Ok(())
}

#[test]
fn test_duplicate_output_key_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("a.bin", "a")?;
  ws.write_file("b.bin", "b")?;
  let config = ws.write_config(
    r#"[[common.artefacts]]
source = "a.bin"
output = "binary_path"

[[common.artefacts]]
source = "b.bin"
output = "binary_path"
"#,
  )?;

  let output = ws.stage(&config)?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Duplicate artefact output key: binary_path"));
  assert_eq!(ws.output_content()?, "");
  Ok(())
}

#[test]
fn test_reserved_output_key_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "x")?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\noutput = \"artifact_dir\"\n")?;

  let output = ws.stage(&config)?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Artefact outputs collide with reserved keys: artifact_dir"));
  assert_eq!(ws.output_content()?, "");
  Ok(())
}

#[test]
fn test_destination_template_creates_subdirectory() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("build/payload.bin", "payload")?;
  let config = ws.write_config(
    r#"[[common.artefacts]]
source = "build/payload.bin"
destination = "{bin_name}/{source_name}"
output = "payload_path"
"#,
  )?;

  let output = ws.stage(&config)?;
  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert_eq!(ws.read_file("dist/tool_linux_amd64/tool/payload.bin")?, "payload");
  assert!(ws.file_exists("dist/tool_linux_amd64/tool/payload.bin.sha256"));

  let staged = ws.staging_dir().join("tool/payload.bin");
  assert_eq!(ws.output("payload_path")?, staged.to_string_lossy());
  assert_eq!(
    ws.output("artefact_map")?,
    format!("{{\"payload_path\": \"{}\"}}", staged.to_string_lossy())
  );
  Ok(())
}

#[test]
fn test_escaping_destination_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "x")?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\ndestination = \"../../etc/passwd\"\n")?;

  let output = ws.stage(&config)?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Destination escapes staging directory: ../../etc/passwd"));
  assert!(!ws.file_exists("etc/passwd"));
  assert_eq!(ws.output_content()?, "");
  Ok(())
}

#[test]
fn test_restaging_is_idempotent() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "Copyright X")?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\n")?;

  assert!(ws.stage(&config)?.status.success());
  let first = ws.read_file("dist/tool_linux_amd64/LICENSE.sha256")?;
  ws.write_file("dist/tool_linux_amd64/stale.txt", "old build")?;

  assert!(ws.stage(&config)?.status.success());
  assert_eq!(ws.read_file("dist/tool_linux_amd64/LICENSE.sha256")?, first);
  assert!(!ws.file_exists("dist/tool_linux_amd64/stale.txt"));

  let mut entries: Vec<String> = std::fs::read_dir(ws.staging_dir())?
    .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
    .collect::<std::io::Result<_>>()?;
  entries.sort();
  assert_eq!(entries, vec!["LICENSE", "LICENSE.sha256"]);
  Ok(())
}

#[test]
fn test_checksum_map_sorted_regardless_of_declaration_order() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("zeta.txt", "z")?;
  ws.write_file("alpha.txt", "a")?;
  let config = ws.write_config(
    r#"[[common.artefacts]]
source = "zeta.txt"
output = "z_path"

[[common.artefacts]]
source = "alpha.txt"
output = "a_path"
"#,
  )?;

  assert!(ws.stage(&config)?.status.success());
  let checksum_map = ws.output("checksum_map")?;
  assert!(checksum_map.find("alpha.txt").unwrap() < checksum_map.find("zeta.txt").unwrap());
  let artefact_map = ws.output("artefact_map")?;
  assert!(artefact_map.find("a_path").unwrap() < artefact_map.find("z_path").unwrap());
  assert_eq!(ws.output("staged_files")?, "alpha.txt\nzeta.txt");
  assert!(ws.output_content()?.contains("staged_files=alpha.txt%0Azeta.txt\n"));
  Ok(())
}

#[test]
fn test_output_appends_after_earlier_records() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("LICENSE", "x")?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\n")?;
  std::fs::create_dir_all(ws.output_file.parent().unwrap())?;
  std::fs::write(&ws.output_file, "earlier=step\n")?;

  assert!(ws.stage(&config)?.status.success());
  let outputs = ws.outputs()?;
  assert_eq!(outputs[0], ("earlier".to_string(), OutputValue::Scalar("step".to_string())));
  assert_eq!(outputs[1].0, "artifact_dir");
  Ok(())
}

#[test]
fn test_missing_workspace_reported() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\n")?;
  let output = run_release_stage(
    &ws.path,
    &[
      "stage",
      config.to_str().unwrap(),
      "linux",
      "--github-output",
      ws.output_file.to_str().unwrap(),
    ],
  )?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Environment variable 'GITHUB_WORKSPACE' is not set."));
  Ok(())
}

#[test]
fn test_unknown_target_reported() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let config = ws.write_config("[[common.artefacts]]\nsource = \"LICENSE\"\n")?;
  let output = run_release_stage(
    &ws.path,
    &[
      "stage",
      config.to_str().unwrap(),
      "freebsd",
      "--workspace",
      ws.path.to_str().unwrap(),
      "--github-output",
      ws.output_file.to_str().unwrap(),
    ],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("targets.freebsd"));
  Ok(())
}
