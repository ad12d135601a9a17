//! The staging pipeline
//!
//! One run: wipe the staging directory, resolve and copy every configured
//! artefact, write a checksum sidecar next to each copy, check the declared
//! outputs for collisions and finally append the result record to the output
//! sink. Any failure aborts the run before the record is written.

use crate::core::config::{ArtefactDescriptor, StagingConfig};
use crate::core::error::StageError;
use crate::stage::output::{OutputRecord, OutputSink, OutputValue};
use crate::stage::resolve;
use crate::stage::template::{self, TemplateContext};
use crate::ui::annotations;
use crate::utils::{display_relative, is_contained, normalize_lexically, portable_path};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

/// Output keys the pipeline always writes itself
pub const RESERVED_OUTPUT_KEYS: [&str; 5] = ["artifact_dir", "dist_dir", "staged_files", "artefact_map", "checksum_map"];

/// Summary of a successful staging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
  pub staging_dir: PathBuf,
  /// Staged files in processing order
  pub staged_artefacts: Vec<PathBuf>,
  /// Declared output key to staged path
  pub outputs: BTreeMap<String, PathBuf>,
  /// Staged file name to hex digest
  pub checksums: BTreeMap<String, String>,
  /// Source templates of optional artefacts that were not found
  pub skipped: Vec<String>,
}

/// A (template, rendered pattern) pair tried during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
struct RenderAttempt {
  template: String,
  rendered: String,
}

struct StagedArtefact {
  path: PathBuf,
  output: Option<String>,
  digest: String,
}

/// Stage every artefact in `config` and emit the result record to `sink`
pub fn stage(config: &StagingConfig, sink: &mut dyn OutputSink) -> Result<StageResult, StageError> {
  let staging_dir = config.staging_dir()?;
  let context = config.template_context()?;
  initialize_staging_dir(&staging_dir)?;

  let mut staged = Vec::new();
  let mut skipped = Vec::new();

  for artefact in &config.artefacts {
    let (source, attempts) = resolve_source(&config.workspace, artefact, &context)?;
    let Some(source) = source else {
      if artefact.required {
        return Err(missing_required(&config.workspace, &attempts));
      }
      log::debug!("Optional artefact '{}' not found; skipping", artefact.source);
      annotations::warning(
        "Artefact Skipped",
        &format!("Optional artefact missing: {}", artefact.source),
      );
      skipped.push(artefact.source.clone());
      continue;
    };

    let destination = stage_single(config, &staging_dir, &context, artefact, &source)?;
    let digest = config.checksum_algorithm.write_sidecar(&destination)?;
    staged.push(StagedArtefact {
      path: destination,
      output: artefact.output.clone(),
      digest,
    });
  }

  if staged.is_empty() {
    return Err(StageError::new("No artefacts were staged."));
  }

  let outputs = validate_outputs(&staged)?;
  validate_unique_destinations(&staged)?;

  let result = StageResult {
    staging_dir,
    checksums: staged
      .iter()
      .map(|s| (file_name(&s.path), s.digest.clone()))
      .collect(),
    staged_artefacts: staged.into_iter().map(|s| s.path).collect(),
    outputs,
    skipped,
  };

  sink.emit(&prepare_output(&result)?)?;
  Ok(result)
}

/// Remove any previous staging directory and create a fresh one
fn initialize_staging_dir(staging_dir: &Path) -> Result<(), StageError> {
  if staging_dir.exists() {
    log::debug!("Removing previous staging directory {}", staging_dir.display());
    fs::remove_dir_all(staging_dir).map_err(|e| StageError::io("remove", staging_dir, e))?;
  }
  fs::create_dir_all(staging_dir).map_err(|e| StageError::io("create", staging_dir, e))
}

/// Try `source` then each alternative until one resolves
fn resolve_source(
  workspace: &Path,
  artefact: &ArtefactDescriptor,
  context: &TemplateContext,
) -> Result<(Option<PathBuf>, Vec<RenderAttempt>), StageError> {
  let mut attempts = Vec::new();
  for pattern in artefact.patterns() {
    let rendered = template::render(pattern, context)?;
    log::debug!("Resolving '{}' as '{}'", pattern, rendered);
    let found = resolve::resolve(workspace, &rendered)?;
    attempts.push(RenderAttempt {
      template: pattern.to_string(),
      rendered,
    });
    if found.is_some() {
      return Ok((found, attempts));
    }
  }
  Ok((None, attempts))
}

fn missing_required(workspace: &Path, attempts: &[RenderAttempt]) -> StageError {
  let attempt_lines: Vec<String> = attempts
    .iter()
    .map(|a| format!("'{}' -> '{}'", a.template, a.rendered))
    .collect();
  StageError::new(format!(
    "Required artefact not found. Workspace={} Attempts=[{}]",
    portable_path(workspace),
    attempt_lines.join(", ")
  ))
}

/// Copy `source` into the staging directory and return the staged path
fn stage_single(
  config: &StagingConfig,
  staging_dir: &Path,
  context: &TemplateContext,
  artefact: &ArtefactDescriptor,
  source: &Path,
) -> Result<PathBuf, StageError> {
  let source_name = file_name(source);
  let destination_text = match &artefact.destination {
    Some(destination) => {
      let mut artefact_context = context.clone();
      artefact_context.insert("source_path".to_string(), portable_path(source));
      artefact_context.insert("source_name".to_string(), source_name.clone());
      template::render(destination, &artefact_context)?
    }
    None => source_name,
  };

  let destination = safe_destination(staging_dir, &destination_text)?;
  if destination.exists() {
    fs::remove_file(&destination).map_err(|e| StageError::io("remove", &destination, e))?;
  }
  copy_with_metadata(source, &destination)?;

  log::info!(
    "Staged '{}' -> '{}'",
    display_relative(&config.workspace, source),
    display_relative(&config.workspace, &destination)
  );
  Ok(destination)
}

/// Join `destination` under `staging_dir`, rejecting anything that escapes it
fn safe_destination(staging_dir: &Path, destination: &str) -> Result<PathBuf, StageError> {
  let target = normalize_lexically(&staging_dir.join(destination));
  if !is_contained(staging_dir, &target) || target == normalize_lexically(staging_dir) {
    return Err(StageError::new(format!(
      "Destination escapes staging directory: {}",
      destination
    )));
  }
  if let Some(parent) = target.parent() {
    fs::create_dir_all(parent).map_err(|e| StageError::io("create", parent, e))?;
  }
  Ok(target)
}

/// Copy contents, access and modification times, then permissions
///
/// Times are set through the handle that wrote the copy, before the source's
/// permission bits land, so read-only sources copy like any other file.
fn copy_with_metadata(source: &Path, destination: &Path) -> Result<(), StageError> {
  let metadata = fs::metadata(source).map_err(|e| StageError::io("read metadata of", source, e))?;

  let copy = || -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut writer = File::create(destination)?;
    io::copy(&mut reader, &mut writer)?;

    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
      times = times.set_accessed(accessed);
    }
    writer.set_times(times)?;
    drop(writer);
    fs::set_permissions(destination, metadata.permissions())
  };
  copy().map_err(|e| StageError::io("copy", source, e))
}

/// Reject reserved and duplicate output keys, returning the output map
fn validate_outputs(staged: &[StagedArtefact]) -> Result<BTreeMap<String, PathBuf>, StageError> {
  let declared: Vec<&str> = staged.iter().filter_map(|s| s.output.as_deref()).collect();

  let collisions: BTreeSet<&str> = declared
    .iter()
    .copied()
    .filter(|key| RESERVED_OUTPUT_KEYS.contains(key))
    .collect();
  if !collisions.is_empty() {
    let keys: Vec<&str> = collisions.into_iter().collect();
    return Err(StageError::new(format!(
      "Artefact outputs collide with reserved keys: {}",
      keys.join(", ")
    )));
  }

  let mut outputs = BTreeMap::new();
  for artefact in staged {
    if let Some(key) = &artefact.output
      && outputs.insert(key.clone(), artefact.path.clone()).is_some()
    {
      return Err(StageError::new(format!("Duplicate artefact output key: {}", key)));
    }
  }
  Ok(outputs)
}

fn validate_unique_destinations(staged: &[StagedArtefact]) -> Result<(), StageError> {
  let mut seen = BTreeSet::new();
  for artefact in staged {
    if !seen.insert(&artefact.path) {
      return Err(StageError::new(format!(
        "Duplicate artefact destination: {}",
        portable_path(&artefact.path)
      )));
    }
  }
  Ok(())
}

/// Build the record written to the output sink
fn prepare_output(result: &StageResult) -> Result<OutputRecord, StageError> {
  let mut staged_names: Vec<String> = result.staged_artefacts.iter().map(|p| file_name(p)).collect();
  staged_names.sort();

  let artefact_map: BTreeMap<&str, String> = result
    .outputs
    .iter()
    .map(|(key, path)| (key.as_str(), portable_path(path)))
    .collect();

  let dist_dir = result
    .staging_dir
    .parent()
    .map(portable_path)
    .unwrap_or_default();

  let mut record: OutputRecord = vec![
    ("artifact_dir".to_string(), portable_path(&result.staging_dir).into()),
    ("dist_dir".to_string(), dist_dir.into()),
    ("staged_files".to_string(), staged_names.join("\n").into()),
    ("artefact_map".to_string(), to_json(&artefact_map)?.into()),
    ("checksum_map".to_string(), to_json(&result.checksums)?.into()),
  ];
  record.extend(
    result
      .outputs
      .iter()
      .map(|(key, path)| (key.clone(), OutputValue::Scalar(portable_path(path)))),
  );
  Ok(record)
}

/// JSON with `", "` and `": "` separators
fn to_json<T: Serialize>(value: &T) -> Result<String, StageError> {
  let mut buffer = Vec::new();
  let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
  value
    .serialize(&mut serializer)
    .map_err(|e| StageError::new(format!("Failed to encode output map: {}", e)))?;
  String::from_utf8(buffer).map_err(|e| StageError::new(format!("Failed to encode output map: {}", e)))
}

struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
  fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
    if first { Ok(()) } else { writer.write_all(b", ") }
  }

  fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
    if first { Ok(()) } else { writer.write_all(b", ") }
  }

  fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
    writer.write_all(b": ")
  }
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().to_string())
    .unwrap_or_default()
}
