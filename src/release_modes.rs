//! Release workflow modes derived from the triggering GitHub event
//!
//! Tag pushes always publish. Reusable workflow calls publish only when asked
//! to, and a dry run never publishes or uploads workflow artefacts.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::stage::output::OutputRecord;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Booleans the release workflow branches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseModes {
  pub dry_run: bool,
  pub should_publish: bool,
  pub should_upload_workflow_artifacts: bool,
}

impl ReleaseModes {
  /// Output record with lowercase `true`/`false` values
  pub fn to_output_record(&self) -> OutputRecord {
    [
      ("dry_run", self.dry_run),
      ("should_publish", self.should_publish),
      ("should_upload_workflow_artifacts", self.should_upload_workflow_artifacts),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string().into()))
    .collect()
  }
}

/// Derive the modes for `event_name` from its JSON payload
pub fn determine(event_name: &str, event: &Value) -> ReleaseResult<ReleaseModes> {
  let inputs = match event_name {
    "push" => Map::new(),
    "workflow_call" => extract_inputs(event)?,
    other => {
      return Err(ReleaseError::message(format!(
        "Unsupported event '{}' for release workflow",
        other
      )));
    }
  };

  let dry_run = coerce_bool(inputs.get("dry-run"), false)?;
  let should_publish = match event_name {
    "push" => true,
    _ => coerce_bool(inputs.get("publish"), false)?,
  };

  Ok(ReleaseModes {
    dry_run,
    should_publish: should_publish && !dry_run,
    should_upload_workflow_artifacts: !dry_run,
  })
}

/// Read the event payload, treating a missing file as an empty object
pub fn load_event(path: &Path) -> ReleaseResult<Value> {
  if !path.exists() {
    log::debug!("Event payload {} not found; using empty payload", path.display());
    return Ok(Value::Object(Map::new()));
  }
  let content = fs::read_to_string(path)?;
  Ok(serde_json::from_str(&content)?)
}

fn extract_inputs(event: &Value) -> ReleaseResult<Map<String, Value>> {
  match event.get("inputs") {
    None | Some(Value::Null) => Ok(Map::new()),
    Some(Value::Object(inputs)) => Ok(inputs.clone()),
    Some(_) => Err(ReleaseError::message("workflow inputs must be a mapping")),
  }
}

/// Interpret a workflow input as a boolean
///
/// Inputs arrive as strings; absent or blank values fall back to `default`.
fn coerce_bool(value: Option<&Value>, default: bool) -> ReleaseResult<bool> {
  match value {
    None | Some(Value::Null) => Ok(default),
    Some(Value::Bool(flag)) => Ok(*flag),
    Some(Value::String(text)) => match text.trim().to_lowercase().as_str() {
      "" => Ok(default),
      "1" | "true" | "yes" | "on" => Ok(true),
      "0" | "false" | "no" | "off" => Ok(false),
      _ => Err(ReleaseError::message(format!("Cannot interpret '{}' as boolean", text))),
    },
    Some(other) => Err(ReleaseError::message(format!("Cannot interpret {} as boolean", other))),
  }
}
