//! Staging configuration
//!
//! A staging file describes a `[common]` section shared by every target and a
//! `[targets.<key>]` section per build target:
//!
//! ```toml
//! [common]
//! bin_name = "tool"
//! checksum_algorithm = "sha256"
//!
//! [[common.artefacts]]
//! source = "LICENSE"
//!
//! [targets.linux-x86_64]
//! platform = "linux"
//! arch = "amd64"
//! target = "x86_64-unknown-linux-gnu"
//!
//! [[targets.linux-x86_64.artefacts]]
//! source = "target/{target}/release/{bin_name}{bin_ext}"
//! output = "binary_path"
//! ```
//!
//! The loader validates everything the pipeline relies on, so a loaded
//! [`StagingConfig`] is never re-checked during a run.

use crate::core::error::StageError;
use crate::stage::checksum::ChecksumAlgorithm;
use crate::stage::template::{self, TemplateContext};
use crate::utils::portable_path;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_STAGING_DIR_TEMPLATE: &str = "{bin_name}_{platform}_{arch}";

/// One file to stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactDescriptor {
  /// Primary location template
  pub source: String,
  /// Abort the run when nothing resolves
  pub required: bool,
  /// Output key the staged path is exported under
  pub output: Option<String>,
  /// Template for the path inside the staging directory
  pub destination: Option<String>,
  /// Fallback templates, tried in order after `source`
  pub alternatives: Vec<String>,
}

impl ArtefactDescriptor {
  /// Required artefact with no output, destination or fallbacks
  pub fn new(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      required: true,
      output: None,
      destination: None,
      alternatives: Vec::new(),
    }
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }

  pub fn with_output(mut self, output: impl Into<String>) -> Self {
    self.output = Some(output.into());
    self
  }

  pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
    self.destination = Some(destination.into());
    self
  }

  pub fn with_alternatives<I, S>(mut self, alternatives: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.alternatives = alternatives.into_iter().map(Into::into).collect();
    self
  }

  /// Source template followed by every alternative, in resolution order
  pub fn patterns(&self) -> impl Iterator<Item = &str> {
    std::iter::once(self.source.as_str()).chain(self.alternatives.iter().map(String::as_str))
  }
}

/// Resolved parameters for one staging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingConfig {
  pub workspace: PathBuf,
  pub bin_name: String,
  pub dist_dir: String,
  pub checksum_algorithm: ChecksumAlgorithm,
  pub artefacts: Vec<ArtefactDescriptor>,
  pub platform: String,
  pub arch: String,
  pub target: String,
  pub bin_ext: String,
  pub staging_dir_template: String,
  pub target_key: Option<String>,
}

impl StagingConfig {
  /// Scalar template values shared by every artefact in a run
  pub fn template_context(&self) -> Result<TemplateContext, StageError> {
    let mut context = TemplateContext::from([
      ("workspace".to_string(), portable_path(&self.workspace)),
      ("bin_name".to_string(), self.bin_name.clone()),
      ("dist_dir".to_string(), self.dist_dir.clone()),
      ("checksum_algorithm".to_string(), self.checksum_algorithm.name().to_string()),
      ("platform".to_string(), self.platform.clone()),
      ("arch".to_string(), self.arch.clone()),
      ("target".to_string(), self.target.clone()),
      ("bin_ext".to_string(), self.bin_ext.clone()),
      ("target_key".to_string(), self.target_key.clone().unwrap_or_default()),
      ("staging_dir_template".to_string(), self.staging_dir_template.clone()),
    ]);
    let name = template::render(&self.staging_dir_template, &context)?;
    context.insert("staging_dir_name".to_string(), name);
    Ok(context)
  }

  /// Leaf name of the staging directory
  pub fn staging_dir_name(&self) -> Result<String, StageError> {
    let context = self.template_context()?;
    Ok(context.get("staging_dir_name").cloned().unwrap_or_default())
  }

  /// `workspace / dist_dir / staging_dir_name`
  pub fn staging_dir(&self) -> Result<PathBuf, StageError> {
    Ok(self.workspace.join(&self.dist_dir).join(self.staging_dir_name()?))
  }

  /// Load the configuration for `target_key` from the TOML file at `path`
  ///
  /// `workspace` is the checkout root; relative paths are made absolute
  /// against the current directory.
  pub fn load(path: &Path, target_key: &str, workspace: &Path) -> Result<Self, StageError> {
    if !path.is_file() {
      return Err(StageError::new(format!(
        "Configuration file not found at {}",
        path.display()
      )));
    }

    let content = fs::read_to_string(path).map_err(|e| StageError::io("read", path, e))?;
    let raw: RawConfig = toml_edit::de::from_str(&content)
      .map_err(|e| StageError::new(format!("Failed to parse {}: {}", path.display(), e)))?;

    let common = raw
      .common
      .ok_or_else(|| StageError::new(format!("Missing configuration key in {}: 'common'", path.display())))?;
    let target = raw.targets.and_then(|mut targets| targets.remove(target_key)).ok_or_else(|| {
      StageError::new(format!(
        "Missing configuration key in {}: 'targets.{}'",
        path.display(),
        target_key
      ))
    })?;

    require_keys(&[("bin_name", common.bin_name.is_some())], "common", path)?;
    require_keys(
      &[
        ("platform", target.platform.is_some()),
        ("arch", target.arch.is_some()),
        ("target", target.target.is_some()),
      ],
      &format!("targets.{}", target_key),
      path,
    )?;

    let checksum_algorithm = match common.checksum_algorithm.as_deref() {
      Some(name) => name.parse()?,
      None => ChecksumAlgorithm::default(),
    };

    let entries: Vec<RawArtefact> = common.artefacts.into_iter().chain(target.artefacts).collect();
    let artefacts = make_artefacts(entries, path)?;

    let workspace = std::path::absolute(workspace).map_err(|e| StageError::io("resolve", workspace, e))?;

    let config = Self {
      workspace,
      bin_name: common.bin_name.unwrap_or_default(),
      dist_dir: common.dist_dir.unwrap_or_else(|| DEFAULT_DIST_DIR.to_string()),
      checksum_algorithm,
      artefacts,
      platform: target.platform.unwrap_or_default(),
      arch: target.arch.unwrap_or_default(),
      target: target.target.unwrap_or_default(),
      bin_ext: target.bin_ext.unwrap_or_default(),
      staging_dir_template: target
        .staging_dir_template
        .or(common.staging_dir_template)
        .unwrap_or_else(|| DEFAULT_STAGING_DIR_TEMPLATE.to_string()),
      target_key: Some(target_key.to_string()),
    };

    // Surface a bad staging directory template at load time
    config.staging_dir_name()?;

    log::debug!(
      "Loaded {} artefact(s) for target '{}' from {}",
      config.artefacts.len(),
      target_key,
      path.display()
    );
    Ok(config)
  }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
  common: Option<RawCommon>,
  targets: Option<BTreeMap<String, RawTarget>>,
}

#[derive(Debug, Deserialize)]
struct RawCommon {
  bin_name: Option<String>,
  dist_dir: Option<String>,
  checksum_algorithm: Option<String>,
  staging_dir_template: Option<String>,
  #[serde(default)]
  artefacts: Vec<RawArtefact>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
  platform: Option<String>,
  arch: Option<String>,
  target: Option<String>,
  bin_ext: Option<String>,
  staging_dir_template: Option<String>,
  #[serde(default)]
  artefacts: Vec<RawArtefact>,
}

#[derive(Debug, Deserialize)]
struct RawArtefact {
  source: Option<String>,
  #[serde(default = "default_required")]
  required: bool,
  output: Option<String>,
  destination: Option<String>,
  #[serde(default)]
  alternatives: Option<OneOrMany>,
}

fn default_required() -> bool {
  true
}

/// `alternatives` may be a single string or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
  One(String),
  Many(Vec<String>),
}

impl OneOrMany {
  fn into_vec(self) -> Vec<String> {
    let values = match self {
      OneOrMany::One(value) => vec![value],
      OneOrMany::Many(values) => values,
    };
    values.into_iter().filter(|value| !value.is_empty()).collect()
  }
}

fn require_keys(keys: &[(&str, bool)], label: &str, path: &Path) -> Result<(), StageError> {
  let mut missing: Vec<&str> = keys
    .iter()
    .filter(|(_, present)| !present)
    .map(|(key, _)| *key)
    .collect();
  if missing.is_empty() {
    return Ok(());
  }
  missing.sort_unstable();
  Err(StageError::new(format!(
    "Missing required configuration key(s) {} in [{}] of {}",
    missing.join(", "),
    label,
    path.display()
  )))
}

fn make_artefacts(entries: Vec<RawArtefact>, path: &Path) -> Result<Vec<ArtefactDescriptor>, StageError> {
  if entries.is_empty() {
    return Err(StageError::new("No artefacts configured to stage."));
  }

  entries
    .into_iter()
    .enumerate()
    .map(|(idx, entry)| {
      let source = entry.source.filter(|s| !s.is_empty()).ok_or_else(|| {
        StageError::new(format!(
          "Missing required artefact key 'source' in entry #{} of {}",
          idx + 1,
          path.display()
        ))
      })?;
      Ok(ArtefactDescriptor {
        source,
        required: entry.required,
        output: entry.output,
        destination: entry.destination,
        alternatives: entry.alternatives.map(OneOrMany::into_vec).unwrap_or_default(),
      })
    })
    .collect()
}
