//! Cargo manifest field access
//!
//! Release steps need a handful of `[package]` fields (name, version, licence,
//! authors...) without pulling in `cargo metadata`. The manifest is parsed
//! with `toml_edit` and read as-is; workspace inheritance is not followed.

use crate::core::error::{ReleaseError, ReleaseResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, TableLike};

/// Fields printable by `release-stage manifest`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ManifestField {
  Name,
  Version,
}

impl ManifestField {
  pub fn key(self) -> &'static str {
    match self {
      ManifestField::Name => "name",
      ManifestField::Version => "version",
    }
  }
}

impl fmt::Display for ManifestField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

/// `[package]` metadata used for distribution packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
  pub license: String,
  pub description: String,
  /// First entry of `authors`
  pub maintainer: String,
  pub homepage: String,
}

/// A parsed `Cargo.toml`
#[derive(Debug)]
pub struct Manifest {
  path: PathBuf,
  doc: DocumentMut,
}

impl Manifest {
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    if !path.is_file() {
      return Err(ReleaseError::message(format!(
        "Manifest {} does not exist",
        path.display()
      )));
    }
    let content = fs::read_to_string(path)?;
    let doc = content
      .parse::<DocumentMut>()
      .map_err(|e| ReleaseError::message(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(Self {
      path: path.to_path_buf(),
      doc,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn package(&self) -> Option<&dyn TableLike> {
    self.doc.get("package").and_then(|item| item.as_table_like())
  }

  fn string(&self, key: &str) -> Option<&str> {
    self.package()?.get(key)?.as_str()
  }

  /// Non-empty string value of `package.<field>`
  pub fn field(&self, field: ManifestField) -> ReleaseResult<String> {
    if self.package().is_none() {
      return Err(ReleaseError::message("package table missing from manifest"));
    }
    self
      .string(field.key())
      .filter(|value| !value.is_empty())
      .map(str::to_string)
      .ok_or_else(|| ReleaseError::message(format!("package.{} is missing", field)))
  }

  /// Packaging metadata, with absent fields left empty
  pub fn metadata(&self) -> PackageMetadata {
    let maintainer = self
      .package()
      .and_then(|package| package.get("authors"))
      .and_then(|item| item.as_array())
      .and_then(|authors| authors.iter().find_map(|author| author.as_str()))
      .unwrap_or_default()
      .to_string();

    PackageMetadata {
      license: self.string("license").unwrap_or_default().to_string(),
      description: self.string("description").unwrap_or_default().to_string(),
      maintainer,
      homepage: self.string("homepage").unwrap_or_default().to_string(),
    }
  }
}
