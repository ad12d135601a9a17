//! Linux distribution packages (`.deb`, `.rpm`) via nFPM
//!
//! - **manpage**: gzip man pages and infer their section
//! - **nfpm**: manifest types, writer and the `nfpm package` runner

pub mod manpage;
pub mod nfpm;

use crate::core::error::{PackageError, ReleaseResult};
use crate::manifest::{Manifest, PackageMetadata};
use crate::utils::portable_path;
use nfpm::{ContentEntry, NfpmConfig, Overrides, PackagerOverride};
use std::path::{Path, PathBuf};

/// Target triples with a known package architecture
pub const SUPPORTED_ARCHES: [(&str, &str); 2] = [
  ("x86_64-unknown-linux-gnu", "amd64"),
  ("aarch64-unknown-linux-gnu", "arm64"),
];

/// Inputs for one packaging run
#[derive(Debug, Clone)]
pub struct PackageOptions {
  pub project_dir: PathBuf,
  pub bin_name: String,
  pub package_name: Option<String>,
  pub target: String,
  pub version: String,
  pub formats: Vec<String>,
  /// Man pages, relative to `project_dir`
  pub man_paths: Vec<PathBuf>,
  pub man_section: String,
  pub deb_depends: Vec<String>,
  /// Defaults to `deb_depends` when absent
  pub rpm_depends: Option<Vec<String>>,
  pub outdir: PathBuf,
  pub config_path: PathBuf,
  pub license: Option<String>,
  pub description: Option<String>,
  pub maintainer: Option<String>,
  pub homepage: Option<String>,
  pub nfpm_binary: String,
}

/// What a packaging run produced
#[derive(Debug, Clone)]
pub struct PackagePlan {
  pub config: NfpmConfig,
  pub config_path: PathBuf,
  pub outdir: PathBuf,
  pub formats: Vec<String>,
}

/// Package architecture for a target triple
pub fn nfpm_arch(target: &str) -> Result<&'static str, PackageError> {
  SUPPORTED_ARCHES
    .iter()
    .find(|(triple, _)| *triple == target)
    .map(|(_, arch)| *arch)
    .ok_or_else(|| PackageError::UnsupportedTarget {
      target: target.to_string(),
    })
}

/// Strip leading `v`s and validate the result as semver
pub fn normalise_version(version: &str) -> Result<String, PackageError> {
  let cleaned = version.trim();
  let stripped = cleaned.trim_start_matches('v');
  let normalised = if stripped.is_empty() { cleaned } else { stripped };
  semver::Version::parse(normalised).map_err(|e| PackageError::InvalidVersion {
    version: version.to_string(),
    reason: e.to_string(),
  })?;
  Ok(normalised.to_string())
}

/// Split comma/space separated dependency lists, keeping first occurrences
pub fn dedupe_tokens<S: AsRef<str>>(values: &[S]) -> Vec<String> {
  let mut tokens: Vec<String> = Vec::new();
  for value in values {
    for token in value.as_ref().replace(',', " ").split_whitespace() {
      if !tokens.iter().any(|existing| existing == token) {
        tokens.push(token.to_string());
      }
    }
  }
  tokens
}

fn ensure_file(path: PathBuf, what: &str) -> Result<PathBuf, PackageError> {
  if path.is_file() {
    Ok(path)
  } else {
    Err(PackageError::MissingInput {
      what: what.to_string(),
      path,
    })
  }
}

/// Files installed by the package
pub fn build_contents(
  project_dir: &Path,
  bin_name: &str,
  target: &str,
  man_paths: &[PathBuf],
  man_section: &str,
  stage_dir: &Path,
) -> ReleaseResult<Vec<ContentEntry>> {
  let binary = ensure_file(
    project_dir.join("target").join(target).join("release").join(bin_name),
    "built binary missing",
  )?;
  let mut contents = vec![ContentEntry::new(
    portable_path(&binary),
    format!("/usr/bin/{}", bin_name),
    "0755",
  )];

  let license = project_dir.join("LICENSE");
  if license.is_file() {
    contents.push(ContentEntry::new(
      portable_path(&license),
      format!("/usr/share/doc/{}/copyright", bin_name),
      "0644",
    ));
  }

  for src in man_paths {
    let real_src = ensure_file(project_dir.join(src), "man page missing")?;
    let gz_path = manpage::gzip_manpage(&real_src, stage_dir)?;
    let section = manpage::infer_section(&gz_path, man_section);
    let gz_name = gz_path
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();
    contents.push(ContentEntry::new(
      portable_path(&gz_path),
      format!("/usr/share/man/man{}/{}", section, gz_name),
      "0644",
    ));
  }

  Ok(contents)
}

/// Validate inputs, gather contents and build the nFPM manifest
pub fn plan(options: &PackageOptions) -> ReleaseResult<PackagePlan> {
  let project_dir = std::path::absolute(&options.project_dir)?;
  let metadata = read_metadata(&project_dir)?;

  let package_name = options
    .package_name
    .as_deref()
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .unwrap_or(&options.bin_name)
    .to_string();
  let version = normalise_version(&options.version)?;
  let target = options.target.trim();
  let arch = nfpm_arch(target)?;

  let formats: Vec<String> = options
    .formats
    .iter()
    .map(|f| f.trim().to_string())
    .filter(|f| !f.is_empty())
    .collect();
  if formats.is_empty() {
    return Err(PackageError::NoFormats.into());
  }

  let man_section = match options.man_section.trim() {
    "" => "1",
    section => section,
  };
  let contents = build_contents(
    &project_dir,
    &options.bin_name,
    target,
    &options.man_paths,
    man_section,
    &project_dir.join("dist").join(".man"),
  )?;

  let deb_depends = dedupe_tokens(&options.deb_depends);
  let rpm_depends = dedupe_tokens(options.rpm_depends.as_deref().unwrap_or(&options.deb_depends));

  let pick = |flag: &Option<String>, fallback: &str| -> String {
    flag
      .clone()
      .filter(|value| !value.is_empty())
      .unwrap_or_else(|| fallback.to_string())
  };
  let maintainer = match pick(&options.maintainer, &metadata.maintainer) {
    value if value.is_empty() => std::env::var("GITHUB_ACTOR").unwrap_or_default(),
    value => value,
  };
  let description = match pick(&options.description, &metadata.description) {
    value if value.is_empty() => package_name.clone(),
    value => value,
  };

  let config = NfpmConfig {
    name: package_name,
    arch: arch.to_string(),
    platform: "linux".to_string(),
    version,
    release: "1".to_string(),
    maintainer,
    homepage: pick(&options.homepage, &metadata.homepage),
    license: pick(&options.license, &metadata.license),
    description,
    contents,
    overrides: Overrides {
      deb: PackagerOverride { depends: deb_depends },
      rpm: PackagerOverride { depends: rpm_depends },
    },
  };

  Ok(PackagePlan {
    config,
    config_path: project_dir.join(&options.config_path),
    outdir: project_dir.join(&options.outdir),
    formats,
  })
}

fn read_metadata(project_dir: &Path) -> Result<PackageMetadata, PackageError> {
  let path = project_dir.join("Cargo.toml");
  if !path.is_file() {
    return Err(PackageError::Manifest {
      path,
      reason: "Cargo manifest not found".to_string(),
    });
  }
  Manifest::load(&path)
    .map(|manifest| manifest.metadata())
    .map_err(|e| PackageError::Manifest {
      path,
      reason: e.to_string(),
    })
}

/// Write the manifest and build every requested format
pub fn package(options: &PackageOptions) -> ReleaseResult<PackagePlan> {
  let plan = plan(options)?;
  std::fs::create_dir_all(&plan.outdir)?;
  nfpm::write_config(&plan.config, &plan.config_path)?;
  println!("wrote {}", plan.config_path.display());
  log::debug!("nfpm manifest: {:?}", plan.config);

  nfpm::run_nfpm(&options.nfpm_binary, &plan.config_path, &plan.outdir, &plan.formats)?;
  Ok(plan)
}
