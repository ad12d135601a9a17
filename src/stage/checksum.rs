//! Content digests and checksum sidecar files

use crate::core::error::StageError;
use sha2::digest::DynDigest;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CHUNK_SIZE: usize = 8192;

/// Digest algorithms accepted for checksum sidecars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumAlgorithm {
  Md5,
  Sha1,
  Sha224,
  #[default]
  Sha256,
  Sha384,
  Sha512,
  Sha512_224,
  Sha512_256,
}

impl ChecksumAlgorithm {
  pub const ALL: [ChecksumAlgorithm; 8] = [
    ChecksumAlgorithm::Md5,
    ChecksumAlgorithm::Sha1,
    ChecksumAlgorithm::Sha224,
    ChecksumAlgorithm::Sha256,
    ChecksumAlgorithm::Sha384,
    ChecksumAlgorithm::Sha512,
    ChecksumAlgorithm::Sha512_224,
    ChecksumAlgorithm::Sha512_256,
  ];

  /// Canonical lowercase name, also used as the sidecar extension
  pub fn name(self) -> &'static str {
    match self {
      ChecksumAlgorithm::Md5 => "md5",
      ChecksumAlgorithm::Sha1 => "sha1",
      ChecksumAlgorithm::Sha224 => "sha224",
      ChecksumAlgorithm::Sha256 => "sha256",
      ChecksumAlgorithm::Sha384 => "sha384",
      ChecksumAlgorithm::Sha512 => "sha512",
      ChecksumAlgorithm::Sha512_224 => "sha512_224",
      ChecksumAlgorithm::Sha512_256 => "sha512_256",
    }
  }

  fn hasher(self) -> Box<dyn DynDigest> {
    match self {
      ChecksumAlgorithm::Md5 => Box::new(md5::Md5::default()),
      ChecksumAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
      ChecksumAlgorithm::Sha224 => Box::new(sha2::Sha224::default()),
      ChecksumAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
      ChecksumAlgorithm::Sha384 => Box::new(sha2::Sha384::default()),
      ChecksumAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
      ChecksumAlgorithm::Sha512_224 => Box::new(sha2::Sha512_224::default()),
      ChecksumAlgorithm::Sha512_256 => Box::new(sha2::Sha512_256::default()),
    }
  }

  /// Hex digest of everything `reader` yields
  pub fn digest_reader(self, mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = self.hasher();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
      let read = reader.read(&mut buffer)?;
      if read == 0 {
        break;
      }
      hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
  }

  /// Hex digest of the file at `path`
  pub fn digest_file(self, path: &Path) -> Result<String, StageError> {
    let file = File::open(path).map_err(|e| StageError::io("open", path, e))?;
    self
      .digest_reader(file)
      .map_err(|e| StageError::io("read", path, e))
  }

  /// Path of the sidecar that accompanies `path`
  pub fn sidecar_path(self, path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(self.name());
    path.with_file_name(name)
  }

  /// Digest `path` and write `<hex>  <name>\n` next to it
  ///
  /// Returns the hex digest.
  pub fn write_sidecar(self, path: &Path) -> Result<String, StageError> {
    let digest = self.digest_file(path)?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();
    let sidecar = self.sidecar_path(path);
    std::fs::write(&sidecar, format!("{}  {}\n", digest, name)).map_err(|e| StageError::io("write", &sidecar, e))?;
    Ok(digest)
  }
}

impl fmt::Display for ChecksumAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ChecksumAlgorithm {
  type Err = StageError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_lowercase().replace('-', "");
    let normalized = match normalized.as_str() {
      "sha512224" => "sha512_224",
      "sha512256" => "sha512_256",
      other => other,
    };
    Self::ALL
      .into_iter()
      .find(|alg| alg.name() == normalized)
      .ok_or_else(|| {
        let supported: Vec<&str> = Self::ALL.iter().map(|alg| alg.name()).collect();
        StageError::new(format!(
          "Unsupported checksum algorithm: {}. Supported: {}",
          s,
          supported.join(", ")
        ))
      })
  }
}
