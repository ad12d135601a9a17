//! Error types for release-stage with contextual messages and exit codes
//!
//! Every subcommand funnels its failures into [`ReleaseError`]. The staging
//! pipeline itself only ever raises [`StageError`]: callers treat any staging
//! failure as "abort the release step" and never branch on its cause, so the
//! message text is the only thing that distinguishes one failure from another.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing artefacts)
  User = 1,
  /// System error (I/O, external tools)
  System = 2,
  /// Validation failure (asset collisions, malformed packaging inputs)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-stage
#[derive(Debug)]
pub enum ReleaseError {
  /// Staging pipeline and staging configuration errors
  Stage(StageError),

  /// Linux packaging errors
  Package(PackageError),

  /// Release asset discovery and upload errors
  Upload(UploadError),

  /// A staging output a later workflow step depends on is absent or empty
  MissingOutput(String),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Stage(_) => ExitCode::User,
      ReleaseError::Package(e) => e.exit_code(),
      ReleaseError::Upload(e) => e.exit_code(),
      ReleaseError::MissingOutput(_) => ExitCode::User,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Title used for the CI annotation when the error is printed
  pub fn title(&self) -> &'static str {
    match self {
      ReleaseError::Stage(_) => "Staging Failure",
      ReleaseError::Package(_) => "Packaging Failure",
      ReleaseError::Upload(_) => "Upload Failure",
      ReleaseError::MissingOutput(_) => "Stage output missing",
      ReleaseError::Io(_) => "I/O Failure",
      ReleaseError::Message { .. } => "Release Failure",
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Package(e) => e.help_message(),
      ReleaseError::Upload(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Stage(e) => write!(f, "{}", e),
      ReleaseError::Package(e) => write!(f, "{}", e),
      ReleaseError::Upload(e) => write!(f, "{}", e),
      ReleaseError::MissingOutput(message) => write!(f, "{}", message),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      ReleaseError::Stage(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<StageError> for ReleaseError {
  fn from(err: StageError) -> Self {
    ReleaseError::Stage(err)
  }
}

impl From<TemplateError> for ReleaseError {
  fn from(err: TemplateError) -> Self {
    ReleaseError::Stage(err.into())
  }
}

impl From<PackageError> for ReleaseError {
  fn from(err: PackageError) -> Self {
    ReleaseError::Package(err)
  }
}

impl From<UploadError> for ReleaseError {
  fn from(err: UploadError) -> Self {
    ReleaseError::Upload(err)
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

/// The one error kind raised by staging configuration and the staging pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
  message: String,
}

impl StageError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }

  /// Wrap an I/O failure with the operation and path that produced it
  pub fn io(action: &str, path: &std::path::Path, err: io::Error) -> Self {
    Self::new(format!("Failed to {} {}: {}", action, path.display(), err))
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for StageError {}

/// Template rendering failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
  /// Placeholder names a key absent from the context
  UnknownPlaceholder { placeholder: String, template: String },

  /// `{` without a matching `}`, or a stray `}`
  Unbalanced { template: String },
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TemplateError::UnknownPlaceholder { placeholder, template } => {
        write!(f, "Invalid template key '{}' in '{}'", placeholder, template)
      }
      TemplateError::Unbalanced { template } => {
        write!(f, "Unbalanced braces in template '{}'", template)
      }
    }
  }
}

impl std::error::Error for TemplateError {}

impl From<TemplateError> for StageError {
  fn from(err: TemplateError) -> Self {
    StageError::new(err.to_string())
  }
}

/// Linux packaging errors
#[derive(Debug)]
pub enum PackageError {
  /// Cargo manifest missing or malformed
  Manifest { path: PathBuf, reason: String },

  /// An input file the package needs is absent
  MissingInput { what: String, path: PathBuf },

  /// Target triple has no known package architecture
  UnsupportedTarget { target: String },

  /// Version string is not valid semver after normalisation
  InvalidVersion { version: String, reason: String },

  /// No package formats requested
  NoFormats,

  /// The packaging tool failed for one or more formats
  ToolFailed { failures: Vec<(String, String)> },
}

impl PackageError {
  fn exit_code(&self) -> ExitCode {
    match self {
      PackageError::ToolFailed { .. } => ExitCode::System,
      _ => ExitCode::Validation,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      PackageError::UnsupportedTarget { .. } => {
        Some("Supported targets: x86_64-unknown-linux-gnu, aarch64-unknown-linux-gnu".to_string())
      }
      PackageError::MissingInput { what, .. } if what.contains("binary") => {
        Some("Build the release binary for this target before packaging.".to_string())
      }
      PackageError::ToolFailed { .. } => Some("Check that nfpm is installed and on PATH (or pass --nfpm-binary).".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for PackageError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PackageError::Manifest { path, reason } => {
        write!(f, "Cargo manifest error at {}: {}", path.display(), reason)
      }
      PackageError::MissingInput { what, path } => write!(f, "{}: {}", what, path.display()),
      PackageError::UnsupportedTarget { target } => write!(f, "unsupported target triple: {}", target),
      PackageError::InvalidVersion { version, reason } => {
        write!(f, "invalid package version '{}': {}", version, reason)
      }
      PackageError::NoFormats => write!(f, "no package formats specified"),
      PackageError::ToolFailed { failures } => {
        let joined: Vec<String> = failures
          .iter()
          .map(|(format, reason)| format!("{} failed with {}", format, reason))
          .collect();
        write!(f, "{}", joined.join("; "))
      }
    }
  }
}

/// Release asset discovery and upload errors
#[derive(Debug)]
pub enum UploadError {
  /// The dist directory does not exist
  MissingDistDir { path: PathBuf },

  /// A candidate asset has zero bytes
  EmptyAsset { path: PathBuf },

  /// Two files map onto the same release asset name
  NameCollision {
    asset_name: String,
    first: PathBuf,
    second: PathBuf,
  },

  /// Nothing matched the asset filters
  NothingDiscovered { path: PathBuf },

  /// The release CLI failed
  CommandFailed { command: String, stderr: String },
}

impl UploadError {
  fn exit_code(&self) -> ExitCode {
    match self {
      UploadError::CommandFailed { .. } => ExitCode::System,
      _ => ExitCode::Validation,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      UploadError::CommandFailed { stderr, .. } if stderr.contains("auth") => {
        Some("Authenticate the GitHub CLI (gh auth login) or export GH_TOKEN.".to_string())
      }
      UploadError::NothingDiscovered { .. } => {
        Some("Run `release-stage stage` for each target before uploading.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for UploadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UploadError::MissingDistDir { path } => {
        write!(f, "Artefact directory {} does not exist", path.display())
      }
      UploadError::EmptyAsset { path } => write!(f, "Artefact {} is empty", path.display()),
      UploadError::NameCollision {
        asset_name,
        first,
        second,
      } => write!(
        f,
        "Asset name collision: {} would upload both {} and {}",
        asset_name,
        first.display(),
        second.display()
      ),
      UploadError::NothingDiscovered { path } => {
        write!(f, "No artefacts discovered in {}", path.display())
      }
      UploadError::CommandFailed { command, stderr } => {
        write!(f, "Command failed: {}\n{}", command, stderr)
      }
    }
  }
}

/// Result type alias for release-stage
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Print an error to stderr as a CI annotation, followed by any help text
pub fn print_error(error: &ReleaseError) {
  crate::ui::annotations::error(error.title(), &error.to_string());

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}", help);
  }
}
