//! CLI commands for release-stage
//!
//! - **stage**: stage one target's artefacts and export workflow outputs
//! - **package**: build `.deb`/`.rpm` packages with nFPM
//! - **upload**: publish staged artefacts to a GitHub release
//! - **release_modes**: derive dry-run/publish flags from the workflow event
//! - **manifest**: print a `Cargo.toml` package field
//! - **windows_paths**: re-export staged binary/licence paths in Windows form

pub mod manifest;
pub mod package;
pub mod release_modes;
pub mod stage;
pub mod upload;
pub mod windows_paths;

pub use manifest::run_manifest;
pub use package::run_package;
pub use release_modes::run_release_modes;
pub use stage::run_stage;
pub use upload::run_upload;
pub use windows_paths::run_windows_paths;
