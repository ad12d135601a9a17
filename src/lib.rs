//! release-stage: stage, package and publish per-target release artefacts
//!
//! The staging pipeline ([`stage::stage`]) is the heart of the crate: it turns a
//! declarative list of artefact templates into a clean staging directory with
//! checksum sidecars and a `GITHUB_OUTPUT` record describing what was staged.
//! The remaining modules cover the release steps around it.

pub mod commands;
pub mod core;
pub mod manifest;
pub mod package;
pub mod release_modes;
pub mod stage;
pub mod ui;
pub mod upload;
pub mod utils;
pub mod windows_paths;
