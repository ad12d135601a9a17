//! Artefact staging
//!
//! - **template**: `{placeholder}` rendering against the run's scalar values
//! - **resolve**: literal and glob path resolution with newest-file selection
//! - **checksum**: digest algorithms and `<name>.<alg>` sidecar files
//! - **pipeline**: the staging run itself
//! - **output**: `GITHUB_OUTPUT` record encoding

pub mod checksum;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod template;

pub use pipeline::{RESERVED_OUTPUT_KEYS, StageResult, stage};
