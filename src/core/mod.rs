//! Core building blocks shared by every subcommand
//!
//! - **config**: staging configuration (TOML) parsing and validation
//! - **error**: error types with exit codes and contextual help messages

pub mod config;
pub mod error;
