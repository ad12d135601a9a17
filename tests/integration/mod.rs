//! Integration tests for release-stage

mod helpers;
mod test_output;
mod test_package;
mod test_resolve;
mod test_stage;
