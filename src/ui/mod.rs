//! Terminal output helpers

pub mod annotations;
