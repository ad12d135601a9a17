//! GitHub Actions workflow annotations
//!
//! Lines of the form `::warning title=T::message` on stderr are picked up by
//! the Actions runner and shown on the run summary. Outside CI they read as
//! ordinary diagnostics.

/// Format an annotation line for `level`
pub fn format(level: &str, title: &str, message: &str) -> String {
  format!("::{} title={}::{}", level, title, message)
}

pub fn error(title: &str, message: &str) {
  eprintln!("{}", format("error", title, message));
}

pub fn warning(title: &str, message: &str) {
  eprintln!("{}", format("warning", title, message));
}
