//! Named placeholder substitution for artefact templates
//!
//! Templates use `{name}` placeholders; `{{` and `}}` produce literal braces.
//! A placeholder whose name is missing from the context is an error, never an
//! empty substitution.

use crate::core::error::TemplateError;
use std::collections::BTreeMap;

/// Scalar values available to templates, keyed by placeholder name
pub type TemplateContext = BTreeMap<String, String>;

/// Render `template` against `context`
pub fn render(template: &str, context: &TemplateContext) -> Result<String, TemplateError> {
  let mut rendered = String::with_capacity(template.len());
  let mut chars = template.chars().peekable();

  while let Some(ch) = chars.next() {
    match ch {
      '{' if chars.peek() == Some(&'{') => {
        chars.next();
        rendered.push('{');
      }
      '}' if chars.peek() == Some(&'}') => {
        chars.next();
        rendered.push('}');
      }
      '{' => {
        let mut name = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
          if inner == '}' {
            closed = true;
            break;
          }
          name.push(inner);
        }
        if !closed || name.contains('{') {
          return Err(TemplateError::Unbalanced {
            template: template.to_string(),
          });
        }
        let value = context.get(&name).ok_or_else(|| TemplateError::UnknownPlaceholder {
          placeholder: name.clone(),
          template: template.to_string(),
        })?;
        rendered.push_str(value);
      }
      '}' => {
        return Err(TemplateError::Unbalanced {
          template: template.to_string(),
        });
      }
      _ => rendered.push(ch),
    }
  }

  Ok(rendered)
}
