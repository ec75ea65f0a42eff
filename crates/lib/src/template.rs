//! `${...}` placeholder rendering.
//!
//! Template files carry Lua expressions in `${...}` placeholders, evaluated
//! against the script runtime's globals (`config`, `ctx`, `acg`):
//!
//! ```text
//! pub const NAME: &str = "${config.project_name}";
//! ```
//!
//! The scanner is brace-depth aware, so table constructors inside a
//! placeholder work. An expression must evaluate to a string, integer,
//! number, or boolean; `nil` is an error rather than an empty string, so
//! typos in config keys surface instead of silently producing blanks.

use std::fs;
use std::path::{Path, PathBuf};

use mlua::Value;
use thiserror::Error;

use crate::script::ScriptRuntime;

/// Errors that can occur while rendering a template.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("failed to read template {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write rendered file {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("unterminated placeholder at offset {offset} in {}", path.display())]
  Unterminated { path: PathBuf, offset: usize },

  #[error("failed to evaluate `{expr}` in {}: {source}", path.display())]
  Eval {
    path: PathBuf,
    expr: String,
    source: mlua::Error,
  },

  #[error("placeholder `{expr}` in {} produced nil", path.display())]
  NilValue { path: PathBuf, expr: String },

  #[error("placeholder `{expr}` in {} produced a value that cannot be rendered", path.display())]
  Unrenderable { path: PathBuf, expr: String },
}

/// Render all placeholders in `source`. `path` is only used for error
/// reporting.
pub fn render_str(
  runtime: &ScriptRuntime,
  source: &str,
  path: &Path,
) -> Result<String, TemplateError> {
  let mut out = String::with_capacity(source.len());
  let mut rest = source;
  let mut offset = 0usize;

  while let Some(start) = rest.find("${") {
    out.push_str(&rest[..start]);

    let after = &rest[start + 2..];
    let end = find_closing_brace(after).ok_or(TemplateError::Unterminated {
      path: path.to_path_buf(),
      offset: offset + start,
    })?;

    let expr = after[..end].trim();
    out.push_str(&eval_placeholder(runtime, expr, path)?);

    rest = &after[end + 1..];
    offset += start + 2 + end + 1;
  }

  out.push_str(rest);
  Ok(out)
}

/// Render `in_path` into `out_path`.
pub fn render_file(
  runtime: &ScriptRuntime,
  in_path: &Path,
  out_path: &Path,
) -> Result<(), TemplateError> {
  let source = fs::read_to_string(in_path).map_err(|e| TemplateError::Read {
    path: in_path.to_path_buf(),
    source: e,
  })?;

  let rendered = render_str(runtime, &source, in_path)?;

  fs::write(out_path, rendered).map_err(|e| TemplateError::Write {
    path: out_path.to_path_buf(),
    source: e,
  })
}

fn eval_placeholder(
  runtime: &ScriptRuntime,
  expr: &str,
  path: &Path,
) -> Result<String, TemplateError> {
  let value: Value = runtime
    .lua()
    .load(&format!("return {expr}"))
    .set_name(format!("={expr}"))
    .eval()
    .map_err(|e| TemplateError::Eval {
      path: path.to_path_buf(),
      expr: expr.to_string(),
      source: e,
    })?;

  match value {
    Value::String(s) => Ok(
      s.to_str()
        .map_err(|e| TemplateError::Eval {
          path: path.to_path_buf(),
          expr: expr.to_string(),
          source: e,
        })?
        .to_string(),
    ),
    Value::Integer(n) => Ok(n.to_string()),
    Value::Number(n) => Ok(n.to_string()),
    Value::Boolean(b) => Ok(b.to_string()),
    Value::Nil => Err(TemplateError::NilValue {
      path: path.to_path_buf(),
      expr: expr.to_string(),
    }),
    _ => Err(TemplateError::Unrenderable {
      path: path.to_path_buf(),
      expr: expr.to_string(),
    }),
  }
}

/// Index of the `}` closing a placeholder, accounting for nested braces.
fn find_closing_brace(s: &str) -> Option<usize> {
  let mut depth = 0usize;
  for (i, c) in s.char_indices() {
    match c {
      '{' => depth += 1,
      '}' if depth == 0 => return Some(i),
      '}' => depth -= 1,
      _ => {}
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ProjectConfig, TemplateConfig};
  use crate::expand::ExpandContext;
  use std::collections::BTreeMap;
  use tempfile::TempDir;

  fn runtime(root: &Path) -> ScriptRuntime {
    let project = ProjectConfig {
      project_name: "demo".to_string(),
      project_root: root.to_path_buf(),
      templates_root: root.join("acg"),
      workspace: None,
      templates: BTreeMap::new(),
    };
    let ctx = ExpandContext {
      template_name: "example".to_string(),
      template: TemplateConfig::default(),
      workspace: vec![project.clone()],
      project,
      target_root: root.to_path_buf(),
    };
    ScriptRuntime::new(&ctx).unwrap()
  }

  fn render(source: &str) -> Result<String, TemplateError> {
    let temp = TempDir::new().unwrap();
    let rt = runtime(temp.path());
    render_str(&rt, source, Path::new("test.tpl"))
  }

  #[test]
  fn literal_text_passes_through() {
    assert_eq!(render("no placeholders here").unwrap(), "no placeholders here");
  }

  #[test]
  fn substitutes_config_values() {
    assert_eq!(
      render("# ${config.project_name}\n").unwrap(),
      "# demo\n"
    );
  }

  #[test]
  fn evaluates_expressions() {
    assert_eq!(render("${1 + 2}").unwrap(), "3");
    assert_eq!(render("${config.project_name:upper()}").unwrap(), "DEMO");
    assert_eq!(render("${true}").unwrap(), "true");
  }

  #[test]
  fn nested_braces_are_balanced() {
    assert_eq!(render("${({\"a\", \"b\"})[2]}").unwrap(), "b");
  }

  #[test]
  fn multiple_placeholders() {
    assert_eq!(
      render("${config.project_name}-${1 + 1}").unwrap(),
      "demo-2"
    );
  }

  #[test]
  fn unterminated_placeholder_fails() {
    let err = render("before ${config.project_name").unwrap_err();
    assert!(matches!(err, TemplateError::Unterminated { offset: 7, .. }));
  }

  #[test]
  fn nil_placeholder_fails() {
    let err = render("${config.no_such_key}").unwrap_err();
    assert!(matches!(err, TemplateError::NilValue { .. }));
    assert!(err.to_string().contains("no_such_key"));
  }

  #[test]
  fn table_placeholder_fails() {
    let err = render("${ {1, 2} }").unwrap_err();
    assert!(matches!(err, TemplateError::Unrenderable { .. }));
  }

  #[test]
  fn invalid_expression_fails() {
    let err = render("${1 +}").unwrap_err();
    assert!(matches!(err, TemplateError::Eval { .. }));
  }

  #[test]
  fn render_file_writes_output() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(temp.path());

    let in_path = temp.path().join("hello.txt.tpl");
    fs::write(&in_path, "hello ${config.project_name}").unwrap();
    let out_path = temp.path().join("hello.txt");

    render_file(&rt, &in_path, &out_path).unwrap();
    assert_eq!(fs::read_to_string(out_path).unwrap(), "hello demo");
  }
}
