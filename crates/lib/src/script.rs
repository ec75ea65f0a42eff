//! Embedded Lua runtime for generator and renamer scripts.
//!
//! Generator scripts (`*.gen.lua`, `*.gen1.lua`) must define a global
//! function `generate(ctx)` returning the target file content as a string.
//! Renamer scripts (`*.rename.lua`, `*.ren1.lua`) must define `rename(ctx)`
//! returning the new file name. The same runtime also evaluates `${...}`
//! placeholder expressions for the template renderer.
//!
//! Registered globals:
//! - `config`: project settings (`project_name`, `project_root`,
//!   `templates_root`)
//! - `ctx`: expansion context (`template`, `project`, `workspace`,
//!   `target_root`)
//! - `acg`: tool information (`version`)

use std::fs;
use std::path::{Path, PathBuf};

use mlua::{Function, Lua, Table, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::ProjectConfig;
use crate::expand::ExpandContext;

/// Errors that can occur while running a script.
#[derive(Debug, Error)]
pub enum ScriptError {
  #[error("Lua runtime error: {0}")]
  Runtime(#[from] mlua::Error),

  #[error("script not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read script {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to load script {}: {source}", path.display())]
  Load { path: PathBuf, source: mlua::Error },

  #[error("script {} does not define a '{entry}' function", path.display())]
  MissingEntryPoint { path: PathBuf, entry: &'static str },

  #[error("error in {entry}() from {}: {source}", path.display())]
  EntryPointFailed {
    path: PathBuf,
    entry: &'static str,
    source: mlua::Error,
  },

  #[error("{entry}() in {} must return a string", path.display())]
  NotAString { path: PathBuf, entry: &'static str },
}

/// A Lua runtime primed with the expansion context of one template.
pub struct ScriptRuntime {
  lua: Lua,
}

impl ScriptRuntime {
  /// Create a runtime with `config`, `ctx`, and `acg` globals registered.
  pub fn new(ctx: &ExpandContext) -> Result<Self, ScriptError> {
    let lua = Lua::new();
    register_globals(&lua, ctx)?;
    Ok(Self { lua })
  }

  /// Run a generator script and return the produced file content.
  pub fn run_generator(&self, path: &Path) -> Result<String, ScriptError> {
    self.call_entry_point(path, "generate")
  }

  /// Run a renamer script and return the new file name.
  pub fn run_renamer(&self, path: &Path) -> Result<String, ScriptError> {
    self.call_entry_point(path, "rename")
  }

  /// Access to the underlying Lua state, used by the template renderer.
  pub fn lua(&self) -> &Lua {
    &self.lua
  }

  fn call_entry_point(&self, path: &Path, entry: &'static str) -> Result<String, ScriptError> {
    if !path.is_file() {
      return Err(ScriptError::NotFound {
        path: path.to_path_buf(),
      });
    }

    let source = fs::read_to_string(path).map_err(|e| ScriptError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;

    // Clear any entry point left over from a previous chunk.
    self.lua.globals().set(entry, Value::Nil)?;

    self
      .lua
      .load(&source)
      .set_name(path.to_string_lossy())
      .exec()
      .map_err(|e| ScriptError::Load {
        path: path.to_path_buf(),
        source: e,
      })?;

    let func: Function =
      self
        .lua
        .globals()
        .get(entry)
        .map_err(|_| ScriptError::MissingEntryPoint {
          path: path.to_path_buf(),
          entry,
        })?;

    let ctx: Table = self.lua.globals().get("ctx")?;
    debug!(script = %path.display(), entry, "calling script entry point");

    let value: Value = func.call(ctx).map_err(|e| ScriptError::EntryPointFailed {
      path: path.to_path_buf(),
      entry,
      source: e,
    })?;

    match value {
      Value::String(s) => Ok(s.to_str()?.to_string()),
      _ => Err(ScriptError::NotAString {
        path: path.to_path_buf(),
        entry,
      }),
    }
  }
}

fn register_globals(lua: &Lua, ctx: &ExpandContext) -> mlua::Result<()> {
  let globals = lua.globals();

  let config = project_table(lua, &ctx.project)?;
  globals.set("config", config)?;

  let template = lua.create_table()?;
  template.set("name", ctx.template_name.as_str())?;
  template.set(
    "target_dir",
    ctx.template.target_dir.to_string_lossy().to_string(),
  )?;
  template.set("init", ctx.template.init)?;
  template.set("self_defence", ctx.template.self_defence)?;

  let workspace = lua.create_table()?;
  for (i, project) in ctx.workspace.iter().enumerate() {
    workspace.set(i + 1, project_table(lua, project)?)?;
  }

  let ctx_table = lua.create_table()?;
  ctx_table.set("template", template)?;
  ctx_table.set("project", project_table(lua, &ctx.project)?)?;
  ctx_table.set("workspace", workspace)?;
  ctx_table.set(
    "target_root",
    ctx.target_root.to_string_lossy().to_string(),
  )?;
  globals.set("ctx", ctx_table)?;

  let acg = lua.create_table()?;
  acg.set("version", env!("CARGO_PKG_VERSION"))?;
  globals.set("acg", acg)?;

  Ok(())
}

fn project_table(lua: &Lua, project: &ProjectConfig) -> mlua::Result<Table> {
  let table = lua.create_table()?;
  table.set("project_name", project.project_name.as_str())?;
  table.set(
    "project_root",
    project.project_root.to_string_lossy().to_string(),
  )?;
  table.set(
    "templates_root",
    project.templates_root.to_string_lossy().to_string(),
  )?;
  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::TemplateConfig;
  use std::collections::BTreeMap;
  use tempfile::TempDir;

  fn test_ctx(target_root: &Path) -> ExpandContext {
    let project = ProjectConfig {
      project_name: "demo".to_string(),
      project_root: target_root.to_path_buf(),
      templates_root: target_root.join("acg"),
      workspace: None,
      templates: BTreeMap::new(),
    };
    ExpandContext {
      template_name: "example".to_string(),
      template: TemplateConfig::default(),
      workspace: vec![project.clone()],
      project,
      target_root: target_root.to_path_buf(),
    }
  }

  fn write_script(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).unwrap();
    path
  }

  #[test]
  fn generator_sees_context() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let script = write_script(
      temp.path(),
      "mod.rs.gen.lua",
      r#"
      function generate(ctx)
        return "project: " .. config.project_name .. ", template: " .. ctx.template.name
      end
      "#,
    );

    let output = runtime.run_generator(&script).unwrap();
    assert_eq!(output, "project: demo, template: example");
  }

  #[test]
  fn renamer_returns_new_name() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let script = write_script(
      temp.path(),
      "lib.rename.lua",
      r#"
      function rename(ctx)
        return config.project_name .. ".rs"
      end
      "#,
    );

    assert_eq!(runtime.run_renamer(&script).unwrap(), "demo.rs");
  }

  #[test]
  fn missing_entry_point_is_an_error() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let script = write_script(temp.path(), "bad.gen.lua", "local x = 1");

    let err = runtime.run_generator(&script).unwrap_err();
    assert!(matches!(err, ScriptError::MissingEntryPoint { entry: "generate", .. }));
  }

  #[test]
  fn entry_point_does_not_leak_between_scripts() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let good = write_script(
      temp.path(),
      "good.gen.lua",
      "function generate(ctx) return \"ok\" end",
    );
    let bad = write_script(temp.path(), "bad.gen.lua", "local x = 1");

    assert_eq!(runtime.run_generator(&good).unwrap(), "ok");
    // The previous script's generate() must not be reused.
    let err = runtime.run_generator(&bad).unwrap_err();
    assert!(matches!(err, ScriptError::MissingEntryPoint { .. }));
  }

  #[test]
  fn non_string_result_is_an_error() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let script = write_script(
      temp.path(),
      "bad.gen.lua",
      "function generate(ctx) return 42 end",
    );

    let err = runtime.run_generator(&script).unwrap_err();
    assert!(matches!(err, ScriptError::NotAString { .. }));
  }

  #[test]
  fn script_error_is_reported_with_path() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let script = write_script(
      temp.path(),
      "boom.gen.lua",
      "function generate(ctx) error(\"boom\") end",
    );

    let err = runtime.run_generator(&script).unwrap_err();
    assert!(matches!(err, ScriptError::EntryPointFailed { .. }));
    assert!(err.to_string().contains("boom.gen.lua"));
  }

  #[test]
  fn missing_script_file() {
    let temp = TempDir::new().unwrap();
    let runtime = ScriptRuntime::new(&test_ctx(temp.path())).unwrap();

    let err = runtime
      .run_generator(&temp.path().join("nope.gen.lua"))
      .unwrap_err();
    assert!(matches!(err, ScriptError::NotFound { .. }));
  }
}
