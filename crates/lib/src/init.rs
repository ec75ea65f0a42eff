//! Scaffold a new autocodegen workspace.
//!
//! This module provides the core logic for the `acg init` command, which
//! creates:
//! - `acg/config.toml` with the project name filled in
//! - an `example` template with a `.tpl` file demonstrating placeholders

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::markers::BOOTSTRAP_DIR;
use crate::workspace::ACG_DIR;

/// Template for acg/config.toml. Contains a {project_name} placeholder for
/// substitution.
const CONFIG_TOML_TEMPLATE: &str = r#"[autocodegen]
project_name = "{project_name}"

# Each template lives in a directory next to this file; its bootstrap/
# subtree is expanded into the target directory on `acg generate`.
#
# [templates.example]
# target_dir = "."
# init = true
# self_defence = true
"#;

/// Example template demonstrating `${...}` placeholders.
const EXAMPLE_README_TPL: &str = r#"# ${config.project_name}

Generated by acg ${acg.version} from the `${ctx.template.name}` template.
"#;

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("file already exists: {}", path.display())]
  PathExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },
}

/// Options for initializing a workspace.
pub struct InitOptions {
  /// Directory to turn into a workspace root.
  pub path: PathBuf,
}

/// Result of a successful initialization.
#[derive(Debug)]
pub struct InitResult {
  /// The workspace root (canonicalized).
  pub project_root: PathBuf,
  /// Path to the created acg/config.toml.
  pub config_toml: PathBuf,
  /// Path to the created example template directory.
  pub example_template: PathBuf,
}

/// Initialize a new autocodegen workspace at `options.path`.
///
/// The project name defaults to the directory's file stem.
///
/// # Errors
///
/// Returns an error if `acg/config.toml` already exists, or if directory
/// creation or file writing fails.
pub fn init(options: &InitOptions) -> Result<InitResult, InitError> {
  let root = &options.path;

  // The directory must exist before it can be canonicalized.
  fs::create_dir_all(root).map_err(|e| InitError::CreateDir {
    path: root.clone(),
    source: e,
  })?;
  let root = dunce::canonicalize(root).map_err(|e| InitError::Canonicalize {
    path: options.path.clone(),
    source: e,
  })?;

  let acg_dir = root.join(ACG_DIR);
  let config_toml = acg_dir.join("config.toml");
  if config_toml.exists() {
    return Err(InitError::PathExists { path: config_toml });
  }

  let project_name = root
    .file_stem()
    .map(|s| s.to_string_lossy().to_string())
    .unwrap_or_else(|| "project".to_string());

  let example_template = acg_dir.join("example");
  let bootstrap = example_template.join(BOOTSTRAP_DIR);
  fs::create_dir_all(&bootstrap).map_err(|e| InitError::CreateDir {
    path: bootstrap.clone(),
    source: e,
  })?;

  let config_content = CONFIG_TOML_TEMPLATE.replace("{project_name}", &project_name);
  fs::write(&config_toml, config_content).map_err(|e| InitError::WriteFile {
    path: config_toml.clone(),
    source: e,
  })?;

  let readme_tpl = bootstrap.join("README.md.tpl");
  fs::write(&readme_tpl, EXAMPLE_README_TPL).map_err(|e| InitError::WriteFile {
    path: readme_tpl,
    source: e,
  })?;

  Ok(InitResult {
    project_root: root,
    config_toml,
    example_template,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn init_creates_config_and_example() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("myproj");

    let result = init(&InitOptions { path: root.clone() }).unwrap();

    assert!(result.config_toml.exists());
    assert!(result.example_template.join(BOOTSTRAP_DIR).join("README.md.tpl").exists());

    let config = fs::read_to_string(&result.config_toml).unwrap();
    assert!(config.contains("project_name = \"myproj\""));
    assert!(!config.contains("{project_name}"));
  }

  #[test]
  fn init_fails_if_config_exists() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("proj");
    fs::create_dir_all(root.join(ACG_DIR)).unwrap();
    fs::write(root.join(ACG_DIR).join("config.toml"), "[autocodegen]\n").unwrap();

    let err = init(&InitOptions { path: root }).unwrap_err();
    assert!(matches!(err, InitError::PathExists { .. }));
    assert!(err.to_string().contains("config.toml"));
  }

  #[test]
  fn init_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("nested").join("path").join("proj");

    let result = init(&InitOptions { path: root }).unwrap();
    assert!(result.config_toml.exists());
  }

  #[test]
  fn initialized_workspace_is_discoverable() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("proj");

    let result = init(&InitOptions { path: root }).unwrap();

    let workspace = crate::workspace::Workspace::discover(&result.project_root).unwrap();
    let project = workspace.root_project();
    assert_eq!(project.project_name, "proj");
    assert!(project.templates.contains_key("example"));
  }
}
