//! Project configuration loaded from `acg/config.toml`.
//!
//! Every project in a workspace owns an `acg/` directory. Its optional
//! `config.toml` names the project, declares workspace members (root project
//! only), and tunes per-template settings. Template directories that exist
//! under `acg/` but are not mentioned in the file are picked up with default
//! settings, so a bare `acg/<name>/bootstrap/` tree is a valid template.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading a project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("invalid config {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("failed to list templates in {}: {source}", path.display())]
  ListTemplates { path: PathBuf, source: std::io::Error },
}

/// Settings for a single template, from `[templates.<name>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TemplateConfig {
  /// Expansion target, relative to the project root.
  pub target_dir: PathBuf,

  /// Whether once-only markers (`.gen1.lua`, `.ren1`) are expanded.
  pub init: bool,

  /// Protect this template's files from being overwritten by other
  /// templates during expansion.
  pub self_defence: bool,
}

impl Default for TemplateConfig {
  fn default() -> Self {
    Self {
      target_dir: PathBuf::from("."),
      init: true,
      self_defence: true,
    }
  }
}

/// The `[workspace]` section. Only valid in the root project's config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
  /// Member directories, relative to the workspace root.
  #[serde(default)]
  pub members: Vec<PathBuf>,
}

/// Raw on-disk shape of `acg/config.toml`. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
  #[serde(default)]
  autocodegen: RawAutocodegen,
  workspace: Option<WorkspaceConfig>,
  #[serde(default)]
  templates: BTreeMap<String, TemplateConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAutocodegen {
  project_name: Option<String>,
}

/// Resolved configuration for one project in a workspace.
///
/// Fully determined at load time and never mutated afterward. Templates are
/// kept in a `BTreeMap` so expansion order is deterministic across runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectConfig {
  /// Display name, used as `config.project_name` in scripts and templates.
  pub project_name: String,

  /// Parent of the `acg/` directory.
  pub project_root: PathBuf,

  /// The `acg/` directory itself.
  pub templates_root: PathBuf,

  /// Workspace members, if this is the root project of a workspace.
  pub workspace: Option<WorkspaceConfig>,

  /// All templates, declared and discovered.
  pub templates: BTreeMap<String, TemplateConfig>,
}

impl ProjectConfig {
  /// Load and resolve the configuration for the given `acg/` directory.
  ///
  /// A missing `config.toml` is treated as an empty configuration. The
  /// project name falls back to `project_name_default` (the workspace
  /// root's name, for members) and then to the project root's file stem.
  pub fn load(acg_dir: &Path, project_name_default: Option<&str>) -> Result<Self, ConfigError> {
    let config_path = acg_dir.join("config.toml");

    let raw = if config_path.is_file() {
      let text = fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
        path: config_path.clone(),
        source: e,
      })?;
      toml::from_str::<RawConfig>(&text).map_err(|e| ConfigError::Parse {
        path: config_path.clone(),
        source: e,
      })?
    } else {
      debug!(path = %config_path.display(), "no config.toml, using defaults");
      RawConfig::default()
    };

    let project_root = acg_dir
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| PathBuf::from("."));

    let project_name = raw
      .autocodegen
      .project_name
      .or_else(|| project_name_default.map(str::to_string))
      .or_else(|| {
        project_root
          .file_stem()
          .map(|s| s.to_string_lossy().into_owned())
      })
      .unwrap_or_else(|| "project".to_string());

    let mut templates = raw.templates;

    // Pick up template directories not named in the config.
    let entries = fs::read_dir(acg_dir).map_err(|e| ConfigError::ListTemplates {
      path: acg_dir.to_path_buf(),
      source: e,
    })?;
    for entry in entries {
      let entry = entry.map_err(|e| ConfigError::ListTemplates {
        path: acg_dir.to_path_buf(),
        source: e,
      })?;
      if !entry.path().is_dir() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().into_owned();
      templates.entry(name).or_default();
    }

    Ok(Self {
      project_name,
      project_root,
      templates_root: acg_dir.to_path_buf(),
      workspace: raw.workspace,
      templates,
    })
  }

  /// Directory holding the named template.
  pub fn template_dir(&self, name: &str) -> PathBuf {
    self.templates_root.join(name)
  }

  /// Whether this project defends `target` against expansion.
  ///
  /// Everything inside the project's `acg/` tree is protected, except the
  /// contents of template directories that opt out with
  /// `self_defence = false`. The `acg/` directory itself is not protected
  /// (creating it is fine).
  pub fn protects(&self, target: &Path) -> bool {
    if target == self.templates_root {
      return false;
    }
    if !target.starts_with(&self.templates_root) {
      return false;
    }
    for (name, template) in &self.templates {
      if target.starts_with(self.template_dir(name)) {
        return template.self_defence;
      }
    }
    // Directly inside acg/ (config.toml, unclassified files).
    true
  }
}
