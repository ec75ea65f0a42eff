//! Workspace discovery and loading.
//!
//! A workspace root is the topmost directory containing an `acg/`
//! subdirectory. The root project's config may declare `[workspace].members`;
//! each member must carry its own `acg/` directory and may not declare a
//! nested workspace.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, ProjectConfig};

/// Name of the per-project configuration directory.
pub const ACG_DIR: &str = "acg";

/// Errors that can occur during workspace discovery.
#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("not an autocodegen workspace (or any of the parent directories): acg")]
  NotFound,

  #[error("missing \"acg\" directory in workspace member: {}", member.display())]
  MemberMissing { member: PathBuf },

  #[error("workspace member may not contain a nested workspace: {}", root.display())]
  NestedWorkspace { root: PathBuf },

  #[error("failed to canonicalize {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: std::io::Error },

  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Find the topmost ancestor of `start` (inclusive) containing an `acg/`
/// directory.
///
/// When workspaces nest on disk, the outermost one wins; members are then
/// reached through the root config rather than by their own position.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
  let mut topmost = None;
  for dir in start.ancestors() {
    if dir.join(ACG_DIR).is_dir() {
      topmost = Some(dir.to_path_buf());
    }
  }
  topmost
}

/// A discovered workspace: the root project followed by its members.
#[derive(Debug, Clone)]
pub struct Workspace {
  /// Canonicalized workspace root directory.
  pub root: PathBuf,

  /// Project configurations, root project first, members in declaration
  /// order.
  pub projects: Vec<ProjectConfig>,
}

impl Workspace {
  /// Discover and load the workspace containing `start`.
  pub fn discover(start: &Path) -> Result<Self, WorkspaceError> {
    let start = dunce::canonicalize(start).map_err(|e| WorkspaceError::Canonicalize {
      path: start.to_path_buf(),
      source: e,
    })?;

    let root = find_project_root(&start).ok_or(WorkspaceError::NotFound)?;
    debug!(root = %root.display(), "workspace root found");

    let root_config = ProjectConfig::load(&root.join(ACG_DIR), None)?;
    let root_name = root_config.project_name.clone();
    let members = root_config
      .workspace
      .as_ref()
      .map(|w| w.members.clone())
      .unwrap_or_default();

    let mut projects = vec![root_config];

    for member in members {
      let acg_dir = root.join(&member).join(ACG_DIR);
      if !acg_dir.is_dir() {
        return Err(WorkspaceError::MemberMissing { member });
      }

      let config = ProjectConfig::load(&acg_dir, Some(&root_name))?;
      if config.workspace.is_some() {
        return Err(WorkspaceError::NestedWorkspace {
          root: config.project_root,
        });
      }

      debug!(member = %member.display(), "loaded workspace member");
      projects.push(config);
    }

    Ok(Self { root, projects })
  }

  /// The root project's configuration.
  pub fn root_project(&self) -> &ProjectConfig {
    &self.projects[0]
  }
}
