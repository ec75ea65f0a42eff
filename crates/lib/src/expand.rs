//! Template expansion pipeline.
//!
//! Expanding a template runs these passes over its target directory:
//! 1. copy the `bootstrap/` tree into the target, honoring self-defence and
//!    skipping once-only markers when the template is not in init mode
//! 2. render `*.tpl` placeholder templates and delete the sources
//! 3. in init mode, run `*.gen1.lua` generators and `*.ren1` renames
//! 4. run `*.gen.lua` generators and `*.rename` renames
//!
//! Rename passes move files before directories, so a renamed file inside a
//! renamed directory is handled exactly once. Every pass records what it did
//! in an [`ExpandReport`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ProjectConfig, TemplateConfig};
use crate::fsutil;
use crate::markers::{self, BOOTSTRAP_DIR, GenMarker, RenameMarker, TEMPLATE_EXT};
use crate::script::{ScriptError, ScriptRuntime};
use crate::template::{self, TemplateError};

/// Errors that can occur during expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
  #[error(transparent)]
  Script(#[from] ScriptError),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error("failed to copy bootstrap tree {}: {source}", path.display())]
  CopyBootstrap { path: PathBuf, source: std::io::Error },

  #[error("failed to write target file {}: {source}", path.display())]
  WriteTarget { path: PathBuf, source: std::io::Error },

  #[error("failed to rename {} -> {}: {source}", from.display(), to.display())]
  Rename {
    from: PathBuf,
    to: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to remove {}: {source}", path.display())]
  Remove { path: PathBuf, source: std::io::Error },

  #[error("path is not valid UTF-8: {}", path.display())]
  NonUtf8Path { path: PathBuf },
}

/// Everything a template expansion needs to know, exposed to scripts as the
/// `ctx` global.
#[derive(Debug, Clone)]
pub struct ExpandContext {
  pub template_name: String,
  pub template: TemplateConfig,
  pub project: ProjectConfig,
  /// All projects in the workspace, root first. Used for self-defence.
  pub workspace: Vec<ProjectConfig>,
  pub target_root: PathBuf,
}

impl ExpandContext {
  /// Template areas of every workspace project. Marker scans skip these so
  /// template sources are only ever read through the bootstrap copy.
  fn protected_roots(&self) -> Vec<PathBuf> {
    self.workspace.iter().map(|p| p.templates_root.clone()).collect()
  }
}

/// What one template expansion did.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExpandReport {
  pub template: String,
  /// Files copied from the bootstrap tree.
  pub copied: Vec<PathBuf>,
  /// Outputs written by the template renderer.
  pub rendered: Vec<PathBuf>,
  /// Outputs written by generator scripts.
  pub generated: Vec<PathBuf>,
  /// Applied renames (from, to).
  pub renamed: Vec<(PathBuf, PathBuf)>,
  /// Destinations skipped by self-defence.
  pub protected: Vec<PathBuf>,
}

impl ExpandReport {
  pub fn change_count(&self) -> usize {
    self.copied.len() + self.rendered.len() + self.generated.len() + self.renamed.len()
  }

  pub fn is_empty(&self) -> bool {
    self.change_count() == 0 && self.protected.is_empty()
  }
}

/// Expand a single template of `project` into its target directory.
///
/// `workspace` must contain every project in the workspace (including
/// `project` itself); their template areas are defended against overwrites.
pub fn expand_template(
  name: &str,
  template: &TemplateConfig,
  project: &ProjectConfig,
  workspace: &[ProjectConfig],
) -> Result<ExpandReport, ExpandError> {
  let bootstrap = project.template_dir(name).join(BOOTSTRAP_DIR);
  let target_root = project.project_root.join(&template.target_dir);

  let mut report = ExpandReport {
    template: name.to_string(),
    ..Default::default()
  };

  if !bootstrap.exists() {
    debug!(template = name, "no bootstrap directory, nothing to expand");
    return Ok(report);
  }

  info!(template = name, target = %target_root.display(), "expanding template");

  let ctx = ExpandContext {
    template_name: name.to_string(),
    template: template.clone(),
    project: project.clone(),
    workspace: workspace.to_vec(),
    target_root,
  };

  copy_bootstrap(&ctx, &bootstrap, &mut report)?;

  let runtime = ScriptRuntime::new(&ctx)?;
  render_templates(&ctx, &runtime, &mut report)?;

  if ctx.template.init {
    run_generators(&ctx, &runtime, GenMarker::Once, &mut report)?;
    process_renames(&ctx, &runtime, RenameMarker::Once, &mut report)?;
  }

  run_generators(&ctx, &runtime, GenMarker::Renewable, &mut report)?;
  process_renames(&ctx, &runtime, RenameMarker::Renewable, &mut report)?;

  Ok(report)
}

/// Whether any workspace project defends `target`.
pub fn is_protected(workspace: &[ProjectConfig], target: &Path) -> bool {
  workspace.iter().any(|p| p.protects(target))
}

/// Whether a bootstrap entry is skipped because its once-only marker must
/// not be re-expanded outside init mode.
pub fn is_once_marker(name: &str, is_dir: bool) -> bool {
  name.ends_with(RenameMarker::Once.ext())
    || name.ends_with(RenameMarker::Once.renamer_ext())
    || (!is_dir && name.ends_with(GenMarker::Once.ext()))
}

fn copy_bootstrap(
  ctx: &ExpandContext,
  bootstrap: &Path,
  report: &mut ExpandReport,
) -> Result<(), ExpandError> {
  let mut copied = Vec::new();
  let mut protected = Vec::new();

  let workspace = &ctx.workspace;
  let init = ctx.template.init;

  let mut ignore = |src: &Path, dst: &Path| {
    if is_protected(workspace, dst) {
      debug!(path = %dst.display(), "self-defence, not overwriting");
      protected.push(dst.to_path_buf());
      return true;
    }
    if !init
      && let Some(name) = src.file_name().and_then(|n| n.to_str())
      && is_once_marker(name, src.is_dir())
    {
      debug!(path = %src.display(), "once-only marker, skipping re-init");
      return true;
    }
    false
  };

  fsutil::copy_tree(bootstrap, &ctx.target_root, &mut ignore, &mut copied).map_err(|e| {
    ExpandError::CopyBootstrap {
      path: bootstrap.to_path_buf(),
      source: e,
    }
  })?;

  report.copied = copied;
  report.protected = protected;
  Ok(())
}

fn render_templates(
  ctx: &ExpandContext,
  runtime: &ScriptRuntime,
  report: &mut ExpandReport,
) -> Result<(), ExpandError> {
  let sources = fsutil::paths_by_ext(&ctx.target_root, TEMPLATE_EXT, false, &ctx.protected_roots());

  for source in &sources {
    let out_path =
      markers::strip_suffix(source, TEMPLATE_EXT).ok_or_else(|| ExpandError::NonUtf8Path {
        path: source.clone(),
      })?;

    info!(output = %out_path.display(), "rendering template");
    template::render_file(runtime, source, &out_path)?;
    fsutil::copy_permissions(source, &out_path).map_err(|e| ExpandError::WriteTarget {
      path: out_path.clone(),
      source: e,
    })?;

    report.rendered.push(out_path);
  }

  for source in &sources {
    fs::remove_file(source).map_err(|e| ExpandError::Remove {
      path: source.clone(),
      source: e,
    })?;
  }

  Ok(())
}

fn run_generators(
  ctx: &ExpandContext,
  runtime: &ScriptRuntime,
  marker: GenMarker,
  report: &mut ExpandReport,
) -> Result<(), ExpandError> {
  let scripts = fsutil::paths_by_ext(&ctx.target_root, marker.ext(), false, &ctx.protected_roots());

  for script in &scripts {
    let target =
      markers::strip_suffix(script, marker.ext()).ok_or_else(|| ExpandError::NonUtf8Path {
        path: script.clone(),
      })?;

    info!(output = %target.display(), "running generator");
    let content = runtime.run_generator(script)?;
    fs::write(&target, content).map_err(|e| ExpandError::WriteTarget {
      path: target.clone(),
      source: e,
    })?;
    fsutil::copy_permissions(script, &target).map_err(|e| ExpandError::WriteTarget {
      path: target.clone(),
      source: e,
    })?;

    report.generated.push(target);
  }

  for script in &scripts {
    fs::remove_file(script).map_err(|e| ExpandError::Remove {
      path: script.clone(),
      source: e,
    })?;
  }

  Ok(())
}

fn process_renames(
  ctx: &ExpandContext,
  runtime: &ScriptRuntime,
  marker: RenameMarker,
  report: &mut ExpandReport,
) -> Result<(), ExpandError> {
  let origins = fsutil::paths_by_ext(&ctx.target_root, marker.ext(), true, &ctx.protected_roots());

  let mut dirs = Vec::new();

  for origin in origins {
    let dest = rename_destination(runtime, &origin, marker)?;

    if origin.is_dir() {
      dirs.push((origin, dest));
    } else {
      info!(from = %origin.display(), to = %dest.display(), "renaming");
      fsutil::move_path(&origin, &dest).map_err(|e| ExpandError::Rename {
        from: origin.clone(),
        to: dest.clone(),
        source: e,
      })?;
      report.renamed.push((origin, dest));
    }
  }

  for (origin, dest) in dirs {
    info!(from = %origin.display(), to = %dest.display(), "renaming directory");
    fsutil::move_path(&origin, &dest).map_err(|e| ExpandError::Rename {
      from: origin.clone(),
      to: dest.clone(),
      source: e,
    })?;
    report.renamed.push((origin, dest));
  }

  Ok(())
}

/// Destination for a rename marker: the path without the marker, unless a
/// sibling renamer script supplies a new name. The renamer is deleted after
/// use.
fn rename_destination(
  runtime: &ScriptRuntime,
  origin: &Path,
  marker: RenameMarker,
) -> Result<PathBuf, ExpandError> {
  let stripped =
    markers::strip_suffix(origin, marker.ext()).ok_or_else(|| ExpandError::NonUtf8Path {
      path: origin.to_path_buf(),
    })?;

  let renamer = PathBuf::from(format!(
    "{}{}",
    stripped.to_string_lossy(),
    marker.renamer_ext()
  ));

  if renamer.is_file() {
    let new_name = runtime.run_renamer(&renamer)?;
    let dest = renamer
      .parent()
      .unwrap_or_else(|| Path::new("."))
      .join(new_name);

    fs::remove_file(&renamer).map_err(|e| ExpandError::Remove {
      path: renamer.clone(),
      source: e,
    })?;

    return Ok(dest);
  }

  Ok(stripped)
}
