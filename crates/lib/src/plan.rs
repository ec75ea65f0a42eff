//! Dry-run planning for template expansion.
//!
//! A plan statically classifies every entry of a template's bootstrap tree
//! without touching the target directory or running any scripts. It mirrors
//! the skip rules of the real pipeline (self-defence, once-only markers) and
//! names the output each marker would produce.

use std::path::PathBuf;

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::{ProjectConfig, TemplateConfig};
use crate::expand::{is_once_marker, is_protected};
use crate::markers::{self, BOOTSTRAP_DIR, Marker, TEMPLATE_EXT};

/// What would happen to one bootstrap entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PlanAction {
  /// Copied verbatim (includes renamer scripts, which the rename pass
  /// consumes later).
  Copy,
  /// Rendered to `output`, marker file removed.
  RenderTemplate { output: PathBuf },
  /// Generator script run, output written to `output`.
  RunGenerator { output: PathBuf, once: bool },
  /// Renamed after copying; the final name may come from a renamer script.
  Rename { once: bool },
  /// Skipped: the destination is defended by a workspace project.
  Protected,
  /// Skipped: once-only marker outside init mode.
  SkipOnce,
}

/// A planned action for a single bootstrap entry.
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
  /// Destination path the entry maps to.
  pub path: PathBuf,
  pub action: PlanAction,
}

impl PlanEntry {
  /// Human-readable description of the action.
  pub fn description(&self) -> String {
    match &self.action {
      PlanAction::Copy => "copy".to_string(),
      PlanAction::RenderTemplate { output } => {
        format!("render -> {}", output.display())
      }
      PlanAction::RunGenerator { output, once } => {
        let kind = if *once { "generate once" } else { "generate" };
        format!("{} -> {}", kind, output.display())
      }
      PlanAction::Rename { once } => {
        if *once { "rename once".to_string() } else { "rename".to_string() }
      }
      PlanAction::Protected => "skip (self-defence)".to_string(),
      PlanAction::SkipOnce => "skip (already initialized)".to_string(),
    }
  }

  pub fn is_skip(&self) -> bool {
    matches!(self.action, PlanAction::Protected | PlanAction::SkipOnce)
  }
}

/// The plan for one template.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Plan {
  pub template: String,
  pub entries: Vec<PlanEntry>,
}

impl Plan {
  pub fn change_count(&self) -> usize {
    self.entries.iter().filter(|e| !e.is_skip()).count()
  }

  pub fn has_changes(&self) -> bool {
    self.change_count() > 0
  }
}

/// Compute the plan for a single template of `project`.
pub fn plan_template(
  name: &str,
  template: &TemplateConfig,
  project: &ProjectConfig,
  workspace: &[ProjectConfig],
) -> Plan {
  let bootstrap = project.template_dir(name).join(BOOTSTRAP_DIR);
  let target_root = project.project_root.join(&template.target_dir);

  let mut plan = Plan {
    template: name.to_string(),
    ..Default::default()
  };

  if !bootstrap.exists() {
    return plan;
  }

  // Prefixes of skipped directories; everything below them is skipped too.
  let mut skipped: Vec<PathBuf> = Vec::new();

  for entry in WalkDir::new(&bootstrap)
    .min_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
  {
    let src = entry.path();
    if skipped.iter().any(|prefix| src.starts_with(prefix)) {
      continue;
    }

    let Some(rel) = src.strip_prefix(&bootstrap).ok() else {
      continue;
    };
    let dst = target_root.join(rel);
    let is_dir = entry.file_type().is_dir();

    if is_protected(workspace, &dst) {
      plan.entries.push(PlanEntry {
        path: dst,
        action: PlanAction::Protected,
      });
      if is_dir {
        skipped.push(src.to_path_buf());
      }
      continue;
    }

    let Some(file_name) = src.file_name().and_then(|n| n.to_str()) else {
      continue;
    };

    if !template.init && is_once_marker(file_name, is_dir) {
      plan.entries.push(PlanEntry {
        path: dst,
        action: PlanAction::SkipOnce,
      });
      if is_dir {
        skipped.push(src.to_path_buf());
      }
      continue;
    }

    let action = match Marker::classify(file_name) {
      Some(Marker::Template) if !is_dir => {
        let output = markers::strip_suffix(&dst, TEMPLATE_EXT).unwrap_or_else(|| dst.clone());
        PlanAction::RenderTemplate { output }
      }
      Some(Marker::Gen(marker)) if !is_dir => {
        let output = markers::strip_suffix(&dst, marker.ext()).unwrap_or_else(|| dst.clone());
        PlanAction::RunGenerator {
          output,
          once: marker.is_once(),
        }
      }
      Some(Marker::Rename(rename)) => PlanAction::Rename {
        once: rename.is_once(),
      },
      // Renamer scripts and unmarked files are plain copies; plain
      // directories don't get their own entry.
      _ if is_dir => continue,
      _ => PlanAction::Copy,
    };

    plan.entries.push(PlanEntry { path: dst, action });
  }

  plan
}
