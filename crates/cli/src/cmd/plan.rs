//! Implementation of the `acg plan` command.
//!
//! Computes what `acg generate` would do for every template in the workspace
//! without touching the target directories or running any scripts.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use acg_lib::plan::{Plan, PlanAction, plan_template};
use acg_lib::workspace::Workspace;

use crate::output::{print_info, print_json, symbols};

pub fn cmd_plan(path: Option<&Path>, json: bool) -> Result<()> {
  let start = match path {
    Some(p) => p.to_path_buf(),
    None => env::current_dir().context("Failed to determine current directory")?,
  };

  let workspace = Workspace::discover(&start)?;

  let mut plans: Vec<Plan> = Vec::new();
  for project in &workspace.projects {
    for (name, template) in &project.templates {
      plans.push(plan_template(name, template, project, &workspace.projects));
    }
  }

  if json {
    return print_json(&plans);
  }

  let total: usize = plans.iter().map(|p| p.change_count()).sum();
  if total == 0 {
    print_info("No changes would be made");
    return Ok(());
  }

  for plan in plans.iter().filter(|p| !p.entries.is_empty()) {
    println!("{}:", plan.template.if_supports_color(Stream::Stdout, |s| s.bold()));
    for entry in &plan.entries {
      let symbol = match &entry.action {
        PlanAction::Copy
        | PlanAction::RenderTemplate { .. }
        | PlanAction::RunGenerator { .. } => {
          symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
        }
        PlanAction::Rename { .. } => {
          symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string()
        }
        PlanAction::Protected | PlanAction::SkipOnce => {
          symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string()
        }
      };

      println!(
        "  {} {} {}",
        symbol,
        entry.path.display(),
        format!("({})", entry.description()).if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
  }

  println!();
  print_info(&format!("Would apply {} change(s)", total));

  Ok(())
}
