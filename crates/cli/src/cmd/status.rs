//! Status command implementation.
//!
//! Displays the discovered workspace: root directory, projects, and their
//! templates.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};

use acg_lib::workspace::Workspace;

use crate::output::{self, print_json, print_stat, print_success};

pub fn cmd_status(path: Option<&Path>, verbose: bool, json: bool) -> Result<()> {
  let start = match path {
    Some(p) => p.to_path_buf(),
    None => env::current_dir().context("Failed to determine current directory")?,
  };
  let workspace = Workspace::discover(&start)?;

  if json {
    let projects: Vec<_> = workspace
      .projects
      .iter()
      .map(|p| {
        serde_json::json!({
          "name": p.project_name,
          "root": p.project_root,
          "templates": p.templates.keys().collect::<Vec<_>>(),
        })
      })
      .collect();
    let json_output = serde_json::json!({
      "root": workspace.root,
      "projects": projects,
    });
    return print_json(&json_output);
  }

  print_success(&format!("Workspace: {}", workspace.root.display()));
  print_stat("Project", &workspace.root_project().project_name);
  print_stat("Projects", &workspace.projects.len().to_string());

  let template_count: usize = workspace.projects.iter().map(|p| p.templates.len()).sum();
  print_stat("Templates", &template_count.to_string());

  if verbose {
    for project in &workspace.projects {
      println!();
      println!("{}:", project.project_root.display());
      for (name, template) in &project.templates {
        println!(
          "  {} {} -> {}",
          output::symbols::INFO,
          name,
          template.target_dir.display()
        );
      }
    }
  }

  Ok(())
}
