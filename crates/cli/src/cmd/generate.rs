//! Implementation of the `acg generate` command.
//!
//! Discovers the surrounding workspace and expands every template of every
//! project, root project first.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use acg_lib::expand_template;
use acg_lib::workspace::Workspace;

use crate::cmd::map_lib_err;
use crate::output::{print_info, print_success, symbols};

pub fn cmd_generate(path: Option<&Path>, verbose: bool) -> Result<()> {
  let start = match path {
    Some(p) => p.to_path_buf(),
    None => env::current_dir().context("Failed to determine current directory")?,
  };

  let workspace = Workspace::discover(&start)?;
  print_info(&format!("Workspace: {}", workspace.root.display()));

  let mut total = 0;
  for project in &workspace.projects {
    for (name, template) in &project.templates {
      let report = map_lib_err(expand_template(name, template, project, &workspace.projects))
        .with_context(|| format!("Failed to expand template: {}", name))?;

      if report.is_empty() {
        continue;
      }

      print_success(&format!(
        "{}: {} change(s)",
        name,
        report.change_count()
      ));

      if verbose {
        for path in &report.copied {
          print_change(symbols::ADD, path, "copied");
        }
        for path in &report.rendered {
          print_change(symbols::ADD, path, "rendered");
        }
        for path in &report.generated {
          print_change(symbols::ADD, path, "generated");
        }
        for (from, to) in &report.renamed {
          println!(
            "  {} {} {} {}",
            symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
            from.display(),
            symbols::ARROW,
            to.display()
          );
        }
        for path in &report.protected {
          print_change(symbols::SKIP, path, "self-defence");
        }
      }

      total += report.change_count();
    }
  }

  if total == 0 {
    print_info("No changes");
  } else {
    print_success(&format!("Done, {} change(s)", total));
  }

  Ok(())
}

fn print_change(symbol: &str, path: &Path, label: &str) {
  println!(
    "  {} {} {}",
    symbol.if_supports_color(Stream::Stdout, |s| s.green()),
    path.display(),
    format!("({})", label).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}
