//! Implementation of the `acg init` command.
//!
//! Scaffolds a new workspace with an `acg/config.toml` and an example
//! template.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use acg_lib::init::{InitOptions, init};

use crate::output::symbols;

pub fn cmd_init(path: &str) -> Result<()> {
  let options = InitOptions {
    path: Path::new(path).to_path_buf(),
  };

  let result = init(&options).context("Failed to initialize workspace")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized autocodegen workspace!".green().bold()
  );
  println!();
  println!(
    "  {} Workspace root: {}",
    symbols::INFO.cyan(),
    result.project_root.display()
  );
  println!(
    "  {} Config:         {}",
    symbols::INFO.cyan(),
    result.config_toml.display()
  );
  println!(
    "  {} Example:        {}",
    symbols::INFO.cyan(),
    result.example_template.display()
  );
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Edit {} and add your templates",
    result.config_toml.display().to_string().cyan()
  );
  println!(
    "  2. Run: {}",
    format!("acg generate {}", result.project_root.display()).cyan()
  );

  Ok(())
}
