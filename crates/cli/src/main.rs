use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// autocodegen - Workspace-aware project scaffolding and code generation
#[derive(Parser)]
#[command(name = "acg")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Expand all templates in the workspace (default)
  Generate {
    /// Directory inside the workspace (default: current directory)
    path: Option<PathBuf>,
  },

  /// Show what an expansion would do without touching the target (dry-run)
  Plan {
    /// Directory inside the workspace (default: current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Scaffold a new workspace
  Init {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    path: String,
  },

  /// Show workspace information
  Status {
    /// Directory inside the workspace (default: current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() {
  // Initialize logging
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  if let Err(e) = run() {
    output::print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let cli = Cli::parse();

  // Running `acg` without a subcommand expands the surrounding workspace.
  match cli.command.unwrap_or(Commands::Generate { path: None }) {
    Commands::Generate { path } => cmd::cmd_generate(path.as_deref(), cli.verbose),
    Commands::Plan { path, json } => cmd::cmd_plan(path.as_deref(), json),
    Commands::Init { path } => cmd::cmd_init(&path),
    Commands::Status { path, json } => cmd::cmd_status(path.as_deref(), cli.verbose, json),
  }
}
