//! acg-lib: Core types and logic for autocodegen
//!
//! This crate provides the building blocks of the `acg` tool:
//! - `config`: per-project configuration loaded from `acg/config.toml`
//! - `workspace`: workspace-root discovery and member loading
//! - `expand`: the template expansion pipeline
//! - `plan`: dry-run classification of what an expansion would do
//! - `script`: the embedded Lua runtime for generator and renamer scripts
//! - `init`: scaffolding for new workspaces

pub mod config;
pub mod expand;
pub mod fsutil;
pub mod init;
pub mod markers;
pub mod plan;
pub mod script;
pub mod template;
pub mod workspace;

pub use config::{ProjectConfig, TemplateConfig, WorkspaceConfig};
pub use expand::{ExpandContext, ExpandError, ExpandReport, expand_template};
pub use plan::{Plan, PlanAction, PlanEntry, plan_template};
pub use workspace::{Workspace, WorkspaceError, find_project_root};
