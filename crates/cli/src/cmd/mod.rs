mod generate;
mod init;
mod plan;
mod status;

pub use generate::cmd_generate;
pub use init::cmd_init;
pub use plan::cmd_plan;
pub use status::cmd_status;

use anyhow::Result;

// Helper to convert library errors to anyhow::Error (works around mlua not
// being Send+Sync).
pub(crate) fn map_lib_err<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T> {
  result.map_err(|e| anyhow::anyhow!("{}", e))
}
