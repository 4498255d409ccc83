//! CLI command handlers, one file per command.

mod completions;
mod get;

pub use completions::run_completions;
pub use get::{run_get, GetArgs};
#[cfg(test)]
pub use get::build_download;
