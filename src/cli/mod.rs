pub mod commands;
mod completion;
mod context;
pub mod output;
mod shell;

pub use context::{CliError, CliMode, CommandError, CommandResult, ShellContext};
pub use shell::{run_cli, SCRIPT_ENV};
