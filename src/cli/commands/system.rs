use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::utils::build_info;

use super::CommandDefinition;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Finance Core {}", meta.version));
    output::info(format!("  Build hash : {} ({})", meta.git_hash, meta.git_status));
    output::info(format!("  Built at   : {}", meta.timestamp));
    output::info(format!("  Target     : {}", meta.target));
    output::info(format!("  Profile    : {}", meta.profile));
    output::info(format!("  Rustc      : {}", meta.rustc));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(raw) = args.first() {
        match context.command(&raw.to_lowercase()) {
            Some(command) => {
                output::section(format!("Help: {}", command.name));
                output::info(format!("  Description: {}", command.description));
                output::info(format!("  Usage: {}", command.usage));
            }
            None => context.suggest_command(raw),
        }
        return Ok(());
    }

    output::section("Available commands");
    for command in context.registry.iter() {
        output::info(format!("  {:<16} {}", command.name, command.description));
    }
    output::info("Use `help <command>` for details.");
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
