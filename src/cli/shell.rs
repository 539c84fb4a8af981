use std::io::{self, BufRead};

use rustyline::{error::ReadlineError, history::DefaultHistory, Cmd, Editor, KeyEvent};
use shell_words::split;

use super::completion::CommandHelper;
use super::context::{CliError, CliMode, LoopControl, ShellContext};
use super::output;

/// Environment variable switching the shell to non-interactive script mode.
pub const SCRIPT_ENV: &str = "FINANCE_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        colored::control::set_override(false);
    }

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(context.command_usages())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output::info("Type `help` to list commands.");

    while context.running {
        let prompt = context.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                if handle_line(context, trimmed) == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if handle_line(context, trimmed) == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

pub(crate) fn handle_line(context: &mut ShellContext, line: &str) -> LoopControl {
    let tokens = match split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse input: {}", err));
            return LoopControl::Continue;
        }
    };
    let Some(raw) = tokens.first() else {
        return LoopControl::Continue;
    };
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            LoopControl::Exit
        }
        Ok(LoopControl::Continue) => LoopControl::Continue,
        Err(err) => {
            context.report_error(err);
            LoopControl::Continue
        }
    }
}
