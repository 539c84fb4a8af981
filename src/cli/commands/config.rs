use crate::cli::context::{CommandResult, ShellContext};
use crate::cli::output;
use crate::currency::SUPPORTED_CURRENCIES;
use crate::language::{find_language, LANGUAGES};

use super::{usage_error, CommandDefinition};

const CUSTOM_USAGE: &str = "custom-categories [on|off]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "currency",
            "Show or select the display currency",
            "currency [code]",
            cmd_currency,
        ),
        CommandDefinition::new(
            "language",
            "Show or select the language",
            "language [code]",
            cmd_language,
        ),
        CommandDefinition::new(
            "custom-categories",
            "Allow categories outside the built-in catalog",
            CUSTOM_USAGE,
            cmd_custom_categories,
        ),
        CommandDefinition::new(
            "config-backup",
            "Back up the current settings",
            "config-backup [note]",
            cmd_config_backup,
        ),
        CommandDefinition::new(
            "config-restore",
            "List settings backups or restore one",
            "config-restore [backup]",
            cmd_config_restore,
        ),
    ]
}

fn cmd_currency(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let code = match args {
        [] => {
            output::section("Currencies");
            for info in SUPPORTED_CURRENCIES {
                let marker = if context.config.currency.as_str() == info.code {
                    "*"
                } else {
                    " "
                };
                output::info(format!(
                    " {} {}  {:<3} {}",
                    marker, info.code, info.symbol, info.name
                ));
            }
            return Ok(());
        }
        [code] => *code,
        _ => return Err(usage_error("currency [code]")),
    };
    context.config.set_currency(code)?;
    context.config_manager.save(&context.config)?;
    let selected = context.config.currency.clone();
    if let Some(ledger) = context.ledger.as_mut() {
        ledger.base_currency = selected.clone();
        ledger.touch();
    }
    output::success(format!("Currency set to {}.", selected));
    Ok(())
}

fn cmd_language(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let code = match args {
        [] => {
            output::section("Languages");
            let current = find_language(&context.config.language).map(|lang| lang.code);
            for language in LANGUAGES {
                let marker = if current == Some(language.code) { "*" } else { " " };
                output::info(format!(
                    " {} {:<6} {}",
                    marker,
                    language.code,
                    language.display_name()
                ));
            }
            return Ok(());
        }
        [code] => *code,
        _ => return Err(usage_error("language [code]")),
    };
    context.config.set_language(code)?;
    context.config_manager.save(&context.config)?;
    output::success(format!("Language set to {}.", context.config.language));
    Ok(())
}

fn cmd_custom_categories(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let enabled = match args {
        [] => {
            let state = if context.config.allow_custom_categories {
                "on"
            } else {
                "off"
            };
            output::info(format!("Custom categories are {}.", state));
            return Ok(());
        }
        [value] => match value.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" => true,
            "off" | "no" | "false" => false,
            _ => return Err(usage_error(CUSTOM_USAGE)),
        },
        _ => return Err(usage_error(CUSTOM_USAGE)),
    };
    context.config.allow_custom_categories = enabled;
    context.config_manager.save(&context.config)?;
    context.sync_ledger_settings();
    output::success(format!(
        "Custom categories {}.",
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}

fn cmd_config_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let name = context
        .config_manager
        .backup(&context.config, note.as_deref())?;
    output::success(format!("Settings backed up as {}.", name));
    Ok(())
}

fn cmd_config_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                output::info("No settings backups.");
                return Ok(());
            }
            output::section("Settings backups");
            for (index, name) in backups.iter().enumerate() {
                output::info(format!("  {:>2}. {}", index + 1, name));
            }
            Ok(())
        }
        [target] => {
            let backups = context.config_manager.list_backups()?;
            let name = match target.parse::<usize>() {
                Ok(index) if index >= 1 && index <= backups.len() => backups[index - 1].clone(),
                _ => target.to_string(),
            };
            context.config = context.config_manager.restore(&name)?;
            context.sync_ledger_settings();
            output::success(format!("Settings restored from {}.", name));
            Ok(())
        }
        _ => Err(usage_error("config-restore [backup]")),
    }
}
