use std::path::Path;

use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::currency::CurrencyCode;
use crate::ledger::Ledger;
use crate::storage::{load_transactions_from_path, StorageBackend};
use crate::utils::paths::canonical_name;

use super::{usage_error, CommandDefinition, ParsedArgs};

const NEW_USAGE: &str = "new-ledger <name> [currency]";
const OPEN_USAGE: &str = "open <name>";
const IMPORT_USAGE: &str = "import <file.json> [--replace]";
const RESTORE_USAGE: &str = "restore [backup|index]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("new-ledger", "Create an empty ledger", NEW_USAGE, cmd_new),
        CommandDefinition::new("open", "Open a saved ledger", OPEN_USAGE, cmd_open),
        CommandDefinition::new("save", "Save the open ledger", "save [name]", cmd_save),
        CommandDefinition::new("ledgers", "List saved ledgers", "ledgers", cmd_ledgers),
        CommandDefinition::new(
            "backup",
            "Back up the open ledger",
            "backup [note]",
            cmd_backup,
        ),
        CommandDefinition::new(
            "restore",
            "List backups of the open ledger or restore one",
            RESTORE_USAGE,
            cmd_restore,
        ),
        CommandDefinition::new(
            "import",
            "Merge transaction records exported from the API",
            IMPORT_USAGE,
            cmd_import,
        ),
    ]
}

fn cmd_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, currency) = match args {
        [name] => (*name, context.config.currency.clone()),
        [name, code] => (*name, CurrencyCode::supported(code)?),
        _ => return Err(usage_error(NEW_USAGE)),
    };
    if name.trim().is_empty() {
        return Err(usage_error(NEW_USAGE));
    }
    let ledger = Ledger::new(name.trim(), currency);
    output::success(format!(
        "Ledger `{}` created ({}).",
        ledger.name, ledger.base_currency
    ));
    context.set_ledger(ledger, canonical_name(name));
    Ok(())
}

fn cmd_open(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let &[name] = args else {
        return Err(usage_error(OPEN_USAGE));
    };
    let ledger = context.storage.load(name)?;
    context.storage.record_last_ledger(Some(name))?;
    output::success(format!(
        "Opened `{}` with {} transaction(s).",
        ledger.name,
        ledger.transactions().len()
    ));
    context.set_ledger(ledger, canonical_name(name));
    Ok(())
}

fn cmd_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = match args {
        [] => context
            .ledger_name
            .clone()
            .ok_or(CommandError::LedgerNotLoaded)?,
        [name] => canonical_name(name),
        _ => return Err(usage_error("save [name]")),
    };
    let ledger = context.ledger()?;
    context.storage.save(ledger, &name)?;
    context.storage.record_last_ledger(Some(&name))?;
    let path = context.storage.ledger_path(&name);
    context.config.last_ledger = Some(name.clone());
    context.config_manager.save(&context.config)?;
    context.ledger_name = Some(name);
    output::success(format!("Saved to {}.", path.display()));
    Ok(())
}

fn cmd_ledgers(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let names = context.storage.list_ledgers()?;
    if names.is_empty() {
        output::info("No saved ledgers.");
        return Ok(());
    }
    output::section("Saved ledgers");
    for name in names {
        let marker = if context.ledger_name.as_deref() == Some(name.as_str()) {
            "*"
        } else {
            " "
        };
        output::info(format!(" {} {}", marker, name));
    }
    Ok(())
}

fn open_ledger_name(context: &ShellContext) -> Result<String, CommandError> {
    context
        .ledger_name
        .clone()
        .ok_or(CommandError::LedgerNotLoaded)
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = open_ledger_name(context)?;
    let note = (!args.is_empty()).then(|| args.join(" "));
    let ledger = context.ledger()?;
    let backup = context.storage.backup(ledger, &name, note.as_deref())?;
    output::success(format!("Ledger backed up as {}.", backup));
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = open_ledger_name(context)?;
    let backups = context.storage.list_backups(&name)?;
    let target = match args {
        [] => {
            if backups.is_empty() {
                output::info(format!("No backups for `{}`.", name));
                return Ok(());
            }
            output::section("Ledger backups");
            for (index, backup) in backups.iter().enumerate() {
                output::info(format!("  {:>2}. {}", index + 1, backup));
            }
            return Ok(());
        }
        [target] => match target.parse::<usize>() {
            Ok(index) if index >= 1 && index <= backups.len() => backups[index - 1].clone(),
            _ => target.to_string(),
        },
        _ => return Err(usage_error(RESTORE_USAGE)),
    };
    let ledger = context.storage.restore(&name, &target)?;
    output::success(format!(
        "Restored `{}` from {} ({} transaction(s)).",
        ledger.name,
        target,
        ledger.transactions().len()
    ));
    context.set_ledger(ledger, name);
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["replace"])?;
    parsed.expect_only(&[])?;
    let [path] = parsed.positional.as_slice() else {
        return Err(usage_error(IMPORT_USAGE));
    };
    let records = load_transactions_from_path(Path::new(path))?;
    let ledger = context.ledger_mut()?;
    let count = if parsed.flag("replace") {
        ledger.replace_all(records)
    } else {
        ledger.import_api_records(records)
    };
    output::success(format!("Imported {} record(s).", count));
    Ok(())
}
