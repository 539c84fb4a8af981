use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::ledger::{CategoryFilter, Frequency, NewTransaction, TransactionKind};

use super::{parse_amount, parse_date_arg, parse_id, usage_error, CommandDefinition, ParsedArgs};

const ADD_USAGE: &str = "add <income|expense> <amount> <description> <category> [date] \
                         [--every daily|weekly|monthly|yearly] [--until date] [--installments n]";
const EDIT_USAGE: &str = "edit <id> [--type kind] [--amount n] [--description text] \
                          [--category name] [--date date] [--every freq] [--until date] \
                          [--installments n] [--once]";
const RECURRENCE_OPTIONS: [&str; 3] = ["every", "until", "installments"];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("add", "Record a transaction", ADD_USAGE, cmd_add),
        CommandDefinition::new("edit", "Change a recorded transaction", EDIT_USAGE, cmd_edit),
        CommandDefinition::new("delete", "Delete a transaction", "delete <id>", cmd_delete),
        CommandDefinition::new(
            "list",
            "List recorded transactions",
            "list [category]",
            cmd_list,
        ),
    ]
}

fn parse_kind(raw: &str) -> Result<TransactionKind, CommandError> {
    TransactionKind::parse(raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("expected `income` or `expense`, got `{}`", raw))
    })
}

fn parse_frequency(raw: &str) -> Result<Frequency, CommandError> {
    Frequency::parse(raw)
        .ok_or_else(|| CommandError::InvalidArguments(format!("unknown frequency `{}`", raw)))
}

fn parse_installments(raw: &str) -> Result<u32, CommandError> {
    raw.trim()
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid installment count `{}`", raw)))
}

/// Applies `--every`, `--until` and `--installments` on top of `input`.
fn apply_recurrence(
    input: &mut NewTransaction,
    args: &ParsedArgs<'_>,
) -> Result<(), CommandError> {
    if let Some(raw) = args.option("every") {
        input.is_recurring = true;
        input.frequency = Some(parse_frequency(raw)?);
    }
    if let Some(raw) = args.option("until") {
        input.is_recurring = true;
        input.end_date = Some(parse_date_arg(raw)?);
    }
    if let Some(raw) = args.option("installments") {
        input.is_recurring = true;
        input.installments = Some(parse_installments(raw)?);
    }
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[])?;
    parsed.expect_only(&RECURRENCE_OPTIONS)?;
    let (kind, amount, description, category, date) = match parsed.positional.as_slice() {
        [kind, amount, description, category] => {
            (*kind, *amount, *description, *category, None)
        }
        [kind, amount, description, category, date] => {
            (*kind, *amount, *description, *category, Some(*date))
        }
        _ => return Err(usage_error(ADD_USAGE)),
    };
    let date = match date {
        Some(raw) => parse_date_arg(raw)?,
        None => context.today(),
    };
    let mut input = NewTransaction::new(
        parse_kind(kind)?,
        parse_amount(amount)?,
        description,
        category,
        date,
    );
    apply_recurrence(&mut input, &parsed)?;

    let id = context.ledger_mut()?.add_transaction(input)?;
    let summary = describe(context, id);
    output::success(format!("Added #{} {}", id, summary));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["once"])?;
    parsed.expect_only(&[
        "type",
        "amount",
        "description",
        "category",
        "date",
        "every",
        "until",
        "installments",
    ])?;
    let [raw_id] = parsed.positional.as_slice() else {
        return Err(usage_error(EDIT_USAGE));
    };
    let id = parse_id(raw_id)?;
    let existing = context
        .ledger()?
        .transaction(id)
        .ok_or_else(|| CommandError::InvalidArguments(format!("no transaction with id {}", id)))?;

    let mut input = NewTransaction::from(existing);
    if let Some(raw) = parsed.option("type") {
        input.kind = parse_kind(raw)?;
    }
    if let Some(raw) = parsed.option("amount") {
        input.amount = parse_amount(raw)?;
    }
    if let Some(raw) = parsed.option("description") {
        input.description = raw.to_string();
    }
    if let Some(raw) = parsed.option("category") {
        input.category = raw.to_string();
    }
    if let Some(raw) = parsed.option("date") {
        input.date = parse_date_arg(raw)?;
    }
    if parsed.flag("once") {
        input.is_recurring = false;
        input.frequency = None;
        input.end_date = None;
        input.installments = None;
    }
    apply_recurrence(&mut input, &parsed)?;

    context.ledger_mut()?.update_transaction(id, input)?;
    let summary = describe(context, id);
    output::success(format!("Updated #{} {}", id, summary));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [raw_id] = args else {
        return Err(usage_error("delete <id>"));
    };
    let id = parse_id(raw_id)?;
    let removed = context.ledger_mut()?.delete_transaction(id)?;
    output::success(format!("Deleted #{} {}", removed.id, removed.description));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let filter = CategoryFilter::from_selection(args.first().copied());
    let ledger = context.ledger()?;
    let rows: Vec<_> = ledger
        .transactions()
        .iter()
        .filter(|txn| filter.matches(&txn.category))
        .collect();
    if rows.is_empty() {
        output::info("No transactions.");
        return Ok(());
    }
    output::section(format!("Transactions in {}", ledger.name));
    for txn in rows {
        let recurrence = txn
            .recurrence()
            .map(|rule| format!("  [{}]", rule.label()))
            .unwrap_or_default();
        output::info(format!(
            "#{:<4} {}  {:<24} {:<14} {}{}",
            txn.id,
            context.date(txn.date),
            txn.description,
            txn.category,
            output::signed(txn.amount, context.money(txn.amount)),
            recurrence
        ));
    }
    Ok(())
}

fn describe(context: &ShellContext, id: u64) -> String {
    let Some(txn) = context.ledger.as_ref().and_then(|ledger| ledger.transaction(id)) else {
        return String::new();
    };
    let mut text = format!(
        "{} {} on {}",
        txn.description,
        context.money(txn.amount),
        context.date(txn.date)
    );
    if let Some(rule) = txn.recurrence() {
        text.push_str(&format!(" ({})", rule.label()));
    }
    text
}
