use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::ledger::{
    categories_by_type, icon_for, CategoryFilter, CategoryScope, RecurrenceStatus,
};

use super::{parse_date_arg, parse_month_arg, usage_error, CommandDefinition};

const BAR_WIDTH: usize = 30;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "month",
            "Show a month's transactions, recurring ones included",
            "month [YYYY-MM] [category]",
            cmd_month,
        ),
        CommandDefinition::new(
            "chart",
            "Show the income versus expenses split for a month",
            "chart [YYYY-MM]",
            cmd_chart,
        ),
        CommandDefinition::new(
            "recurring",
            "Show recurring transactions and their next due dates",
            "recurring [date]",
            cmd_recurring,
        ),
        CommandDefinition::new(
            "categories",
            "List categories for a transaction type",
            "categories [income|expense|all]",
            cmd_categories,
        ),
    ]
}

fn cmd_month(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() > 2 {
        return Err(usage_error("month [YYYY-MM] [category]"));
    }
    let month = parse_month_arg(args.first().copied(), context.today())?;
    let filter = CategoryFilter::from_selection(args.get(1).copied());
    let view = context.ledger()?.month_view(month, filter);

    let title = match view.filter.selected() {
        Some(category) => format!("{} ({})", month.label(), category),
        None => month.label(),
    };
    output::section(title);
    if view.occurrences.is_empty() {
        output::info("No transactions this month.");
    }
    for occurrence in &view.occurrences {
        let marker = if occurrence.is_projected { "~" } else { " " };
        output::info(format!(
            "{}{}  #{:<4} {:<28} {:<14} {}",
            marker,
            context.date(occurrence.date),
            occurrence.transaction_id,
            occurrence.display_description(),
            occurrence.category,
            output::signed(occurrence.amount, context.money(occurrence.amount))
        ));
    }
    let summary = &view.summary;
    output::info(format!("  Income   : {}", context.money(summary.income)));
    output::info(format!("  Expenses : {}", context.money(summary.expenses)));
    output::info(format!(
        "  Balance  : {}",
        output::signed(summary.balance, context.money(summary.balance))
    ));
    Ok(())
}

fn cmd_chart(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() > 1 {
        return Err(usage_error("chart [YYYY-MM]"));
    }
    let month = parse_month_arg(args.first().copied(), context.today())?;
    let view = context.ledger()?.month_view(month, CategoryFilter::All);
    output::section(format!("Chart {}", month.label()));
    let Some(chart) = view.chart else {
        output::info("Nothing to chart.");
        return Ok(());
    };
    output::info(format!(
        "  Income   {} {:>5.1}%  {}",
        output::bar(chart.income_share, BAR_WIDTH),
        chart.income_share * 100.0,
        context.money(chart.income)
    ));
    output::info(format!(
        "  Expenses {} {:>5.1}%  {}",
        output::bar(chart.expense_share, BAR_WIDTH),
        chart.expense_share * 100.0,
        context.money(chart.expenses)
    ));
    for total in view.summary.expenses_by_category() {
        output::info(format!(
            "    {:<14} {:>5.1}%  {}",
            total.category,
            total.share * 100.0,
            context.money(total.total)
        ));
    }
    Ok(())
}

fn cmd_recurring(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let reference = match args {
        [] => context.today(),
        [raw] => parse_date_arg(raw)?,
        _ => return Err(usage_error("recurring [date]")),
    };
    let snapshots = context.ledger()?.recurring_snapshots(reference);
    if snapshots.is_empty() {
        output::info("No recurring transactions.");
        return Ok(());
    }
    output::section(format!("Recurring as of {}", context.date(reference)));
    for snapshot in snapshots {
        let next = match (snapshot.status, snapshot.next_due) {
            (RecurrenceStatus::Active, Some(date)) => format!("next {}", context.date(date)),
            _ => "completed".to_string(),
        };
        let remaining = snapshot
            .remaining
            .map(|count| format!(", {} left", count))
            .unwrap_or_default();
        output::info(format!(
            "#{:<4} {:<24} {:>12}  {}  {}{}",
            snapshot.transaction_id,
            snapshot.description,
            context.money(snapshot.amount),
            snapshot.interval_label,
            next,
            remaining
        ));
    }
    Ok(())
}

fn cmd_categories(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let scope = match args.first().map(|raw| raw.to_ascii_lowercase()).as_deref() {
        None | Some("all") => CategoryScope::All,
        Some("income") => CategoryScope::Income,
        Some("expense") => CategoryScope::Expense,
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown category type `{}`",
                other
            )))
        }
    };
    output::section("Categories");
    for name in categories_by_type(scope) {
        output::info(format!("  {:<16} ({})", name, icon_for(name)));
    }
    if let Some(ledger) = context.ledger.as_ref() {
        let custom: Vec<String> = ledger
            .used_categories()
            .into_iter()
            .filter(|used| {
                !categories_by_type(CategoryScope::All)
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(used))
            })
            .collect();
        if !custom.is_empty() {
            output::info(format!("  Custom: {}", custom.join(", ")));
        }
    }
    Ok(())
}
