use std::collections::HashMap;

pub mod config;
pub mod ledger;
pub mod month;
pub mod system;
pub mod transaction;

use chrono::NaiveDate;

use crate::language::parse_user_date;
use crate::ledger::YearMonth;

use super::context::{CommandError, CommandResult, ShellContext};

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(ledger::definitions());
    commands.extend(transaction::definitions());
    commands.extend(month::definitions());
    commands.extend(config::definitions());
    commands
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// Positional arguments plus `--name value` options and bare `--flag`s.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    options: HashMap<&'a str, &'a str>,
    flags: Vec<&'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// `switches` lists the options that take no value.
    pub fn parse(args: &[&'a str], switches: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            match arg.strip_prefix("--") {
                Some(name) if switches.contains(&name) => parsed.flags.push(name),
                Some(name) => {
                    let value = iter.next().ok_or_else(|| {
                        CommandError::InvalidArguments(format!("option `--{}` needs a value", name))
                    })?;
                    parsed.options.insert(name, value);
                }
                None => parsed.positional.push(arg),
            }
        }
        Ok(parsed)
    }

    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(&name)
    }

    /// Rejects options outside `known`.
    pub fn expect_only(&self, known: &[&str]) -> Result<(), CommandError> {
        match self.options.keys().find(|name| !known.contains(*name)) {
            Some(name) => Err(CommandError::InvalidArguments(format!(
                "unknown option `--{}`",
                name
            ))),
            None => Ok(()),
        }
    }
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", usage))
}

pub(crate) fn parse_amount(raw: &str) -> Result<f64, CommandError> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.abs()),
        _ => Err(CommandError::InvalidArguments(format!(
            "invalid amount `{}`",
            raw
        ))),
    }
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate, CommandError> {
    Ok(parse_user_date(raw)?)
}

pub(crate) fn parse_id(raw: &str) -> Result<u64, CommandError> {
    raw.trim()
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid transaction id `{}`", raw)))
}

pub(crate) fn parse_month_arg(
    raw: Option<&str>,
    today: NaiveDate,
) -> Result<YearMonth, CommandError> {
    match raw {
        None => Ok(YearMonth::from_date(today)),
        Some(value) => Ok(value.parse::<YearMonth>()?),
    }
}
