use std::io;

use chrono::{Local, NaiveDate};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::{Config, ConfigManager},
    currency::{format_currency_value, format_date},
    errors::FinanceError,
    ledger::Ledger,
    storage::{JsonStorage, StorageBackend},
    utils::paths::PathResolver,
};

use super::commands::{all_definitions, CommandDefinition, CommandRegistry};
use super::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

/// Fatal shell failures.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] FinanceError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
}

/// Failures of a single command; reported and the shell keeps going.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No ledger open. Use `new-ledger` or `open` first.")]
    LedgerNotLoaded,
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] FinanceError),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) storage: JsonStorage,
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: Config,
    pub(crate) ledger: Option<Ledger>,
    pub(crate) ledger_name: Option<String>,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = PathResolver::base_dir();
        let storage = JsonStorage::new(Some(base.clone()), None)?;
        let config_manager = ConfigManager::with_base_dir(base)?;
        let config = config_manager.load()?;
        let mut context = Self {
            mode,
            registry: CommandRegistry::new(all_definitions()),
            storage,
            config_manager,
            config,
            ledger: None,
            ledger_name: None,
            running: true,
        };
        context.auto_load_last();
        Ok(context)
    }

    /// Reopens the last ledger in interactive sessions. Scripts always start empty.
    fn auto_load_last(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let last = match self.storage.last_ledger() {
            Ok(Some(name)) => name,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "could not read last ledger state");
                return;
            }
        };
        match self.storage.load(&last) {
            Ok(ledger) => {
                output::info(format!("Reopened ledger `{}`.", ledger.name));
                self.set_ledger(ledger, last);
            }
            Err(err) => tracing::warn!(ledger = %last, error = %err, "could not reopen ledger"),
        }
    }

    pub(crate) fn set_ledger(&mut self, ledger: Ledger, name: String) {
        self.ledger = Some(ledger);
        self.ledger_name = Some(name);
        self.sync_ledger_settings();
    }

    /// Copies settings that govern entry validation onto the open ledger.
    pub(crate) fn sync_ledger_settings(&mut self) {
        if let Some(ledger) = self.ledger.as_mut() {
            ledger.allow_custom_categories = self.config.allow_custom_categories;
        }
    }

    pub(crate) fn ledger(&self) -> Result<&Ledger, CommandError> {
        self.ledger.as_ref().ok_or(CommandError::LedgerNotLoaded)
    }

    pub(crate) fn ledger_mut(&mut self) -> Result<&mut Ledger, CommandError> {
        self.ledger.as_mut().ok_or(CommandError::LedgerNotLoaded)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub(crate) fn command_usages(&self) -> Vec<(&'static str, &'static str)> {
        self.registry
            .iter()
            .map(|definition| (definition.name, definition.usage))
            .collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn prompt(&self) -> String {
        match &self.ledger {
            Some(ledger) => format!("finance({})> ", ledger.name),
            None => "finance> ".to_string(),
        }
    }

    /// Formats an amount in the open ledger's currency (or the configured one).
    pub(crate) fn money(&self, amount: f64) -> String {
        let code = self
            .ledger
            .as_ref()
            .map(|ledger| &ledger.base_currency)
            .unwrap_or(&self.config.currency);
        format_currency_value(amount, code, &self.config.locale(), &self.config.format)
    }

    pub(crate) fn date(&self, date: NaiveDate) -> String {
        format_date(&self.config.locale(), date)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let handler = match self.registry.get(command) {
            Some(definition) => definition.handler,
            None => {
                self.suggest_command(raw);
                return Ok(LoopControl::Continue);
            }
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::hint(format!("Did you mean `{}`?", name));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::LedgerNotLoaded => {
                output::error(CommandError::LedgerNotLoaded);
                output::hint("Try `new-ledger Household` to get started.");
            }
            CommandError::Core(err) => output::error(err),
        }
    }
}
