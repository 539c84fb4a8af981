use std::borrow::Cow;

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context as ReadlineContext, Helper,
};

use crate::currency::SUPPORTED_CURRENCIES;
use crate::language::LANGUAGES;
use crate::ledger::Frequency;

/// Line editor helper: completes command words and their common arguments,
/// and hints the usage line once a command has been typed.
pub(crate) struct CommandHelper {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandHelper {
    pub(crate) fn new(mut commands: Vec<(&'static str, &'static str)>) -> Self {
        commands.sort_by_key(|(name, _)| *name);
        commands.dedup_by_key(|(name, _)| *name);
        Self { commands }
    }

    fn usage(&self, command: &str) -> Option<&'static str> {
        self.commands
            .iter()
            .find(|(name, _)| *name == command)
            .map(|(_, usage)| *usage)
    }

    /// Candidate values for the word after `previous` in a `command` line.
    fn argument_values(command: &str, previous: &str, position: usize) -> Vec<String> {
        if previous == "--every" {
            return Frequency::ALL.iter().map(|f| f.as_str().to_string()).collect();
        }
        let fixed: &[&str] = match (command, position) {
            ("add", 1) => &["income", "expense"],
            ("edit", _) if previous.starts_with("--type") => &["income", "expense"],
            ("categories", 1) => &["income", "expense", "all"],
            ("custom-categories", 1) => &["on", "off"],
            ("currency", 1) => {
                return SUPPORTED_CURRENCIES
                    .iter()
                    .map(|info| info.code.to_string())
                    .collect()
            }
            ("language", 1) => return LANGUAGES.iter().map(|lang| lang.code.to_string()).collect(),
            _ => &[],
        };
        fixed.iter().map(|value| value.to_string()).collect()
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let start = before.rfind(' ').map_or(0, |idx| idx + 1);
        let needle = before[start..].to_ascii_lowercase();
        let words: Vec<&str> = before[..start].split_whitespace().collect();

        let values: Vec<String> = match words.as_slice() {
            [] => self.commands.iter().map(|(name, _)| name.to_string()).collect(),
            [command, rest @ ..] => {
                let previous = rest.last().copied().unwrap_or(*command);
                Self::argument_values(&command.to_ascii_lowercase(), previous, rest.len() + 1)
            }
        };
        let candidates = values
            .into_iter()
            .filter(|value| value.to_ascii_lowercase().starts_with(&needle))
            .map(|value| Pair {
                display: value.clone(),
                replacement: value,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos != line.len() {
            return None;
        }
        let command = line.strip_suffix(' ')?;
        if command.contains(' ') {
            return None;
        }
        let usage = self.usage(&command.to_ascii_lowercase())?;
        let args = usage.split_once(' ')?.1;
        Some(args.to_string())
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for CommandHelper {
    /// Keeps reading while a quoted description is still open.
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        match shell_words::split(ctx.input()) {
            Err(_) => Ok(ValidationResult::Incomplete),
            Ok(_) => Ok(ValidationResult::Valid(None)),
        }
    }
}
