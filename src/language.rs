use chrono::NaiveDate;
use serde::Serialize;

use crate::currency::{DateFormatStyle, LocaleConfig};
use crate::errors::FinanceError;

/// A language offered on the language selection screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
}

impl Language {
    /// Flag plus native name, the way the selection list renders an entry.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.flag, self.native_name)
    }
}

pub const DEFAULT_LANGUAGE: &str = "en-US";

pub const LANGUAGES: &[Language] = &[
    Language {
        code: "en-US",
        name: "English",
        native_name: "English",
        flag: "🇺🇸",
    },
    Language {
        code: "pt-BR",
        name: "Portuguese",
        native_name: "Português",
        flag: "🇧🇷",
    },
    Language {
        code: "es-ES",
        name: "Spanish",
        native_name: "Español",
        flag: "🇪🇸",
    },
];

/// Looks a language up by full tag (`pt-BR`) or bare language (`pt`).
pub fn find_language(code: &str) -> Option<&'static Language> {
    let needle = code.trim().replace('_', "-");
    LANGUAGES
        .iter()
        .find(|lang| lang.code.eq_ignore_ascii_case(&needle))
        .or_else(|| {
            LANGUAGES.iter().find(|lang| {
                lang.code
                    .split('-')
                    .next()
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&needle))
            })
        })
}

impl LocaleConfig {
    /// Separators and date style conventional for a language tag; unknown tags get
    /// the default locale.
    pub fn for_language(code: &str) -> LocaleConfig {
        match find_language(code).map(|lang| lang.code) {
            Some("pt-BR") => LocaleConfig {
                language_tag: "pt-BR".into(),
                decimal_separator: ',',
                grouping_separator: '.',
                date_format: DateFormatStyle::DayMonthYear,
            },
            Some("es-ES") => LocaleConfig {
                language_tag: "es-ES".into(),
                decimal_separator: ',',
                grouping_separator: '.',
                date_format: DateFormatStyle::DayMonthYear,
            },
            _ => LocaleConfig::default(),
        }
    }
}

/// Parses a `DD/MM/YYYY` date as typed into the transaction form, rejecting dates
/// that do not exist.
pub fn parse_display_date(input: &str) -> Result<NaiveDate, FinanceError> {
    let invalid = || FinanceError::InvalidInput(format!("invalid date `{}` (DD/MM/YYYY)", input.trim()));
    let parts: Vec<&str> = input.trim().split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(invalid());
    };
    if day.len() != 2 || month.len() != 2 || year.len() != 4 {
        return Err(invalid());
    }
    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Accepts `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_user_date(input: &str) -> Result<NaiveDate, FinanceError> {
    let trimmed = input.trim();
    if trimmed.contains('/') {
        parse_display_date(trimmed)
    } else {
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map_err(|_| FinanceError::InvalidInput(format!("invalid date `{trimmed}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_languages_by_tag_or_prefix() {
        assert_eq!(find_language("pt_br").unwrap().native_name, "Português");
        assert_eq!(find_language("es").unwrap().code, "es-ES");
        assert!(find_language("de").is_none());
        assert_eq!(find_language("en-us").unwrap().display_name(), "🇺🇸 English");
    }

    #[test]
    fn locale_follows_language() {
        let locale = LocaleConfig::for_language("pt-BR");
        assert_eq!(locale.decimal_separator, ',');
        assert_eq!(locale.date_format, DateFormatStyle::DayMonthYear);
        assert_eq!(LocaleConfig::for_language("xx"), LocaleConfig::default());
    }

    #[test]
    fn display_dates_must_exist() {
        assert_eq!(
            parse_display_date("29/02/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_display_date("29/02/2023").is_err());
        assert!(parse_display_date("31/04/2025").is_err());
        assert!(parse_display_date("1/4/2025").is_err());
        assert!(parse_display_date("01-04-2025").is_err());
    }

    #[test]
    fn user_dates_accept_both_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(parse_user_date("2025-04-01").unwrap(), expected);
        assert_eq!(parse_user_date(" 01/04/2025 ").unwrap(), expected);
        assert!(parse_user_date("tomorrow").is_err());
    }
}
