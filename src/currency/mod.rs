use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::FinanceError;

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts only the currencies offered on the selection screen.
    pub fn supported(code: &str) -> Result<Self, FinanceError> {
        let candidate = Self::new(code);
        if find_currency(candidate.as_str()).is_some() {
            Ok(candidate)
        } else {
            Err(FinanceError::InvalidInput(format!(
                "unsupported currency `{}`",
                code.trim()
            )))
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub minor_units: u8,
}

pub const SUPPORTED_CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo {
        code: "USD",
        name: "US Dollar",
        symbol: "$",
        minor_units: 2,
    },
    CurrencyInfo {
        code: "EUR",
        name: "Euro",
        symbol: "€",
        minor_units: 2,
    },
    CurrencyInfo {
        code: "BRL",
        name: "Brazilian Real",
        symbol: "R$",
        minor_units: 2,
    },
    CurrencyInfo {
        code: "GBP",
        name: "Pound Sterling",
        symbol: "£",
        minor_units: 2,
    },
    CurrencyInfo {
        code: "JPY",
        name: "Japanese Yen",
        symbol: "¥",
        minor_units: 0,
    },
];

pub fn find_currency(code: &str) -> Option<&'static CurrencyInfo> {
    SUPPORTED_CURRENCIES
        .iter()
        .find(|info| info.code.eq_ignore_ascii_case(code.trim()))
}

/// Locale-aware formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub date_format: DateFormatStyle,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            decimal_separator: '.',
            grouping_separator: ',',
            date_format: DateFormatStyle::MonthDayYear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormatOptions {
    pub currency_display: CurrencyDisplay,
    pub negative_style: NegativeStyle,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    #[default]
    Sign,
    Parentheses,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CurrencyDisplay {
    #[default]
    Symbol,
    Code,
    SymbolAndCode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateFormatStyle {
    /// `2025-03-09`
    Iso,
    /// `09/03/2025`
    DayMonthYear,
    /// `03/09/2025`
    MonthDayYear,
    /// `09 Mar 2025`
    Medium,
}

pub fn symbol_for(code: &str) -> String {
    find_currency(code)
        .map(|info| info.symbol.to_string())
        .unwrap_or_else(|| code.to_string())
}

pub fn minor_units_for(code: &str) -> u8 {
    match find_currency(code) {
        Some(info) => info.minor_units,
        None if matches!(code, "KWD" | "BHD") => 3,
        None => 2,
    }
}

pub fn format_number(locale: &LocaleConfig, value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body.as_str(), None),
    };
    let grouped = match int_part.strip_prefix('-') {
        Some(digits) => format!("-{}", group_digits(digits, locale.grouping_separator)),
        None => group_digits(int_part, locale.grouping_separator),
    };
    match frac_part {
        Some(frac) => format!("{}{}{}", grouped, locale.decimal_separator, frac),
        None => grouped,
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().enumerate() {
        if count != 0 && (digits.len() - count) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

pub fn format_currency_value(
    amount: f64,
    code: &CurrencyCode,
    locale: &LocaleConfig,
    options: &FormatOptions,
) -> String {
    let precision = minor_units_for(code.as_str());
    let digits = format_number(locale, amount.abs(), precision);
    // A value that rounds to zero is never shown as negative.
    let negative = amount < 0.0 && digits.chars().any(|ch| ch.is_ascii_digit() && ch != '0');
    let symbol = symbol_for(code.as_str());
    let separator = if symbol.chars().all(char::is_alphabetic) {
        " "
    } else {
        ""
    };
    let body = match options.currency_display {
        CurrencyDisplay::Code => format!("{} {}", code.as_str(), digits),
        CurrencyDisplay::Symbol | CurrencyDisplay::SymbolAndCode => {
            format!("{}{}{}", symbol, separator, digits)
        }
    };
    let signed = match (negative, options.negative_style) {
        (false, _) => body,
        (true, NegativeStyle::Sign) => format!("-{}", body),
        (true, NegativeStyle::Parentheses) => format!("({})", body),
    };
    match options.currency_display {
        CurrencyDisplay::SymbolAndCode => format!("{} ({})", signed, code.as_str()),
        _ => signed,
    }
}

pub fn format_date(locale: &LocaleConfig, date: NaiveDate) -> String {
    match locale.date_format {
        DateFormatStyle::Iso => date.format("%Y-%m-%d").to_string(),
        DateFormatStyle::DayMonthYear => date.format("%d/%m/%Y").to_string(),
        DateFormatStyle::MonthDayYear => date.format("%m/%d/%Y").to_string(),
        DateFormatStyle::Medium => format!(
            "{:02} {} {}",
            date.day(),
            month_label(date.month()),
            date.year()
        ),
    }
}

fn month_label(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "",
    }
}
