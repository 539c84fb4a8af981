use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, FinanceResult};

use super::category::{canonical_category, CategoryScope};
use super::serde_compat;
use super::time_interval::{Frequency, TimeInterval};

/// Longest installment plan accepted on entry.
pub const MAX_INSTALLMENTS: u32 = 600;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<TransactionKind> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" | "in" | "+" => Some(TransactionKind::Income),
            "expense" | "out" | "-" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    /// Expenses are stored negative and income positive, whatever sign was typed.
    pub fn signed_amount(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount.abs(),
            TransactionKind::Expense => -amount.abs(),
        }
    }

    /// Kind implied by the sign of a stored amount.
    pub fn from_amount(amount: f64) -> TransactionKind {
        if amount < 0.0 {
            TransactionKind::Expense
        } else {
            TransactionKind::Income
        }
    }
}

/// A transaction record in the shape the transactions API exchanges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: u64,
    pub amount: f64,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "serde_compat::date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default, with = "serde_compat::date_opt")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    #[serde(default)]
    pub user_id: u64,
    #[serde(with = "serde_compat::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "serde_compat::timestamp_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Builds a stored record from validated input.
    pub fn from_new(id: u64, user_id: u64, input: NewTransaction, now: DateTime<Utc>) -> Self {
        let mut txn = Self {
            id,
            amount: 0.0,
            description: String::new(),
            kind: input.kind,
            date: input.date,
            is_recurring: false,
            category: String::new(),
            end_date: None,
            frequency: None,
            installments: None,
            user_id,
            created_at: now,
            updated_at: None,
        };
        txn.apply(input);
        txn
    }

    /// Overwrites the editable fields, keeping identity and creation metadata.
    pub fn apply_update(&mut self, input: NewTransaction, now: DateTime<Utc>) {
        self.apply(input);
        self.updated_at = Some(now);
    }

    fn apply(&mut self, input: NewTransaction) {
        self.kind = input.kind;
        self.amount = input.kind.signed_amount(input.amount);
        self.description = input.description.trim().to_string();
        self.date = input.date;
        self.category = input.category.trim().to_string();
        self.is_recurring = input.is_recurring;
        if input.repeats() {
            self.frequency = Some(input.frequency.unwrap_or_default());
            self.end_date = input.end_date;
            self.installments = input.installments;
        } else {
            self.frequency = None;
            self.end_date = None;
            self.installments = None;
        }
    }

    /// Forces the stored sign to agree with the declared kind.
    ///
    /// Records coming from older clients occasionally carry a positive expense.
    pub fn normalize_sign(&mut self) {
        self.amount = self.kind.signed_amount(self.amount);
    }

    /// Recurrence rule implied by the record, if it repeats.
    pub fn recurrence(&self) -> Option<Recurrence> {
        if !repeats(self.is_recurring, self.installments) {
            return None;
        }
        Some(Recurrence::new(
            self.date,
            self.frequency.unwrap_or_default(),
            self.end_date,
            self.installments,
        ))
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

/// Input for creating or editing a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTransaction {
    pub amount: f64,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "serde_compat::date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, with = "serde_compat::date_opt")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionKind,
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            amount,
            description: description.into(),
            kind,
            date,
            category: category.into(),
            is_recurring: false,
            frequency: None,
            end_date: None,
            installments: None,
        }
    }

    pub fn recurring(mut self, frequency: Frequency) -> Self {
        self.is_recurring = true;
        self.frequency = Some(frequency);
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.is_recurring = true;
        self.end_date = Some(end_date);
        self
    }

    pub fn in_installments(mut self, count: u32) -> Self {
        self.is_recurring = true;
        self.installments = Some(count);
        self
    }

    /// A plan of more than one installment repeats even without the recurring flag.
    pub fn repeats(&self) -> bool {
        repeats(self.is_recurring, self.installments)
    }

    /// Checks the input and canonicalises the category spelling.
    pub fn validate(&mut self, allow_custom_categories: bool) -> FinanceResult<()> {
        if self.description.trim().is_empty() {
            return Err(FinanceError::InvalidInput("description is required".into()));
        }
        if !self.amount.is_finite() || self.amount == 0.0 {
            return Err(FinanceError::InvalidInput(
                "amount must be a non-zero number".into(),
            ));
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(FinanceError::InvalidInput("category is required".into()));
        }
        match canonical_category(category, CategoryScope::from(self.kind)) {
            Some(canonical) => self.category = canonical.to_string(),
            None if allow_custom_categories => self.category = category.to_string(),
            None => {
                return Err(FinanceError::InvalidInput(format!(
                    "unknown {} category `{}`",
                    self.kind.as_str(),
                    category
                )))
            }
        }
        if let Some(end_date) = self.end_date {
            if end_date < self.date {
                return Err(FinanceError::InvalidInput(format!(
                    "end date {} is before start date {}",
                    end_date, self.date
                )));
            }
        }
        if let Some(count) = self.installments {
            if count == 0 || count > MAX_INSTALLMENTS {
                return Err(FinanceError::InvalidInput(format!(
                    "installments must be between 1 and {MAX_INSTALLMENTS}"
                )));
            }
        }
        Ok(())
    }
}

impl From<&Transaction> for NewTransaction {
    fn from(txn: &Transaction) -> Self {
        Self {
            amount: txn.amount.abs(),
            description: txn.description.clone(),
            kind: txn.kind,
            date: txn.date,
            category: txn.category.clone(),
            is_recurring: txn.is_recurring,
            frequency: txn.frequency,
            end_date: txn.end_date,
            installments: txn.installments,
        }
    }
}

fn repeats(is_recurring: bool, installments: Option<u32>) -> bool {
    is_recurring || installments.is_some_and(|n| n > 1)
}

/// How a recurring series stops.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RecurrenceEnd {
    #[default]
    Never,
    /// Last occurrence falls on or before this date.
    OnDate(NaiveDate),
    /// Fixed number of occurrences, the original included.
    AfterOccurrences(u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recurrence {
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    pub interval: TimeInterval,
    pub end: RecurrenceEnd,
}

impl Recurrence {
    /// When both an end date and an installment count are given, whichever limit is
    /// reached first becomes the end.
    pub fn new(
        start_date: NaiveDate,
        frequency: Frequency,
        end_date: Option<NaiveDate>,
        installments: Option<u32>,
    ) -> Self {
        let interval = frequency.interval();
        // The stored record always occurs, so an end before the start ends on it.
        let end_date = end_date.map(|date| date.max(start_date));
        let end = match (end_date, installments.filter(|n| *n > 0)) {
            (None, None) => RecurrenceEnd::Never,
            (Some(date), None) => RecurrenceEnd::OnDate(date),
            (None, Some(count)) => RecurrenceEnd::AfterOccurrences(count),
            (Some(date), Some(count)) => {
                let last_installment = interval.nth_after(start_date, count - 1);
                if last_installment <= date {
                    RecurrenceEnd::AfterOccurrences(count)
                } else {
                    RecurrenceEnd::OnDate(date)
                }
            }
        };
        Self {
            start_date,
            frequency,
            interval,
            end,
        }
    }

    pub fn allows_occurrence(&self, index: u32, candidate: NaiveDate) -> bool {
        if candidate < self.start_date {
            return false;
        }
        match self.end {
            RecurrenceEnd::Never => true,
            RecurrenceEnd::OnDate(end_date) => candidate <= end_date,
            RecurrenceEnd::AfterOccurrences(limit) => index < limit,
        }
    }

    pub fn occurrence_date(&self, index: u32) -> NaiveDate {
        self.interval.nth_after(self.start_date, index)
    }

    /// Number of occurrences in the series; `None` for open-ended rules.
    pub fn total_occurrences(&self) -> Option<u32> {
        match self.end {
            RecurrenceEnd::Never => None,
            RecurrenceEnd::AfterOccurrences(count) => Some(count),
            RecurrenceEnd::OnDate(end_date) => Some(
                self.interval
                    .steps_until(self.start_date, end_date)
                    .saturating_add(1),
            ),
        }
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        match self.total_occurrences()? {
            0 => None,
            count => Some(self.occurrence_date(count - 1)),
        }
    }

    pub fn is_installment_plan(&self) -> bool {
        matches!(self.end, RecurrenceEnd::AfterOccurrences(_))
    }

    pub fn label(&self) -> String {
        let base = self.interval.label();
        match self.end {
            RecurrenceEnd::Never => base,
            RecurrenceEnd::OnDate(date) => format!("{base} until {date}"),
            RecurrenceEnd::AfterOccurrences(count) => format!("{base}, {count} installments"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        date(2025, 1, 1).and_hms_opt(9, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn expense_amounts_are_stored_negative() {
        let input = NewTransaction::new(
            TransactionKind::Expense,
            42.5,
            "Groceries",
            "Food",
            date(2025, 1, 5),
        );
        let txn = Transaction::from_new(1, 7, input, now());
        assert_eq!(txn.amount, -42.5);
        assert!(txn.is_expense());

        let income = NewTransaction::new(
            TransactionKind::Income,
            -3000.0,
            "Paycheck",
            "Salary",
            date(2025, 1, 5),
        );
        assert_eq!(Transaction::from_new(2, 7, income, now()).amount, 3000.0);
    }

    #[test]
    fn validation_rejects_bad_input() {
        let base = NewTransaction::new(
            TransactionKind::Expense,
            10.0,
            "Bus",
            "transport",
            date(2025, 3, 10),
        );

        let mut ok = base.clone();
        ok.validate(false).unwrap();
        assert_eq!(ok.category, "Transport");

        let mut blank = base.clone();
        blank.description = "  ".into();
        assert!(blank.validate(false).is_err());

        let mut zero = base.clone();
        zero.amount = 0.0;
        assert!(zero.validate(false).is_err());

        let mut wrong_side = base.clone();
        wrong_side.category = "Salary".into();
        assert!(wrong_side.validate(false).is_err());
        assert!(wrong_side.clone().validate(true).is_ok());

        let mut backwards = base.clone().until(date(2025, 3, 1));
        assert!(backwards.validate(false).is_err());

        let mut no_installments = base.in_installments(0);
        assert!(no_installments.validate(false).is_err());
    }

    #[test]
    fn recurrence_missing_frequency_defaults_to_monthly() {
        let input = NewTransaction::new(
            TransactionKind::Expense,
            80.0,
            "Gym",
            "Healthcare",
            date(2025, 1, 15),
        );
        let mut txn = Transaction::from_new(1, 1, input, now());
        assert!(txn.recurrence().is_none());
        txn.is_recurring = true;
        let rule = txn.recurrence().unwrap();
        assert_eq!(rule.frequency, Frequency::Monthly);
        assert_eq!(rule.end, RecurrenceEnd::Never);
        assert_eq!(rule.total_occurrences(), None);
    }

    #[test]
    fn earlier_limit_wins_between_end_date_and_installments() {
        let start = date(2025, 1, 10);
        let by_count = Recurrence::new(start, Frequency::Monthly, Some(date(2025, 12, 31)), Some(3));
        assert_eq!(by_count.end, RecurrenceEnd::AfterOccurrences(3));
        assert_eq!(by_count.last_date(), Some(date(2025, 3, 10)));

        let by_date = Recurrence::new(start, Frequency::Monthly, Some(date(2025, 2, 28)), Some(12));
        assert_eq!(by_date.end, RecurrenceEnd::OnDate(date(2025, 2, 28)));
        assert_eq!(by_date.total_occurrences(), Some(2));
        assert_eq!(by_date.last_date(), Some(date(2025, 2, 10)));
    }

    #[test]
    fn installments_without_flag_still_recur() {
        let mut txn = Transaction::from_new(
            3,
            1,
            NewTransaction::new(
                TransactionKind::Expense,
                100.0,
                "Laptop",
                "Shopping",
                date(2025, 2, 1),
            ),
            now(),
        );
        txn.installments = Some(10);
        let rule = txn.recurrence().unwrap();
        assert!(rule.is_installment_plan());
        assert_eq!(rule.label(), "Monthly, 10 installments");
    }

    #[test]
    fn api_record_round_trips_through_json() {
        let raw = r#"{
            "id": 12,
            "amount": 150.0,
            "description": "Internet",
            "type": "expense",
            "date": "2025-04-05T00:00:00",
            "is_recurring": true,
            "category": "Bills",
            "end_date": null,
            "user_id": 3,
            "created_at": "2025-04-05T10:11:12",
            "updated_at": null
        }"#;
        let mut txn: Transaction = serde_json::from_str(raw).unwrap();
        txn.normalize_sign();
        assert_eq!(txn.amount, -150.0);
        assert_eq!(txn.date, date(2025, 4, 5));
        assert!(txn.frequency.is_none());
        assert_eq!(txn.recurrence().unwrap().frequency, Frequency::Monthly);

        let json = serde_json::to_value(&txn).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2025-04-05");
    }

    #[test]
    fn edit_round_trips_through_new_transaction() {
        let input = NewTransaction::new(
            TransactionKind::Expense,
            25.0,
            "Movie",
            "Entertainment",
            date(2025, 6, 1),
        )
        .recurring(Frequency::Weekly);
        let mut txn = Transaction::from_new(9, 1, input, now());
        let mut edit = NewTransaction::from(&txn);
        assert_eq!(edit.amount, 25.0);
        edit.is_recurring = false;
        txn.apply_update(edit, now());
        assert!(txn.frequency.is_none());
        assert!(txn.updated_at.is_some());
        assert!(txn.recurrence().is_none());
    }

    #[test]
    fn installment_plan_without_flag_keeps_its_rule_on_edit() {
        let mut input = NewTransaction::new(
            TransactionKind::Expense,
            90.0,
            "Headphones",
            "Shopping",
            date(2025, 1, 10),
        );
        input.installments = Some(3);
        assert!(input.repeats());
        let mut txn = Transaction::from_new(4, 1, input, now());
        assert!(!txn.is_recurring);
        assert_eq!(txn.installments, Some(3));

        let mut edit = NewTransaction::from(&txn);
        edit.amount = 120.0;
        txn.apply_update(edit, now());
        assert_eq!(txn.installments, Some(3));
        assert_eq!(txn.frequency, Some(Frequency::Monthly));
        assert_eq!(txn.recurrence().unwrap().total_occurrences(), Some(3));
    }

    #[test]
    fn end_date_before_start_still_keeps_the_first_occurrence() {
        let rule = Recurrence::new(
            date(2025, 3, 10),
            Frequency::Monthly,
            Some(date(2025, 3, 1)),
            None,
        );
        assert_eq!(rule.end, RecurrenceEnd::OnDate(date(2025, 3, 10)));
        assert!(rule.allows_occurrence(0, date(2025, 3, 10)));
        assert!(!rule.allows_occurrence(1, rule.occurrence_date(1)));

        let capped = Recurrence::new(
            date(2025, 3, 10),
            Frequency::Monthly,
            Some(date(2025, 2, 1)),
            Some(6),
        );
        assert_eq!(capped.end, RecurrenceEnd::OnDate(date(2025, 3, 10)));
    }
}
