use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use super::transaction::{Recurrence, RecurrenceEnd, Transaction, TransactionKind};
use super::window::{DateWindow, YearMonth};

/// Upper bound on occurrences produced for a single transaction per projection.
pub const MAX_OCCURRENCES: usize = 1024;

/// Position of an occurrence inside an installment plan, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Installment {
    pub number: u32,
    pub total: u32,
}

impl Installment {
    pub fn label(&self) -> String {
        format!("{}/{}", self.number, self.total)
    }
}

/// One dated instance of a transaction, either the stored record itself or a
/// virtual repetition derived from its recurrence rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub transaction_id: u64,
    pub index: u32,
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub kind: TransactionKind,
    pub installment: Option<Installment>,
    pub is_projected: bool,
}

impl Occurrence {
    fn from_transaction(
        txn: &Transaction,
        index: u32,
        date: NaiveDate,
        rule: Option<&Recurrence>,
    ) -> Self {
        let installment = rule.and_then(|rule| match rule.end {
            RecurrenceEnd::AfterOccurrences(total) => Some(Installment {
                number: index + 1,
                total,
            }),
            _ => None,
        });
        Self {
            transaction_id: txn.id,
            index,
            date,
            amount: txn.amount,
            description: txn.description.clone(),
            category: txn.category.clone(),
            kind: txn.kind,
            installment,
            is_projected: index > 0,
        }
    }

    /// Description with the installment position appended, e.g. "Laptop (3/10)".
    pub fn display_description(&self) -> String {
        match self.installment {
            Some(installment) => format!("{} ({})", self.description, installment.label()),
            None => self.description.clone(),
        }
    }
}

/// Occurrences of a single transaction that fall inside `window`.
pub fn expand(txn: &Transaction, window: &DateWindow) -> Vec<Occurrence> {
    let Some(rule) = txn.recurrence() else {
        if window.contains(txn.date) {
            return vec![Occurrence::from_transaction(txn, 0, txn.date, None)];
        }
        return Vec::new();
    };

    let mut occurrences = Vec::new();
    let mut index = rule.interval.steps_until(rule.start_date, window.start);
    // steps_until lands on or before the window start; step forward into it.
    while rule.occurrence_date(index) < window.start {
        index = index.saturating_add(1);
    }

    while occurrences.len() < MAX_OCCURRENCES {
        let date = rule.occurrence_date(index);
        if !window.contains(date) || !rule.allows_occurrence(index, date) {
            break;
        }
        occurrences.push(Occurrence::from_transaction(txn, index, date, Some(&rule)));
        if index == u32::MAX {
            break;
        }
        index += 1;
    }

    if occurrences.len() == MAX_OCCURRENCES {
        tracing::debug!(
            transaction = txn.id,
            "occurrence projection truncated at {MAX_OCCURRENCES}"
        );
    }
    occurrences
}

/// Occurrences of every transaction inside `window`, ordered by date, then
/// transaction id, then position in the series.
pub fn expand_all<'a, I>(transactions: I, window: &DateWindow) -> Vec<Occurrence>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut occurrences: Vec<Occurrence> = transactions
        .into_iter()
        .flat_map(|txn| expand(txn, window))
        .collect();
    occurrences.sort_by(compare_occurrences);
    occurrences
}

pub fn occurrences_in_month<'a, I>(transactions: I, month: YearMonth) -> Vec<Occurrence>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    expand_all(transactions, &month.window())
}

/// First occurrence strictly after `after`, if the series still has one.
pub fn next_occurrence(txn: &Transaction, after: NaiveDate) -> Option<Occurrence> {
    let Some(rule) = txn.recurrence() else {
        return (txn.date > after).then(|| Occurrence::from_transaction(txn, 0, txn.date, None));
    };
    let mut index = rule.interval.steps_until(rule.start_date, after);
    for _ in 0..MAX_OCCURRENCES {
        let date = rule.occurrence_date(index);
        if !rule.allows_occurrence(index, date) {
            return None;
        }
        if date > after {
            return Some(Occurrence::from_transaction(txn, index, date, Some(&rule)));
        }
        index = index.checked_add(1)?;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecurrenceStatus {
    Active,
    Completed,
}

/// Overview of a recurring transaction relative to a reference date.
#[derive(Debug, Clone, Serialize)]
pub struct RecurrenceSnapshot {
    pub transaction_id: u64,
    pub description: String,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub interval_label: String,
    pub next_due: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub remaining: Option<u32>,
    pub status: RecurrenceStatus,
}

/// Snapshots of every recurring transaction, soonest next due date first; finished
/// series sort last.
pub fn snapshot_recurrences<'a, I>(transactions: I, reference: NaiveDate) -> Vec<RecurrenceSnapshot>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut snapshots: Vec<RecurrenceSnapshot> = transactions
        .into_iter()
        .filter_map(|txn| {
            let rule = txn.recurrence()?;
            let yesterday = reference.pred_opt().unwrap_or(reference);
            let next = next_occurrence(txn, yesterday);
            let remaining = rule.total_occurrences().map(|total| match &next {
                Some(occurrence) => total.saturating_sub(occurrence.index),
                None => 0,
            });
            Some(RecurrenceSnapshot {
                transaction_id: txn.id,
                description: txn.description.clone(),
                amount: txn.amount,
                start_date: rule.start_date,
                interval_label: rule.label(),
                next_due: next.as_ref().map(|occurrence| occurrence.date),
                last_date: rule.last_date(),
                remaining,
                status: if next.is_some() {
                    RecurrenceStatus::Active
                } else {
                    RecurrenceStatus::Completed
                },
            })
        })
        .collect();

    snapshots.sort_by(|a, b| match (a.next_due, b.next_due) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.transaction_id.cmp(&b.transaction_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.transaction_id.cmp(&b.transaction_id),
    });
    snapshots
}

fn compare_occurrences(a: &Occurrence, b: &Occurrence) -> Ordering {
    a.date
        .cmp(&b.date)
        .then(a.transaction_id.cmp(&b.transaction_id))
        .then(a.index.cmp(&b.index))
}
