use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;
use crate::errors::{FinanceError, FinanceResult};

use super::category::CategoryFilter;
use super::recurring::{self, Occurrence, RecurrenceSnapshot};
use super::summary::{ChartBreakdown, MonthlySummary};
use super::transaction::{NewTransaction, Transaction};
use super::window::YearMonth;

/// Local book of transactions for one user, the cache behind every screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub name: String,
    #[serde(default)]
    pub base_currency: CurrencyCode,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub allow_custom_categories: bool,
    #[serde(default)]
    transactions: Vec<Transaction>,
    #[serde(default = "Ledger::first_id")]
    next_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the month screens render: the filtered occurrences, their totals,
/// and the chart split.
#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    pub month: YearMonth,
    pub filter: CategoryFilter,
    pub occurrences: Vec<Occurrence>,
    pub summary: MonthlySummary,
    pub chart: Option<ChartBreakdown>,
}

impl Ledger {
    pub fn new(name: impl Into<String>, base_currency: CurrencyCode) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            base_currency,
            user_id: 0,
            allow_custom_categories: false,
            transactions: Vec::new(),
            next_id: Self::first_id(),
            created_at: now,
            updated_at: now,
        }
    }

    fn first_id() -> u64 {
        1
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: u64) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn add_transaction(&mut self, mut input: NewTransaction) -> FinanceResult<u64> {
        input.validate(self.allow_custom_categories)?;
        let id = self.allocate_id()?;
        let txn = Transaction::from_new(id, self.user_id, input, Utc::now());
        tracing::info!(
            ledger = %self.name,
            id,
            amount = txn.amount,
            recurring = txn.is_recurring,
            "transaction added"
        );
        self.transactions.push(txn);
        self.touch();
        Ok(id)
    }

    /// Hands out `next_id`, refusing once it would reuse a stored id.
    fn allocate_id(&mut self) -> FinanceResult<u64> {
        let id = self.next_id;
        if self.transaction(id).is_some() {
            return Err(FinanceError::Storage(format!(
                "transaction id {id} is already taken, no ids left to allocate"
            )));
        }
        self.next_id = id.saturating_add(1);
        Ok(id)
    }

    pub fn update_transaction(&mut self, id: u64, mut input: NewTransaction) -> FinanceResult<()> {
        input.validate(self.allow_custom_categories)?;
        let txn = self
            .transactions
            .iter_mut()
            .find(|txn| txn.id == id)
            .ok_or_else(|| FinanceError::NotFound(format!("transaction {id}")))?;
        txn.apply_update(input, Utc::now());
        tracing::info!(ledger = %self.name, id, "transaction updated");
        self.touch();
        Ok(())
    }

    pub fn delete_transaction(&mut self, id: u64) -> FinanceResult<Transaction> {
        let position = self
            .transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or_else(|| FinanceError::NotFound(format!("transaction {id}")))?;
        let removed = self.transactions.remove(position);
        tracing::info!(ledger = %self.name, id, "transaction deleted");
        self.touch();
        Ok(removed)
    }

    /// Replaces the whole book with records fetched from the API.
    ///
    /// Amount signs are normalised and the id counter moves past the largest id
    /// seen, stopping at `u64::MAX`. Duplicate ids keep the last record.
    pub fn replace_all(&mut self, records: Vec<Transaction>) -> usize {
        self.transactions.clear();
        self.next_id = Self::first_id();
        let count = self.merge_records(records);
        tracing::info!(ledger = %self.name, count, "transactions refreshed");
        count
    }

    /// Merges API records into the book, overwriting entries with matching ids.
    pub fn import_api_records(&mut self, records: Vec<Transaction>) -> usize {
        let count = self.merge_records(records);
        tracing::info!(ledger = %self.name, count, "transactions imported");
        count
    }

    fn merge_records(&mut self, records: Vec<Transaction>) -> usize {
        let count = records.len();
        for mut record in records {
            record.normalize_sign();
            self.next_id = self.next_id.max(record.id.saturating_add(1));
            match self.transactions.iter_mut().find(|txn| txn.id == record.id) {
                Some(existing) => *existing = record,
                None => self.transactions.push(record),
            }
        }
        self.transactions.sort_by_key(|txn| (txn.date, txn.id));
        self.touch();
        count
    }

    pub fn occurrences_in_month(&self, month: YearMonth, filter: &CategoryFilter) -> Vec<Occurrence> {
        recurring::occurrences_in_month(
            self.transactions.iter().filter(|txn| filter.matches(&txn.category)),
            month,
        )
    }

    pub fn month_view(&self, month: YearMonth, filter: CategoryFilter) -> MonthView {
        let occurrences = self.occurrences_in_month(month, &filter);
        let summary = MonthlySummary::from_occurrences(month, &occurrences);
        let chart = summary.chart();
        tracing::debug!(
            ledger = %self.name,
            %month,
            occurrences = occurrences.len(),
            "month view built"
        );
        MonthView {
            month,
            filter,
            occurrences,
            summary,
            chart,
        }
    }

    pub fn recurring_snapshots(&self, reference: NaiveDate) -> Vec<RecurrenceSnapshot> {
        recurring::snapshot_recurrences(&self.transactions, reference)
    }

    /// Categories that actually appear in the book, in first-seen order.
    pub fn used_categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for txn in &self.transactions {
            if !seen.iter().any(|name| name.eq_ignore_ascii_case(&txn.category)) {
                seen.push(txn.category.clone());
            }
        }
        seen
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::time_interval::Frequency;
    use crate::ledger::transaction::TransactionKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new("Household", CurrencyCode::new("brl"));
        ledger
            .add_transaction(
                NewTransaction::new(
                    TransactionKind::Income,
                    5000.0,
                    "Paycheck",
                    "Salary",
                    date(2025, 1, 5),
                )
                .recurring(Frequency::Monthly),
            )
            .unwrap();
        ledger
            .add_transaction(
                NewTransaction::new(
                    TransactionKind::Expense,
                    300.0,
                    "Sofa",
                    "Housing",
                    date(2025, 1, 20),
                )
                .in_installments(3),
            )
            .unwrap();
        ledger
            .add_transaction(NewTransaction::new(
                TransactionKind::Expense,
                80.0,
                "Dinner",
                "Food",
                date(2025, 2, 14),
            ))
            .unwrap();
        ledger
    }

    #[test]
    fn ids_increase_and_invalid_input_is_rejected() {
        let mut ledger = sample_ledger();
        assert_eq!(ledger.transactions().len(), 3);
        assert_eq!(ledger.transactions()[2].id, 3);
        let err = ledger
            .add_transaction(NewTransaction::new(
                TransactionKind::Expense,
                10.0,
                "",
                "Food",
                date(2025, 2, 1),
            ))
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvalidInput(_)));
        assert_eq!(ledger.transactions().len(), 3);
    }

    #[test]
    fn month_view_combines_projection_filter_and_totals() {
        let ledger = sample_ledger();
        let february = ledger.month_view(month(2025, 2), CategoryFilter::All);
        assert_eq!(february.occurrences.len(), 3);
        assert_eq!(february.summary.income, 5000.0);
        assert_eq!(february.summary.expenses, 380.0);
        assert!(february.chart.is_some());

        let food_only = ledger.month_view(month(2025, 2), CategoryFilter::from_selection(Some("food")));
        assert_eq!(food_only.occurrences.len(), 1);
        assert_eq!(food_only.summary.balance, -80.0);

        let april = ledger.month_view(month(2025, 4), CategoryFilter::All);
        assert_eq!(april.summary.expenses, 0.0);
        assert_eq!(april.summary.income, 5000.0);

        let before = ledger.month_view(month(2024, 12), CategoryFilter::All);
        assert!(before.occurrences.is_empty());
        assert!(before.chart.is_none());
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let mut ledger = sample_ledger();
        let mut edit = NewTransaction::from(ledger.transaction(3).unwrap());
        edit.amount = 95.0;
        ledger.update_transaction(3, edit.clone()).unwrap();
        assert_eq!(ledger.transaction(3).unwrap().amount, -95.0);
        assert!(matches!(
            ledger.update_transaction(99, edit),
            Err(FinanceError::NotFound(_))
        ));
        let removed = ledger.delete_transaction(2).unwrap();
        assert_eq!(removed.description, "Sofa");
        assert!(ledger.delete_transaction(2).is_err());
    }

    #[test]
    fn replace_all_normalises_and_advances_ids() {
        let mut ledger = sample_ledger();
        let mut record = ledger.transaction(3).unwrap().clone();
        record.id = 40;
        record.amount = 12.0;
        let count = ledger.replace_all(vec![record]);
        assert_eq!(count, 1);
        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.transaction(40).unwrap().amount, -12.0);
        let next = ledger
            .add_transaction(NewTransaction::new(
                TransactionKind::Income,
                1.0,
                "Refund",
                "Refunds",
                date(2025, 3, 1),
            ))
            .unwrap();
        assert_eq!(next, 41);
    }

    #[test]
    fn used_categories_are_unique() {
        let ledger = sample_ledger();
        assert_eq!(ledger.used_categories(), vec!["Salary", "Housing", "Food"]);
    }

    #[test]
    fn ids_run_out_without_reusing_imported_ones() {
        let mut ledger = sample_ledger();
        let mut record = ledger.transaction(3).unwrap().clone();
        record.id = u64::MAX - 1;
        ledger.import_api_records(vec![record.clone()]);
        let dinner = NewTransaction::from(ledger.transaction(3).unwrap());

        assert_eq!(ledger.add_transaction(dinner.clone()).unwrap(), u64::MAX);
        let err = ledger.add_transaction(dinner.clone()).unwrap_err();
        assert!(matches!(err, FinanceError::Storage(_)));

        record.id = u64::MAX;
        let mut full = sample_ledger();
        full.import_api_records(vec![record]);
        let before = full.transactions().len();
        assert!(full.add_transaction(dinner).is_err());
        assert_eq!(full.transactions().len(), before);
    }

    #[test]
    fn installment_only_import_survives_an_edit() {
        let raw = r#"[{
            "id": 5,
            "amount": 90,
            "description": "Headphones",
            "type": "expense",
            "date": "2025-01-10",
            "is_recurring": false,
            "installments": 3,
            "category": "Shopping",
            "user_id": 1,
            "created_at": "2025-01-10T08:00:00Z"
        }]"#;
        let records: Vec<Transaction> = serde_json::from_str(raw).unwrap();
        let mut ledger = sample_ledger();
        ledger.import_api_records(records);
        let headphones = |ledger: &Ledger| {
            ledger
                .month_view(month(2025, 2), CategoryFilter::from_selection(Some("Shopping")))
                .occurrences
                .len()
        };
        assert_eq!(headphones(&ledger), 1);

        let mut edit = NewTransaction::from(ledger.transaction(5).unwrap());
        edit.amount = 120.0;
        ledger.update_transaction(5, edit).unwrap();
        assert_eq!(ledger.transaction(5).unwrap().installments, Some(3));
        assert_eq!(headphones(&ledger), 1);
        let march = ledger.month_view(month(2025, 3), CategoryFilter::from_selection(Some("Shopping")));
        assert_eq!(march.occurrences[0].display_description(), "Headphones (3/3)");
    }

    #[test]
    fn imported_end_before_start_keeps_the_record_visible() {
        let raw = r#"[{
            "id": 8,
            "amount": -45,
            "description": "Gym",
            "type": "expense",
            "date": "2025-03-10",
            "is_recurring": true,
            "frequency": "monthly",
            "end_date": "2025-03-01",
            "category": "Healthcare",
            "user_id": 1,
            "created_at": "2025-03-10T08:00:00Z"
        }]"#;
        let mut ledger = Ledger::new("Gym", CurrencyCode::new("USD"));
        ledger.replace_all(serde_json::from_str(raw).unwrap());
        let march = ledger.month_view(month(2025, 3), CategoryFilter::All);
        assert_eq!(march.occurrences.len(), 1);
        assert_eq!(march.summary.expenses, 45.0);
        assert!(march.chart.is_some());
        let april = ledger.month_view(month(2025, 4), CategoryFilter::All);
        assert!(april.occurrences.is_empty());
    }
}
