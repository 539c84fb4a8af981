use std::collections::HashMap;

use serde::Serialize;

use super::recurring::Occurrence;
use super::transaction::TransactionKind;
use super::window::YearMonth;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub kind: TransactionKind,
    /// Absolute amount spent or earned.
    pub total: f64,
    /// Fraction of the kind's total, in `0.0..=1.0`.
    pub share: f64,
}

/// Income, expenses, and balance for one month of occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub count: usize,
    pub by_category: Vec<CategoryTotal>,
}

impl MonthlySummary {
    pub fn from_occurrences(month: YearMonth, occurrences: &[Occurrence]) -> Self {
        let mut income = 0.0;
        let mut expenses = 0.0;
        let mut buckets: HashMap<(String, TransactionKind), f64> = HashMap::new();

        for occurrence in occurrences {
            let kind = if occurrence.amount > 0.0 {
                income += occurrence.amount;
                TransactionKind::Income
            } else {
                expenses += occurrence.amount.abs();
                TransactionKind::Expense
            };
            *buckets
                .entry((occurrence.category.clone(), kind))
                .or_default() += occurrence.amount.abs();
        }

        let mut by_category: Vec<CategoryTotal> = buckets
            .into_iter()
            .map(|((category, kind), total)| {
                let side = match kind {
                    TransactionKind::Income => income,
                    TransactionKind::Expense => expenses,
                };
                CategoryTotal {
                    category,
                    kind,
                    total,
                    share: if side > 0.0 { total / side } else { 0.0 },
                }
            })
            .collect();
        by_category.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });

        Self {
            month,
            income,
            expenses,
            balance: income - expenses,
            count: occurrences.len(),
            by_category,
        }
    }

    pub fn expenses_by_category(&self) -> impl Iterator<Item = &CategoryTotal> {
        self.by_category
            .iter()
            .filter(|total| total.kind == TransactionKind::Expense)
    }

    pub fn chart(&self) -> Option<ChartBreakdown> {
        ChartBreakdown::new(self.income, self.expenses)
    }
}

/// Income versus expenses split, as drawn by the pie chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartBreakdown {
    pub income: f64,
    pub expenses: f64,
    pub income_share: f64,
    pub expense_share: f64,
}

impl ChartBreakdown {
    /// `None` when there is nothing to draw.
    pub fn new(income: f64, expenses: f64) -> Option<Self> {
        let income = income.max(0.0);
        let expenses = expenses.max(0.0);
        let total = income + expenses;
        if total <= 0.0 {
            return None;
        }
        Some(Self {
            income,
            expenses,
            income_share: income / total,
            expense_share: expenses / total,
        })
    }

    pub fn from_occurrences(occurrences: &[Occurrence]) -> Option<Self> {
        let (income, expenses) =
            occurrences
                .iter()
                .fold((0.0, 0.0), |(income, expenses), occurrence| {
                    if occurrence.amount > 0.0 {
                        (income + occurrence.amount, expenses)
                    } else {
                        (income, expenses + occurrence.amount.abs())
                    }
                });
        Self::new(income, expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn occurrence(id: u64, amount: f64, category: &str) -> Occurrence {
        Occurrence {
            transaction_id: id,
            index: 0,
            date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            amount,
            description: format!("txn {id}"),
            category: category.into(),
            kind: TransactionKind::from_amount(amount),
            installment: None,
            is_projected: false,
        }
    }

    fn may() -> YearMonth {
        YearMonth::new(2025, 5).unwrap()
    }

    #[test]
    fn summary_splits_income_and_expenses() {
        let occurrences = vec![
            occurrence(1, 3000.0, "Salary"),
            occurrence(2, -900.0, "Housing"),
            occurrence(3, -100.0, "Food"),
            occurrence(4, -50.0, "Food"),
        ];
        let summary = MonthlySummary::from_occurrences(may(), &occurrences);
        assert_eq!(summary.income, 3000.0);
        assert_eq!(summary.expenses, 1050.0);
        assert_eq!(summary.balance, 1950.0);
        assert_eq!(summary.count, 4);

        let expenses: Vec<(&str, f64)> = summary
            .expenses_by_category()
            .map(|total| (total.category.as_str(), total.total))
            .collect();
        assert_eq!(expenses, vec![("Housing", 900.0), ("Food", 150.0)]);
        let food = summary
            .by_category
            .iter()
            .find(|total| total.category == "Food")
            .unwrap();
        assert!((food.share - 150.0 / 1050.0).abs() < 1e-9);
    }

    #[test]
    fn same_name_on_both_sides_stays_separate() {
        let occurrences = vec![
            occurrence(1, 200.0, "Investments"),
            occurrence(2, -500.0, "Investments"),
        ];
        let summary = MonthlySummary::from_occurrences(may(), &occurrences);
        assert_eq!(summary.by_category.len(), 2);
        assert_eq!(summary.by_category[0].kind, TransactionKind::Expense);
        assert_eq!(summary.by_category[1].share, 1.0);
    }

    #[test]
    fn empty_month_has_no_chart() {
        let summary = MonthlySummary::from_occurrences(may(), &[]);
        assert_eq!(summary.balance, 0.0);
        assert!(summary.chart().is_none());
        assert!(ChartBreakdown::from_occurrences(&[]).is_none());
    }

    #[test]
    fn chart_shares_sum_to_one() {
        let chart = ChartBreakdown::from_occurrences(&[
            occurrence(1, 750.0, "Freelance"),
            occurrence(2, -250.0, "Bills"),
        ])
        .unwrap();
        assert_eq!(chart.income_share, 0.75);
        assert_eq!(chart.expense_share, 0.25);
    }
}
