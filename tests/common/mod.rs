#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use finance_core::{
    config::ConfigManager,
    currency::CurrencyCode,
    ledger::{Frequency, Ledger, NewTransaction, TransactionKind},
    storage::JsonStorage,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh data directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated storage and config managers backed by a unique directory.
pub fn setup_test_env() -> (JsonStorage, ConfigManager) {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base.clone()), Some(3)).expect("create json storage");
    let config = ConfigManager::with_base_dir(base).expect("create config manager");
    (storage, config)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// A household book with a monthly salary, a rent bill ending in June, a phone
/// bought in 4 installments, a weekly grocery run, and a one-off dinner.
pub fn household_ledger() -> Ledger {
    let mut ledger = Ledger::new("Household", CurrencyCode::new("USD"));
    let inputs = vec![
        NewTransaction::new(
            TransactionKind::Income,
            4200.0,
            "Paycheck",
            "Salary",
            date(2025, 1, 31),
        )
        .recurring(Frequency::Monthly),
        NewTransaction::new(
            TransactionKind::Expense,
            1500.0,
            "Rent",
            "Housing",
            date(2025, 1, 1),
        )
        .recurring(Frequency::Monthly)
        .until(date(2025, 6, 1)),
        NewTransaction::new(
            TransactionKind::Expense,
            250.0,
            "Phone",
            "Shopping",
            date(2025, 2, 10),
        )
        .recurring(Frequency::Monthly)
        .in_installments(4),
        NewTransaction::new(
            TransactionKind::Expense,
            60.0,
            "Groceries",
            "Food",
            date(2025, 3, 3),
        )
        .recurring(Frequency::Weekly),
        NewTransaction::new(
            TransactionKind::Expense,
            85.0,
            "Anniversary dinner",
            "Food",
            date(2025, 3, 14),
        ),
    ];
    for input in inputs {
        ledger.add_transaction(input).expect("valid transaction");
    }
    ledger
}
