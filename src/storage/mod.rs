pub mod json_backend;

use std::path::Path;

use crate::{errors::FinanceResult, ledger::Ledger};

/// Abstraction over persistence backends capable of storing ledgers and their backups.
pub trait StorageBackend: Send + Sync {
    fn save(&self, ledger: &Ledger, name: &str) -> FinanceResult<()>;
    fn load(&self, name: &str) -> FinanceResult<Ledger>;
    fn list_backups(&self, name: &str) -> FinanceResult<Vec<String>>;
    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> FinanceResult<String>;
    fn restore(&self, name: &str, backup_name: &str) -> FinanceResult<Ledger>;

    /// Ad-hoc export to a path outside managed storage.
    fn save_to_path(&self, ledger: &Ledger, path: &Path) -> FinanceResult<()> {
        json_backend::save_ledger_to_path(ledger, path)
    }

    fn load_from_path(&self, path: &Path) -> FinanceResult<Ledger> {
        json_backend::load_ledger_from_path(path)
    }
}

pub use json_backend::{load_transactions_from_path, JsonStorage, DEFAULT_RETENTION};
