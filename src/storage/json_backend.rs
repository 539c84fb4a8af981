use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::{parse_timestamp, sanitize_note},
    errors::{FinanceError, FinanceResult},
    ledger::{Ledger, Transaction},
    utils::{
        ensure_dir,
        paths::{canonical_name, is_plain_file_name, PathResolver},
        write_atomic,
    },
};

use super::StorageBackend;

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DEFAULT_RETENTION: usize = 5;

/// Ledgers stored as pretty JSON under `ledgers/<slug>.json`, with rolling backups
/// under `backups/<slug>/`.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    ledgers_dir: PathBuf,
    backups_dir: PathBuf,
    state_file: PathBuf,
    retention: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    last_ledger: Option<String>,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> FinanceResult<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let ledgers_dir = PathResolver::ledger_dir_in(&app_root);
        let backups_dir = PathResolver::backup_dir_in(&app_root);
        ensure_dir(&ledgers_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            state_file: PathResolver::state_file_in(&app_root),
            root: app_root,
            ledgers_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> FinanceResult<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir.join(format!("{}.json", canonical_name(name)))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.ledger_path(name).exists()
    }

    /// Slugs of every stored ledger, sorted.
    pub fn list_ledgers(&self) -> FinanceResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.ledgers_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn last_ledger(&self) -> FinanceResult<Option<String>> {
        Ok(self.read_state()?.last_ledger)
    }

    pub fn record_last_ledger(&self, name: Option<&str>) -> FinanceResult<()> {
        let mut state = self.read_state()?;
        state.last_ledger = name.map(canonical_name);
        write_atomic(&self.state_file, &serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }

    fn read_state(&self) -> FinanceResult<StoreState> {
        if !self.state_file.exists() {
            return Ok(StoreState::default());
        }
        let data = fs::read_to_string(&self.state_file)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn backup_file_name(name: &str, note: Option<&str>) -> String {
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        format!("{}.{}", stem, BACKUP_EXTENSION)
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> FinanceResult<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_name = Self::backup_file_name(name, None);
        fs::copy(path, dir.join(&backup_name))?;
        tracing::debug!(ledger = name, backup = %backup_name, "previous ledger file kept");
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> FinanceResult<()> {
        let backups = self.list_backups(name)?;
        for entry in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backup_path(name, entry)) {
                tracing::warn!(backup = %entry, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, ledger: &Ledger, name: &str) -> FinanceResult<()> {
        let path = self.ledger_path(name);
        self.backup_existing_file(name, &path)?;
        save_ledger_to_path(ledger, &path)?;
        tracing::info!(ledger = name, path = %path.display(), "ledger saved");
        Ok(())
    }

    fn load(&self, name: &str) -> FinanceResult<Ledger> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(FinanceError::NotFound(format!("ledger `{}`", name)));
        }
        load_ledger_from_path(&path)
    }

    /// Backup file names for `name`, newest first.
    fn list_backups(&self, name: &str) -> FinanceResult<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|file| file.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_timestamp(b)
                .cmp(&parse_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> FinanceResult<String> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let backup_name = Self::backup_file_name(name, note);
        write_atomic(&dir.join(&backup_name), &serde_json::to_string_pretty(ledger)?)?;
        self.prune_backups(name)?;
        tracing::info!(ledger = name, backup = %backup_name, "ledger backup created");
        Ok(backup_name)
    }

    fn restore(&self, name: &str, backup_name: &str) -> FinanceResult<Ledger> {
        if !is_plain_file_name(backup_name) {
            return Err(FinanceError::Storage(format!(
                "invalid backup name `{}`",
                backup_name
            )));
        }
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(FinanceError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let ledger = load_ledger_from_path(&backup_path)?;
        save_ledger_to_path(&ledger, &self.ledger_path(name))?;
        tracing::info!(ledger = name, backup = backup_name, "ledger restored");
        Ok(ledger)
    }
}

pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> FinanceResult<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    write_atomic(path, &json)?;
    Ok(())
}

pub fn load_ledger_from_path(path: &Path) -> FinanceResult<Ledger> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Reads a JSON array of transaction records in the API's wire format.
pub fn load_transactions_from_path(path: &Path) -> FinanceResult<Vec<Transaction>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;
    use crate::ledger::{NewTransaction, TransactionKind};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn storage_with_temp_dir(retention: usize) -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf()), Some(retention))
            .expect("json storage");
        (storage, temp)
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new("Household", CurrencyCode::new("USD"));
        ledger
            .add_transaction(NewTransaction::new(
                TransactionKind::Expense,
                25.0,
                "Groceries",
                "Food",
                NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            ))
            .unwrap();
        ledger
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir(3);
        storage.save(&sample_ledger(), "Household").expect("save");
        let loaded = storage.load("household").expect("load");
        assert_eq!(loaded.name, "Household");
        assert_eq!(loaded.transactions().len(), 1);
        assert_eq!(loaded.transactions()[0].amount, -25.0);
        assert_eq!(storage.list_ledgers().unwrap(), vec!["household"]);
        assert!(matches!(storage.load("missing"), Err(FinanceError::NotFound(_))));
    }

    #[test]
    fn backups_are_pruned_to_retention() {
        let (storage, _guard) = storage_with_temp_dir(2);
        let ledger = sample_ledger();
        let base = format!("household_{}", Utc::now().format(BACKUP_TIMESTAMP_FORMAT));
        for note in ["one", "two", "three"] {
            let dir = storage.backup_dir("household");
            ensure_dir(&dir).unwrap();
            let path = dir.join(format!("{}_{}.json", base, note));
            save_ledger_to_path(&ledger, &path).unwrap();
        }
        storage.backup(&ledger, "household", Some("latest")).unwrap();
        assert_eq!(storage.list_backups("household").unwrap().len(), 2);
    }

    #[test]
    fn restore_rewrites_the_ledger_file() {
        let (storage, _guard) = storage_with_temp_dir(5);
        let ledger = sample_ledger();
        storage.save(&ledger, "household").unwrap();
        let backup = storage.backup(&ledger, "household", Some("pre import")).unwrap();
        assert!(backup.ends_with("_pre-import.json"));

        let mut emptied = ledger.clone();
        emptied.delete_transaction(1).unwrap();
        storage.save(&emptied, "household").unwrap();
        assert!(storage.load("household").unwrap().transactions().is_empty());

        let restored = storage.restore("household", &backup).unwrap();
        assert_eq!(restored.transactions().len(), 1);
        assert_eq!(storage.load("household").unwrap().transactions().len(), 1);
        assert!(storage.restore("household", "nope.json").is_err());
    }

    #[test]
    fn restore_rejects_names_outside_the_backup_folder() {
        let (storage, _guard) = storage_with_temp_dir(5);
        let ledger = sample_ledger();
        storage.save(&ledger, "household").unwrap();
        storage.save(&ledger, "other").unwrap();
        for name in ["../other/other.json", "../../ledgers/other.json", ".."] {
            assert!(matches!(
                storage.restore("household", name),
                Err(FinanceError::Storage(_))
            ));
        }
        assert_eq!(storage.load("household").unwrap().transactions().len(), 1);
    }

    #[test]
    fn remembers_last_ledger() {
        let (storage, _guard) = storage_with_temp_dir(5);
        assert_eq!(storage.last_ledger().unwrap(), None);
        storage.record_last_ledger(Some("My Budget")).unwrap();
        assert_eq!(storage.last_ledger().unwrap().as_deref(), Some("my-budget"));
        storage.record_last_ledger(None).unwrap();
        assert_eq!(storage.last_ledger().unwrap(), None);
    }
}
