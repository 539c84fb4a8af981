use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    currency::{CurrencyCode, FormatOptions, LocaleConfig},
    errors::{FinanceError, FinanceResult},
    language::{find_language, DEFAULT_LANGUAGE},
    utils::{
        ensure_dir,
        paths::{is_plain_file_name, PathResolver},
        write_atomic,
    },
};

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// User preferences chosen on the settings screens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_language")]
    pub language: String,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ledger: Option<String>,
    #[serde(default)]
    pub allow_custom_categories: bool,
    #[serde(default)]
    pub format: FormatOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Self::default_language(),
            currency: CurrencyCode::default(),
            last_ledger: None,
            allow_custom_categories: false,
            format: FormatOptions::default(),
        }
    }
}

impl Config {
    fn default_language() -> String {
        DEFAULT_LANGUAGE.to_string()
    }

    pub fn locale(&self) -> LocaleConfig {
        LocaleConfig::for_language(&self.language)
    }

    pub fn set_currency(&mut self, code: &str) -> FinanceResult<()> {
        self.currency = CurrencyCode::supported(code)?;
        Ok(())
    }

    pub fn set_language(&mut self, code: &str) -> FinanceResult<()> {
        let language = find_language(code).ok_or_else(|| {
            FinanceError::Config(format!("unsupported language `{}`", code.trim()))
        })?;
        self.language = language.code.to_string();
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    pub fn new() -> FinanceResult<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> FinanceResult<Self> {
        ensure_dir(&base)?;
        let backups_dir = PathResolver::config_backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            backups_dir,
        })
    }

    pub fn load(&self) -> FinanceResult<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)?;
        if find_language(&config.language).is_none() {
            tracing::warn!(language = %config.language, "unknown language in config");
        }
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> FinanceResult<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        tracing::info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    /// Writes a timestamped copy of `config`, returning the backup file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> FinanceResult<String> {
        ensure_dir(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut name = format!("config_{}", timestamp);
        if let Some(label) = sanitize_note(note) {
            name.push('_');
            name.push_str(&label);
        }
        name.push_str(&format!(".{}", BACKUP_EXTENSION));
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.backups_dir.join(&name), &json)?;
        tracing::info!(backup = %name, "configuration backup created");
        Ok(name)
    }

    pub fn restore(&self, backup_name: &str) -> FinanceResult<Config> {
        if !is_plain_file_name(backup_name) {
            return Err(FinanceError::Storage(format!(
                "invalid configuration backup name `{}`",
                backup_name
            )));
        }
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(FinanceError::Storage(format!(
                "configuration backup `{}` not found",
                backup_name
            )));
        }
        let data = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&data)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> FinanceResult<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_timestamp(b)
                .cmp(&parse_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub(crate) fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extracts the `YYYYMMDD_HHMMSS` stamp that follows the first `_` in a backup name.
pub(crate) fn parse_timestamp(name: &str) -> Option<NaiveDateTime> {
    let (_, rest) = name.split_once('_')?;
    let stamp = rest.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConfigManager) {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        (temp, manager)
    }

    #[test]
    fn load_returns_defaults_when_missing() {
        let (_temp, manager) = manager();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.currency.as_str(), "USD");
    }

    #[test]
    fn save_then_load_keeps_selection() {
        let (_temp, manager) = manager();
        let mut config = Config::default();
        config.set_currency("brl").unwrap();
        config.set_language("pt").unwrap();
        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.currency.as_str(), "BRL");
        assert_eq!(loaded.language, "pt-BR");
        assert_eq!(loaded.locale().decimal_separator, ',');
    }

    #[test]
    fn rejects_unsupported_selections() {
        let mut config = Config::default();
        assert!(config.set_currency("DOGE").is_err());
        assert!(matches!(
            config.set_language("klingon"),
            Err(FinanceError::Config(_))
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn backup_and_restore_round_trip() {
        let (_temp, manager) = manager();
        let mut config = Config::default();
        config.set_currency("EUR").unwrap();
        let name = manager.backup(&config, Some("Before trip!")).unwrap();
        assert!(name.starts_with("config_"));
        assert!(name.ends_with("_before-trip.json"));
        assert_eq!(manager.list_backups().unwrap(), vec![name.clone()]);

        manager.save(&Config::default()).unwrap();
        let restored = manager.restore(&name).unwrap();
        assert_eq!(restored.currency.as_str(), "EUR");
        assert_eq!(manager.load().unwrap().currency.as_str(), "EUR");
        assert!(manager.restore("config_missing.json").is_err());
    }

    #[test]
    fn restore_stays_inside_the_backup_directory() {
        let (temp, manager) = manager();
        manager.save(&Config::default()).unwrap();
        let err = manager.restore("../config.json").unwrap_err();
        assert!(matches!(err, FinanceError::Storage(_)));
        assert!(temp.path().join("config.json").exists());
    }

    #[test]
    fn parses_backup_timestamps() {
        assert!(parse_timestamp("config_20250102_030405_note.json").is_some());
        assert!(parse_timestamp("config_garbage.json").is_none());
        assert_eq!(sanitize_note(Some("  ")), None);
        assert_eq!(sanitize_note(Some("Pre Import v2")), Some("pre-import-v2".into()));
    }
}
