use dirs::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".finance_core";
const LEDGER_DIR: &str = "ledgers";
const BACKUP_DIR: &str = "backups";
const CONFIG_FILE: &str = "config.json";
const CONFIG_BACKUP_DIR: &str = "config_backups";
const STATE_FILE: &str = "state.json";
const TMP_SUFFIX: &str = "tmp";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "FINANCE_CORE_HOME";

/// Resolves the on-disk layout under the application data directory.
pub struct PathResolver;

impl PathResolver {
    /// Returns the application data directory, defaulting to `~/.finance_core`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
        root.unwrap_or_else(Self::base_dir)
    }

    pub fn ledger_dir_in(base: &Path) -> PathBuf {
        base.join(LEDGER_DIR)
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join(BACKUP_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    pub fn config_backup_dir_in(base: &Path) -> PathBuf {
        base.join(CONFIG_BACKUP_DIR)
    }

    pub fn state_file_in(base: &Path) -> PathBuf {
        base.join(STATE_FILE)
    }
}

/// `ledger.json` becomes `ledger.json.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Lower-case slug used for file names: alphanumerics kept, runs of anything else
/// collapsed to a single `-`.
pub fn canonical_name(name: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !slug.is_empty() && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "ledger".to_string()
    } else {
        trimmed.to_string()
    }
}

/// True when `name` is a bare file name that stays inside the directory it is
/// joined onto.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|file| file.to_str()) == Some(name)
}
