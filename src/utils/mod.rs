pub mod build_info;
pub mod paths;

use std::{fs, io, path::Path, sync::Once};

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "finance_core=info".parse() {
            filter = filter.add_directive(directive);
        }

        // A subscriber installed by the host application wins.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    });
}

/// Creates `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `data` to a sibling temporary file and renames it over `path`.
pub fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = paths::tmp_path(path);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
