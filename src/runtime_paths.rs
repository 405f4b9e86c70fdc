use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};

pub const HOME_ENV: &str = "CLIENTDESK_HOME";

static ROOT_OVERRIDE: OnceLock<RwLock<Option<PathBuf>>> = OnceLock::new();

fn root_override() -> &'static RwLock<Option<PathBuf>> {
    ROOT_OVERRIDE.get_or_init(|| RwLock::new(None))
}

/// Redirects all local files (config, browser storage) under `path`.
/// Takes precedence over `CLIENTDESK_HOME`.
pub fn set_app_root_override(path: Option<PathBuf>) {
    match root_override().write() {
        Ok(mut guard) => *guard = path,
        Err(poisoned) => *poisoned.into_inner() = path,
    }
}

fn resolve_root<F>(home_env: F) -> PathBuf
where
    F: Fn() -> Option<String>,
{
    let pinned = match root_override().read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    pinned
        .or_else(|| {
            home_env()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| {
            ProjectDirs::from("", "", "clientdesk").map(|dirs| dirs.data_dir().to_path_buf())
        })
        .unwrap_or_else(|| std::env::temp_dir().join("clientdesk"))
}

pub fn app_root() -> PathBuf {
    resolve_root(|| std::env::var(HOME_ENV).ok())
}

pub fn default_config_path() -> PathBuf {
    app_root().join("config.json")
}

pub fn default_storage_path() -> PathBuf {
    app_root().join("storage").join("local_storage.json")
}
