pub mod settings;

use std::path::{Path, PathBuf};

pub use settings::{ScanSettings, Settings, SettingsLayer, DEFAULT_OUTPUT_DIR};

pub const PROJECT_CONFIG_FILE: &str = "agentcut.toml";
pub const CONFIG_DIR_ENV: &str = "AGENTCUT_CONFIG_DIR";

/// `$AGENTCUT_CONFIG_DIR/config.toml`, else `<config dir>/agentcut/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir).join("config.toml"));
    }
    dirs::config_dir().map(|d| d.join("agentcut").join("config.toml"))
}

pub fn project_config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(PROJECT_CONFIG_FILE)
}
