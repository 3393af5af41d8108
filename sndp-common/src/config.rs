//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Name of the database file inside the data folder
pub const DB_FILE_NAME: &str = "sndp.db";

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_folder())
}

/// Full path of the SQLite database inside the data folder
pub fn db_path(data_folder: &std::path::Path) -> PathBuf {
    data_folder.join(DB_FILE_NAME)
}

/// Locate the configuration file for the platform
fn find_config_file() -> Result<PathBuf> {
    // ~/.config/sndp/config.toml (or OS equivalent), then
    // /etc/sndp/config.toml on Linux.
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("sndp").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/sndp/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sndp"))
        .unwrap_or_else(|| PathBuf::from("./sndp_data"))
}
