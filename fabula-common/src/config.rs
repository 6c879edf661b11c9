//! Configuration loading and root folder resolution
//!
//! All Fabula state lives under a single root folder (database file plus
//! stored cover images). Multi-tier resolution keeps the common case (no
//! configuration at all) working out of the box.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "FABULA_ROOT_FOLDER";

/// Environment variable carrying the TMDB API key
pub const TMDB_API_KEY_ENV: &str = "FABULA_TMDB_API_KEY";

/// Session lifetime when "remember me" was not requested (1 day)
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 86_400;

/// Session lifetime for remembered logins (30 days)
pub const DEFAULT_REMEMBER_ME_TIMEOUT_SECS: i64 = 2_592_000;

/// Optional on-disk configuration (`config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tmdb_api_key: Option<String>,
}

/// Resolve the root folder following the priority order:
///
/// 1. Command-line argument (highest priority)
/// 2. `FABULA_ROOT_FOLDER` environment variable
/// 3. `root_folder` key in the TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = load_toml_config().root_folder {
        return PathBuf::from(path);
    }

    // Priority 4: OS-dependent default
    default_root_folder()
}

/// Load the TOML config file, or an empty config when none exists.
///
/// A file that exists but does not parse is reported and otherwise treated
/// as absent; a broken config file should not take the service down.
pub fn load_toml_config() -> TomlConfig {
    let Some(path) = config_file_path() else {
        return TomlConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<TomlConfig>(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring unparseable config file {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!("Ignoring unreadable config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Locate the config file for the platform, if one exists.
///
/// Linux checks `~/.config/fabula/config.toml` then `/etc/fabula/config.toml`;
/// macOS and Windows use the user config directory only.
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("fabula").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/fabula/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/fabula
        dirs::data_local_dir()
            .map(|d| d.join("fabula"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/fabula"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/fabula
        dirs::data_dir()
            .map(|d| d.join("fabula"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/fabula"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\fabula
        dirs::data_local_dir()
            .map(|d| d.join("fabula"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\fabula"))
    } else {
        PathBuf::from("./fabula_data")
    }
}

/// Create the root folder and its subdirectories if missing.
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    std::fs::create_dir_all(covers_dir(root))?;
    Ok(())
}

/// Path of the application database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("fabula.db")
}

/// Directory holding stored cover images
pub fn covers_dir(root: &Path) -> PathBuf {
    root.join("covers")
}

/// Resolve the TMDB API key from 3-tier configuration.
///
/// Priority: database settings, then `FABULA_TMDB_API_KEY`, then the TOML
/// config file. Multiple configured sources are reported since the lower
/// tiers are silently shadowed.
pub async fn resolve_tmdb_api_key(db: &SqlitePool, toml_config: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();

    // Tier 1: Database (authoritative)
    let db_key = crate::db::settings::get_setting(db, "tmdb_api_key")
        .await?
        .filter(|k| is_valid_key(k));
    if db_key.is_some() {
        sources.push("database");
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(TMDB_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    if env_key.is_some() {
        sources.push("environment");
    }

    // Tier 3: TOML config
    let toml_key = toml_config
        .tmdb_api_key
        .clone()
        .filter(|k| is_valid_key(k));
    if toml_key.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "TMDB API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        info!("TMDB API key loaded from database");
        return Ok(key);
    }
    if let Some(key) = env_key {
        info!("TMDB API key loaded from environment variable");
        return Ok(key);
    }
    if let Some(key) = toml_key {
        info!("TMDB API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(
        "TMDB API key not configured. Series metadata lookup will be unavailable.\n\
         Configure using one of:\n\
         1. Settings table: INSERT INTO settings (key, value) VALUES ('tmdb_api_key', 'your-key')\n\
         2. Environment: FABULA_TMDB_API_KEY=your-key\n\
         3. TOML config: ~/.config/fabula/config.toml (tmdb_api_key = \"your-key\")\n\
         \n\
         Obtain an API key at: https://www.themoviedb.org/settings/api"
            .to_string(),
    ))
}

/// Validate an API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Session lifetimes, read from settings with compiled defaults.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    pub standard_secs: i64,
    pub remember_me_secs: i64,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            standard_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            remember_me_secs: DEFAULT_REMEMBER_ME_TIMEOUT_SECS,
        }
    }
}

/// Load session lifetimes from the settings table.
///
/// Missing or unparseable values fall back to the compiled defaults.
pub async fn session_timeouts(db: &SqlitePool) -> Result<SessionTimeouts> {
    let mut timeouts = SessionTimeouts::default();

    if let Some(value) = crate::db::settings::get_setting(db, "session_timeout_seconds").await? {
        match value.parse::<i64>() {
            Ok(secs) if secs > 0 => timeouts.standard_secs = secs,
            _ => warn!("Ignoring invalid session_timeout_seconds setting: {}", value),
        }
    }
    if let Some(value) =
        crate::db::settings::get_setting(db, "remember_me_timeout_seconds").await?
    {
        match value.parse::<i64>() {
            Ok(secs) if secs > 0 => timeouts.remember_me_secs = secs,
            _ => warn!(
                "Ignoring invalid remember_me_timeout_seconds setting: {}",
                value
            ),
        }
    }

    Ok(timeouts)
}
