//! Settings parser for the session core's `config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use okul_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "okul";

/// Default deadline for each push-path network call. Short on purpose:
/// a hung push endpoint must not delay the user-visible logout.
pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 5;

/// Tunables for the session core.
///
/// Every field has a default, so a missing or partial config file is
/// never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Per-call deadline, in seconds, for push registration/deregistration.
    pub push_timeout_secs: u64,

    /// Override for the file-backed store location (development hosts).
    pub storage_file: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            push_timeout_secs: DEFAULT_PUSH_TIMEOUT_SECS,
            storage_file: None,
        }
    }
}

impl SessionSettings {
    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    /// Resolved location for a file-backed store: the configured
    /// override, or the platform default.
    pub fn storage_path(&self) -> PathBuf {
        self.storage_file
            .clone()
            .unwrap_or_else(default_storage_file)
    }
}

/// Default location of the development file store
/// (`<data_dir>/okul/session.json`).
pub fn default_storage_file() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR).join("session.json")
}

/// Load settings from `dir/config.toml`, falling back to defaults on a
/// missing, unreadable, or unparseable file.
pub fn load_settings(dir: &Path) -> SessionSettings {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return SessionSettings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                SessionSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            SessionSettings::default()
        }
    }
}

/// Write settings to `dir/config.toml`, creating the directory if needed.
pub fn save_settings(dir: &Path, settings: &SessionSettings) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;

    std::fs::write(&config_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(dir.path());
        assert_eq!(settings, SessionSettings::default());
        assert_eq!(settings.push_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "push_timeout_secs = 2\n").unwrap();

        let settings = load_settings(dir.path());
        assert_eq!(settings.push_timeout_secs, 2);
        assert_eq!(settings.storage_file, None);
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "push_timeout_secs = [oops\n").unwrap();

        let settings = load_settings(dir.path());
        assert_eq!(settings, SessionSettings::default());
    }

    #[test]
    fn test_storage_path_defaults_when_unset() {
        let settings = SessionSettings::default();
        assert!(settings.storage_path().ends_with("okul/session.json"));
    }

    #[tokio::test]
    async fn test_storage_file_override_backs_a_file_store() {
        use crate::store::{FileStore, SecureStore};

        let dir = tempfile::tempdir().unwrap();
        let configured = SessionSettings {
            push_timeout_secs: DEFAULT_PUSH_TIMEOUT_SECS,
            storage_file: Some(dir.path().join("session.json")),
        };
        save_settings(dir.path(), &configured).unwrap();

        let settings = load_settings(dir.path());
        let store = FileStore::open(settings.storage_path()).await.unwrap();
        store.set("theme", "dark").await.unwrap();

        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SessionSettings {
            push_timeout_secs: 9,
            storage_file: Some(PathBuf::from("/tmp/session.json")),
        };

        save_settings(dir.path(), &settings).unwrap();
        assert_eq!(load_settings(dir.path()), settings);
    }
}
