//! Settings loading
//!
//! Values come from, in increasing precedence:
//! - `appsettings.json` in the content root
//! - `appsettings.{environment}.json` in the content root
//! - environment variables with the same key names
//!
//! Both files are optional. Every key must be set by some layer.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "appsettings.json";
pub const DEFAULT_ENVIRONMENT: &str = "Development";

pub const KEY_CONNECTION: &str = "StorageAccountConnection";
pub const KEY_CONTAINER: &str = "BlobContainer";
pub const KEY_DESTINATION: &str = "LocalFilesDestination";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing required setting(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Resolved configuration, immutable for the rest of the run
#[derive(Clone)]
pub struct Settings {
    pub storage_account_connection: String,
    pub blob_container: String,
    pub local_files_destination: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("storage_account_connection", &"<redacted>")
            .field("blob_container", &self.blob_container)
            .field("local_files_destination", &self.local_files_destination)
            .finish()
    }
}

/// One source of settings; unset keys fall through to lower layers
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsLayer {
    storage_account_connection: Option<String>,
    blob_container: Option<String>,
    local_files_destination: Option<String>,
}

impl SettingsLayer {
    /// Values from `over` win where present and non-empty
    fn overlay(self, over: SettingsLayer) -> SettingsLayer {
        fn pick(base: Option<String>, over: Option<String>) -> Option<String> {
            over.filter(|v| !v.is_empty()).or(base)
        }
        SettingsLayer {
            storage_account_connection: pick(
                self.storage_account_connection,
                over.storage_account_connection,
            ),
            blob_container: pick(self.blob_container, over.blob_container),
            local_files_destination: pick(
                self.local_files_destination,
                over.local_files_destination,
            ),
        }
    }

    fn from_env<F>(lookup: F) -> SettingsLayer
    where
        F: Fn(&str) -> Option<String>,
    {
        SettingsLayer {
            storage_account_connection: lookup(KEY_CONNECTION),
            blob_container: lookup(KEY_CONTAINER),
            local_files_destination: lookup(KEY_DESTINATION),
        }
    }

    fn resolve(self) -> Result<Settings, ConfigError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        let connection = non_empty(self.storage_account_connection);
        let container = non_empty(self.blob_container);
        let destination = non_empty(self.local_files_destination);

        match (connection, container, destination) {
            (Some(connection), Some(container), Some(destination)) => Ok(Settings {
                storage_account_connection: connection,
                blob_container: container,
                local_files_destination: PathBuf::from(destination),
            }),
            (connection, container, destination) => {
                let missing = [
                    (connection.is_none(), KEY_CONNECTION),
                    (container.is_none(), KEY_CONTAINER),
                    (destination.is_none(), KEY_DESTINATION),
                ]
                .into_iter()
                .filter_map(|(is_missing, key)| is_missing.then_some(key))
                .collect();
                Err(ConfigError::Missing(missing))
            }
        }
    }
}

/// Read an optional JSON settings file
fn read_layer(path: &Path) -> Result<SettingsLayer, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Settings file {} not found, skipping", path.display());
            return Ok(SettingsLayer::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let layer = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded settings from {}", path.display());
    Ok(layer)
}

impl Settings {
    /// Load settings from `content_root` and the process environment
    pub fn load(content_root: &Path, environment: &str) -> Result<Settings, ConfigError> {
        Self::load_with_env(content_root, environment, |key| std::env::var(key).ok())
    }

    pub fn load_with_env<F>(
        content_root: &Path,
        environment: &str,
        lookup: F,
    ) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = read_layer(&content_root.join(SETTINGS_FILE))?;
        let env_file = read_layer(&content_root.join(format!("appsettings.{}.json", environment)))?;

        base.overlay(env_file)
            .overlay(SettingsLayer::from_env(lookup))
            .resolve()
    }
}
