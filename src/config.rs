//! Application-level configuration loading: car rules, seeded categories and storage selection.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::dto::validation::{CarRules, DEFAULT_VIN_LENGTH};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CRM_CARS_CONFIG_PATH";
/// Environment variable selecting the storage backend.
const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
/// Category assigned to cars created without a category name.
const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    car_rules: CarRules,
    default_category: String,
    categories: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        vin_length = app_config.car_rules.vin_length,
                        categories = app_config.categories.len(),
                        "loaded car configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    pub fn car_rules(&self) -> CarRules {
        self.car_rules
    }

    pub fn vin_length(&self) -> usize {
        self.car_rules.vin_length
    }

    /// Name of the category used when a request leaves the category name blank.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    /// Categories to seed into storage. Always contains the default category.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    vin_length: Option<usize>,
    default_category: Option<String>,
    categories: Option<Vec<String>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let vin_length = value
            .vin_length
            .filter(|length| *length > 0)
            .unwrap_or(DEFAULT_VIN_LENGTH);
        let default_category = value
            .default_category
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());

        let mut categories: Vec<String> = Vec::new();
        let requested = value.categories.unwrap_or_else(default_categories);
        for name in requested
            .into_iter()
            .chain(std::iter::once(default_category.clone()))
        {
            let name = name.trim();
            if name.is_empty()
                || categories
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(name))
            {
                continue;
            }
            categories.push(name.to_owned());
        }

        Self {
            car_rules: CarRules { vin_length },
            default_category,
            categories,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in categories shipped with the binary.
fn default_categories() -> Vec<String> {
    ["Sedan", "Combi", "Hatchback", "SUV", DEFAULT_CATEGORY]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Storage backend the server persists cars in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
    Memory,
}

#[derive(Debug, Error)]
#[error("unsupported storage backend `{0}`")]
pub struct UnknownBackend(String);

impl StorageBackend {
    /// Read [`STORAGE_BACKEND_ENV`], defaulting to the first persistent backend compiled in.
    pub fn from_env() -> Result<Self, UnknownBackend> {
        match env::var(STORAGE_BACKEND_ENV) {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Self::default()),
        }
    }
}

impl Default for StorageBackend {
    #[allow(unreachable_code)]
    fn default() -> Self {
        #[cfg(feature = "mongo-store")]
        return StorageBackend::Mongo;
        #[cfg(feature = "couch-store")]
        return StorageBackend::Couch;
        StorageBackend::Memory
    }
}

impl FromStr for StorageBackend {
    type Err = UnknownBackend;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(StorageBackend::Couch),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(UnknownBackend(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_the_standard_categories() {
        let config = AppConfig::default();
        assert_eq!(config.vin_length(), 17);
        assert_eq!(config.default_category(), "Other");
        assert_eq!(
            config.categories(),
            ["Sedan", "Combi", "Hatchback", "SUV", "Other"]
        );
    }

    #[test]
    fn default_category_is_always_seeded() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"vinLength":11,"defaultCategory":"Unknown","categories":["Van","van"," "]}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.vin_length(), 11);
        assert_eq!(config.default_category(), "Unknown");
        assert_eq!(config.categories(), ["Van", "Unknown"]);
    }

    #[test]
    fn backend_names_are_parsed_ignoring_case() {
        assert_eq!(
            "Memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
