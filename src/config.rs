use std::num::NonZeroUsize;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use directories::BaseDirs;
use docstorecl::client::firestore::{FirestoreConfig, DEFAULT_DATABASE, DEFAULT_POLL_INTERVAL};
use docstorecl::model::{FieldMapping, Query};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::DurationMilliSeconds;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
use url::Url;

use crate::paginator::{OutOfRange, ShrinkPolicy};

#[cfg(not(target_arch = "wasm32"))]
const CONFIG_PATH: &str = "adviceboard/config.json";

#[cfg(not(target_arch = "wasm32"))]
const PROJECT_ENV: &str = "ADVICEBOARD_FIRESTORE_PROJECT";
#[cfg(not(target_arch = "wasm32"))]
const API_KEY_ENV: &str = "ADVICEBOARD_FIRESTORE_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_boards")]
    pub boards: Vec<BoardConfig>,
    #[serde(default)]
    pub store: StoreSettings,
}

/// How the page number controls look.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    /// One button per page.
    #[default]
    Numbered,
    /// Page buttons between Prev and Next, disabled where they lead nowhere.
    Arrows,
}

/// One message board: where its messages live and how they are paged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub title: String,
    pub collection: String,
    #[serde(default)]
    pub fields: FieldMapping,
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroUsize,
    #[serde(default)]
    pub pagination: PaginationStyle,
    #[serde(default)]
    pub out_of_range: OutOfRange,
    #[serde(default)]
    pub on_shrink: ShrinkPolicy,
}

impl BoardConfig {
    pub fn query(&self) -> Query {
        Query::newest_first(&self.collection, &self.fields)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreSettings {
    /// Keep messages in memory for the lifetime of the process.
    #[default]
    Memory,
    Firestore(FirestoreSettings),
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FirestoreSettings {
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<Url>,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_poll_interval", rename = "poll_interval_ms")]
    pub poll_interval: Duration,
}

impl FirestoreSettings {
    pub fn new(project_id: String) -> Self {
        Self {
            project_id,
            database: default_database(),
            api_key: None,
            base_url: None,
            poll_interval: default_poll_interval(),
        }
    }
}

impl From<FirestoreSettings> for FirestoreConfig {
    fn from(settings: FirestoreSettings) -> Self {
        FirestoreConfig {
            project_id: settings.project_id,
            database: settings.database,
            api_key: settings.api_key,
            base_url: settings.base_url,
            poll_interval: settings.poll_interval,
        }
    }
}

fn default_page_size() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(4)
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_boards() -> Vec<BoardConfig> {
    vec![
        BoardConfig {
            title: "give advice".to_string(),
            collection: "messages".to_string(),
            fields: FieldMapping::new("message", "timestamp"),
            page_size: default_page_size(),
            pagination: PaginationStyle::Numbered,
            out_of_range: OutOfRange::Ignore,
            on_shrink: ShrinkPolicy::Clamp,
        },
        BoardConfig {
            title: "feedback".to_string(),
            collection: "feedback".to_string(),
            fields: FieldMapping::new("text", "createdAt"),
            page_size: default_page_size(),
            pagination: PaginationStyle::Arrows,
            out_of_range: OutOfRange::Ignore,
            on_shrink: ShrinkPolicy::Clamp,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boards: default_boards(),
            store: StoreSettings::default(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config, serde_json::Error> {
        let mut config: Config = serde_json::from_str(json)?;
        if config.boards.is_empty() {
            log::warn!("no boards configured, using the defaults");
            config.boards = default_boards();
        }
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Config {
        let mut config = Self::load_file();
        config.apply_env(|key| std::env::var(key).ok());
        log::debug!("config: {config:?}");
        config
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn load_file() -> Config {
        let Some(dirs) = BaseDirs::new() else {
            log::warn!("could not get basedirs");
            return Default::default();
        };
        let path = dirs.config_dir().join(CONFIG_PATH);
        let Ok(contents) = fs::read_to_string(&path) else {
            log::warn!(
                "could not read {path}, writing defaults",
                path = path.to_string_lossy()
            );
            let config = Config::default();
            config.save();
            return config;
        };

        match Self::from_json(&contents) {
            Ok(x) => x,
            Err(e) => {
                log::warn!("error deserializing config: {e}");
                Default::default()
            }
        }
    }

    /// Environment variables switch the store to Firestore without touching
    /// the config file.
    #[cfg(not(target_arch = "wasm32"))]
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(project_id) = var(PROJECT_ENV) {
            let mut settings = match std::mem::take(&mut self.store) {
                StoreSettings::Firestore(s) => FirestoreSettings { project_id, ..s },
                StoreSettings::Memory => FirestoreSettings::new(project_id),
            };
            if let Some(key) = var(API_KEY_ENV) {
                settings.api_key = Some(key);
            }
            self.store = StoreSettings::Firestore(settings);
        } else if let (Some(key), StoreSettings::Firestore(settings)) =
            (var(API_KEY_ENV), &mut self.store)
        {
            settings.api_key = Some(key);
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Config {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        let Some(storage) = storage else {
            log::warn!("local storage is unavailable");
            return Default::default();
        };

        let Some(json) = storage.get_item("config").ok().flatten() else {
            log::warn!("no config in local storage, writing defaults");
            let config = Config::default();
            config.save();
            return config;
        };

        Self::from_json(&json)
            .inspect_err(|err| log::error!("deserialization error: {err}"))
            .unwrap_or_default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        let Some(dirs) = BaseDirs::new() else {
            log::warn!("could not find basedirs");
            return;
        };

        let path = dirs.config_dir().join(CONFIG_PATH);

        let json_str = match serde_json::to_string_pretty(&self) {
            Ok(x) => x,
            Err(e) => {
                log::warn!("could not serialize config: {e}");
                return;
            }
        };

        if let Some(ancestor) = path.parent() {
            if let Err(e) = fs::create_dir_all(ancestor) {
                log::warn!(
                    "could not create {path}: {e}",
                    path = path.as_os_str().to_string_lossy()
                );
                return;
            }
        }

        if let Err(e) = fs::write(path, json_str) {
            log::warn!("could not write config file: {e}");
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let json_str = match serde_json::to_string_pretty(&self) {
            Ok(x) => x,
            Err(e) => {
                log::warn!("could not serialize config: {e}");
                return;
            }
        };
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        match storage {
            Some(storage) => {
                if storage.set_item("config", &json_str).is_err() {
                    log::warn!("could not write config to local storage");
                }
            }
            None => log::warn!("local storage is unavailable"),
        }
    }
}
