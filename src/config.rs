use serde_derive::Deserialize;
use std::io::Read;
use std::time::Duration;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use thiserror::*;
use url::Url;

/// Where the store lives when nothing else is configured.
pub const DEFAULT_STORE_URL: &str = "http://localhost:3001";
/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "TASKSYNC_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error {0} when reading config")]
    IoError(#[from] std::io::Error),
    #[error("cannot open config file '{0}' : {1}")]
    OpeningError(PathBuf, std::io::Error),
    #[error("UTF8 format error when reading config")]
    Utf8Error,
    #[error("format error {0} when reading config")]
    FormatError(#[from] serde_yaml::Error),
    #[error("invalid store timeout '{0}': {1}")]
    TimeoutError(String, humantime::DurationError),
}

fn default_store_url() -> Url {
    Url::parse(DEFAULT_STORE_URL).expect("default store url is valid")
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StoreConfig {
    Http {
        #[serde(default = "default_store_url")]
        url: Url,
        /// Human readable duration such as `5s`; the client default applies when absent.
        timeout: Option<String>,
    },
    Memory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Http {
            url: default_store_url(),
            timeout: None,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        match self {
            StoreConfig::Http {
                timeout: Some(raw), ..
            } => humantime::parse_duration(raw)
                .map(Some)
                .map_err(|err| ConfigError::TimeoutError(raw.clone(), err)),
            _ => Ok(None),
        }
    }
}

#[derive(Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    pub log: Option<crate::log::Log>,
}

impl Config {
    pub fn from_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let p = path.as_ref();
        let mut file = File::open(p).map_err(|e| ConfigError::OpeningError(p.to_owned(), e))?;
        let mut contents = vec![];
        file.read_to_end(&mut contents)?;
        let contents = String::from_utf8(contents).map_err(|_| ConfigError::Utf8Error)?;
        let config = Config::from_str(&contents)?;
        config.store.timeout()?;
        Ok(config)
    }

    /// Reads the file named by `TASKSYNC_CONFIG`, or falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }
}

pub mod testdata {
    use super::Config;

    #[allow(dead_code)]
    pub fn test_config() -> Config {
        Config::from_str(
            r#"
        log:
            level: debug
            structured: false
        store:
            type: Http
            url: "http://127.0.0.1:3001/"
            timeout: 5s
        "#,
        )
        .unwrap()
    }
}
