//! Configuration management for the CERFA server

use crate::api::DEFAULT_MAX_UPLOAD_BYTES;
use cerfa::{CerfaError, CerfaFiller, FillStrategy, Layout};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to load layout: {0}")]
    Layout(#[source] CerfaError),

    #[error("Failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub fill: FillConfig,
    /// Request body cap, uploads included
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct FillConfig {
    pub strategy: FillStrategy,
    /// Layout JSON replacing the built-in one
    pub layout_path: Option<PathBuf>,
    /// Template used when a request uploads none
    pub template_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            fill: FillConfig {
                strategy: FillStrategy::default(),
                layout_path: None,
                template_path: None,
            },
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("SERVER_PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: "SERVER_PORT",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.server.port,
        };

        let strategy = match get("FILL_STRATEGY") {
            Some(value) => value.parse::<FillStrategy>().map_err(|e| ConfigError::InvalidValue {
                key: "FILL_STRATEGY",
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.fill.strategy,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_UPLOAD_BYTES",
                        value,
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_UPLOAD_BYTES",
                        value,
                        reason: e.to_string(),
                    })
                }
            },
            None => defaults.max_upload_bytes,
        };

        Ok(Config {
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            fill: FillConfig {
                strategy,
                layout_path: get("CERFA_LAYOUT").map(PathBuf::from),
                template_path: get("CERFA_TEMPLATE").map(PathBuf::from),
            },
            max_upload_bytes,
        })
    }

    /// Load the layout and template files and build the filler
    pub fn build_filler(&self) -> Result<CerfaFiller, ConfigError> {
        let layout = match &self.fill.layout_path {
            Some(path) => Layout::from_file(path),
            None => Layout::cerfa_13757(),
        }
        .map_err(ConfigError::Layout)?;

        let filler = CerfaFiller::new(layout, self.fill.strategy);
        match &self.fill.template_path {
            Some(path) => {
                let template = std::fs::read(path).map_err(|source| ConfigError::Template {
                    path: path.clone(),
                    source,
                })?;
                Ok(filler.with_template(template))
            }
            None => Ok(filler),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
