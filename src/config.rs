use crate::error::ConfigError;
use crate::types::SheetId;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PORT: u16 = 3000;

/// Relay configuration, read from config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Falls back to SMARTSHEET_ACCESS_TOKEN when absent or empty.
    #[serde(default)]
    pub smartsheet_access_token: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub sheet_id: SheetId,
    pub webhook_name: String,
    pub callback_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub handler: HandlerConfig,
    #[serde(default)]
    pub shared_secret: Option<String>,
}

/// The external program each row event is handed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_api_base_url() -> String {
    "https://api.smartsheet.com/2.0".into()
}
fn default_program() -> String {
    "python".into()
}
fn default_args() -> Vec<String> {
    vec!["new.py".into()]
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The configured token, or `env_token` if the file left it blank.
    pub fn access_token(&self, env_token: Option<String>) -> Option<String> {
        self.smartsheet_access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or(env_token.filter(|t| !t.is_empty()))
    }

    /// Filter directive used when RUST_LOG is not set.
    pub fn log_directive(&self) -> String {
        let level = match self.log_level.to_ascii_lowercase().as_str() {
            "silly" | "verbose" | "trace" => "trace",
            "debug" => "debug",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "info",
        };
        format!("smartsheet_row_relay={level}")
    }
}

/// Parse the PORT environment value, defaulting when unset.
pub fn port_from_env(value: Option<String>) -> Result<u16, ConfigError> {
    match value {
        None => Ok(DEFAULT_PORT),
        Some(v) if v.trim().is_empty() => Ok(DEFAULT_PORT),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Port(v)),
    }
}
