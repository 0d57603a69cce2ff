//! Configuration for the SDK.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default collection endpoint. `server` in the config file overrides it.
pub const DEFAULT_ENDPOINT: &str = "https://ingest.spoor.dev/events";

/// Default client source identifier reported in the envelope.
pub const DEFAULT_SOURCE: &str = "spoor";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Client version reported in the envelope.
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main SDK configuration.
///
/// Owned by the host application; the delivery core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// API key identifying this client to the collection server.
    #[serde(default)]
    pub api_key: String,
    /// Version of the tracking client, reported in the envelope.
    #[serde(default = "default_version")]
    pub version: String,
    /// Source of the tracking client, reported in the envelope.
    #[serde(default = "default_source")]
    pub source: String,
    /// Collection endpoint override. `None` uses [`DEFAULT_ENDPOINT`].
    #[serde(default)]
    pub server: Option<String>,
    /// Developer mode: more verbose diagnostics.
    #[serde(default)]
    pub developer: bool,
    /// Suppress network sends. Only effective together with `developer`.
    #[serde(default)]
    pub no_send: bool,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_version() -> String {
    CLIENT_VERSION.to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_key: String::new(),
            version: default_version(),
            source: default_source(),
            server: None,
            developer: false,
            no_send: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// The endpoint events are delivered to.
    pub fn endpoint(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Sends are suppressed only when both flags are set.
    pub fn send_suppressed(&self) -> bool {
        self.developer && self.no_send
    }

    /// Check that the effective endpoint is a usable collection URL.
    ///
    /// A broken `server` override would otherwise only surface as silent
    /// delivery failures at send time.
    pub fn validate(&self) -> CoreResult<()> {
        let url = Url::parse(self.endpoint())?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(CoreError::Config(format!(
                "endpoint scheme must be http or https, got {other}"
            ))),
        }
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("SPOOR_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(api_key) = std::env::var("SPOOR_API_KEY") {
            self.api_key = api_key;
        }
        if let Ok(server) = std::env::var("SPOOR_SERVER") {
            if !server.is_empty() {
                self.server = Some(server);
            }
        }
        if let Ok(developer) = std::env::var("SPOOR_DEVELOPER") {
            self.developer = developer == "1" || developer.eq_ignore_ascii_case("true");
        }
        if let Ok(no_send) = std::env::var("SPOOR_NO_SEND") {
            self.no_send = no_send == "1" || no_send.eq_ignore_ascii_case("true");
        }
    }
}
