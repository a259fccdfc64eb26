use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Top-level relay configuration.
/// Loaded from an optional TOML file overlaid by `DR_*` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
    /// WebSocket upgrade path (default: /ws)
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily log files; stderr only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Read operator commands from stdin (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Send operator text as a `command` envelope instead of raw text.
    #[serde(default)]
    pub wrap_commands: bool,
    /// Characters of element text shown before truncation (default: 100)
    #[serde(default = "default_text_preview_chars")]
    pub text_preview_chars: usize,
}

impl RelayConfig {
    /// Load config from an optional file and the environment.
    ///
    /// Without an explicit path, `domrelay.{toml,json,yaml}` in the working
    /// directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("domrelay").required(false),
        };
        let builder = config::Config::builder()
            .add_source(file)
            .add_source(env_source());
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// `host:port` the listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("DR")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
            json: false,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wrap_commands: false,
            text_preview_chars: default_text_preview_chars(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ws_path() -> String {
    "/ws".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_text_preview_chars() -> usize {
    100
}
