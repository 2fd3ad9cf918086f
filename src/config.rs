use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::orderboard::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    COMPACT,
    JSON,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<LogLevel> for LevelFilter {
    fn from(val: LogLevel) -> Self {
        match val {
            LogLevel::TRACE => LevelFilter::TRACE,
            LogLevel::DEBUG => LevelFilter::DEBUG,
            LogLevel::INFO => LevelFilter::INFO,
            LogLevel::WARN => LevelFilter::WARN,
            LogLevel::ERROR => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::INFO,
            format: LogFormat::COMPACT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Name of the commodity the board quotes, used in logs.
    pub commodity: String,
    /// Capacity of the command channel feeding the board task.
    pub channel_capacity: usize,
    /// Number of random commands the demo feed generates.
    pub demo_commands: usize,
    /// Id given to the first order placed.
    pub first_order_id: OrderId,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            commodity: "silver bars".to_string(),
            channel_capacity: 1000,
            demo_commands: 50,
            first_order_id: 0,
        }
    }
}

/// Top-level application configuration wrapper.
///
/// Loaded with the following precedence (lowest to highest):
/// 1) Built-in defaults
/// 2) Optional config file (if present)
/// 3) Environment variables prefixed `COMMODITY_BOARD_`, with `__`
///    separating nested keys (e.g. `COMMODITY_BOARD_LOGGER__LEVEL=DEBUG`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub logger: LogConfig,
    pub board: BoardConfig,
}

impl AppConfig {
    pub fn load(config_path: &Path) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if config_path.exists() {
            figment = figment.merge(Toml::file(config_path));
        }
        figment = figment.merge(Env::prefixed("COMMODITY_BOARD_").split("__"));

        let cfg = figment.extract()?;
        Ok(cfg)
    }

    /// Defaults overlaid with the given TOML text only.
    pub fn from_toml_str(toml: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(toml))
            .extract()
    }
}
