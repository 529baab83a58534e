//! Configuration management for Inkmark Server

use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::decoration::DecorationConfig;
use crate::overlay::OverlayConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub overlay: OverlaySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, or `memory` for the in-memory store
    pub url: String,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        let url = self.url.trim();
        url.is_empty() || url.eq_ignore_ascii_case("memory")
    }
}

/// Decoration and anchoring settings
#[derive(Debug, Clone, Deserialize)]
pub struct OverlaySettings {
    pub class_name: String,
    pub id_attribute: String,
    pub note_attribute: String,
    pub default_color: String,
    pub use_id_paths: bool,
    pub verify_text: bool,
}

impl OverlaySettings {
    /// Engine settings derived from this configuration
    pub fn engine_config(&self) -> OverlayConfig {
        OverlayConfig {
            decoration: DecorationConfig {
                class_name: self.class_name.clone(),
                id_attribute: self.id_attribute.clone(),
                note_attribute: self.note_attribute.clone(),
                ..DecorationConfig::default()
            },
            use_id_paths: self.use_id_paths,
            verify_text: self.verify_text,
            default_color: self.default_color.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        let overlay = OverlayConfig::default();
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./inkmark.db".to_string(),
            },
            overlay: OverlaySettings {
                class_name: overlay.decoration.class_name,
                id_attribute: overlay.decoration.id_attribute,
                note_attribute: overlay.decoration.note_attribute,
                default_color: overlay.default_color,
                use_id_paths: overlay.use_id_paths,
                verify_text: overlay.verify_text,
            },
        }
    }
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port = match env::var("SERVER_PORT") {
            Err(_) => defaults.server.port,
            Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value,
            })?,
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            overlay: OverlaySettings {
                class_name: env::var("HIGHLIGHT_CLASS").unwrap_or(defaults.overlay.class_name),
                id_attribute: env::var("HIGHLIGHT_ID_ATTRIBUTE")
                    .unwrap_or(defaults.overlay.id_attribute),
                note_attribute: env::var("HIGHLIGHT_NOTE_ATTRIBUTE")
                    .unwrap_or(defaults.overlay.note_attribute),
                default_color: env::var("HIGHLIGHT_DEFAULT_COLOR")
                    .unwrap_or(defaults.overlay.default_color),
                use_id_paths: parse_bool("HIGHLIGHT_ID_PATHS", defaults.overlay.use_id_paths)?,
                verify_text: parse_bool("HIGHLIGHT_VERIFY_TEXT", defaults.overlay.verify_text)?,
            },
        })
    }
}
