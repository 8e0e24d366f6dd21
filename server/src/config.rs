// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Runtime settings, read from `TASKBOARD_*` environment variables.
//! `main` loads a `.env` file first when one is present.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/taskboard.db";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind: SocketAddr,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub page_size: u32,
    /// Re-read templates from disk before every render.
    pub template_reload: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            template_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")),
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            page_size: DEFAULT_PAGE_SIZE,
            template_reload: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{key}: expected a boolean, got {other:?}"),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Builds the settings from `(key, value)` pairs. Unknown keys are ignored.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with("TASKBOARD_"))
            .collect();
        let mut settings = Settings::default();

        if let Some(url) = vars.get("TASKBOARD_DATABASE_URL") {
            settings.database_url = url.clone();
        }
        if let Some(bind) = vars.get("TASKBOARD_BIND") {
            settings.bind = bind
                .parse()
                .with_context(|| format!("TASKBOARD_BIND: invalid socket address {bind:?}"))?;
        }
        if let Some(dir) = vars.get("TASKBOARD_TEMPLATE_DIR") {
            settings.template_dir = PathBuf::from(dir);
        }
        if let Some(dir) = vars.get("TASKBOARD_STATIC_DIR") {
            settings.static_dir = PathBuf::from(dir);
        }
        if let Some(size) = vars.get("TASKBOARD_PAGE_SIZE") {
            let size: u32 = size
                .parse()
                .with_context(|| format!("TASKBOARD_PAGE_SIZE: not a number: {size:?}"))?;
            if !(1..=MAX_PAGE_SIZE).contains(&size) {
                bail!("TASKBOARD_PAGE_SIZE must be between 1 and {MAX_PAGE_SIZE}, got {size}");
            }
            settings.page_size = size;
        }
        if let Some(reload) = vars.get("TASKBOARD_TEMPLATE_RELOAD") {
            settings.template_reload = parse_bool("TASKBOARD_TEMPLATE_RELOAD", reload)?;
        }
        if let Some(level) = vars.get("TASKBOARD_LOG_LEVEL") {
            settings.log_level = level.clone();
        }
        if let Some(format) = vars.get("TASKBOARD_LOG_FORMAT") {
            settings.log_format = match format.as_str() {
                "json" => LogFormat::Json,
                "pretty" | "" => LogFormat::Pretty,
                other => bail!("TASKBOARD_LOG_FORMAT: expected \"pretty\" or \"json\", got {other:?}"),
            };
        }

        Ok(settings)
    }

    /// Installs the global tracing subscriber. `RUST_LOG` wins over `log_level`.
    pub fn init_logging(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        match self.log_format {
            LogFormat::Json => fmt().json().with_env_filter(filter).init(),
            LogFormat::Pretty => fmt().with_target(false).with_env_filter(filter).init(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings = Settings::from_vars(vars(&[("HOME", "/root")])).unwrap();
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.bind.to_string(), DEFAULT_BIND);
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert!(!settings.template_reload);
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert!(settings.template_dir.ends_with("templates"));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_vars(vars(&[
            ("TASKBOARD_DATABASE_URL", "sqlite::memory:"),
            ("TASKBOARD_BIND", "127.0.0.1:8080"),
            ("TASKBOARD_PAGE_SIZE", "25"),
            ("TASKBOARD_TEMPLATE_RELOAD", "yes"),
            ("TASKBOARD_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.bind.port(), 8080);
        assert_eq!(settings.page_size, 25);
        assert!(settings.template_reload);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Settings::from_vars(vars(&[("TASKBOARD_PAGE_SIZE", "0")])).is_err());
        assert!(Settings::from_vars(vars(&[("TASKBOARD_PAGE_SIZE", "many")])).is_err());
        assert!(Settings::from_vars(vars(&[("TASKBOARD_BIND", "localhost")])).is_err());
        assert!(Settings::from_vars(vars(&[("TASKBOARD_LOG_FORMAT", "xml")])).is_err());
        assert!(Settings::from_vars(vars(&[("TASKBOARD_TEMPLATE_RELOAD", "maybe")])).is_err());
    }
}
