use std::path::Path;

use anyhow::{Context, Result};
use client_core::{listing::DEFAULT_PAGE_SIZE, DEFAULT_API_BASE_URL};
use ::config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "quizadmin";
const DEFAULT_SESSION_DATABASE_URL: &str = "sqlite://./data/quizadmin.db";
const DEFAULT_LOG_FILTER: &str = "warn";
const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub session_database_url: String,
    pub page_size: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            session_database_url: DEFAULT_SESSION_DATABASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            log_filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base_url: Option<String>,
    pub session_database_url: Option<String>,
    pub page_size: Option<usize>,
}

impl Settings {
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.api_base_url {
            self.api_base_url = url;
        }
        if let Some(url) = overrides.session_database_url {
            self.session_database_url = url;
        }
        if let Some(size) = overrides.page_size {
            self.page_size = size;
        }
        self.page_size = self.page_size.max(1);
        self.session_database_url = normalize_database_url(&self.session_database_url);
        self
    }
}

/// Defaults, then `quizadmin.toml` in the working directory (or the file at
/// `path`, which must exist), then `APP__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    build_settings(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn build_settings(path: Option<&Path>, env: Environment) -> Result<Settings> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
        .set_default("api_base_url", defaults.api_base_url)?
        .set_default("session_database_url", defaults.session_database_url)?
        .set_default("page_size", defaults.page_size as i64)?
        .set_default("log_filter", defaults.log_filter)?;

    builder = match path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
    };

    let settings: Settings = builder
        .add_source(env)
        .build()
        .context("failed to load configuration")?
        .try_deserialize()
        .context("invalid configuration")?;

    Ok(settings.apply(Overrides::default()))
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_SESSION_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
