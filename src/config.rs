// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Application configuration and the mutable runtime settings derived from it.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::grouping::DEFAULT_GROUP;

pub const CONFIG_ENV: &str = "PIMDESK_CONFIG";
pub const API_BASE_ENV: &str = "PIMDESK_API_BASE";
const CONFIG_FILE: &str = "pimdesk.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub ui: UiConfig,
    /// Initial state of the live Shopify sync toggle.
    pub shopify_sync: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Longest wait for any single read.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Progress streams wake this often to notice a cancel while the server is quiet.
    pub stream_poll_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            stream_poll_secs: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub products_per_page: usize,
    pub fields_per_page: usize,
    pub form_page_size: usize,
    pub status_ttl_ms: u64,
    pub default_group: String,
    pub dedupe_options: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            products_per_page: 25,
            fields_per_page: 6,
            form_page_size: 5,
            status_ttl_ms: 2000,
            default_group: DEFAULT_GROUP.to_string(),
            dedupe_options: false,
        }
    }
}

impl AppConfig {
    /// Load from `$PIMDESK_CONFIG` or `./pimdesk.toml`, then apply environment overrides.
    ///
    /// A missing file yields defaults; an unreadable or invalid file is an error.
    pub fn load() -> Result<Self> {
        let path = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.api.base_url = normalize_base(&config.api.base_url);
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(API_BASE_ENV)
            && !base.trim().is_empty()
        {
            self.api.base_url = normalize_base(&base);
        }
    }
}

/// Trim whitespace and trailing slashes from a base URL.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Join `path` onto `base`; absolute URLs are returned as-is.
pub fn api_url(base: &str, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = normalize_base(base);
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Runtime toggles the user can flip while the app is running.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    shopify_sync: bool,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            shopify_sync: config.shopify_sync,
        }
    }

    pub fn shopify_sync(&self) -> bool {
        self.shopify_sync
    }

    pub fn set_shopify_sync(&mut self, on: bool) {
        self.shopify_sync = on;
    }
}

/// In-memory login session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
    token: Option<String>,
    role: Option<String>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn set(&mut self, username: String, token: String, role: Option<String>) {
        self.username = Some(username);
        self.token = Some(token);
        self.role = role;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
