// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Backend connection settings

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`ShotakuConfig::url`]
pub const URL_ENV: &str = "SHOTAKU_URL";
/// Environment variable overriding [`ShotakuConfig::anon_key`]
pub const KEY_ENV: &str = "SHOTAKU_ANON_KEY";

/// Connection settings for the hosted content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotakuConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Publishable (anon) API key
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Database schema the tables live in
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Realtime heartbeat period
    #[serde(default = "default_heartbeat")]
    pub heartbeat_interval_secs: u64,

    /// Logo shown when the `logos` bucket is empty
    #[serde(default = "default_logo")]
    pub default_logo: String,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_heartbeat() -> u64 {
    30
}

fn default_logo() -> String {
    "/logo.png".to_string()
}

impl Default for ShotakuConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            schema: default_schema(),
            request_timeout_secs: default_timeout(),
            heartbeat_interval_secs: default_heartbeat(),
            default_logo: default_logo(),
        }
    }
}

impl ShotakuConfig {
    /// Load configuration from the default location, then apply environment overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("shotaku").join("config.json"))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(URL_ENV) {
            if !url.trim().is_empty() {
                self.url = Some(url);
            }
        }
        if let Ok(key) = std::env::var(KEY_ENV) {
            if !key.trim().is_empty() {
                self.anon_key = Some(key);
            }
        }
    }

    /// Apply command-line overrides, which win over file and environment
    pub fn with_overrides(mut self, url: Option<String>, anon_key: Option<String>) -> Self {
        if url.is_some() {
            self.url = url;
        }
        if anon_key.is_some() {
            self.anon_key = anon_key;
        }
        self
    }

    /// Ensure the settings needed to reach the backend are present
    pub fn validate(&self) -> Result<()> {
        let url = self.url.as_deref().unwrap_or_default().trim();
        if url.is_empty() {
            return Err(SyncError::Config(format!(
                "no backend URL configured (set {} or run `shotaku config set --url`)",
                URL_ENV
            )));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SyncError::Config(format!("invalid backend URL: {}", url)));
        }
        if self.anon_key.as_deref().unwrap_or_default().trim().is_empty() {
            return Err(SyncError::Config(format!(
                "no API key configured (set {} or run `shotaku config set --key`)",
                KEY_ENV
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.url
            .as_deref()
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/')
            .to_string()
    }
}
