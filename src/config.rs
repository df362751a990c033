//! Configuration handling for the dashboard

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "examlyx_tui=info";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "EXAMLYX_API_URL";

/// User configuration stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    /// Base URL of the Examlyx backend
    pub api_url: Option<String>,
    /// Tracing filter directive (e.g. "examlyx_tui=debug")
    pub log_filter: Option<String>,
}

/// Resolved settings passed explicitly into the app and the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    pub api_url: String,
    pub log_filter: String,
}

impl Default for AppContext {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DashboardConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "examlyx", "examlyx-tui")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Path of the log file written by the tracing subscriber
    pub fn log_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_local_dir().join("examlyx-tui.log"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: DashboardConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Resolve the effective context. `env_api_url` wins over the file.
    pub fn resolve(&self, env_api_url: Option<String>) -> AppContext {
        let api_url = env_api_url
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        AppContext {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            log_filter: self
                .log_filter
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
