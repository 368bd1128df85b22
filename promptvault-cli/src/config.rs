use crate::constants::PVAULT_CLI;
use confy::ConfyError;
use promptvault_core::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT, HttpPromptApi};
use promptvault_core::query::DEFAULT_PAGE_SIZE;
use promptvault_core::session::DEFAULT_DEBOUNCE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptVaultConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub debounce_ms: u64,
}

impl Default for PromptVaultConfig {
    fn default() -> Self {
        Self {
            api_url: String::from(DEFAULT_API_URL),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl PromptVaultConfig {
    /// Replaces the stored URL with one given on the command line or in the environment.
    /// Blank overrides are ignored.
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn page_size(&self) -> u32 {
        if self.page_size == 0 { DEFAULT_PAGE_SIZE } else { self.page_size }
    }
}

/// Loads the config file, creating it with defaults on first use. `api_url` is the value
/// of `--api-url` or `PROMPTVAULT_API_URL`, whichever clap resolved.
pub fn load_config(api_url: Option<String>) -> PromptVaultConfig {
    let config: Result<PromptVaultConfig, ConfyError> = confy::load(PVAULT_CLI, None);
    match config {
        Ok(config) => config.with_api_url(api_url),
        Err(err) => {
            eprintln!("Error: Problem loading config ({}). Exiting...", err);
            std::process::exit(exitcode::CONFIG);
        }
    }
}

pub fn build_api(config: &PromptVaultConfig) -> HttpPromptApi {
    match HttpPromptApi::with_timeout(config.api_url.clone(), config.timeout()) {
        Ok(api) => api,
        Err(err) => {
            eprintln!("Error: Could not set up client for {} ({}). Exiting...", config.api_url, err);
            std::process::exit(exitcode::CONFIG);
        }
    }
}
