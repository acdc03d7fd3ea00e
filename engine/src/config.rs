//! Run configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use retrovote_client::{HttpApiConfig, RetryPolicy};
use retrovote_types::WorkflowKind;

use crate::ConfigError;

/// Configuration for one run of the voting client.
///
/// Can be loaded from a TOML file via [`RunConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base URL of the voting API, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Site origin sent as `origin`/`referer`.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,

    /// Voting round all ballot, project and vote calls refer to.
    #[serde(default = "default_round_id")]
    pub round_id: String,

    /// Maximum number of accounts processed at once.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Workflow to run; asked interactively when absent.
    #[serde(default)]
    pub workflow: Option<WorkflowKind>,

    /// One mnemonic or private key per line.
    #[serde(default = "default_accounts_path")]
    pub accounts_path: PathBuf,

    /// One proxy per line; a missing or empty file means direct connections.
    #[serde(default = "default_proxies_path")]
    pub proxies_path: PathBuf,

    /// Where the record workflow exports eligible accounts.
    #[serde(default = "default_recorded_accounts_path")]
    pub recorded_accounts_path: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file every log line is also appended to.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetrySettings,

    /// Seed for reproducible vote allocations.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// `[retry]` table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per call; unbounded when absent.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Pause between attempts in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        let policy = match self.max_attempts {
            Some(max) => RetryPolicy::bounded(max),
            None => RetryPolicy::unbounded(),
        };
        policy.with_delay(Duration::from_millis(self.delay_ms))
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_api_base_url() -> String {
    retrovote_client::http::DEFAULT_API_BASE_URL.to_string()
}

fn default_site_origin() -> String {
    retrovote_client::http::DEFAULT_SITE_ORIGIN.to_string()
}

fn default_round_id() -> String {
    "1".to_string()
}

fn default_threads() -> usize {
    1
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.txt")
}

fn default_proxies_path() -> PathBuf {
    PathBuf::from("proxies.txt")
}

fn default_recorded_accounts_path() -> PathBuf {
    PathBuf::from("accounts_with_votes.txt")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            site_origin: default_site_origin(),
            round_id: default_round_id(),
            threads: default_threads(),
            workflow: None,
            accounts_path: default_accounts_path(),
            proxies_path: default_proxies_path(),
            recorded_accounts_path: default_recorded_accounts_path(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            log_file: None,
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetrySettings::default(),
            seed: None,
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        if self.round_id.trim().is_empty() {
            return Err(ConfigError::Invalid("round_id must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    /// Settings for [`retrovote_client::HttpConnector`].
    pub fn http_config(&self) -> HttpApiConfig {
        let mut config = HttpApiConfig::new(self.round_id.clone());
        config.base_url = self.api_base_url.clone();
        config.site_origin = self.site_origin.clone();
        config.timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }
}
