use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default time in seconds to sleep before re-fetching run status.
fn default_poll_wait_secs() -> u64 {
    30
}

/// Default time in seconds to wait for logs to be indexed after a run ends.
fn default_log_settle_secs() -> u64 {
    40
}

/// Default maximum cumulative wait in seconds before declaring a timeout.
fn default_job_timeout_secs() -> u64 {
    900
}

fn default_api_base_url() -> String {
    String::new()
}

/// Connection settings for the job-execution service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the job API, e.g. `https://service.example.com/dex/api/v1/`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bearer token attached to every call. Acquiring it is the caller's job.
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_poll_wait_secs")]
    pub poll_wait_secs: u64,
    #[serde(default = "default_log_settle_secs")]
    pub log_settle_secs: u64,
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            access_token: String::new(),
            poll_wait_secs: default_poll_wait_secs(),
            log_settle_secs: default_log_settle_secs(),
            job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Load config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: ClientConfig = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// The API base URL with a guaranteed trailing slash, so endpoint paths
    /// can be appended directly.
    pub fn api_root(&self) -> String {
        if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        }
    }
}
