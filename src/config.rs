use std::time::Duration;

use crate::error::ExtractionError;

pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the external extraction service.
///
/// Loaded once at startup and injected into the client; nothing else in the
/// process reads these environment variables.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub api_key: String,
    pub referer: Option<String>,
    pub sync_timeout: Duration,
}

impl ExtractionConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            referer: None,
            sync_timeout: Duration::from_secs(DEFAULT_SYNC_TIMEOUT_SECS),
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    /// Reads `GUIDEBASE_API_URL`, `GUIDEBASE_API_KEY` (both required),
    /// `GUIDEBASE_REFERER` and `GUIDEBASE_SYNC_TIMEOUT_SECS` (optional).
    pub fn from_env() -> Result<Self, ExtractionError> {
        let base_url = required_env("GUIDEBASE_API_URL")?;
        let api_key = required_env("GUIDEBASE_API_KEY")?;

        let mut config = Self::new(base_url, api_key);

        if let Some(referer) = optional_env("GUIDEBASE_REFERER") {
            config.referer = Some(referer);
        }

        if let Some(raw) = optional_env("GUIDEBASE_SYNC_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ExtractionError::Config(format!(
                    "invalid GUIDEBASE_SYNC_TIMEOUT_SECS={raw:?}: expected a number of seconds"
                ))
            })?;
            if secs == 0 {
                return Err(ExtractionError::Config(
                    "GUIDEBASE_SYNC_TIMEOUT_SECS must be > 0".to_string(),
                ));
            }
            config.sync_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn required_env(name: &str) -> Result<String, ExtractionError> {
    let value = std::env::var(name)
        .map_err(|_| ExtractionError::Config(format!("{name} is not set")))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ExtractionError::Config(format!("{name} is empty")));
    }
    Ok(value)
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
