use std::path::Path;

use reqwest::Url;

use crate::config::schema::ClientConfig;
use crate::error::ConfigError;

pub const ENV_API_BASE: &str = "LLMSTXT_API_BASE";
pub const ENV_POLL_INTERVAL_MS: &str = "LLMSTXT_POLL_INTERVAL_MS";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    log::debug!("Loaded client config from {:?}", path);
    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

impl ClientConfig {
    /// Defaults overlaid with `LLMSTXT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Applies `LLMSTXT_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let api_base = std::env::var(ENV_API_BASE).ok();
        let poll_interval = std::env::var(ENV_POLL_INTERVAL_MS).ok();
        self.with_overrides(api_base.as_deref(), poll_interval.as_deref())
    }

    fn with_overrides(
        mut self,
        api_base: Option<&str>,
        poll_interval_ms: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
            self.api_base = base.trim().to_string();
        }

        if let Some(raw) = poll_interval_ms {
            self.poll_interval_ms =
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::Validation {
                        message: format!("{} must be an integer: {}", ENV_POLL_INTERVAL_MS, e),
                    })?;
        }

        validate_config(&self)?;
        Ok(self)
    }
}

pub fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.api_base).map_err(|e| ConfigError::Validation {
        message: format!("Invalid apiBase '{}': {}", config.api_base, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            message: format!(
                "apiBase must use http or https, got '{}'",
                url.scheme()
            ),
        });
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "pollIntervalMs must be greater than 0".to_string(),
        });
    }

    if config.max_consecutive_poll_failures == Some(0) {
        return Err(ConfigError::Validation {
            message: "maxConsecutivePollFailures must be at least 1 when set".to_string(),
        });
    }

    if config.job_timeout_secs == Some(0) {
        return Err(ConfigError::Validation {
            message: "jobTimeoutSecs must be at least 1 when set".to_string(),
        });
    }

    if config.channel_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "channelCapacity must be greater than 0".to_string(),
        });
    }

    Ok(())
}
