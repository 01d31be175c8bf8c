use std::time::Duration;

use crate::enrichment::PollPolicy;

/// Default Surfe bulk people enrichment endpoint.
pub const DEFAULT_API_URL: &str = "https://api.surfe.com/v2/people/enrich";

#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token. May be empty; the remote service rejects it then.
    pub api_key: String,
    pub api_url: String,
    pub request_timeout: Duration,
    pub max_polls: Option<u32>,
    pub max_wait: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            max_polls: None,
            max_wait: Some(Duration::from_secs(3600)),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            tracing::warn!("API_KEY is not set; Surfe will reject requests as unauthorized");
        }

        let config = Self {
            api_key,
            api_url: lookup("SURFE_API_URL")
                .filter(|s| !s.trim().is_empty())
                .map(|url| -> anyhow::Result<String> {
                    let parsed = url::Url::parse(&url)
                        .map_err(|e| anyhow::anyhow!("SURFE_API_URL is not a valid URL: {}", e))?;
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        anyhow::bail!("SURFE_API_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or(defaults.api_url),
            request_timeout: match lookup("SURFE_REQUEST_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("SURFE_REQUEST_TIMEOUT_SECS must be a whole number of seconds")
                })?),
                None => defaults.request_timeout,
            },
            max_polls: match lookup("SURFE_MAX_POLLS") {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| anyhow::anyhow!("SURFE_MAX_POLLS must be a positive number"))?,
                ),
                None => defaults.max_polls,
            },
            max_wait: match lookup("SURFE_MAX_WAIT_SECS") {
                Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("SURFE_MAX_WAIT_SECS must be a whole number of seconds")
                })?)),
                None => defaults.max_wait,
            },
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!("Surfe API URL: {}", config.api_url);
        tracing::debug!("API key present: {}", !config.api_key.is_empty());
        tracing::debug!(
            "Poll budget: max_polls={:?} max_wait={:?}",
            config.max_polls,
            config.max_wait
        );

        Ok(config)
    }

    /// Poll policy for a given interval, bounded by the configured budget.
    pub fn poll_policy(&self, interval: Duration) -> PollPolicy {
        PollPolicy {
            interval,
            max_polls: self.max_polls,
            max_elapsed: self.max_wait,
        }
    }
}
