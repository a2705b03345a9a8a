//! Client configuration.
//!
//! A [`Config`] is an immutable bag of connection and timing settings,
//! constructed once per client through [`ConfigBuilder`]. The builder
//! validates the timing invariants so a misconfigured wait window is
//! rejected up front instead of producing a loop that can never poll.

use crate::error::{Result, RucaptchaError};
use std::time::Duration;

/// Default service endpoint.
pub const DEFAULT_SERVER_BASE_URI: &str = "http://rucaptcha.com";

/// Default pause between result polls for image captchas.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default pause between result polls for recaptcha/keycaptcha tasks,
/// which the workers take noticeably longer to solve.
pub const DEFAULT_RECAPTCHA_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default upper bound on the whole wait-for-result loop.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(120);

/// Immutable client configuration.
///
/// # Example
/// ```
/// use rucaptcha_client::Config;
/// use std::time::Duration;
///
/// let config = Config::builder("my-api-key")
///     .poll_interval(Duration::from_secs(3))
///     .max_wait(Duration::from_secs(60))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.api_key(), "my-api-key");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    api_key: String,
    server_base_uri: String,
    soft_id: Option<String>,
    poll_interval: Duration,
    recaptcha_poll_interval: Duration,
    max_wait: Duration,
}

impl Config {
    /// Create a builder with the required API key.
    pub fn builder(api_key: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(api_key)
    }

    /// Build a configuration with all defaults from an API key alone.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self> {
        ConfigBuilder::new(api_key).build()
    }

    /// Account API key sent with every request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Base URI of the service, without a trailing slash.
    pub fn server_base_uri(&self) -> &str {
        &self.server_base_uri
    }

    /// Application id reported to the service for attribution, if any.
    pub fn soft_id(&self) -> Option<&str> {
        self.soft_id.as_deref()
    }

    /// Pause between polls in the image recognize loop.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Pause between polls in the recaptcha/keycaptcha recognize loops.
    pub fn recaptcha_poll_interval(&self) -> Duration {
        self.recaptcha_poll_interval
    }

    /// Upper bound on time spent waiting for a result.
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder {
    api_key: String,
    server_base_uri: String,
    soft_id: Option<String>,
    poll_interval: Duration,
    recaptcha_poll_interval: Duration,
    max_wait: Duration,
}

impl ConfigBuilder {
    /// Create a new builder with the required API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server_base_uri: DEFAULT_SERVER_BASE_URI.to_string(),
            soft_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            recaptcha_poll_interval: DEFAULT_RECAPTCHA_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Override the service endpoint. A trailing slash is stripped.
    pub fn server_base_uri(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        self.server_base_uri = uri.trim_end_matches('/').to_string();
        self
    }

    /// Set the application id sent with each submission for service-side
    /// attribution. Unset by default.
    pub fn soft_id(mut self, soft_id: impl Into<String>) -> Self {
        self.soft_id = Some(soft_id.into());
        self
    }

    /// Set the pause between polls for image captchas.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the pause between polls for recaptcha/keycaptcha tasks.
    pub fn recaptcha_poll_interval(mut self, interval: Duration) -> Self {
        self.recaptcha_poll_interval = interval;
        self
    }

    /// Set the upper bound on the whole wait-for-result loop.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    /// Returns [`RucaptchaError::InvalidArgument`] when the API key is empty,
    /// any timeout is zero, or `max_wait` is shorter than `poll_interval`
    /// (the loop sleeps before its first poll, so such a window would time
    /// out without ever checking the result).
    pub fn build(self) -> Result<Config> {
        if self.api_key.is_empty() {
            return Err(RucaptchaError::InvalidArgument(
                "API key must not be empty".into(),
            ));
        }

        if self.poll_interval.is_zero()
            || self.recaptcha_poll_interval.is_zero()
            || self.max_wait.is_zero()
        {
            return Err(RucaptchaError::InvalidArgument(
                "timeouts must be greater than zero".into(),
            ));
        }

        if self.max_wait < self.poll_interval {
            return Err(RucaptchaError::InvalidArgument(format!(
                "max_wait ({:?}) must be at least as long as poll_interval ({:?})",
                self.max_wait, self.poll_interval
            )));
        }

        Ok(Config {
            api_key: self.api_key,
            server_base_uri: self.server_base_uri,
            soft_id: self.soft_id,
            poll_interval: self.poll_interval,
            recaptcha_poll_interval: self.recaptcha_poll_interval,
            max_wait: self.max_wait,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_api_key("key").unwrap();
        assert_eq!(config.server_base_uri(), DEFAULT_SERVER_BASE_URI);
        assert_eq!(config.soft_id(), None);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.recaptcha_poll_interval(), Duration::from_secs(15));
        assert_eq!(config.max_wait(), Duration::from_secs(120));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = Config::from_api_key("");
        assert!(matches!(result, Err(RucaptchaError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::builder("key")
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(RucaptchaError::InvalidArgument(_))));
    }

    #[test]
    fn test_max_wait_shorter_than_interval_rejected() {
        let result = Config::builder("key")
            .poll_interval(Duration::from_secs(30))
            .max_wait(Duration::from_secs(10))
            .build();
        assert!(matches!(result, Err(RucaptchaError::InvalidArgument(_))));
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config = Config::builder("key")
            .server_base_uri("https://example.com/")
            .build()
            .unwrap();
        assert_eq!(config.server_base_uri(), "https://example.com");
    }
}
