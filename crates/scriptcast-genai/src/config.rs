//! Generative service configuration.

use std::time::Duration;

use crate::error::{GenAiError, GenAiResult};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CONTENT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for the generative service client.
#[derive(Clone)]
pub struct GenAiConfig {
    /// API key appended to every request
    pub api_key: String,
    /// Base URL of the REST API (no trailing slash)
    pub base_url: String,
    /// Model used for metadata generation
    pub content_model: String,
    /// Model used for video generation
    pub video_model: String,
    /// Fixed delay between video job polls
    pub poll_interval: Duration,
    /// Upper bound on total polling wait; `None` waits indefinitely
    pub max_wait: Option<Duration>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("content_model", &self.content_model)
            .field("video_model", &self.video_model)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GenAiConfig {
    /// Create config with defaults and the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            content_model: DEFAULT_CONTENT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: None,
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Create config from environment variables.
    ///
    /// The API key is read from `API_KEY`, falling back to `GEMINI_API_KEY`.
    /// A missing key is a fatal configuration error.
    pub fn from_env() -> GenAiResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GenAiResult<Self> {
        let secs = |name: &str| lookup(name).and_then(|s| s.trim().parse::<u64>().ok());

        let api_key = lookup("API_KEY")
            .or_else(|| lookup("GEMINI_API_KEY"))
            .ok_or_else(|| GenAiError::config("API_KEY environment variable not set"))?;

        let config = Self {
            api_key,
            base_url: lookup("GEMINI_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            content_model: lookup("GEMINI_CONTENT_MODEL").unwrap_or_else(|| DEFAULT_CONTENT_MODEL.to_string()),
            video_model: lookup("GEMINI_VIDEO_MODEL").unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
            poll_interval: secs("VIDEO_POLL_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            max_wait: secs("VIDEO_MAX_WAIT_SECS").map(Duration::from_secs),
            request_timeout: Duration::from_secs(secs("GEMINI_REQUEST_TIMEOUT_SECS").unwrap_or(120)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that can never work.
    pub fn validate(&self) -> GenAiResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(GenAiError::config("API key is empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(GenAiError::config("poll interval must be greater than zero"));
        }
        Ok(())
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Cap the total time spent waiting on a video job.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Override the content model.
    pub fn with_content_model(mut self, model: impl Into<String>) -> Self {
        self.content_model = model.into();
        self
    }

    /// Override the video model.
    pub fn with_video_model(mut self, model: impl Into<String>) -> Self {
        self.video_model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = GenAiConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.content_model, "gemini-2.5-flash");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert!(config.max_wait.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_key_and_zero_interval() {
        let err = GenAiConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, GenAiError::Config(_)));

        let err = GenAiConfig::new("key")
            .with_poll_interval(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, GenAiError::Config(_)));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GenAiConfig::from_lookup(vars(&[("GEMINI_BASE_URL", "http://localhost")])).unwrap_err();
        assert!(matches!(err, GenAiError::Config(_)));
    }

    #[test]
    fn test_whitespace_key_is_config_error() {
        let err = GenAiConfig::from_lookup(vars(&[("API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, GenAiError::Config(_)));
    }

    #[test]
    fn test_gemini_key_fallback() {
        let config = GenAiConfig::from_lookup(vars(&[("GEMINI_API_KEY", "fallback")])).unwrap();
        assert_eq!(config.api_key, "fallback");

        let config = GenAiConfig::from_lookup(vars(&[("API_KEY", "primary"), ("GEMINI_API_KEY", "fallback")])).unwrap();
        assert_eq!(config.api_key, "primary");
    }

    #[test]
    fn test_lookup_overrides() {
        let config = GenAiConfig::from_lookup(vars(&[
            ("API_KEY", "k"),
            ("GEMINI_BASE_URL", "http://localhost:8080/v1beta/"),
            ("VIDEO_POLL_INTERVAL_SECS", "3"),
            ("VIDEO_MAX_WAIT_SECS", "600"),
            ("GEMINI_REQUEST_TIMEOUT_SECS", "not-a-number"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/v1beta");
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.max_wait, Some(Duration::from_secs(600)));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.video_model, DEFAULT_VIDEO_MODEL);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = GenAiConfig::from_lookup(vars(&[("API_KEY", "k"), ("VIDEO_POLL_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, GenAiError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GenAiConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = GenAiConfig::new("key").with_base_url("http://localhost:1234/");
        assert_eq!(config.base_url, "http://localhost:1234");
    }
}
