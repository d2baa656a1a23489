//! Configuration for the streaming client.
//!
//! Everything that used to be decided by ambient environment is an explicit
//! value here and is passed to the components at construction.  A config can
//! be built in code with the `with_*` setters or loaded from YAML.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::logging::{LogContext, LogLevel};
use crate::retry::ExponentialBackoff;
use crate::titles::AgentTitles;

/// Default streaming endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/run_sse";

/// Default response header that carries the message id.
pub const DEFAULT_MESSAGE_ID_HEADER: &str = "x-message-id";

/// Default timeout for establishing the TCP/TLS connection, in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Configuration of a streaming client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// URL the request is POSTed to.
    pub endpoint: String,

    /// Timeout for establishing the connection, in seconds.
    pub connect_timeout_secs: u64,

    /// Optional bound on the whole request including the streamed body, in
    /// seconds.  `None` lets a stream run as long as the server keeps it open.
    pub timeout_secs: Option<u64>,

    /// Response header that carries the message id.
    pub message_id_header: String,

    /// Retry behavior for connection establishment.
    pub retry: ExponentialBackoff,

    /// Minimum level of forwarded log records.
    pub log_level: LogLevel,

    /// Agent titles that replace or extend the built-in table.
    pub titles: BTreeMap<String, String>,
}

impl StreamConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            timeout_secs: None,
            message_id_header: DEFAULT_MESSAGE_ID_HEADER.to_string(),
            retry: ExponentialBackoff::default(),
            log_level: LogLevel::default(),
            titles: BTreeMap::new(),
        }
    }

    /// Parses a YAML document.  Missing keys take their default values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: StreamConfig = serde_yaml::from_str(yaml)?;
        config.endpoint_url()?;
        Ok(config)
    }

    /// Loads a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Self::from_yaml_str(&yaml)
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets or clears the overall request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Sets the message-id header name.
    pub fn with_message_id_header(mut self, header: impl Into<String>) -> Self {
        self.message_id_header = header.into();
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: ExponentialBackoff) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Adds an agent title.
    pub fn with_title(mut self, agent_name: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(agent_name.into(), title.into());
        self
    }

    /// Parses and checks the endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::config(format!(
                "endpoint must be http or https, got {scheme}"
            ))),
        }
    }

    /// The connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The overall request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// A logging context at the configured level backed by `tracing`.
    pub fn log_context(&self) -> LogContext {
        LogContext::tracing(self.log_level)
    }

    /// The built-in agent titles with this config's overrides applied.
    pub fn agent_titles(&self) -> AgentTitles {
        AgentTitles::default().with_overrides(&self.titles)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::titles::TitleLookup;

    #[test]
    fn default_config() {
        let config = StreamConfig::new();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.message_id_header, "x-message-id");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert!(config.timeout().is_none());
        assert_eq!(config.retry, ExponentialBackoff::default());
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.titles.is_empty());
        assert!(config.endpoint_url().is_ok());
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = StreamConfig::from_yaml_str(
            "endpoint: https://chat.example.com/api/run_sse\n\
             log_level: debug\n\
             retry:\n  max_retries: 5\n\
             titles:\n  research_agent: Digging in\n",
        )
        .unwrap();
        assert_eq!(config.endpoint, "https://chat.example.com/api/run_sse");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay_ms, crate::retry::DEFAULT_BASE_DELAY_MS);
        assert_eq!(config.message_id_header, DEFAULT_MESSAGE_ID_HEADER);
        assert_eq!(config.agent_titles().title("research_agent"), "Digging in");
    }

    #[test]
    fn rejects_bad_endpoint() {
        assert!(StreamConfig::from_yaml_str("endpoint: not a url\n").is_err());
        let err = StreamConfig::from_yaml_str("endpoint: ftp://example.com/x\n").unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn builder_pattern() {
        let config = StreamConfig::new()
            .with_endpoint("https://example.com/stream")
            .with_connect_timeout(Duration::from_secs(5))
            .with_timeout(Some(Duration::from_secs(600)))
            .with_message_id_header("x-response-id")
            .with_retry(ExponentialBackoff::default().with_max_retries(0))
            .with_log_level(LogLevel::Warn)
            .with_title("slides_agent", "Designing");
        assert_eq!(config.endpoint, "https://example.com/stream");
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.message_id_header, "x-response-id");
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.log_context().level(), LogLevel::Warn);
        assert_eq!(config.agent_titles().title("slides_agent"), "Designing");
    }
}
