//! Configuration types for the chat application.
//!
//! Command-line arguments are parsed with `arrrg` and layered over an
//! optional YAML [`StreamConfig`] file.

use arrrg_derive::CommandLine;
use time::OffsetDateTime;

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::logging::LogLevel;

/// User id sent when none is given.
const DEFAULT_USER_ID: &str = "cli-user";

/// Command-line arguments for the agentstream-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Path to a YAML stream configuration.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Endpoint override.
    #[arrrg(optional, "Streaming endpoint URL", "URL")]
    pub endpoint: Option<String>,

    /// User id sent with each message.
    #[arrrg(optional, "User id (default: cli-user)", "ID")]
    pub user: Option<String>,

    /// Session id sent with each message.
    #[arrrg(optional, "Session id (default: generated)", "ID")]
    pub session: Option<String>,

    /// Log level override.
    #[arrrg(optional, "Log level: debug, info, warn, error", "LEVEL")]
    pub log_level: Option<String>,

    /// Retry bound override.
    #[arrrg(optional, "Maximum connection retries", "N")]
    pub max_retries: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration of a chat run.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Configuration of the streaming client.
    pub stream: StreamConfig,

    /// User id sent with each message.
    pub user_id: String,

    /// Session id sent with each message.
    pub session_id: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a config with default values and a fresh session id.
    pub fn new() -> Self {
        Self {
            stream: StreamConfig::new(),
            user_id: DEFAULT_USER_ID.to_string(),
            session_id: generate_session_id(),
            use_color: true,
        }
    }

    /// Resolves command-line arguments, loading the YAML file they name.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let stream = match &args.config {
            Some(path) => StreamConfig::load(path)?,
            None => StreamConfig::new(),
        };
        Self::from_args_with(args, stream)
    }

    /// Applies command-line arguments over an already loaded `stream` config.
    pub fn from_args_with(args: ChatArgs, mut stream: StreamConfig) -> Result<Self> {
        if let Some(endpoint) = args.endpoint {
            stream = stream.with_endpoint(endpoint);
            stream.endpoint_url()?;
        }
        if let Some(level) = args.log_level {
            let level = level
                .parse::<LogLevel>()
                .map_err(|e| Error::config(e.to_string()))?;
            stream = stream.with_log_level(level);
        }
        if let Some(max_retries) = args.max_retries {
            let retry = stream.retry.clone().with_max_retries(max_retries);
            stream = stream.with_retry(retry);
        }

        let mut config = ChatConfig {
            stream,
            ..ChatConfig::new()
        };
        if let Some(user) = args.user {
            config = config.with_user_id(user);
        }
        if let Some(session) = args.session {
            config = config.with_session_id(session);
        }
        if args.no_color {
            config = config.without_color();
        }
        Ok(config)
    }

    /// Sets the user id.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_session_id() -> String {
    format!("session-{}", OffsetDateTime::now_utc().unix_timestamp())
}
